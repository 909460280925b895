//! Shell front end: stdin lines in script mode, a rustyline prompt otherwise.
//!
//! The interactive prompt completes command names, `key=value` expense
//! fields, catalog categories and config keys, and hints at a command's
//! usage once its name has been typed.

use std::{
    borrow::Cow,
    collections::HashMap,
    io::{self, BufRead},
};

use colored::Colorize;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::core::{CliError, CliMode, LoopControl, ShellContext};
use crate::cli::output::info as output_info;
use crate::config::CONFIG_KEYS;

const SCRIPT_ENV: &str = "SPLIT_CORE_CLI_SCRIPT";

const FIELD_KEYS: &[&str] = &[
    "description",
    "amount",
    "date",
    "category",
    "paid-by",
    "split",
    "receipt",
];
const PARTY_VALUES: &[&str] = &["me", "roommate"];
const SPLIT_VALUES: &[&str] = &["equal", "me", "roommate"];

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Script => {
            for line in io::stdin().lock().lines() {
                if context.run_line(&line?)? == LoopControl::Exit {
                    break;
                }
            }
            Ok(())
        }
        CliMode::Interactive => run_interactive(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    output_info(format!(
        "Split Core: {} expense(s) loaded. Type `help` for commands.",
        context.store.len()
    ));

    let mut editor = Editor::<ShellHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(ShellHelper::from_context(context)));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    loop {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                if context.run_line(trimmed)? == LoopControl::Exit {
                    break;
                }
                // `config set` may have changed the catalog.
                if let Some(helper) = editor.helper_mut() {
                    helper.refresh_categories(context);
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output_info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

struct ShellHelper {
    commands: Vec<String>,
    usages: HashMap<String, &'static str>,
    categories: Vec<String>,
}

impl ShellHelper {
    fn from_context(context: &ShellContext) -> Self {
        let mut commands: Vec<String> = context
            .command_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        commands.sort();
        commands.dedup();
        let usages = commands
            .iter()
            .filter_map(|name| context.command(name).map(|entry| (name.clone(), entry.usage)))
            .collect();

        let mut helper = Self {
            commands,
            usages,
            categories: Vec::new(),
        };
        helper.refresh_categories(context);
        helper
    }

    fn refresh_categories(&mut self, context: &ShellContext) {
        self.categories = context.catalog.names().map(str::to_string).collect();
    }

    /// Candidates for `current`, given the words already completed before it.
    fn candidates(&self, words: &[String], current: &str) -> Vec<String> {
        let Some(command) = words.first() else {
            return starting_with(self.commands.iter().map(String::as_str), current);
        };

        match (command.to_ascii_lowercase().as_str(), words.len()) {
            ("add", _) => self.field_candidates(current),
            // The first argument of `edit` is an expense id.
            ("edit", 1) => Vec::new(),
            ("edit", _) => self.field_candidates(current),
            ("help", 1) => starting_with(self.commands.iter().map(String::as_str), current),
            ("categories", 1) => starting_with(["catalog"], current),
            ("config", 1) => starting_with(["show", "set"], current),
            ("config", 2) if words[1].eq_ignore_ascii_case("set") => {
                starting_with(CONFIG_KEYS.iter().copied(), current)
            }
            _ => Vec::new(),
        }
    }

    fn field_candidates(&self, current: &str) -> Vec<String> {
        let Some((key, partial)) = current.split_once('=') else {
            return starting_with(FIELD_KEYS.iter().copied(), current)
                .into_iter()
                .map(|key| format!("{key}="))
                .collect();
        };

        let values: Vec<&str> = match key.to_ascii_lowercase().as_str() {
            "category" | "cat" => self
                .categories
                .iter()
                .map(String::as_str)
                .chain(["auto"])
                .collect(),
            "paid-by" | "paid_by" | "payer" => PARTY_VALUES.to_vec(),
            "split" => SPLIT_VALUES.to_vec(),
            _ => Vec::new(),
        };

        starting_with(values, partial.trim_start_matches('"'))
            .into_iter()
            .map(|value| {
                if value.contains(char::is_whitespace) {
                    format!("{key}=\"{value}\"")
                } else {
                    format!("{key}={value}")
                }
            })
            .collect()
    }
}

/// Case-insensitive prefix filter.
fn starting_with<'a>(names: impl IntoIterator<Item = &'a str>, needle: &str) -> Vec<String> {
    let needle = needle.to_ascii_lowercase();
    names
        .into_iter()
        .filter(|name| name.to_ascii_lowercase().starts_with(&needle))
        .map(str::to_string)
        .collect()
}

/// Byte offset where the word under the cursor begins; quoted spaces do not
/// end a word.
fn word_start(prefix: &str) -> usize {
    let mut quoted = false;
    let mut start = 0;
    for (idx, ch) in prefix.char_indices() {
        if ch == '"' {
            quoted = !quoted;
        } else if ch.is_whitespace() && !quoted {
            start = idx + ch.len_utf8();
        }
    }
    start
}

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = word_start(prefix);
        let words = shell_words::split(&prefix[..start]).unwrap_or_default();
        let pairs = self
            .candidates(&words, &prefix[start..])
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let command = line.strip_suffix(' ')?;
        if command.is_empty() || command.contains(char::is_whitespace) {
            return None;
        }
        let usage = self.usages.get(&command.to_ascii_lowercase())?;
        usage.split_once(' ').map(|(_, rest)| rest.to_string())
    }
}

impl Highlighter for ShellHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for ShellHelper {}
