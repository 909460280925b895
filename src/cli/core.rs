//! Core CLI loop, dispatch, and shell context helpers.

use std::{io, path::PathBuf};

use chrono::{Local, NaiveDate};
use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;
use strsim::levenshtein;

use crate::{
    assistant::{self, AssistError, ExpenseAssistant},
    config::{Config, ConfigManager},
    core::{utils::PathResolver, ExpenseStore},
    domain::{CategoryCatalog, Expense, ExpenseId},
    errors::SplitError,
    form::ValidationError,
    storage::{ExpensePersistence, JsonFileStore},
};

pub use crate::errors::CliError;

use super::commands;
use super::format;
use super::io as cli_io;
use super::output;
use super::registry::{CommandEntry, CommandRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub store: ExpenseStore,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub catalog: CategoryCatalog,
    pub assistant: Box<dyn ExpenseAssistant>,
    pub theme: ColorfulTheme,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, PathResolver::base_dir())
    }

    /// Opens the shell against the data directory `base`.
    pub fn with_base_dir(mode: CliMode, base: PathBuf) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(base.clone())?;
        let config = config_manager.load()?;
        let backend = JsonFileStore::new(Some(base))?;
        let store = ExpenseStore::hydrate(ExpensePersistence::new(Box::new(backend)));
        let catalog = config.catalog();
        let assistant = assistant::from_config(&config.assistant);

        output::set_plain(mode == CliMode::Script);
        tracing::info!(
            mode = ?mode,
            expenses = store.len(),
            assistant = assistant.name(),
            "shell ready"
        );

        Ok(ShellContext {
            mode,
            registry,
            store,
            config_manager,
            config,
            catalog,
            assistant,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
        })
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn theme(&self) -> &ColorfulTheme {
        &self.theme
    }

    pub(crate) fn prompt(&self) -> String {
        format!("split ({})> ", self.store.len())
    }

    pub(crate) fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub(crate) fn money(&self, amount: rust_decimal::Decimal) -> String {
        format::money(&self.config.currency_symbol, amount)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    /// Saves the config and rebuilds everything derived from it.
    pub(crate) fn persist_config(&mut self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        self.catalog = self.config.catalog();
        self.assistant = assistant::from_config(&self.config.assistant);
        Ok(())
    }

    /// Finds an expense by full id or by an unambiguous id prefix or suffix.
    pub(crate) fn find_expense(&self, token: &str) -> Result<Option<&Expense>, CommandError> {
        let token = token.trim();
        if let Some(expense) = self.store.get(&ExpenseId::from(token)) {
            return Ok(Some(expense));
        }
        if token.is_empty() {
            return Ok(None);
        }
        let mut matches = self.store.all().iter().filter(|expense| {
            let id = expense.id.as_str();
            id.ends_with(token) || id.starts_with(token)
        });
        let first = matches.next();
        if matches.next().is_some() {
            return Err(CommandError::InvalidArguments(format!(
                "`{token}` matches more than one expense; use a longer id"
            )));
        }
        Ok(first)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match shell_words::split(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.print_warning(&err.to_string());
                return Ok(LoopControl::Continue);
            }
        };

        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }

        let command = tokens[0].to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.last_command = Some(line.trim().to_string());

        match self.dispatch(&command, &tokens[0], &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            other => other,
        }
    }

    /// Runs one line and reports a failed command without stopping the shell.
    pub(crate) fn run_line(&mut self, line: &str) -> Result<LoopControl, CliError> {
        match self.process_line(line) {
            Ok(control) => Ok(control),
            Err(err) => {
                self.report_error(err)?;
                Ok(LoopControl::Continue)
            }
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action(&self.theme, "Exit shell?", true)?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                self.print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Validation(err) => {
                self.print_error(&format!("Expense not saved: {err}"));
                Ok(())
            }
            other => {
                self.print_error(&other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        cli_io::print_error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }

    pub(crate) fn print_hint(&self, message: &str) {
        cli_io::print_hint(message);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Assist(#[from] AssistError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] SplitError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CliError> for CommandError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Core(inner) => CommandError::Core(inner),
            CliError::Command(message) => CommandError::InvalidArguments(message),
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

/// Runs `lines` through a script-mode shell rooted at `base`.
pub fn process_script(base: PathBuf, lines: &[&str]) -> Result<ShellContext, CliError> {
    let mut app = ShellContext::with_base_dir(CliMode::Script, base)?;
    for line in lines {
        if app.run_line(line)? == LoopControl::Exit {
            break;
        }
    }
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Party, SplitMethod};
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[test]
    fn unbalanced_quote_is_reported_and_skipped() {
        let temp = tempdir().unwrap();
        let mut context =
            ShellContext::with_base_dir(CliMode::Script, temp.path().to_path_buf()).unwrap();
        let control = context
            .run_line("add description=\"Weekly shop amount=12")
            .unwrap();
        assert_eq!(control, LoopControl::Continue);
        assert!(context.store.is_empty());

        context
            .run_line("add description=\"Weekly shop\" amount=12")
            .unwrap();
        assert_eq!(context.store.all()[0].description, "Weekly shop");
    }

    #[test]
    fn script_runner_adds_and_persists() {
        let temp = tempdir().unwrap();
        let context = process_script(
            temp.path().to_path_buf(),
            &[
                "add description=\"Electric bill\" amount=100 date=2024-05-01 category=utilities",
                "add description=Takeout amount=40 date=2024-05-02 category=\"dining out\" paid-by=roommate",
                "exit",
                "add description=Ignored amount=1",
            ],
        )
        .unwrap();

        assert!(!context.running);
        assert_eq!(context.store.len(), 2);
        let newest = &context.store.all()[0];
        assert_eq!(newest.description, "Takeout");
        assert_eq!(newest.category.name(), "Dining Out");
        assert_eq!(newest.paid_by, Party::Roommate);
        assert_eq!(context.store.summary().balance, Decimal::from(30));

        let reopened = ShellContext::with_base_dir(CliMode::Script, temp.path().to_path_buf())
            .unwrap();
        assert_eq!(reopened.store.all(), context.store.all());
    }

    #[test]
    fn invalid_amount_leaves_store_untouched() {
        let temp = tempdir().unwrap();
        let context = process_script(
            temp.path().to_path_buf(),
            &["add description=Refund amount=-5", "add description=Nothing amount=0"],
        )
        .unwrap();
        assert!(context.store.is_empty());
    }

    #[test]
    fn edit_and_delete_by_short_id() {
        let temp = tempdir().unwrap();
        let mut context = process_script(
            temp.path().to_path_buf(),
            &["add description=Rent amount=1200 date=2024-06-01 category=Rent"],
        )
        .unwrap();
        let id = context.store.all()[0].id.clone();

        context
            .process_line(&format!("edit {} split=me amount=1100", id.short()))
            .unwrap();
        let edited = &context.store.all()[0];
        assert_eq!(edited.id, id);
        assert_eq!(edited.split_method, SplitMethod::MeOwesFull);
        assert_eq!(edited.amount, Decimal::from(1100));
        assert_eq!(edited.description, "Rent");

        context.process_line(&format!("remove {}", id.short())).unwrap();
        assert!(context.store.is_empty());
        context.process_line(&format!("delete {}", id.short())).unwrap();
    }

    #[test]
    fn unknown_command_keeps_running() {
        let temp = tempdir().unwrap();
        let mut context =
            ShellContext::with_base_dir(CliMode::Script, temp.path().to_path_buf()).unwrap();
        let control = context.process_line("sumary").unwrap();
        assert_eq!(control, LoopControl::Continue);
        assert!(context.running);
    }

    #[test]
    fn config_set_updates_catalog() {
        let temp = tempdir().unwrap();
        let context = process_script(
            temp.path().to_path_buf(),
            &[
                "config set extra_categories Pets",
                "add description=\"Cat food\" amount=20 category=pets",
            ],
        )
        .unwrap();
        assert_eq!(context.store.all()[0].category.name(), "Pets");
        let saved = ConfigManager::with_base_dir(temp.path().to_path_buf())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(saved.extra_categories, vec!["Pets"]);
    }

    #[test]
    fn unreadable_receipt_still_saves_typed_fields() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("no-such-receipt.jpg");
        let line = format!(
            "add receipt=\"{}\" description=Lunch amount=12 category=Groceries",
            missing.display()
        );
        let context = process_script(temp.path().to_path_buf(), &[line.as_str()]).unwrap();
        assert_eq!(context.store.len(), 1);
        assert_eq!(context.store.all()[0].description, "Lunch");
    }

    #[test]
    fn oversized_amount_is_rejected_and_summary_still_runs() {
        let temp = tempdir().unwrap();
        let mut context = process_script(
            temp.path().to_path_buf(),
            &["add description=Typo amount=79228162514264337593543950335"],
        )
        .unwrap();
        assert!(context.store.is_empty());
        context.process_line("summary").unwrap();
        context.process_line("categories").unwrap();
    }
}
