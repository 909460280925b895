use std::path::Path;

use crate::assistant::{self, ReceiptImage};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "suggest",
            "Ask the assistant to categorize a description",
            "suggest <description>",
            cmd_suggest,
        ),
        CommandEntry::new(
            "scan",
            "Read description, amount and date from a receipt image",
            "scan <image>",
            cmd_scan,
        ),
    ]
}

fn cmd_suggest(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let description = args.join(" ");
    if description.trim().is_empty() {
        return Err(CommandError::InvalidArguments(
            "usage: suggest <description>".into(),
        ));
    }

    let category = assistant::categorize_or_default(
        context.assistant.as_ref(),
        description.trim(),
        &context.catalog,
    );
    io::print_success(format!("Suggested category: {category}"));
    if category.is_other() && !context.assistant.is_available() {
        io::print_hint("The assistant is unavailable; set an API key to get real suggestions.");
    }
    Ok(())
}

fn cmd_scan(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(path) = args.first() else {
        return Err(CommandError::InvalidArguments("usage: scan <image>".into()));
    };
    let image = ReceiptImage::from_path(Path::new(path))?;
    let extraction = context.assistant.extract_receipt(&image)?;

    output_section("Receipt");
    io::print_info(format!(
        "  Description: {}",
        extraction.description.as_deref().unwrap_or("(not found)")
    ));
    io::print_info(format!(
        "  Amount     : {}",
        extraction
            .amount
            .map(|amount| context.money(amount))
            .unwrap_or_else(|| "(not found)".into())
    ));
    io::print_info(format!(
        "  Date       : {}",
        extraction
            .date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "(not found)".into())
    ));
    io::print_hint(format!("Use `add receipt={path}` to record it."));
    Ok(())
}
