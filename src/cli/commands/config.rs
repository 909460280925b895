use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and change preferences",
        "config [show|set <key> <value>]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        show_config(context);
        return Ok(());
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 2 {
                return Err(CommandError::InvalidArguments(
                    "usage: config set <key> <value>".into(),
                ));
            }
            let key = args[1].to_lowercase();
            let value = args[2..].join(" ");
            context.config.set_value(&key, &value)?;
            context.persist_config()?;
            io::print_success(format!("Updated `{key}`."));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config subcommand `{}`",
            other
        ))),
    }
}

fn show_config(context: &ShellContext) {
    let config = &context.config;
    output_section("Configuration");
    io::print_info(format!("  File: {}", context.config_manager.path().display()));
    io::print_info(format!("  currency_symbol       : {}", config.currency_symbol));
    io::print_info(format!(
        "  extra_categories      : {}",
        if config.extra_categories.is_empty() {
            "(none)".to_string()
        } else {
            config.extra_categories.join(", ")
        }
    ));

    let assistant = &config.assistant;
    io::print_info(format!(
        "  assistant.enabled     : {}",
        if assistant.enabled { "on" } else { "off" }
    ));
    io::print_info(format!("  assistant.model       : {}", assistant.model));
    io::print_info(format!("  assistant.endpoint    : {}", assistant.endpoint));
    io::print_info(format!(
        "  assistant.api_key     : {}",
        if assistant.api_key.is_some() { "(set)" } else { "(unset)" }
    ));
    io::print_info(format!("  assistant.api_key_env : {}", assistant.api_key_env));
    io::print_info(format!("  assistant.timeout_secs: {}", assistant.timeout_secs));
    io::print_info(format!(
        "  Assistant status      : {}",
        if context.assistant.is_available() {
            "ready"
        } else {
            "unavailable"
        }
    ));
}
