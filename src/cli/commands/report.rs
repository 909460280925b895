use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::format;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::core::category_totals;
use crate::domain::Party;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "summary",
            "Show totals and who owes whom",
            "summary",
            cmd_summary,
        ),
        CommandEntry::new(
            "categories",
            "Show spending per category, or the category catalog",
            "categories [catalog]",
            cmd_categories,
        ),
    ]
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = context.store.summary();
    let symbol = context.config.currency_symbol.as_str();

    output_section("Summary");
    for party in Party::ALL {
        let totals = summary.party(party);
        let name = match party {
            Party::Me => "You",
            Party::Roommate => "Roommate",
        };
        io::print_info(format!(
            "  {:<9} paid {:>12}   share {:>12}   balance {:>12}",
            name,
            format::money(symbol, totals.total_paid),
            format::money(symbol, totals.total_share),
            format::signed_money(symbol, summary.balance_for(party)),
        ));
    }
    io::print_info(format::settlement_line(symbol, &summary));
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args
        .first()
        .is_some_and(|arg| arg.eq_ignore_ascii_case("catalog"))
    {
        output_section("Category catalog");
        for name in context.catalog.names() {
            io::print_info(format!("  {name}"));
        }
        return Ok(());
    }

    let report = category_totals(context.store.all());
    output_section("Spending by category");
    if report.is_empty() {
        io::print_info("No expenses recorded yet.");
        return Ok(());
    }
    for row in report {
        io::print_info(format!(
            "  {:<16} {:>12}  ({} expense{})",
            row.category.name(),
            context.money(row.total),
            row.count,
            if row.count == 1 { "" } else { "s" }
        ));
    }
    Ok(())
}
