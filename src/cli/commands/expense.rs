use std::path::Path;

use crate::assistant::ReceiptImage;
use crate::cli::core::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::format;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::domain::{Displayable, Expense, Party, SplitMethod};
use crate::form::{EnrichmentOutcome, ExpenseForm, FormMode, Submission};

const FIELD_USAGE: &str = "description=<text> amount=<number> date=<YYYY-MM-DD> \
category=<name|auto> paid-by=<me|roommate> split=<equal|me|roommate> receipt=<image>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "add",
            "Record a shared expense",
            "add [description=.. amount=.. date=.. category=.. paid-by=.. split=.. receipt=..]",
            cmd_add,
        ),
        CommandEntry::new(
            "edit",
            "Change an existing expense",
            "edit <id> [field=value ...]",
            cmd_edit,
        ),
        CommandEntry::new("delete", "Delete an expense", "delete <id>", cmd_delete)
            .with_aliases(&["remove"]),
        CommandEntry::new("list", "List expenses, newest first", "list", cmd_list),
        CommandEntry::new("show", "Show one expense", "show <id>", cmd_show),
    ]
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FieldArgs {
    description: Option<String>,
    amount: Option<String>,
    date: Option<String>,
    category: Option<String>,
    paid_by: Option<Party>,
    split: Option<SplitMethod>,
    receipt: Option<String>,
}

impl FieldArgs {
    fn parse(args: &[&str]) -> Result<Self, CommandError> {
        let mut fields = FieldArgs::default();
        for arg in args {
            let Some((key, value)) = arg.split_once('=') else {
                return Err(CommandError::InvalidArguments(format!(
                    "expected key=value, got `{arg}` ({FIELD_USAGE})"
                )));
            };
            let value = value.trim().to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "description" | "desc" => fields.description = Some(value),
                "amount" => fields.amount = Some(value),
                "date" => fields.date = Some(value),
                "category" | "cat" => fields.category = Some(value),
                "paid-by" | "paid_by" | "payer" => {
                    fields.paid_by = Some(value.parse().map_err(CommandError::InvalidArguments)?)
                }
                "split" => {
                    fields.split = Some(value.parse().map_err(CommandError::InvalidArguments)?)
                }
                "receipt" => fields.receipt = Some(value),
                other => {
                    return Err(CommandError::InvalidArguments(format!(
                        "unknown field `{other}` ({FIELD_USAGE})"
                    )))
                }
            }
        }
        Ok(fields)
    }

    fn wants_suggestion(&self) -> bool {
        self.category
            .as_deref()
            .is_some_and(|category| category.is_empty() || category.eq_ignore_ascii_case("auto"))
    }
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut form = ExpenseForm::new(context.catalog.clone(), context.today());
    if args.is_empty() {
        if context.mode() == CliMode::Script {
            return Err(CommandError::InvalidArguments(format!(
                "usage: add {FIELD_USAGE}"
            )));
        }
        run_wizard(context, &mut form)?;
    } else {
        apply_fields(context, &mut form, FieldArgs::parse(args)?)?;
    }
    submit(context, &mut form)
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((token, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: edit <id> [field=value ...]".into(),
        ));
    };
    let Some(expense) = context.find_expense(token)?.cloned() else {
        io::print_warning(format!("No expense matches `{token}`."));
        return Ok(());
    };

    let mut form = ExpenseForm::edit(&expense, context.catalog.clone());
    if rest.is_empty() {
        if context.mode() == CliMode::Script {
            return Err(CommandError::InvalidArguments(
                "usage: edit <id> field=value ...".into(),
            ));
        }
        run_wizard(context, &mut form)?;
    } else {
        apply_fields(context, &mut form, FieldArgs::parse(rest)?)?;
    }
    submit(context, &mut form)
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(token) = args.first() else {
        return Err(CommandError::InvalidArguments("usage: delete <id>".into()));
    };
    let Some(expense) = context.find_expense(token)?.cloned() else {
        io::print_warning(format!("No expense matches `{token}`."));
        return Ok(());
    };

    if context.mode() == CliMode::Interactive
        && !io::confirm_action(
            context.theme(),
            &format!("Delete `{}`?", expense.description),
            false,
        )?
    {
        io::print_info("Operation cancelled.");
        return Ok(());
    }

    match context.store.remove(&expense.id) {
        Some(removed) => io::print_success(format!(
            "Deleted {} ({}).",
            removed.description,
            context.money(removed.amount)
        )),
        None => io::print_warning(format!("No expense matches `{token}`.")),
    }
    Ok(())
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output_section("Expenses");
    if context.store.is_empty() {
        io::print_info("No expenses recorded yet. Use `add` to record one.");
        return Ok(());
    }
    let symbol = context.config.currency_symbol.as_str();
    for expense in context.store.all() {
        io::print_info(format::expense_row(symbol, expense));
    }
    io::print_info(format!("{} expense(s).", context.store.len()));
    Ok(())
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(token) = args.first() else {
        return Err(CommandError::InvalidArguments("usage: show <id>".into()));
    };
    let Some(expense) = context.find_expense(token)? else {
        io::print_warning(format!("No expense matches `{token}`."));
        return Ok(());
    };
    print_expense(context, expense);
    Ok(())
}

fn print_expense(context: &ShellContext, expense: &Expense) {
    output_section(expense.display_label());
    io::print_info(format!("  Id         : {}", expense.id));
    io::print_info(format!("  Description: {}", expense.description));
    io::print_info(format!("  Amount     : {}", context.money(expense.amount)));
    io::print_info(format!("  Date       : {}", expense.date));
    io::print_info(format!("  Category   : {}", expense.category));
    io::print_info(format!("  Paid by    : {}", expense.paid_by));
    io::print_info(format!("  Split      : {}", expense.split_method));
}

/// Copies parsed fields into the form. A receipt is read first so that
/// explicit fields win over what the assistant extracted; an unreadable
/// receipt only warns.
fn apply_fields(
    context: &ShellContext,
    form: &mut ExpenseForm,
    fields: FieldArgs,
) -> CommandResult {
    let suggest = fields.wants_suggestion();

    if let Some(path) = &fields.receipt {
        scan_receipt_file(context, form, path);
    }
    if let Some(description) = fields.description {
        form.set_description(description);
    }
    if let Some(amount) = fields.amount {
        form.set_amount(amount);
    }
    if let Some(date) = fields.date {
        form.set_date(date);
    }
    if let Some(paid_by) = fields.paid_by {
        form.set_paid_by(paid_by);
    }
    if let Some(split) = fields.split {
        form.set_split_method(split);
    }
    match fields.category {
        Some(_) if suggest => {
            form.set_category("");
            let outcome = form.suggest_category(context.assistant.as_ref());
            report_suggestion(form, outcome);
        }
        Some(category) => form.set_category(category),
        None => {}
    }
    Ok(())
}

fn scan_receipt_file(context: &ShellContext, form: &mut ExpenseForm, path: &str) {
    match ReceiptImage::from_path(Path::new(path)) {
        Ok(image) => {
            let outcome = form.scan_receipt(context.assistant.as_ref(), &image);
            report_receipt(form, outcome);
        }
        Err(err) => io::print_warning(format!("Could not read the receipt: {err}")),
    }
}

fn report_receipt(form: &mut ExpenseForm, outcome: EnrichmentOutcome) {
    if let EnrichmentOutcome::Applied(fields) = outcome {
        io::print_info(format!("Filled from receipt: {}.", fields.join(", ")));
    }
    for notice in form.take_notices() {
        io::print_warning(notice);
    }
}

fn report_suggestion(form: &ExpenseForm, outcome: EnrichmentOutcome) {
    match outcome {
        EnrichmentOutcome::Applied(_) => {
            io::print_info(format!("Suggested category: {}.", form.category()))
        }
        EnrichmentOutcome::Defaulted => {
            io::print_warning("No category suggestion available; using Other.")
        }
        EnrichmentOutcome::Skipped => {
            io::print_warning("Enter a description before asking for a category.")
        }
        EnrichmentOutcome::Unchanged | EnrichmentOutcome::Stale => {}
    }
}

fn submit(context: &mut ShellContext, form: &mut ExpenseForm) -> CommandResult {
    match form.submit(&mut context.store)? {
        Submission::Created(expense) => io::print_success(format!(
            "Added {} [{}]: {} paid by {}.",
            expense.description,
            expense.id.short(),
            context.money(expense.amount),
            expense.paid_by
        )),
        Submission::Updated {
            expense,
            applied: true,
        } => io::print_success(format!(
            "Updated {} [{}].",
            expense.description,
            expense.id.short()
        )),
        Submission::Updated { expense, .. } => io::print_warning(format!(
            "Expense [{}] no longer exists; nothing was changed.",
            expense.id.short()
        )),
    }
    Ok(())
}

/// Catalog names plus the preselected index. A category that has left the
/// catalog is offered first so that editing keeps it by default.
fn category_options(form: &ExpenseForm) -> (Vec<String>, usize) {
    let mut options: Vec<String> = form.catalog().names().map(str::to_string).collect();
    let current = form.category().trim();
    match options
        .iter()
        .position(|name| name.eq_ignore_ascii_case(current))
    {
        Some(index) => (options, index),
        None if !current.is_empty() => {
            options.insert(0, current.to_string());
            (options, 0)
        }
        None => (options, 0),
    }
}

/// Prompts for every field, starting from the form's current values.
fn run_wizard(context: &ShellContext, form: &mut ExpenseForm) -> CommandResult {
    let editing = matches!(form.mode(), FormMode::Edit(_));
    output_section(if editing { "Edit expense" } else { "New expense" });

    if !editing
        && context.assistant.is_available()
        && io::confirm_action(context.theme(), "Scan a receipt first?", false)?
    {
        let path = io::prompt_text(context.theme(), "Receipt image path", "", false)?;
        scan_receipt_file(context, form, path.trim());
    }

    let theme = context.theme();
    let description = io::prompt_text(theme, "Description", form.description(), false)?;
    form.set_description(description);
    let amount = io::prompt_text(theme, "Amount", form.amount(), false)?;
    form.set_amount(amount);
    let date = io::prompt_text(theme, "Date (YYYY-MM-DD)", form.date(), false)?;
    form.set_date(date);

    let (mut options, current) = category_options(form);
    let ask_assistant = context.assistant.is_available();
    if ask_assistant {
        options.push("Ask the assistant".to_string());
    }
    let choice = io::prompt_select(theme, "Category", &options, current)?;
    if ask_assistant && choice == options.len() - 1 {
        form.set_category("");
        let outcome = form.suggest_category(context.assistant.as_ref());
        report_suggestion(form, outcome);
    } else {
        form.set_category(options[choice].clone());
    }

    let parties: Vec<&str> = Party::ALL.iter().map(|party| party.label()).collect();
    let paid_by = io::prompt_select(
        theme,
        "Paid by",
        &parties,
        Party::ALL
            .iter()
            .position(|party| *party == form.paid_by())
            .unwrap_or(0),
    )?;
    form.set_paid_by(Party::ALL[paid_by]);

    let splits: Vec<&str> = SplitMethod::ALL.iter().map(|split| split.label()).collect();
    let split = io::prompt_select(
        theme,
        "Split",
        &splits,
        SplitMethod::ALL
            .iter()
            .position(|split| *split == form.split_method())
            .unwrap_or(0),
    )?;
    form.set_split_method(SplitMethod::ALL[split]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_arguments() {
        let fields = FieldArgs::parse(&[
            "description=Weekly shop",
            "amount=12.50",
            "paid-by=roommate",
            "split=50/50",
            "category=auto",
        ])
        .unwrap();
        assert_eq!(fields.description.as_deref(), Some("Weekly shop"));
        assert_eq!(fields.amount.as_deref(), Some("12.50"));
        assert_eq!(fields.paid_by, Some(Party::Roommate));
        assert_eq!(fields.split, Some(SplitMethod::Equally));
        assert!(fields.wants_suggestion());
    }

    #[test]
    fn rejects_unknown_or_malformed_fields() {
        assert!(FieldArgs::parse(&["colour=red"]).is_err());
        assert!(FieldArgs::parse(&["amount"]).is_err());
        assert!(FieldArgs::parse(&["paid-by=landlord"]).is_err());
    }

    #[test]
    fn explicit_category_does_not_trigger_suggestion() {
        let fields = FieldArgs::parse(&["category=Rent"]).unwrap();
        assert!(!fields.wants_suggestion());
        assert!(!FieldArgs::default().wants_suggestion());
    }

    #[test]
    fn retired_category_is_offered_and_preselected() {
        use crate::domain::{Category, CategoryCatalog, ExpenseId};
        use chrono::NaiveDate;

        let catalog = CategoryCatalog::standard();
        let mut expense = Expense {
            id: ExpenseId::from("legacy"),
            description: "Dog food".into(),
            amount: "18".parse().unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            category: Category::new("Pets"),
            paid_by: Party::Me,
            split_method: SplitMethod::Equally,
        };
        let (options, current) = category_options(&ExpenseForm::edit(&expense, catalog.clone()));
        assert_eq!(options[current], "Pets");
        assert_eq!(options.len(), catalog.names().count() + 1);

        expense.category = Category::new("Rent");
        let (options, current) = category_options(&ExpenseForm::edit(&expense, catalog.clone()));
        assert_eq!(options[current], "Rent");
        assert_eq!(options.len(), catalog.names().count());
    }
}
