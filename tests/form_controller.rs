mod common;

use chrono::NaiveDate;
use common::dec;
use split_core::assistant::{
    AssistError, ExpenseAssistant, ReceiptExtraction, ReceiptImage,
};
use split_core::core::ExpenseStore;
use split_core::domain::{Category, CategoryCatalog, Party, SplitMethod};
use split_core::form::{EnrichmentOutcome, ExpenseForm, Submission, ValidationError};

/// Assistant returning canned answers.
struct Canned {
    category: Option<&'static str>,
    receipt: Option<ReceiptExtraction>,
}

impl ExpenseAssistant for Canned {
    fn name(&self) -> &str {
        "canned"
    }

    fn categorize(&self, _: &str, _: &CategoryCatalog) -> Result<Category, AssistError> {
        self.category
            .map(Category::new)
            .ok_or(AssistError::NoSuggestion)
    }

    fn extract_receipt(&self, _: &ReceiptImage) -> Result<ReceiptExtraction, AssistError> {
        self.receipt.clone().ok_or(AssistError::NoSuggestion)
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 20).unwrap()
}

#[test]
fn rejected_amounts_leave_collection_unchanged() {
    let mut store = ExpenseStore::in_memory();
    for amount in ["-5", "0"] {
        let mut form = ExpenseForm::new(CategoryCatalog::standard(), today());
        form.set_description("Refund");
        form.set_amount(amount);
        assert_eq!(form.submit(&mut store), Err(ValidationError::NonPositiveAmount));
    }
    assert!(store.is_empty());
}

#[test]
fn receipt_then_suggestion_builds_complete_expense() {
    let assistant = Canned {
        category: Some("Dining Out"),
        receipt: Some(ReceiptExtraction {
            description: Some("Noodle Bar".into()),
            amount: Some(dec("31.80")),
            date: NaiveDate::from_ymd_opt(2024, 8, 18),
        }),
    };
    let image = ReceiptImage::new(vec![0xFF, 0xD8], "image/jpeg");
    let mut store = ExpenseStore::in_memory();
    let mut form = ExpenseForm::new(CategoryCatalog::standard(), today());

    assert_eq!(
        form.scan_receipt(&assistant, &image),
        EnrichmentOutcome::Applied(vec!["description", "amount", "date"])
    );
    assert_eq!(
        form.suggest_category(&assistant),
        EnrichmentOutcome::Applied(vec!["category"])
    );
    form.set_paid_by(Party::Roommate);

    let expense = match form.submit(&mut store).unwrap() {
        Submission::Created(expense) => expense,
        other => panic!("expected a new expense, got {other:?}"),
    };
    assert_eq!(expense.description, "Noodle Bar");
    assert_eq!(expense.amount, dec("31.80"));
    assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 8, 18).unwrap());
    assert_eq!(expense.category.name(), "Dining Out");
    assert_eq!(expense.split_method, SplitMethod::Equally);
    assert_eq!(store.summary().balance, dec("-15.90"));
}

#[test]
fn unusable_suggestion_defaults_to_other_and_submits() {
    let assistant = Canned {
        category: Some("Spaceships"),
        receipt: None,
    };
    let mut store = ExpenseStore::in_memory();
    let mut form = ExpenseForm::new(CategoryCatalog::standard(), today());
    form.set_description("Mystery purchase");
    form.set_amount("9.99");
    form.set_category("");

    assert_eq!(form.suggest_category(&assistant), EnrichmentOutcome::Defaulted);
    let submission = form.submit(&mut store).unwrap();
    assert!(submission.expense().category.is_other());
}

#[test]
fn response_after_close_is_dropped() {
    let assistant = Canned {
        category: Some("Rent"),
        receipt: None,
    };
    let mut form = ExpenseForm::new(CategoryCatalog::standard(), today());
    form.set_description("Monthly rent");
    let ticket = form.begin_categorization().unwrap();
    let answer = assistant.categorize(form.description(), form.catalog());
    form.close();
    assert_eq!(form.finish_categorization(ticket, answer), EnrichmentOutcome::Stale);
    assert_eq!(form.category(), "Groceries");
}
