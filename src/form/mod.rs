//! Entry form for creating and editing expenses.
//!
//! The form holds raw text as typed, validates it into an [`ExpenseDraft`]
//! and hands it to the [`ExpenseStore`]. Assistant calls are tracked with
//! [`EnrichmentTicket`]s so that a response arriving after the form was
//! submitted or closed is dropped instead of overwriting newer input.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::assistant::{AssistError, ExpenseAssistant, ReceiptExtraction, ReceiptImage};
use crate::core::ExpenseStore;
use crate::domain::{
    Category, CategoryCatalog, Expense, ExpenseDraft, ExpenseId, Party, SplitMethod,
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest amount a single expense may carry (one quadrillion).
pub fn max_amount() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

static NEXT_FORM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("amount `{0}` is not a number")]
    InvalidAmount(String),
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("amount `{0}` exceeds the largest accepted value")]
    AmountTooLarge(String),
    #[error("date `{0}` must use the YYYY-MM-DD format")]
    InvalidDate(String),
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("form is already closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ExpenseId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichmentKind {
    Categorization,
    ReceiptScan,
}

/// Identifies one in-flight assistant request of one form generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentTicket {
    form: u64,
    generation: u64,
    kind: EnrichmentKind,
}

impl EnrichmentTicket {
    pub fn kind(&self) -> EnrichmentKind {
        self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Names of the fields that were filled in.
    Applied(Vec<&'static str>),
    /// Nothing usable came back; an empty category was set to `Other`.
    Defaulted,
    /// Nothing usable came back and no field changed.
    Unchanged,
    /// The ticket no longer matches this form; the response was dropped.
    Stale,
    /// No request was started.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Created(Expense),
    /// `applied` is false when the record vanished while the form was open.
    Updated { expense: Expense, applied: bool },
}

impl Submission {
    pub fn expense(&self) -> &Expense {
        match self {
            Submission::Created(expense) => expense,
            Submission::Updated { expense, .. } => expense,
        }
    }
}

pub struct ExpenseForm {
    id: u64,
    mode: FormMode,
    catalog: CategoryCatalog,
    description: String,
    amount: String,
    date: String,
    category: String,
    /// Category of the record being edited; accepted even if the catalog dropped it.
    legacy_category: Option<Category>,
    paid_by: Party,
    split_method: SplitMethod,
    generation: u64,
    pending_category: bool,
    pending_receipt: bool,
    closed: bool,
    notices: Vec<String>,
}

impl ExpenseForm {
    /// Blank form for a new expense.
    pub fn new(catalog: CategoryCatalog, today: NaiveDate) -> Self {
        let category = catalog.default_selection().name().to_string();
        Self::build(FormMode::Create, catalog, today.format(DATE_FORMAT).to_string(), category)
    }

    /// Form pre-filled from an existing record.
    pub fn edit(expense: &Expense, catalog: CategoryCatalog) -> Self {
        let mut form = Self::build(
            FormMode::Edit(expense.id.clone()),
            catalog,
            expense.date.format(DATE_FORMAT).to_string(),
            expense.category.name().to_string(),
        );
        form.description = expense.description.clone();
        form.amount = expense.amount.to_string();
        form.paid_by = expense.paid_by;
        form.split_method = expense.split_method;
        form.legacy_category = Some(expense.category.clone());
        form
    }

    fn build(mode: FormMode, catalog: CategoryCatalog, date: String, category: String) -> Self {
        Self {
            id: NEXT_FORM_ID.fetch_add(1, Ordering::Relaxed),
            mode,
            catalog,
            description: String::new(),
            amount: String::new(),
            date,
            category,
            legacy_category: None,
            paid_by: Party::Me,
            split_method: SplitMethod::Equally,
            generation: 0,
            pending_category: false,
            pending_receipt: false,
            closed: false,
            notices: Vec::new(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn paid_by(&self) -> Party {
        self.paid_by
    }

    pub fn split_method(&self) -> SplitMethod {
        self.split_method
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
    }

    pub fn set_amount(&mut self, value: impl Into<String>) {
        self.amount = value.into();
    }

    pub fn set_date(&mut self, value: impl Into<String>) {
        self.date = value.into();
    }

    pub fn set_category(&mut self, value: impl Into<String>) {
        self.category = value.into();
    }

    pub fn set_paid_by(&mut self, party: Party) {
        self.paid_by = party;
    }

    pub fn set_split_method(&mut self, method: SplitMethod) {
        self.split_method = method;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_pending(&self, kind: EnrichmentKind) -> bool {
        match kind {
            EnrichmentKind::Categorization => self.pending_category,
            EnrichmentKind::ReceiptScan => self.pending_receipt,
        }
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Checks every field and produces the draft that would be stored.
    pub fn validate(&self) -> Result<ExpenseDraft, ValidationError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingField("description"));
        }

        let amount_text = self.amount.trim();
        if amount_text.is_empty() {
            return Err(ValidationError::MissingField("amount"));
        }
        let amount = Decimal::from_str(amount_text)
            .map_err(|_| ValidationError::InvalidAmount(amount_text.to_string()))?;
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        if amount > max_amount() {
            return Err(ValidationError::AmountTooLarge(amount_text.to_string()));
        }

        let date_text = self.date.trim();
        if date_text.is_empty() {
            return Err(ValidationError::MissingField("date"));
        }
        let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date_text.to_string()))?;

        let category = self.resolve_category()?;

        Ok(ExpenseDraft {
            description: description.to_string(),
            amount,
            date,
            category,
            paid_by: self.paid_by,
            split_method: self.split_method,
        })
    }

    fn resolve_category(&self) -> Result<Category, ValidationError> {
        let text = self.category.trim();
        if text.is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        if let Some(category) = self.catalog.resolve(text) {
            return Ok(category);
        }
        match &self.legacy_category {
            Some(existing) if existing.name() == text => Ok(existing.clone()),
            _ => Err(ValidationError::UnknownCategory(text.to_string())),
        }
    }

    /// Validates and writes the form into `store`. On success the form is
    /// closed and outstanding tickets go stale.
    pub fn submit(&mut self, store: &mut ExpenseStore) -> Result<Submission, ValidationError> {
        if self.closed {
            return Err(ValidationError::Closed);
        }
        let draft = self.validate()?;
        let submission = match &self.mode {
            FormMode::Create => Submission::Created(store.add(draft)),
            FormMode::Edit(id) => {
                let expense = Expense::from_draft(id.clone(), draft);
                let applied = store.update(expense.clone());
                Submission::Updated { expense, applied }
            }
        };
        self.finish_cycle();
        Ok(submission)
    }

    /// Abandons the form without writing anything.
    pub fn close(&mut self) {
        if !self.closed {
            self.finish_cycle();
        }
    }

    fn finish_cycle(&mut self) {
        self.generation += 1;
        self.pending_category = false;
        self.pending_receipt = false;
        self.closed = true;
    }

    fn issue(&mut self, kind: EnrichmentKind) -> Option<EnrichmentTicket> {
        if self.closed || self.is_pending(kind) {
            return None;
        }
        match kind {
            EnrichmentKind::Categorization => self.pending_category = true,
            EnrichmentKind::ReceiptScan => self.pending_receipt = true,
        }
        Some(EnrichmentTicket {
            form: self.id,
            generation: self.generation,
            kind,
        })
    }

    /// Redeems `ticket`, returning false when its response must be dropped.
    fn redeem(&mut self, ticket: EnrichmentTicket, kind: EnrichmentKind) -> bool {
        if ticket.form != self.id
            || ticket.kind != kind
            || ticket.generation != self.generation
            || self.closed
        {
            tracing::debug!(form = self.id, ?kind, "discarding stale assistant response");
            return false;
        }
        match kind {
            EnrichmentKind::Categorization => self.pending_category = false,
            EnrichmentKind::ReceiptScan => self.pending_receipt = false,
        }
        true
    }

    /// Starts a category suggestion for the current description.
    pub fn begin_categorization(&mut self) -> Option<EnrichmentTicket> {
        if self.description.trim().is_empty() {
            return None;
        }
        self.issue(EnrichmentKind::Categorization)
    }

    pub fn finish_categorization(
        &mut self,
        ticket: EnrichmentTicket,
        outcome: Result<Category, AssistError>,
    ) -> EnrichmentOutcome {
        if !self.redeem(ticket, EnrichmentKind::Categorization) {
            return EnrichmentOutcome::Stale;
        }

        match outcome {
            Ok(suggested) => {
                if let Some(category) = self.catalog.resolve(suggested.name()) {
                    self.category = category.name().to_string();
                    return EnrichmentOutcome::Applied(vec!["category"]);
                }
                tracing::warn!(category = %suggested, "ignoring suggestion outside the catalog");
            }
            Err(err) => tracing::warn!(error = %err, "category suggestion failed"),
        }

        if self.category.trim().is_empty() {
            self.category = Category::other().name().to_string();
            EnrichmentOutcome::Defaulted
        } else {
            EnrichmentOutcome::Unchanged
        }
    }

    pub fn begin_receipt_scan(&mut self) -> Option<EnrichmentTicket> {
        self.issue(EnrichmentKind::ReceiptScan)
    }

    /// Pre-fills the fields the receipt yielded; everything else is kept.
    pub fn finish_receipt_scan(
        &mut self,
        ticket: EnrichmentTicket,
        outcome: Result<ReceiptExtraction, AssistError>,
    ) -> EnrichmentOutcome {
        if !self.redeem(ticket, EnrichmentKind::ReceiptScan) {
            return EnrichmentOutcome::Stale;
        }

        let extraction = match outcome {
            Ok(extraction) => extraction,
            Err(err) => {
                tracing::warn!(error = %err, "receipt scan failed");
                self.notices.push(format!("Could not read the receipt: {err}"));
                return EnrichmentOutcome::Unchanged;
            }
        };

        let mut filled = Vec::new();
        if let Some(description) = extraction.description {
            self.description = description;
            filled.push("description");
        }
        if let Some(amount) = extraction.amount {
            self.amount = amount.to_string();
            filled.push("amount");
        }
        if let Some(date) = extraction.date {
            self.date = date.format(DATE_FORMAT).to_string();
            filled.push("date");
        }

        if filled.is_empty() {
            self.notices
                .push("The receipt did not contain any readable details.".to_string());
            EnrichmentOutcome::Unchanged
        } else {
            EnrichmentOutcome::Applied(filled)
        }
    }

    /// Runs a full categorization round trip against `assistant`.
    pub fn suggest_category(&mut self, assistant: &dyn ExpenseAssistant) -> EnrichmentOutcome {
        let Some(ticket) = self.begin_categorization() else {
            return EnrichmentOutcome::Skipped;
        };
        let description = self.description.trim().to_string();
        let outcome = assistant.categorize(&description, &self.catalog);
        self.finish_categorization(ticket, outcome)
    }

    /// Runs a full receipt scan against `assistant`.
    pub fn scan_receipt(
        &mut self,
        assistant: &dyn ExpenseAssistant,
        image: &ReceiptImage,
    ) -> EnrichmentOutcome {
        let Some(ticket) = self.begin_receipt_scan() else {
            return EnrichmentOutcome::Skipped;
        };
        let outcome = assistant.extract_receipt(image);
        self.finish_receipt_scan(ticket, outcome)
    }
}
