//! Expense records shared between the two parties.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::category::Category;
use crate::domain::common::Displayable;

/// Opaque expense identifier.
///
/// Minted identifiers combine a nanosecond timestamp with a random suffix;
/// identifiers loaded from storage are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    pub fn mint() -> Self {
        let now = Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{nanos:x}-{}", &random[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing eight characters, enough to tell records apart in listings.
    pub fn short(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(7)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.0[start..]
    }
}

impl From<String> for ExpenseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ExpenseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two fixed participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    Me,
    Roommate,
}

impl Party {
    pub const ALL: [Party; 2] = [Party::Me, Party::Roommate];

    pub fn label(self) -> &'static str {
        match self {
            Party::Me => "Me",
            Party::Roommate => "Roommate",
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Party {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "me" | "you" | "self" => Ok(Party::Me),
            "roommate" | "them" | "other" => Ok(Party::Roommate),
            other => Err(format!("unknown party `{other}` (use me or roommate)")),
        }
    }
}

/// How an expense's cost is divided into each party's share.
///
/// Serialized with the human-readable labels so stored ledgers
/// stay readable; the variant names are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitMethod {
    #[serde(rename = "Split 50/50", alias = "Equally")]
    Equally,
    #[serde(rename = "You owe 100%", alias = "MeOwesFull")]
    MeOwesFull,
    #[serde(rename = "Roommate owes 100%", alias = "RoommateOwesFull")]
    RoommateOwesFull,
}

impl SplitMethod {
    pub const ALL: [SplitMethod; 3] = [
        SplitMethod::Equally,
        SplitMethod::MeOwesFull,
        SplitMethod::RoommateOwesFull,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SplitMethod::Equally => "Split 50/50",
            SplitMethod::MeOwesFull => "You owe 100%",
            SplitMethod::RoommateOwesFull => "Roommate owes 100%",
        }
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SplitMethod {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized: String = input
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '/')
            .collect();
        match normalized.as_str() {
            "equal" | "equally" | "5050" | "50/50" | "split5050" | "split50/50" | "half" => {
                Ok(SplitMethod::Equally)
            }
            "me" | "meowesfull" | "youowe100" | "mine" => Ok(SplitMethod::MeOwesFull),
            "roommate" | "roommateowesfull" | "roommateowes100" | "theirs" => {
                Ok(SplitMethod::RoommateOwesFull)
            }
            _ => Err(format!(
                "unknown split `{}` (use equal, me or roommate)",
                input.trim()
            )),
        }
    }
}

/// Expense fields as entered, before an identifier is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Category,
    pub paid_by: Party,
    pub split_method: SplitMethod,
}

/// A recorded shared expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Category,
    pub paid_by: Party,
    pub split_method: SplitMethod,
}

impl Expense {
    pub fn from_draft(id: ExpenseId, draft: ExpenseDraft) -> Self {
        Self {
            id,
            description: draft.description,
            amount: draft.amount,
            date: draft.date,
            category: draft.category,
            paid_by: draft.paid_by,
            split_method: draft.split_method,
        }
    }

    pub fn to_draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            description: self.description.clone(),
            amount: self.amount,
            date: self.date,
            category: self.category.clone(),
            paid_by: self.paid_by,
            split_method: self.split_method,
        }
    }
}

impl Displayable for Expense {
    fn display_label(&self) -> String {
        format!(
            "{} ({}) paid by {} on {}",
            self.description, self.category, self.paid_by, self.date
        )
    }
}
