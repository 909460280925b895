#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use split_core::domain::{Category, ExpenseDraft, Party, SplitMethod};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated data directory for one test.
pub fn setup_test_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn dec(raw: &str) -> Decimal {
    Decimal::from_str(raw).expect("valid decimal literal")
}

pub fn draft(amount: &str, paid_by: Party, split_method: SplitMethod) -> ExpenseDraft {
    ExpenseDraft {
        description: "Shared cost".into(),
        amount: dec(amount),
        date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
        category: Category::new("Groceries"),
        paid_by,
        split_method,
    }
}
