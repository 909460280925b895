//! Owned, ordered collection of expenses.

use std::collections::HashSet;

use crate::core::balance::{summarize, Summary};
use crate::domain::{Expense, ExpenseDraft, ExpenseId};
use crate::storage::ExpensePersistence;

/// Single source of truth for the expense list, newest first.
///
/// Every successful mutation mirrors the full list into the attached
/// persistence adapter. Write failures are logged by the adapter and the
/// in-memory state stays authoritative.
pub struct ExpenseStore {
    expenses: Vec<Expense>,
    persistence: Option<ExpensePersistence>,
    revision: u64,
}

impl ExpenseStore {
    /// Store without persistence.
    pub fn in_memory() -> Self {
        Self::from_expenses(Vec::new())
    }

    pub fn from_expenses(expenses: Vec<Expense>) -> Self {
        Self {
            expenses: dedupe_ids(expenses),
            persistence: None,
            revision: 0,
        }
    }

    /// Loads the persisted list and keeps mirroring changes into it.
    pub fn hydrate(persistence: ExpensePersistence) -> Self {
        let expenses = persistence.load();
        tracing::info!(count = expenses.len(), "expense store hydrated");
        Self {
            expenses: dedupe_ids(expenses),
            persistence: Some(persistence),
            revision: 0,
        }
    }

    /// Records a new expense under a freshly minted id and returns it.
    pub fn add(&mut self, draft: ExpenseDraft) -> Expense {
        let mut id = ExpenseId::mint();
        while self.contains(&id) {
            id = ExpenseId::mint();
        }
        let expense = Expense::from_draft(id, draft);
        self.expenses.insert(0, expense.clone());
        tracing::info!(id = %expense.id, amount = %expense.amount, "expense added");
        self.changed();
        expense
    }

    /// Replaces the record with the same id. Unknown ids are ignored; the
    /// return value reports whether anything was replaced.
    pub fn update(&mut self, expense: Expense) -> bool {
        let Some(slot) = self.expenses.iter_mut().find(|e| e.id == expense.id) else {
            tracing::debug!(id = %expense.id, "update ignored: no such expense");
            return false;
        };
        *slot = expense;
        tracing::info!(id = %slot.id, "expense updated");
        self.changed();
        true
    }

    /// Deletes the record with `id` if present.
    pub fn remove(&mut self, id: &ExpenseId) -> Option<Expense> {
        let index = self.expenses.iter().position(|e| &e.id == id)?;
        let removed = self.expenses.remove(index);
        tracing::info!(id = %removed.id, "expense removed");
        self.changed();
        Some(removed)
    }

    /// Current snapshot, newest first.
    pub fn all(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn get(&self, id: &ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| &e.id == id)
    }

    pub fn contains(&self, id: &ExpenseId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Bumped by every successful mutation; lets observers detect change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.expenses)
    }

    fn changed(&mut self) {
        self.revision += 1;
        if let Some(persistence) = &self.persistence {
            persistence.save(&self.expenses);
        }
    }
}

fn dedupe_ids(expenses: Vec<Expense>) -> Vec<Expense> {
    let mut seen = HashSet::new();
    let before = expenses.len();
    let unique: Vec<Expense> = expenses
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    if unique.len() != before {
        tracing::warn!(
            dropped = before - unique.len(),
            "dropped expenses with duplicate ids"
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Party, SplitMethod};
    use crate::storage::{KeyValueStore, MemoryStore, EXPENSES_KEY};
    use chrono::NaiveDate;

    fn draft(description: &str, amount: &str) -> ExpenseDraft {
        ExpenseDraft {
            description: description.into(),
            amount: amount.parse().unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            category: Category::new("Groceries"),
            paid_by: Party::Me,
            split_method: SplitMethod::Equally,
        }
    }

    #[test]
    fn add_prepends_and_mints_unique_ids() {
        let mut store = ExpenseStore::in_memory();
        let first = store.add(draft("Milk", "3.20"));
        let second = store.add(draft("Bread", "2.10"));
        assert_ne!(first.id, second.id);
        assert_eq!(store.all()[0].id, second.id);
        assert_eq!(store.all()[1].id, first.id);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut store = ExpenseStore::in_memory();
        let older = store.add(draft("Milk", "3.20"));
        let newer = store.add(draft("Bread", "2.10"));

        let mut edited = older.clone();
        edited.description = "Oat milk".into();
        assert!(store.update(edited));
        assert_eq!(store.all()[0].id, newer.id);
        assert_eq!(store.all()[1].description, "Oat milk");
    }

    #[test]
    fn update_with_unknown_id_changes_nothing() {
        let mut store = ExpenseStore::in_memory();
        store.add(draft("Milk", "3.20"));
        let before = store.all().to_vec();
        let revision = store.revision();

        let stranger = Expense::from_draft(ExpenseId::from("missing"), draft("Ghost", "1"));
        assert!(!store.update(stranger));
        assert_eq!(store.all(), before.as_slice());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn remove_twice_is_idempotent() {
        let mut store = ExpenseStore::in_memory();
        let expense = store.add(draft("Milk", "3.20"));
        assert!(store.remove(&expense.id).is_some());
        assert!(store.remove(&expense.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn mutations_are_mirrored_to_persistence() {
        let backend = MemoryStore::new();
        let mut store = ExpenseStore::hydrate(ExpensePersistence::new(Box::new(backend.clone())));
        let expense = store.add(draft("Milk", "3.20"));

        let raw = backend.get(EXPENSES_KEY).unwrap().expect("blob written");
        assert!(raw.contains(expense.id.as_str()));

        store.remove(&expense.id);
        let raw = backend.get(EXPENSES_KEY).unwrap().unwrap();
        let stored: Vec<Expense> = serde_json::from_str(&raw).unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn hydrate_drops_duplicate_ids() {
        let first = Expense::from_draft(ExpenseId::from("dup"), draft("Milk", "3.20"));
        let second = Expense::from_draft(ExpenseId::from("dup"), draft("Bread", "2.10"));
        let store = ExpenseStore::from_expenses(vec![first, second]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].description, "Milk");
    }
}
