//! Mirrors the expense list into a [`KeyValueStore`] as one serialized blob.

use crate::{domain::Expense, errors::Result};

use super::KeyValueStore;

/// Fixed key the expense list is stored under.
pub const EXPENSES_KEY: &str = "expenses";

/// Reads and writes the whole expense list. Failures never propagate out of
/// [`load`](Self::load) and [`save`](Self::save); they are logged and the
/// caller carries on with its in-memory state.
pub struct ExpensePersistence {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl ExpensePersistence {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self::with_key(backend, EXPENSES_KEY)
    }

    pub fn with_key(backend: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the stored list; a missing, unreadable or malformed blob yields
    /// an empty list.
    pub fn load(&self) -> Vec<Expense> {
        match self.try_load() {
            Ok(expenses) => {
                tracing::debug!(count = expenses.len(), key = %self.key, "loaded expenses");
                expenses
            }
            Err(err) => {
                tracing::error!(key = %self.key, error = %err, "failed to load expenses; starting empty");
                Vec::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Vec<Expense>> {
        match self.backend.get(&self.key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Overwrites the stored list. Errors are logged, not returned.
    pub fn save(&self, expenses: &[Expense]) {
        if let Err(err) = self.try_save(expenses) {
            tracing::error!(key = %self.key, error = %err, "failed to save expenses");
        }
    }

    pub fn try_save(&self, expenses: &[Expense]) -> Result<()> {
        let json = serde_json::to_string_pretty(expenses)?;
        self.backend.set(&self.key, &json)
    }
}
