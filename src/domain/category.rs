//! Spending categories and the catalog used to validate them at entry time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fallback category used whenever nothing better is known.
pub const OTHER_CATEGORY: &str = "Other";

/// Categories offered out of the box, in display order.
pub const DEFAULT_CATEGORIES: [&str; 10] = [
    "Groceries",
    "Utilities",
    "Rent",
    "Subscriptions",
    "Entertainment",
    "Dining Out",
    "Transportation",
    "Shopping",
    "Health",
    OTHER_CATEGORY,
];

/// Name of a spending category.
///
/// Stored records may carry any name; only new entries are checked against a
/// [`CategoryCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn other() -> Self {
        Self(OTHER_CATEGORY.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_other(&self) -> bool {
        self.0 == OTHER_CATEGORY
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Known category names accepted by forms and assistant suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    names: Vec<String>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl CategoryCatalog {
    pub fn standard() -> Self {
        Self {
            names: DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Standard catalog extended with user-defined names. Blank names and
    /// case-insensitive duplicates are skipped.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::standard();
        for name in extra {
            let trimmed = name.as_ref().trim();
            if trimmed.is_empty() || catalog.lookup(trimmed).is_some() {
                continue;
            }
            catalog.names.push(trimmed.to_string());
        }
        catalog
    }

    /// Resolves user or assistant input to the canonical catalog spelling.
    pub fn resolve(&self, input: &str) -> Option<Category> {
        self.lookup(input.trim()).map(|name| Category::new(name.clone()))
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.names.iter().any(|name| name == category.name())
    }

    /// Category preselected on a fresh form.
    pub fn default_selection(&self) -> Category {
        self.names
            .first()
            .map(|name| Category::new(name.clone()))
            .unwrap_or_else(Category::other)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn lookup(&self, input: &str) -> Option<&String> {
        self.names
            .iter()
            .find(|name| name.eq_ignore_ascii_case(input))
    }
}
