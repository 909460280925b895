pub mod category;
pub mod common;
pub mod expense;

pub use category::{Category, CategoryCatalog, DEFAULT_CATEGORIES, OTHER_CATEGORY};
pub use common::Displayable;
pub use expense::{Expense, ExpenseDraft, ExpenseId, Party, SplitMethod};
