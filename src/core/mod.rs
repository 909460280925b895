pub mod balance;
pub mod category_report;
pub mod expense_store;
pub mod utils;

pub use balance::{summarize, PartyTotals, Settlement, Summary};
pub use category_report::{category_totals, CategoryTotal};
pub use expense_store::ExpenseStore;
