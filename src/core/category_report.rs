use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::{Category, Expense};

/// Total spent in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
    pub count: usize,
}

/// Spending per category, largest total first; ties are ordered by name.
/// Records that would overflow their category total are logged and skipped.
pub fn category_totals(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&Category, (Decimal, usize)> = HashMap::new();
    for expense in expenses {
        let entry = totals
            .entry(&expense.category)
            .or_insert((Decimal::ZERO, 0));
        match entry.0.checked_add(expense.amount) {
            Some(total) => {
                entry.0 = total;
                entry.1 += 1;
            }
            None => tracing::warn!(
                id = %expense.id,
                category = expense.category.name(),
                "expense overflows its category total; skipped"
            ),
        }
    }

    let mut report: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.clone(),
            total,
            count,
        })
        .collect();
    report.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    report
}
