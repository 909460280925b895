use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{Settlement, Summary};
use crate::domain::Expense;

fn two_places(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `$12.50`; negative amounts keep their sign in front of the symbol.
pub fn money(symbol: &str, amount: Decimal) -> String {
    let rounded = two_places(amount);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{symbol}{:.2}", rounded.abs())
    } else {
        format!("{symbol}{:.2}", rounded.abs())
    }
}

/// `+$30.00` or `-$50.00`; zero carries no sign.
pub fn signed_money(symbol: &str, amount: Decimal) -> String {
    let rounded = two_places(amount);
    let sign = if rounded.is_zero() {
        ""
    } else if rounded.is_sign_negative() {
        "-"
    } else {
        "+"
    };
    format!("{sign}{symbol}{:.2}", rounded.abs())
}

pub fn settlement_line(symbol: &str, summary: &Summary) -> String {
    match summary.settlement() {
        Settlement::RoommateOwesMe(amount) => {
            format!("Roommate owes you {}", money(symbol, amount))
        }
        Settlement::MeOwesRoommate(amount) => {
            format!("You owe Roommate {}", money(symbol, amount))
        }
        Settlement::Settled => "You are all settled up!".to_string(),
    }
}

pub fn expense_row(symbol: &str, expense: &Expense) -> String {
    format!(
        "  {:<8}  {}  {:<24}  {:<14}  {:>10}  {:<8}  {}",
        expense.id.short(),
        expense.date,
        truncate(&expense.description, 24),
        expense.category.name(),
        money(symbol, expense.amount),
        expense.paid_by,
        expense.split_method,
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
