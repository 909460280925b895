//! Paid/owed totals and the signed balance between the two parties.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Expense, Party, SplitMethod};

/// Running totals for one party.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyTotals {
    pub total_paid: Decimal,
    pub total_share: Decimal,
}

/// Who owes whom, derived from a [`Summary`] balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    RoommateOwesMe(Decimal),
    MeOwesRoommate(Decimal),
    Settled,
}

/// Aggregate figures for an expense list.
///
/// `balance` is `me.total_paid - me.total_share`: positive when the roommate
/// owes me, negative when I owe the roommate. The roommate's balance is its
/// negation and is never computed separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub me: PartyTotals,
    pub roommate: PartyTotals,
    pub balance: Decimal,
}

impl Summary {
    pub fn party(&self, party: Party) -> &PartyTotals {
        match party {
            Party::Me => &self.me,
            Party::Roommate => &self.roommate,
        }
    }

    pub fn roommate_balance(&self) -> Decimal {
        -self.balance
    }

    /// Signed balance from `party`'s point of view.
    pub fn balance_for(&self, party: Party) -> Decimal {
        match party {
            Party::Me => self.balance,
            Party::Roommate => self.roommate_balance(),
        }
    }

    pub fn settlement(&self) -> Settlement {
        if self.balance > Decimal::ZERO {
            Settlement::RoommateOwesMe(self.balance)
        } else if self.balance < Decimal::ZERO {
            Settlement::MeOwesRoommate(self.balance.abs())
        } else {
            Settlement::Settled
        }
    }

    fn party_mut(&mut self, party: Party) -> &mut PartyTotals {
        match party {
            Party::Me => &mut self.me,
            Party::Roommate => &mut self.roommate,
        }
    }
}

/// Reduces the expense list into per-party totals and the balance.
///
/// A record whose amount would overflow the running totals is logged and
/// left out.
pub fn summarize(expenses: &[Expense]) -> Summary {
    let mut summary = Summary::default();

    for expense in expenses {
        match summary.with_expense(expense) {
            Some(next) => summary = next,
            None => tracing::warn!(
                id = %expense.id,
                amount = %expense.amount,
                "expense overflows the running totals; skipped"
            ),
        }
    }

    summary
}

impl Summary {
    fn with_expense(&self, expense: &Expense) -> Option<Summary> {
        let mut next = *self;
        let amount = expense.amount;
        let payer = next.party_mut(expense.paid_by);
        payer.total_paid = payer.total_paid.checked_add(amount)?;

        match expense.split_method {
            SplitMethod::Equally => {
                let half = amount.checked_div(Decimal::TWO)?;
                next.me.total_share = next.me.total_share.checked_add(half)?;
                next.roommate.total_share = next.roommate.total_share.checked_add(half)?;
            }
            SplitMethod::MeOwesFull => {
                next.me.total_share = next.me.total_share.checked_add(amount)?;
            }
            SplitMethod::RoommateOwesFull => {
                next.roommate.total_share = next.roommate.total_share.checked_add(amount)?;
            }
        }

        next.balance = next.me.total_paid.checked_sub(next.me.total_share)?;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, ExpenseId};
    use chrono::NaiveDate;

    fn dec(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn expense(amount: &str, paid_by: Party, split_method: SplitMethod) -> Expense {
        Expense {
            id: ExpenseId::mint(),
            description: "Shared".into(),
            amount: dec(amount),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            category: Category::other(),
            paid_by,
            split_method,
        }
    }

    #[test]
    fn empty_list_is_settled() {
        let summary = summarize(&[]);
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.settlement(), Settlement::Settled);
    }

    #[test]
    fn equal_splits_in_both_directions() {
        let summary = summarize(&[
            expense("100", Party::Me, SplitMethod::Equally),
            expense("40", Party::Roommate, SplitMethod::Equally),
        ]);
        assert_eq!(summary.me.total_paid, dec("100"));
        assert_eq!(summary.roommate.total_paid, dec("40"));
        assert_eq!(summary.me.total_share, dec("70"));
        assert_eq!(summary.roommate.total_share, dec("70"));
        assert_eq!(summary.balance, dec("30"));
        assert_eq!(summary.settlement(), Settlement::RoommateOwesMe(dec("30")));
    }

    #[test]
    fn full_share_assigned_to_me() {
        let summary = summarize(&[expense("50", Party::Roommate, SplitMethod::MeOwesFull)]);
        assert_eq!(summary.me.total_share, dec("50"));
        assert_eq!(summary.roommate.total_share, Decimal::ZERO);
        assert_eq!(summary.me.total_paid, Decimal::ZERO);
        assert_eq!(summary.roommate.total_paid, dec("50"));
        assert_eq!(summary.balance, dec("-50"));
        assert_eq!(summary.settlement(), Settlement::MeOwesRoommate(dec("50")));
    }

    #[test]
    fn full_share_assigned_to_roommate() {
        let summary = summarize(&[expense("12.34", Party::Me, SplitMethod::RoommateOwesFull)]);
        assert_eq!(summary.me.total_share, Decimal::ZERO);
        assert_eq!(summary.roommate.total_share, dec("12.34"));
        assert_eq!(summary.balance, dec("12.34"));
    }

    #[test]
    fn odd_cent_halves_sum_back_exactly() {
        let summary = summarize(&[expense("0.01", Party::Me, SplitMethod::Equally)]);
        assert_eq!(summary.me.total_share, dec("0.005"));
        assert_eq!(
            summary.me.total_share + summary.roommate.total_share,
            dec("0.01")
        );
    }

    #[test]
    fn balances_mirror_each_other() {
        let summary = summarize(&[
            expense("19.99", Party::Me, SplitMethod::Equally),
            expense("7.01", Party::Roommate, SplitMethod::MeOwesFull),
            expense("3.33", Party::Roommate, SplitMethod::Equally),
        ]);
        assert_eq!(summary.balance_for(Party::Me), -summary.balance_for(Party::Roommate));
        assert_eq!(summary.party(Party::Roommate), &summary.roommate);
    }

    #[test]
    fn overflowing_record_is_skipped() {
        let mut huge = expense("1", Party::Me, SplitMethod::Equally);
        huge.amount = Decimal::MAX;
        let summary = summarize(&[
            expense("40", Party::Roommate, SplitMethod::Equally),
            huge.clone(),
            huge,
        ]);
        assert_eq!(summary.roommate.total_paid, dec("40"));
        assert_eq!(summary.me.total_paid, Decimal::MAX);
        assert_eq!(summary.balance_for(Party::Me), -summary.balance_for(Party::Roommate));
    }
}
