mod common;

use common::{dec, draft};
use rust_decimal::Decimal;
use split_core::core::{ExpenseStore, Settlement};
use split_core::domain::{Party, SplitMethod};

#[test]
fn two_equal_splits_leave_roommate_owing() {
    let mut store = ExpenseStore::in_memory();
    store.add(draft("100", Party::Me, SplitMethod::Equally));
    store.add(draft("40", Party::Roommate, SplitMethod::Equally));

    let summary = store.summary();
    assert_eq!(summary.me.total_paid, dec("100"));
    assert_eq!(summary.roommate.total_paid, dec("40"));
    assert_eq!(summary.me.total_share, dec("70"));
    assert_eq!(summary.roommate.total_share, dec("70"));
    assert_eq!(summary.balance, dec("30"));
    assert_eq!(summary.roommate_balance(), dec("-30"));
    assert_eq!(summary.settlement(), Settlement::RoommateOwesMe(dec("30")));
}

#[test]
fn roommate_pays_for_something_only_i_use() {
    let mut store = ExpenseStore::in_memory();
    store.add(draft("50", Party::Roommate, SplitMethod::MeOwesFull));

    let summary = store.summary();
    assert_eq!(summary.me.total_share, dec("50"));
    assert_eq!(summary.roommate.total_share, Decimal::ZERO);
    assert_eq!(summary.me.total_paid, Decimal::ZERO);
    assert_eq!(summary.roommate.total_paid, dec("50"));
    assert_eq!(summary.balance, dec("-50"));
    assert_eq!(summary.settlement(), Settlement::MeOwesRoommate(dec("50")));
}

#[test]
fn mixed_ledger_keeps_mirror_and_share_totals() {
    let mut store = ExpenseStore::in_memory();
    let entries = [
        ("12.34", Party::Me, SplitMethod::Equally),
        ("0.01", Party::Roommate, SplitMethod::Equally),
        ("99.99", Party::Roommate, SplitMethod::RoommateOwesFull),
        ("7.50", Party::Me, SplitMethod::MeOwesFull),
        ("1200", Party::Me, SplitMethod::Equally),
    ];
    let mut total = Decimal::ZERO;
    for (amount, paid_by, split) in entries {
        total += dec(amount);
        store.add(draft(amount, paid_by, split));
    }

    let summary = store.summary();
    assert_eq!(summary.balance_for(Party::Me), -summary.balance_for(Party::Roommate));
    assert_eq!(summary.me.total_share + summary.roommate.total_share, total);
    assert_eq!(summary.me.total_paid + summary.roommate.total_paid, total);
}

#[test]
fn removing_everything_settles_up() {
    let mut store = ExpenseStore::in_memory();
    let expense = store.add(draft("25", Party::Me, SplitMethod::RoommateOwesFull));
    assert_eq!(store.summary().settlement(), Settlement::RoommateOwesMe(dec("25")));
    store.remove(&expense.id);
    assert_eq!(store.summary().settlement(), Settlement::Settled);
}
