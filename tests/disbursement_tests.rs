mod common;

use common::{amount, date, disburse, initialize, kinds, run};
use petty_cash::{
    domain::{DomainError, TransactionKind},
    ledger::{LedgerStore, errors::LedgerError},
    storage::MemoryStore,
};
use rust_decimal::dec;

/// A disbursement subtracts from the balance and keeps its purpose and recipient.
#[test]
fn disbursement_reduces_balance() {
    let store = run(vec![
        initialize(dec!(500), "2024-01-01"),
        disburse(dec!(75.50), "2024-01-02", "Office Supplies", "Jane Doe"),
    ]);

    assert_eq!(store.balance(), amount(dec!(424.50)));
    assert_eq!(
        kinds(&store),
        vec![TransactionKind::Initialization, TransactionKind::Disbursement]
    );
    let tx = &store.transactions()[1];
    assert_eq!(tx.amount(), amount(dec!(75.50)));
    assert_eq!(tx.purpose(), Some("Office Supplies"));
    assert_eq!(tx.recipient(), Some("Jane Doe"));
}

#[test]
fn disbursement_of_exact_balance_leaves_zero() {
    let store = run(vec![
        initialize(dec!(50), "2024-01-01"),
        disburse(dec!(50), "2024-01-02", "Maintenance", "Bob"),
    ]);

    assert_eq!(store.balance(), amount(dec!(0)));
    assert_eq!(store.transactions().len(), 2);
}

/// Overdrafts are refused by the store itself, not only by callers.
#[test]
fn disbursement_exceeding_balance_is_rejected() {
    let mut store = LedgerStore::open(MemoryStore::new()).unwrap();
    store.initialize(amount(dec!(30)), date("2024-01-01")).unwrap();

    let err = store
        .disburse(amount(dec!(30.01)), date("2024-01-02"), "Meals", "Team")
        .unwrap_err();

    match err {
        LedgerError::DomainError(DomainError::InsufficientFunds { balance, requested }) => {
            assert_eq!(balance, amount(dec!(30)));
            assert_eq!(requested, amount(dec!(30.01)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.balance(), amount(dec!(30)));
    assert_eq!(store.transactions().len(), 1);
}

#[test]
fn negative_disbursement_is_rejected() {
    let store = run(vec![
        initialize(dec!(100), "2024-01-01"),
        disburse(dec!(-20), "2024-01-02", "Refund", "Alice"),
    ]);

    assert_eq!(store.balance(), amount(dec!(100)));
    assert_eq!(store.transactions().len(), 1);
}

/// Sub-cent input is rounded to cents before it reaches the ledger.
#[test]
fn sub_cent_amounts_round_to_cents() {
    let store = run(vec![
        initialize(dec!(100), "2024-01-01"),
        disburse(dec!(10.005), "2024-01-02", "Postage", "Post Office"),
    ]);

    assert_eq!(store.balance(), amount(dec!(89.99)));
}
