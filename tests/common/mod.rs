use chrono::NaiveDate;
use petty_cash::{
    domain::{Amount, TransactionKind},
    ledger::{LedgerAction, LedgerStore},
    storage::MemoryStore,
};
use rust_decimal::Decimal;

pub fn run(actions: Vec<LedgerAction>) -> LedgerStore<MemoryStore> {
    let mut store = LedgerStore::open(MemoryStore::new()).unwrap();
    store.process_actions(actions);
    store
}

pub fn amount(value: Decimal) -> Amount {
    Amount::from_decimal(value).unwrap()
}

pub fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

#[allow(dead_code)]
pub fn initialize(value: Decimal, on: &str) -> LedgerAction {
    LedgerAction::Initialize {
        amount: amount(value),
        date: date(on),
    }
}

#[allow(dead_code)]
pub fn disburse(value: Decimal, on: &str, purpose: &str, recipient: &str) -> LedgerAction {
    LedgerAction::Disburse {
        amount: amount(value),
        date: date(on),
        purpose: purpose.into(),
        recipient: recipient.into(),
    }
}

#[allow(dead_code)]
pub fn replenish(value: Decimal, on: &str) -> LedgerAction {
    LedgerAction::Replenish {
        amount: amount(value),
        date: date(on),
    }
}

#[allow(dead_code)]
pub fn kinds(store: &LedgerStore<MemoryStore>) -> Vec<TransactionKind> {
    store.transactions().iter().map(|tx| tx.kind()).collect()
}
