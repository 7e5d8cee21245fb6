//! Petty-cash fund bookkeeping: a fixed-point ledger of disbursements and
//! replenishments, cash-count reconciliation, reports and backups, persisted
//! to a simple key-value store.

pub mod domain;
pub mod export;
pub mod ledger;
pub mod reconciliation;
pub mod report;
pub mod settings;
pub mod storage;
