//! Versioned ledger snapshots.
//!
//! Current documents carry `"version": 1` next to the flattened ledger state,
//! with amounts in cents. Documents without a version predate fixed-point
//! amounts: every floating-point value, the stored balance included, is rounded
//! to cents and the result is validated like any other snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{KeyValueStore, StorageError, keys};
use crate::domain::{Amount, LedgerState, RecordId, Transaction, TransactionKind};

pub const SNAPSHOT_VERSION: u64 = 1;

#[derive(Serialize)]
struct VersionedSnapshot<'a> {
    version: u64,
    #[serde(flatten)]
    state: &'a LedgerState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySnapshot {
    balance: f64,
    #[serde(default)]
    transactions: Vec<LegacyTransaction>,
    #[serde(default)]
    is_initialized: bool,
}

#[derive(Debug, Deserialize)]
struct LegacyTransaction {
    id: String,
    r#type: TransactionKind,
    amount: f64,
    date: NaiveDate,
    purpose: Option<String>,
    recipient: Option<String>,
    timestamp: DateTime<Utc>,
}

pub fn encode_ledger(state: &LedgerState) -> Result<String, StorageError> {
    Ok(ledger_value(state)?.to_string())
}

/// The versioned snapshot as a JSON value, for embedding in larger documents.
pub fn ledger_value(state: &LedgerState) -> Result<Value, StorageError> {
    serde_json::to_value(VersionedSnapshot {
        version: SNAPSHOT_VERSION,
        state,
    })
    .map_err(|source| StorageError::Json {
        key: keys::LEDGER.to_owned(),
        source,
    })
}

/// Parses, migrates if needed, and validates a ledger snapshot.
pub fn decode_ledger(raw: &str) -> Result<LedgerState, StorageError> {
    let json_error = |source| StorageError::Json {
        key: keys::LEDGER.to_owned(),
        source,
    };
    let value: Value = serde_json::from_str(raw).map_err(json_error)?;

    let state = match value.get("version").map(Value::as_u64) {
        None => migrate_legacy(serde_json::from_value(value).map_err(json_error)?)?,
        Some(Some(SNAPSHOT_VERSION)) => serde_json::from_value(value).map_err(json_error)?,
        Some(Some(other)) => return Err(StorageError::UnsupportedVersion(other)),
        Some(None) => return Err(StorageError::UnsupportedVersion(0)),
    };

    state.validate()?;
    Ok(state)
}

fn migrate_legacy(legacy: LegacySnapshot) -> Result<LedgerState, StorageError> {
    let transactions = legacy
        .transactions
        .into_iter()
        .map(|tx| {
            Ok(Transaction::restore(
                RecordId::from(tx.id),
                tx.r#type,
                Amount::from_f64(tx.amount)?,
                tx.date,
                tx.purpose,
                tx.recipient,
                tx.timestamp,
            ))
        })
        .collect::<Result<Vec<_>, StorageError>>()?;

    let balance = Amount::from_f64(legacy.balance)?;
    info!(
        transactions = transactions.len(),
        "migrated unversioned ledger snapshot"
    );
    Ok(LedgerState::from_parts(
        balance,
        transactions,
        legacy.is_initialized,
    ))
}

/// `Ok(None)` when nothing has been stored yet.
pub fn load_ledger(store: &impl KeyValueStore) -> Result<Option<LedgerState>, StorageError> {
    store
        .get(keys::LEDGER)?
        .map(|raw| decode_ledger(&raw))
        .transpose()
}

pub fn save_ledger(store: &impl KeyValueStore, state: &LedgerState) -> Result<(), StorageError> {
    store.set(keys::LEDGER, &encode_ledger(state)?)
}
