//! Cash-count reconciliation.
//!
//! Compares the recorded balance with a physical count. Reconciling never
//! changes the ledger; records go to their own newest-first history.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Amount, DomainError, RecordId};
use crate::storage::{self, KeyValueStore, StorageError, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationStatus {
    Balanced,
    /// Physical cash exceeds the recorded balance.
    Overage,
    /// Physical cash falls short of the recorded balance.
    Shortage,
}

impl ReconciliationStatus {
    /// Amounts are whole cents, so only an exact zero is balanced. Inputs are
    /// rounded before the comparison: 100.006 counted against 100.00 is an
    /// overage of one cent.
    pub fn classify(difference: Amount) -> Self {
        if difference.is_positive() {
            ReconciliationStatus::Overage
        } else if difference.is_negative() {
            ReconciliationStatus::Shortage
        } else {
            ReconciliationStatus::Balanced
        }
    }
}

impl std::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReconciliationStatus::Balanced => "balanced",
            ReconciliationStatus::Overage => "overage",
            ReconciliationStatus::Shortage => "shortage",
        })
    }
}

/// Immutable result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRecord {
    id: RecordId,
    date: NaiveDate,
    system_balance: Amount,
    physical_balance: Amount,
    /// `physical_balance - system_balance`.
    difference: Amount,
    status: ReconciliationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    timestamp: DateTime<Utc>,
}

impl ReconciliationRecord {
    pub fn id(&self) -> &RecordId {
        &self.id
    }
    pub fn date(&self) -> NaiveDate {
        self.date
    }
    pub fn system_balance(&self) -> Amount {
        self.system_balance
    }
    pub fn physical_balance(&self) -> Amount {
        self.physical_balance
    }
    pub fn difference(&self) -> Amount {
        self.difference
    }
    pub fn status(&self) -> ReconciliationStatus {
        self.status
    }
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Checks that the stored difference and status follow from the two balances.
    pub fn validate(&self) -> Result<(), DomainError> {
        let computed = self.physical_balance.checked_sub(self.system_balance)?;
        if computed != self.difference {
            return Err(DomainError::DifferenceMismatch {
                id: self.id.clone(),
                recorded: self.difference,
                computed,
            });
        }
        if ReconciliationStatus::classify(computed) != self.status {
            return Err(DomainError::StatusMismatch {
                id: self.id.clone(),
                status: self.status,
                difference: computed,
            });
        }
        Ok(())
    }
}

/// Reconciles as of today's local date.
pub fn reconcile(
    system_balance: Amount,
    physical_balance: Amount,
    notes: Option<String>,
) -> Result<ReconciliationRecord, DomainError> {
    reconcile_on(
        Local::now().date_naive(),
        system_balance,
        physical_balance,
        notes,
    )
}

pub fn reconcile_on(
    date: NaiveDate,
    system_balance: Amount,
    physical_balance: Amount,
    notes: Option<String>,
) -> Result<ReconciliationRecord, DomainError> {
    let difference = physical_balance.checked_sub(system_balance)?;
    Ok(ReconciliationRecord {
        id: RecordId::generate(),
        date,
        system_balance,
        physical_balance,
        difference,
        status: ReconciliationStatus::classify(difference),
        notes: notes.filter(|n| !n.trim().is_empty()),
        timestamp: Utc::now(),
    })
}

fn read_records(storage: &impl KeyValueStore) -> Result<Vec<ReconciliationRecord>, StorageError> {
    let records: Vec<ReconciliationRecord> =
        storage::read_json(storage, keys::RECONCILIATION_HISTORY)?.unwrap_or_default();
    for record in &records {
        record.validate()?;
    }
    Ok(records)
}

/// Persisted reconciliation records, newest first. Retention is unbounded;
/// views that only want the latest few use `recent`.
#[derive(Debug)]
pub struct ReconciliationHistory<S: KeyValueStore> {
    records: Vec<ReconciliationRecord>,
    storage: S,
}

impl<S: KeyValueStore> ReconciliationHistory<S> {
    /// Fails on records whose difference or status does not match their balances.
    pub fn open(storage: S) -> Result<Self, StorageError> {
        let records = read_records(&storage)?;
        Ok(Self { records, storage })
    }

    pub fn records(&self) -> &[ReconciliationRecord] {
        &self.records
    }
    pub fn latest(&self) -> Option<&ReconciliationRecord> {
        self.records.first()
    }
    pub fn recent(&self, n: usize) -> &[ReconciliationRecord] {
        &self.records[..n.min(self.records.len())]
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Re-reads the persisted history. Storage wins over what this handle
    /// holds, so a ledger reset is picked up here.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.records = read_records(&self.storage)?;
        Ok(())
    }

    /// Reloads, prepends and persists. The record stays in memory even if the
    /// write fails.
    pub fn record(
        &mut self,
        record: ReconciliationRecord,
    ) -> Result<&ReconciliationRecord, StorageError> {
        self.reload()?;
        info!(
            status = %record.status,
            difference = %record.difference,
            "reconciliation recorded"
        );
        self.records.insert(0, record);
        self.persist()?;
        Ok(&self.records[0])
    }

    /// Wholesale replacement, used by imports.
    pub fn replace(&mut self, records: Vec<ReconciliationRecord>) -> Result<(), StorageError> {
        self.records = records;
        self.persist()
    }

    fn persist(&self) -> Result<(), StorageError> {
        storage::write_json(&self.storage, keys::RECONCILIATION_HISTORY, &self.records)
    }
}
