//! Data leaving or entering the tool as files: CSV transaction exports and
//! the JSON backup bundle.

pub use self::csv::{CSV_HEADER, write_transactions};
pub use self::json::{EXPORT_VERSION, ExportBundle, ImportSummary, export_bundle, import_bundle};

mod csv;
mod json;

use crate::{domain::DomainError, ledger::errors::LedgerError, storage::StorageError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Malformed export document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported export version {0}")]
    UnsupportedVersion(String),
    #[error("Invalid fund data: {0}")]
    InvalidFundData(#[source] StorageError),
    #[error("Invalid reconciliation history: {0}")]
    InvalidReconciliation(#[source] DomainError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
