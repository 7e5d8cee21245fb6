//! JSON backup bundle.
//!
//! Import happens in two stages, like any external input:
//! 1. Serde deserializes the document into a loose `RawBundle`.
//! 2. `TryFrom<RawBundle>` checks the version and decodes the fund data through
//!    the same snapshot path used on startup, so legacy snapshots migrate here too.
//!    Every reconciliation record must agree with its own balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::ExportError;
use crate::{
    domain::LedgerState,
    ledger::LedgerStore,
    reconciliation::{ReconciliationHistory, ReconciliationRecord},
    settings::Settings,
    storage::{self, KeyValueStore},
};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub fund_data: Value,
    pub reconciliation_history: Vec<ReconciliationRecord>,
    pub settings: Settings,
}

/// Flat representation of an export document as found on disk.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBundle {
    version: Value,
    #[serde(default)]
    export_date: Option<DateTime<Utc>>,
    fund_data: Value,
    #[serde(default)]
    reconciliation_history: Vec<ReconciliationRecord>,
    #[serde(default)]
    settings: Option<Settings>,
}

/// A validated import, ready to replace the current data.
#[derive(Debug)]
struct ImportedData {
    export_date: Option<DateTime<Utc>>,
    ledger: LedgerState,
    reconciliation_history: Vec<ReconciliationRecord>,
    settings: Option<Settings>,
}

impl TryFrom<RawBundle> for ImportedData {
    type Error = ExportError;

    fn try_from(value: RawBundle) -> Result<Self, Self::Error> {
        let version = match &value.version {
            Value::String(v) => v.clone(),
            other => other.to_string(),
        };
        if version.split('.').next() != EXPORT_VERSION.split('.').next() {
            return Err(ExportError::UnsupportedVersion(version));
        }
        let ledger = storage::decode_ledger(&value.fund_data.to_string())
            .map_err(ExportError::InvalidFundData)?;
        for record in &value.reconciliation_history {
            record
                .validate()
                .map_err(ExportError::InvalidReconciliation)?;
        }
        Ok(ImportedData {
            export_date: value.export_date,
            ledger,
            reconciliation_history: value.reconciliation_history,
            settings: value.settings,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub export_date: Option<DateTime<Utc>>,
    pub transactions: usize,
    pub reconciliations: usize,
    pub settings_replaced: bool,
}

pub fn export_bundle<S: KeyValueStore>(
    ledger: &LedgerStore<S>,
    history: &ReconciliationHistory<S>,
    settings: &Settings,
) -> Result<ExportBundle, ExportError> {
    Ok(ExportBundle {
        version: EXPORT_VERSION.to_owned(),
        export_date: Utc::now(),
        fund_data: storage::ledger_value(ledger.state())?,
        reconciliation_history: history.records().to_vec(),
        settings: settings.clone(),
    })
}

/// Validates `raw` completely before touching anything, then replaces the
/// ledger, the reconciliation history and (when present) the settings.
pub fn import_bundle<S: KeyValueStore>(
    raw: &str,
    ledger: &mut LedgerStore<S>,
    history: &mut ReconciliationHistory<S>,
) -> Result<ImportSummary, ExportError> {
    let bundle: RawBundle = serde_json::from_str(raw)?;
    let imported = ImportedData::try_from(bundle)?;

    let summary = ImportSummary {
        export_date: imported.export_date,
        transactions: imported.ledger.transactions().len(),
        reconciliations: imported.reconciliation_history.len(),
        settings_replaced: imported.settings.is_some(),
    };

    ledger.load_from_storage(imported.ledger)?;
    history.replace(imported.reconciliation_history)?;
    if let Some(settings) = imported.settings {
        settings.save(ledger.storage())?;
    }

    info!(
        transactions = summary.transactions,
        reconciliations = summary.reconciliations,
        "import complete"
    );
    Ok(summary)
}
