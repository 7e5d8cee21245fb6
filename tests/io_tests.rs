mod common;

use common::{amount, date};
use petty_cash::{
    domain::{Amount, DomainError, TransactionKind},
    export::{self, ExportError},
    ledger::LedgerStore,
    reconciliation::{ReconciliationHistory, reconcile_on},
    report::TransactionFilter,
    settings::Settings,
    storage::{self, MemoryStore},
};
use rust_decimal::dec;

const SNAPSHOT: &str = include_str!("io_tests/fund_snapshot.json");
const EXPECTED_CSV: &str = include_str!("io_tests/expected_transactions.csv");
const LEGACY_EXPORT: &str = include_str!("io_tests/legacy_export.json");

// csv output
#[test]
fn transactions_export_to_csv() -> anyhow::Result<()> {
    let state = storage::decode_ledger(SNAPSHOT)?;

    let mut output = Vec::new();
    export::write_transactions(state.transactions(), &mut output)?;

    assert_eq!(String::from_utf8(output)?, EXPECTED_CSV);
    Ok(())
}

#[test]
fn filtered_csv_export_keeps_header() -> anyhow::Result<()> {
    let state = storage::decode_ledger(SNAPSHOT)?;
    let filter = TransactionFilter {
        kind: Some(TransactionKind::Disbursement),
        search: Some("nobody".into()),
        ..Default::default()
    };

    let mut output = Vec::new();
    export::write_transactions(filter.apply(state.transactions()), &mut output)?;

    assert_eq!(
        String::from_utf8(output)?,
        "Date,Type,Amount,Purpose,Recipient,Transaction ID\n"
    );
    Ok(())
}

// json export, then import into an empty store
#[test]
fn json_bundle_round_trips() -> anyhow::Result<()> {
    let source = MemoryStore::new();
    let mut ledger = LedgerStore::open(&source)?;
    ledger.initialize(amount(dec!(500)), date("2024-01-01"))?;
    ledger.disburse(amount(dec!(75.50)), date("2024-01-02"), "Office Supplies", "Jane Doe")?;
    let mut history = ReconciliationHistory::open(&source)?;
    history.record(reconcile_on(date("2024-01-03"), ledger.balance(), amount(dec!(424)), None)?)?;
    let mut settings = Settings::default();
    settings.add_category("Cleaning")?;

    let bundle = export::export_bundle(&ledger, &history, &settings)?;
    let raw = serde_json::to_string(&bundle)?;

    let target = MemoryStore::new();
    let mut imported_ledger = LedgerStore::open(&target)?;
    let mut imported_history = ReconciliationHistory::open(&target)?;
    let summary = export::import_bundle(&raw, &mut imported_ledger, &mut imported_history)?;

    assert_eq!(summary.transactions, 2);
    assert_eq!(summary.reconciliations, 1);
    assert!(summary.settings_replaced);
    assert_eq!(imported_ledger.state(), ledger.state());
    assert_eq!(imported_history.records(), history.records());
    assert_eq!(Settings::load(&target)?, settings);
    Ok(())
}

// export documents written before amounts were stored in cents
#[test]
fn legacy_export_is_migrated_on_import() -> anyhow::Result<()> {
    let target = MemoryStore::new();
    let mut ledger = LedgerStore::open(&target)?;
    let mut history = ReconciliationHistory::open(&target)?;

    let summary = export::import_bundle(LEGACY_EXPORT, &mut ledger, &mut history)?;

    assert_eq!(summary.transactions, 2);
    assert_eq!(ledger.balance(), amount(dec!(424.50)));
    let settings = Settings::load(&target)?;
    assert_eq!(settings.low_balance_threshold, Amount::from_cents(10000));
    assert_eq!(settings.custom_categories, vec!["Office Supplies", "Cleaning"]);
    assert!(settings.notifications.low_balance_alerts);
    Ok(())
}

#[test]
fn import_with_unknown_version_changes_nothing() -> anyhow::Result<()> {
    let target = MemoryStore::new();
    let mut ledger = LedgerStore::open(&target)?;
    ledger.initialize(amount(dec!(100)), date("2024-01-01"))?;
    let mut history = ReconciliationHistory::open(&target)?;
    let before = ledger.state().clone();

    let raw = LEGACY_EXPORT.replace("\"1.0\"", "\"2.0\"");
    let err = export::import_bundle(&raw, &mut ledger, &mut history).unwrap_err();

    assert!(matches!(err, ExportError::UnsupportedVersion(v) if v == "2.0"));
    assert_eq!(ledger.state(), &before);
    Ok(())
}

#[test]
fn import_with_inconsistent_fund_data_is_rejected() -> anyhow::Result<()> {
    let target = MemoryStore::new();
    let mut ledger = LedgerStore::open(&target)?;
    let mut history = ReconciliationHistory::open(&target)?;

    let raw = SNAPSHOT.replace("62450", "1");
    let bundle = format!(r#"{{"version": "1.0", "fundData": {raw}}}"#);
    let err = export::import_bundle(&bundle, &mut ledger, &mut history).unwrap_err();

    assert!(matches!(err, ExportError::InvalidFundData(_)));
    assert!(!ledger.is_initialized());
    Ok(())
}

#[test]
fn import_with_inconsistent_reconciliation_is_rejected() -> anyhow::Result<()> {
    let target = MemoryStore::new();
    let mut ledger = LedgerStore::open(&target)?;
    let mut history = ReconciliationHistory::open(&target)?;

    let bundle = format!(
        r#"{{"version": "1.0", "fundData": {SNAPSHOT}, "reconciliationHistory": [{{
            "id": "r1", "date": "2024-01-04", "systemBalance": 10000,
            "physicalBalance": 5000, "difference": 999, "status": "balanced",
            "timestamp": "2024-01-04T09:00:00Z"
        }}]}}"#
    );
    let err = export::import_bundle(&bundle, &mut ledger, &mut history).unwrap_err();

    assert!(matches!(
        err,
        ExportError::InvalidReconciliation(DomainError::DifferenceMismatch { .. })
    ));
    assert!(!ledger.is_initialized());
    assert!(history.is_empty());
    Ok(())
}
