//! Serializes transactions to CSV.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{RecordId, Transaction, TransactionKind};

pub const CSV_HEADER: [&str; 6] = [
    "Date",
    "Type",
    "Amount",
    "Purpose",
    "Recipient",
    "Transaction ID",
];

/// Maps directly to the export columns: Date, Type, Amount, Purpose, Recipient, Transaction ID.
#[derive(Debug, Serialize)]
struct OutputCsv<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Type")]
    kind: TransactionKind,
    #[serde(rename = "Amount")]
    amount: Decimal,
    #[serde(rename = "Purpose")]
    purpose: &'a str,
    #[serde(rename = "Recipient")]
    recipient: &'a str,
    #[serde(rename = "Transaction ID")]
    id: &'a RecordId,
}

pub fn write_transactions<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    writer: impl std::io::Write,
) -> anyhow::Result<()> {
    // Header is written up front so an empty selection still yields a valid file.
    let mut wtr = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for tx in transactions {
        let output_csv = OutputCsv {
            date: tx.date(),
            kind: tx.kind(),
            amount: tx.amount().to_decimal(),
            purpose: tx.purpose().unwrap_or_default(),
            recipient: tx.recipient().unwrap_or_default(),
            id: tx.id(),
        };
        wtr.serialize(output_csv)?;
    }
    wtr.flush()?;
    Ok(())
}
