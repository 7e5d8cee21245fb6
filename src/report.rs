//! Transaction filtering and period summaries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Amount, Transaction, TransactionKind};

/// Selects transactions for history views, reports and exports.
/// Every populated field must match; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring of purpose or recipient.
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.kind.is_some_and(|kind| kind != tx.kind()) {
            return false;
        }
        if self.from.is_some_and(|from| tx.date() < from) {
            return false;
        }
        if self.to.is_some_and(|to| tx.date() > to) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [tx.purpose(), tx.recipient()]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }

    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions.iter().filter(|tx| self.matches(tx)).collect()
    }
}

/// Newest business date first, creation time breaking ties.
pub fn sort_recent_first(transactions: &mut [&Transaction]) {
    transactions.sort_by(|a, b| {
        b.date()
            .cmp(&a.date())
            .then_with(|| b.timestamp().cmp(&a.timestamp()))
    });
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub initialized_with: Amount,
    pub total_disbursed: Amount,
    pub total_replenished: Amount,
    pub disbursement_count: usize,
    pub replenishment_count: usize,
    /// Disbursed totals keyed by purpose; blank purposes land under "Uncategorized".
    pub by_purpose: BTreeMap<String, Amount>,
}

impl Summary {
    pub fn of<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut summary = Summary::default();
        for tx in transactions {
            match tx.kind() {
                TransactionKind::Initialization => summary.initialized_with += tx.amount(),
                TransactionKind::Disbursement => {
                    summary.total_disbursed += tx.amount();
                    summary.disbursement_count += 1;
                    let purpose = tx
                        .purpose()
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .unwrap_or("Uncategorized");
                    *summary
                        .by_purpose
                        .entry(purpose.to_owned())
                        .or_default() += tx.amount();
                }
                TransactionKind::Replenishment => {
                    summary.total_replenished += tx.amount();
                    summary.replenishment_count += 1;
                }
            }
        }
        summary
    }

    /// Replenished minus disbursed over the summarized period.
    pub fn net_change(&self) -> Amount {
        self.total_replenished - self.total_disbursed
    }
}
