//! Core domain types: amounts, transactions, and the fund ledger.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Add, AddAssign, From, Into, Neg, Sub, SubAssign};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::reconciliation::ReconciliationStatus;

/// Fixed-point currency amount in minor units (cents).
///
/// User-entered decimals are rounded to two places on the way in; the decimal
/// form only reappears when an amount is displayed or exported.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    From,
    Into,
    Add,
    Sub,
    Neg,
    AddAssign,
    SubAssign,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Rounds to cents, midpoint away from zero.
    pub fn from_decimal(value: Decimal) -> Result<Self, DomainError> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Self)
            .ok_or(DomainError::AmountOutOfRange(value))
    }

    /// Only used to migrate snapshots written with floating-point amounts.
    pub fn from_f64(value: f64) -> Result<Self, DomainError> {
        let decimal =
            Decimal::from_f64(value).ok_or_else(|| DomainError::InvalidAmount(value.to_string()))?;
        Self::from_decimal(decimal)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
    pub fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn checked_add(self, rhs: Amount) -> Result<Amount, DomainError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(DomainError::AmountOutOfRange(rhs.to_decimal()))
    }
    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, DomainError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(DomainError::AmountOutOfRange(rhs.to_decimal()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| DomainError::InvalidAmount(s.into()))?;
        Self::from_decimal(value)
    }
}

/// Unique, time-ordered identifier shared by transactions and reconciliation records.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, From, Into,
)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// UUIDv7: millisecond timestamp followed by random bits.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DomainError {
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Decimal),
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Amount),
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Amount, requested: Amount },
    #[error("Recorded balance {recorded} does not match transaction history ({computed})")]
    BalanceMismatch { recorded: Amount, computed: Amount },
    #[error("Initialization must be the first and only initialization transaction")]
    MisplacedInitialization,
    #[error("Initialized flag is {flag} but history says {history}")]
    InitializedFlagMismatch { flag: bool, history: bool },
    #[error("Transaction {0} has a negative amount")]
    NegativeTransactionAmount(RecordId),
    #[error("Duplicate transaction id {0}")]
    DuplicateTransactionId(RecordId),
    #[error("Reconciliation {id} records difference {recorded} but its counts give {computed}")]
    DifferenceMismatch {
        id: RecordId,
        recorded: Amount,
        computed: Amount,
    },
    #[error("Reconciliation {id} is marked {status} but its difference is {difference}")]
    StatusMismatch {
        id: RecordId,
        status: ReconciliationStatus,
        difference: Amount,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Initialization,
    Disbursement,
    Replenishment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Initialization => "initialization",
            TransactionKind::Disbursement => "disbursement",
            TransactionKind::Replenishment => "replenishment",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "initialization" => Ok(TransactionKind::Initialization),
            "disbursement" => Ok(TransactionKind::Disbursement),
            "replenishment" => Ok(TransactionKind::Replenishment),
            other => Err(format!("unknown transaction type {other:?}")),
        }
    }
}

/// One ledger event. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: RecordId,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: Amount,
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recipient: Option<String>,
    timestamp: DateTime<Utc>,
}

impl Transaction {
    fn new(kind: TransactionKind, amount: Amount, date: NaiveDate) -> Self {
        Self {
            id: RecordId::generate(),
            kind,
            amount,
            date,
            purpose: None,
            recipient: None,
            timestamp: Utc::now(),
        }
    }

    pub fn initialization(amount: Amount, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Initialization, amount, date)
    }
    pub fn disbursement(
        amount: Amount,
        date: NaiveDate,
        purpose: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            purpose: Some(purpose.into()),
            recipient: Some(recipient.into()),
            ..Self::new(TransactionKind::Disbursement, amount, date)
        }
    }
    pub fn replenishment(amount: Amount, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Replenishment, amount, date)
    }

    /// Rebuilds a transaction that was already recorded, keeping its identity.
    pub(crate) fn restore(
        id: RecordId,
        kind: TransactionKind,
        amount: Amount,
        date: NaiveDate,
        purpose: Option<String>,
        recipient: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            amount,
            date,
            purpose,
            recipient,
            timestamp,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }
    pub fn amount(&self) -> Amount {
        self.amount
    }
    pub fn date(&self) -> NaiveDate {
        self.date
    }
    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }
    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Balance after this transaction is applied on top of `balance`.
    pub fn apply_to(&self, balance: Amount) -> Result<Amount, DomainError> {
        match self.kind {
            TransactionKind::Initialization => Ok(self.amount),
            TransactionKind::Disbursement => balance.checked_sub(self.amount),
            TransactionKind::Replenishment => balance.checked_add(self.amount),
        }
    }
}

/// Folds a history into the balance it implies.
pub fn fold_balance(transactions: &[Transaction]) -> Result<Amount, DomainError> {
    transactions
        .iter()
        .try_fold(Amount::ZERO, |balance, tx| tx.apply_to(balance))
}

/// The fund aggregate. Invariant: `balance == fold_balance(transactions)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    balance: Amount,
    transactions: Vec<Transaction>,
    is_initialized: bool,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a state from raw parts without checking it; run `validate` before trusting it.
    pub fn from_parts(
        balance: Amount,
        transactions: Vec<Transaction>,
        is_initialized: bool,
    ) -> Self {
        Self {
            balance,
            transactions,
            is_initialized,
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }
    pub fn initialization(&self) -> Option<&Transaction> {
        self.transactions
            .first()
            .filter(|tx| tx.kind() == TransactionKind::Initialization)
    }

    /// Appends a transaction and applies its signed amount. Nothing changes
    /// when the new balance would not fit.
    pub(crate) fn append(&mut self, transaction: Transaction) -> Result<(), DomainError> {
        self.balance = transaction.apply_to(self.balance)?;
        if transaction.kind() == TransactionKind::Initialization {
            self.is_initialized = true;
        }
        self.transactions.push(transaction);
        Ok(())
    }

    /// Debit check without mutation.
    pub fn ensure_covers(&self, amount: Amount) -> Result<(), DomainError> {
        if self.balance < amount {
            return Err(DomainError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Checks every structural rule a persisted or imported snapshot must satisfy.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for (index, tx) in self.transactions.iter().enumerate() {
            if tx.amount().is_negative() {
                return Err(DomainError::NegativeTransactionAmount(tx.id().clone()));
            }
            if !seen.insert(tx.id()) {
                return Err(DomainError::DuplicateTransactionId(tx.id().clone()));
            }
            if tx.kind() == TransactionKind::Initialization && index != 0 {
                return Err(DomainError::MisplacedInitialization);
            }
        }

        let history = self.initialization().is_some();
        if history != self.is_initialized {
            return Err(DomainError::InitializedFlagMismatch {
                flag: self.is_initialized,
                history,
            });
        }
        if !history && !self.transactions.is_empty() {
            return Err(DomainError::MisplacedInitialization);
        }

        let computed = fold_balance(&self.transactions)?;
        if computed != self.balance {
            return Err(DomainError::BalanceMismatch {
                recorded: self.balance,
                computed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn amt(value: Decimal) -> Amount {
        Amount::from_decimal(value).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn amounts_round_half_away_from_zero() {
        assert_eq!(amt(dec!(100.004)), Amount::from_cents(10000));
        assert_eq!(amt(dec!(100.005)), Amount::from_cents(10001));
        assert_eq!(amt(dec!(-4.505)), Amount::from_cents(-451));
    }

    #[test]
    fn amount_display_keeps_two_places() {
        assert_eq!(Amount::from_cents(42450).to_string(), "424.50");
        assert_eq!(Amount::from_cents(-450).to_string(), "-4.50");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn amount_parsing_rejects_garbage() {
        assert_eq!("75.50".parse::<Amount>(), Ok(Amount::from_cents(7550)));
        assert!(matches!(
            "seventy".parse::<Amount>(),
            Err(DomainError::InvalidAmount(_))
        ));
    }

    #[test]
    fn legacy_float_amounts_are_rounded_to_cents() {
        assert_eq!(Amount::from_f64(0.1 + 0.2).unwrap(), Amount::from_cents(30));
        assert_eq!(Amount::from_f64(75.5).unwrap(), Amount::from_cents(7550));
        assert!(Amount::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn fold_follows_signed_amount_rule() {
        let txs = vec![
            Transaction::initialization(amt(dec!(500)), day(1)),
            Transaction::disbursement(amt(dec!(75.50)), day(2), "Office Supplies", "Jane Doe"),
            Transaction::replenishment(amt(dec!(200)), day(3)),
        ];
        assert_eq!(fold_balance(&txs), Ok(amt(dec!(624.50))));
    }

    #[test]
    fn fold_reports_overflow_instead_of_wrapping() {
        let txs = vec![
            Transaction::initialization(Amount::from_cents(i64::MAX - 10), day(1)),
            Transaction::replenishment(Amount::from_cents(11), day(2)),
        ];
        assert_eq!(
            fold_balance(&txs),
            Err(DomainError::AmountOutOfRange(Amount::from_cents(11).to_decimal()))
        );
    }

    #[test]
    fn validate_rejects_history_that_overflows() {
        let state = LedgerState::from_parts(
            Amount::from_cents(i64::MAX),
            vec![
                Transaction::initialization(Amount::from_cents(i64::MAX), day(1)),
                Transaction::replenishment(Amount::from_cents(i64::MAX), day(2)),
            ],
            true,
        );
        assert!(matches!(state.validate(), Err(DomainError::AmountOutOfRange(_))));
    }

    #[test]
    fn validate_rejects_balance_drift() {
        let state = LedgerState::from_parts(
            amt(dec!(10)),
            vec![Transaction::initialization(amt(dec!(500)), day(1))],
            true,
        );
        assert_eq!(
            state.validate(),
            Err(DomainError::BalanceMismatch {
                recorded: amt(dec!(10)),
                computed: amt(dec!(500)),
            })
        );
    }

    #[test]
    fn validate_rejects_history_without_initialization() {
        let state = LedgerState::from_parts(
            amt(dec!(20)),
            vec![Transaction::replenishment(amt(dec!(20)), day(1))],
            false,
        );
        assert_eq!(state.validate(), Err(DomainError::MisplacedInitialization));
    }

    #[test]
    fn validate_rejects_flag_mismatch() {
        let state = LedgerState::from_parts(Amount::ZERO, vec![], true);
        assert_eq!(
            state.validate(),
            Err(DomainError::InitializedFlagMismatch {
                flag: true,
                history: false
            })
        );
    }

    #[test]
    fn validate_rejects_second_initialization() {
        let state = LedgerState::from_parts(
            amt(dec!(100)),
            vec![
                Transaction::initialization(amt(dec!(500)), day(1)),
                Transaction::initialization(amt(dec!(100)), day(2)),
            ],
            true,
        );
        assert_eq!(state.validate(), Err(DomainError::MisplacedInitialization));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let init = Transaction::initialization(amt(dec!(500)), day(1));
        let dup = Transaction::restore(
            init.id().clone(),
            TransactionKind::Replenishment,
            amt(dec!(1)),
            day(2),
            None,
            None,
            Utc::now(),
        );
        let state = LedgerState::from_parts(amt(dec!(501)), vec![init.clone(), dup], true);
        assert_eq!(
            state.validate(),
            Err(DomainError::DuplicateTransactionId(init.id().clone()))
        );
    }

    #[test]
    fn empty_state_is_valid() {
        assert_eq!(LedgerState::new().validate(), Ok(()));
    }
}
