//! Stateful fund ledger.
//!
//! Owns the balance and the append-only transaction history, applies actions
//! one at a time, writes a full snapshot after every change and then tells
//! subscribers about the new state.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::{
    domain::{Amount, DomainError, LedgerState, Transaction},
    ledger::errors::LedgerError,
    storage::{self, KeyValueStore, keys},
};
pub use types::{LedgerAction, Listener, SubscriptionId, Subscribers};

pub mod errors;
mod types;

pub struct LedgerStore<S: KeyValueStore> {
    state: LedgerState,
    storage: S,
    subscribers: Subscribers,
}

/// Guard: movements must carry a strictly positive amount.
fn check_positive(amount: Amount) -> Result<(), LedgerError> {
    if !amount.is_positive() {
        return Err(DomainError::NonPositiveAmount(amount).into());
    }
    Ok(())
}

/// Guard: only an initialized fund can move cash.
fn check_initialized(state: &LedgerState) -> Result<(), LedgerError> {
    if !state.is_initialized() {
        return Err(LedgerError::NotInitialized);
    }
    Ok(())
}

impl<S: KeyValueStore> LedgerStore<S> {
    /// Rehydrates from `storage`, starting empty when nothing was saved.
    /// A stored snapshot that fails to parse or validate is an error, not an empty ledger.
    pub fn open(storage: S) -> Result<Self, LedgerError> {
        let state = storage::load_ledger(&storage)?.unwrap_or_default();
        debug!(
            balance = %state.balance(),
            transactions = state.transactions().len(),
            "ledger hydrated"
        );
        Ok(Self {
            state,
            storage,
            subscribers: Subscribers::new(),
        })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }
    pub fn balance(&self) -> Amount {
        self.state.balance()
    }
    pub fn transactions(&self) -> &[Transaction] {
        self.state.transactions()
    }
    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&LedgerState) + 'static) -> SubscriptionId {
        self.subscribers.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn initialize(
        &mut self,
        amount: Amount,
        date: NaiveDate,
    ) -> Result<&LedgerState, LedgerError> {
        self.dispatch(LedgerAction::Initialize { amount, date })
    }

    pub fn disburse(
        &mut self,
        amount: Amount,
        date: NaiveDate,
        purpose: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Result<&LedgerState, LedgerError> {
        self.dispatch(LedgerAction::Disburse {
            amount,
            date,
            purpose: purpose.into(),
            recipient: recipient.into(),
        })
    }

    pub fn replenish(
        &mut self,
        amount: Amount,
        date: NaiveDate,
    ) -> Result<&LedgerState, LedgerError> {
        self.dispatch(LedgerAction::Replenish { amount, date })
    }

    pub fn load_from_storage(
        &mut self,
        snapshot: LedgerState,
    ) -> Result<&LedgerState, LedgerError> {
        self.dispatch(LedgerAction::Load(snapshot))
    }

    /// Empties the ledger and deletes the persisted ledger and reconciliation
    /// history. Settings are kept.
    pub fn reset(&mut self) -> Result<&LedgerState, LedgerError> {
        self.dispatch(LedgerAction::Reset)
    }

    /// Applies `action`, persists, then notifies.
    ///
    /// A rejected action leaves the state untouched and nothing is written. A
    /// failed write leaves the new state applied in memory (and subscribers
    /// notified) but reports `LedgerError::Storage`; the next successful write
    /// persists the full snapshot again.
    pub fn dispatch(&mut self, action: LedgerAction) -> Result<&LedgerState, LedgerError> {
        let name = action.name();
        let is_reset = matches!(action, LedgerAction::Reset);
        self.process_action(action)?;

        let persisted = if is_reset {
            self.clear_persisted()
        } else {
            storage::save_ledger(&self.storage, &self.state)
        };
        self.subscribers.notify(&self.state);

        if let Err(e) = persisted {
            warn!("Failed to persist ledger after {name}: {e}");
            return Err(e.into());
        }
        info!(action = name, balance = %self.state.balance(), "ledger updated");
        Ok(&self.state)
    }

    fn clear_persisted(&self) -> Result<(), storage::StorageError> {
        self.storage.remove(keys::LEDGER)?;
        self.storage.remove(keys::RECONCILIATION_HISTORY)
    }

    fn process_action(&mut self, action: LedgerAction) -> Result<(), LedgerError> {
        match action {
            LedgerAction::Initialize { amount, date } => self.process_initialize(amount, date)?,
            LedgerAction::Disburse {
                amount,
                date,
                purpose,
                recipient,
            } => self.process_disburse(amount, date, purpose, recipient)?,
            LedgerAction::Replenish { amount, date } => self.process_replenish(amount, date)?,
            LedgerAction::Load(snapshot) => self.process_load(snapshot)?,
            LedgerAction::Reset => self.state = LedgerState::new(),
        }

        Ok(())
    }

    fn process_initialize(&mut self, amount: Amount, date: NaiveDate) -> Result<(), LedgerError> {
        if self.state.is_initialized() {
            return Err(LedgerError::AlreadyInitialized);
        }
        check_positive(amount)?;

        self.state.append(Transaction::initialization(amount, date))?;
        Ok(())
    }

    fn process_disburse(
        &mut self,
        amount: Amount,
        date: NaiveDate,
        purpose: String,
        recipient: String,
    ) -> Result<(), LedgerError> {
        check_initialized(&self.state)?;
        check_positive(amount)?;
        self.state.ensure_covers(amount)?;

        self.state
            .append(Transaction::disbursement(amount, date, purpose, recipient))?;
        Ok(())
    }

    fn process_replenish(&mut self, amount: Amount, date: NaiveDate) -> Result<(), LedgerError> {
        check_initialized(&self.state)?;
        check_positive(amount)?;

        self.state.append(Transaction::replenishment(amount, date))?;
        Ok(())
    }

    fn process_load(&mut self, snapshot: LedgerState) -> Result<(), LedgerError> {
        snapshot.validate()?;
        self.state = snapshot;
        Ok(())
    }

    /// Applies actions in order, logging and skipping rejected ones.
    pub fn process_actions(&mut self, actions: impl IntoIterator<Item = LedgerAction>) {
        for action in actions {
            if let Err(e) = self.dispatch(action) {
                warn!("Error processing ledger action: {e}");
            }
        }
    }
}

impl<S: KeyValueStore> std::fmt::Debug for LedgerStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}
