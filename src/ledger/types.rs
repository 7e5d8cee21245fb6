use chrono::NaiveDate;

use crate::domain::{Amount, LedgerState};

/// Every state transition the store accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerAction {
    Initialize {
        amount: Amount,
        date: NaiveDate,
    },
    Disburse {
        amount: Amount,
        date: NaiveDate,
        purpose: String,
        recipient: String,
    },
    Replenish {
        amount: Amount,
        date: NaiveDate,
    },
    /// Wholesale replacement, used for rehydration and imports.
    Load(LedgerState),
    Reset,
}

impl LedgerAction {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerAction::Initialize { .. } => "initialize",
            LedgerAction::Disburse { .. } => "disburse",
            LedgerAction::Replenish { .. } => "replenish",
            LedgerAction::Load(_) => "load",
            LedgerAction::Reset => "reset",
        }
    }
}

/// Handle returned by `LedgerStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(super) u64);

pub type Listener = Box<dyn FnMut(&LedgerState)>;

/// Registered change listeners, notified in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn notify(&mut self, state: &LedgerState) {
        for (_, listener) in &mut self.listeners {
            listener(state);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.listeners.len())
            .finish()
    }
}
