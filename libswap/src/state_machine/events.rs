use crate::address::Address;
use crate::cryptography::hashes::Hashlock;
use crate::cryptography::secret::SwapSecret;
use crate::helpers::Timestamp;
use std::cell::RefCell;
use std::fmt::{Display, Formatter};

/// Notifications emitted by a swap lock for external monitoring. Nothing inside the lock consumes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapEvent {
    Deployed { address: Address, depositor: Address, hashlock: Hashlock, lock_until: Timestamp, amount: u128 },
    SecretRevealed { address: Address, revealer: Address, secret: SwapSecret, claimable_after: Timestamp },
    TokensClaimed { address: Address, claimer: Address, amount: u128, timestamp: Timestamp },
    /// The single-step legacy unlock.
    Unlocked { address: Address, unlocker: Address, secret: SwapSecret, amount: u128 },
    Refunded { address: Address, depositor: Address, amount: u128 },
    /// Deployment was refused because the DLEQ proof did not verify. `address` is the address the lock would have had.
    ProofVerificationFailed { address: Address, hashlock: Hashlock, reason: String },
}

impl SwapEvent {
    pub fn address(&self) -> Address {
        match self {
            SwapEvent::Deployed { address, .. }
            | SwapEvent::SecretRevealed { address, .. }
            | SwapEvent::TokensClaimed { address, .. }
            | SwapEvent::Unlocked { address, .. }
            | SwapEvent::Refunded { address, .. }
            | SwapEvent::ProofVerificationFailed { address, .. } => *address,
        }
    }
}

impl Display for SwapEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapEvent::Deployed { .. } => write!(f, "Deployed"),
            SwapEvent::SecretRevealed { .. } => write!(f, "SecretRevealed"),
            SwapEvent::TokensClaimed { .. } => write!(f, "TokensClaimed"),
            SwapEvent::Unlocked { .. } => write!(f, "Unlocked"),
            SwapEvent::Refunded { .. } => write!(f, "Refunded"),
            SwapEvent::ProofVerificationFailed { .. } => write!(f, "ProofVerificationFailed"),
        }
    }
}

pub trait EventSink {
    fn emit(&self, event: SwapEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: SwapEvent) {}
}

/// Records events in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: RefCell<Vec<SwapEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SwapEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn last(&self) -> Option<SwapEvent> {
        self.events.borrow().last().cloned()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: SwapEvent) {
        self.events.borrow_mut().push(event);
    }
}
