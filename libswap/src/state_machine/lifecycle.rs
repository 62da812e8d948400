use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A lightweight type indicating which phase of the swap lifecycle a lock is in.
///
/// ```text
///   Locked ──reveal_secret──▶ SecretRevealed ──claim_tokens──▶ Claimed
///     │ └──────────────verify_and_unlock──────────────────────▶ Claimed
///     └──refund──▶ Refunded
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockStage {
    /// Funds are deposited and the hashlock is unopened.
    Locked,
    /// The secret is public. Refunds are permanently disabled and the unlocker may claim after the grace period.
    SecretRevealed,
    /// Funds went to the unlocker.
    Claimed,
    /// Funds went back to the depositor.
    Refunded,
}

impl LockStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LockStage::Claimed | LockStage::Refunded)
    }
}

impl Display for LockStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LockStage::Locked => write!(f, "Locked"),
            LockStage::SecretRevealed => write!(f, "SecretRevealed"),
            LockStage::Claimed => write!(f, "Claimed"),
            LockStage::Refunded => write!(f, "Refunded"),
        }
    }
}
