use crate::address::Address;
use crate::cryptography::dleq::DleqError;
use crate::error::ErrorKind;
use crate::helpers::Timestamp;
use crate::state_machine::lifecycle::LockStage;
use crate::token::TransferError;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("DLEQ proof rejected. {0}")]
    Proof(#[from] DleqError),
    #[error("Invalid swap configuration: {0}")]
    InvalidConfig(String),
    #[error("The lock time {lock_until} is not in the future (now is {now}).")]
    LockTimeNotInFuture { lock_until: Timestamp, now: Timestamp },
    #[error("The hashlock is all zeroes.")]
    ZeroHashlock,
    #[error("A lock without a token must have a zero amount, but {0} was given.")]
    AmountWithoutToken(u128),
    #[error("A lock with a token must have a non-zero amount.")]
    ZeroAmount,
    #[error("The token address is the zero address.")]
    ZeroTokenAddress,
    #[error("The timestamp arithmetic overflowed.")]
    TimestampOverflow,
    #[error("The lock is in the {stage} stage, which does not allow {operation}.")]
    InvalidStage { operation: &'static str, stage: LockStage },
    #[error("{caller} is not authorised to call {operation}.")]
    Unauthorized { operation: &'static str, caller: Address },
    #[error("{operation} is not available until {until} (now is {now}).")]
    TimelockActive { operation: &'static str, until: Timestamp, now: Timestamp },
    #[error("Re-entrant call rejected.")]
    Reentrancy,
    #[error("Token transfer failed. {0}")]
    Transfer(#[from] TransferError),
}

impl LockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LockError::Proof(e) => e.kind(),
            LockError::InvalidConfig(_)
            | LockError::LockTimeNotInFuture { .. }
            | LockError::ZeroHashlock
            | LockError::AmountWithoutToken(_)
            | LockError::ZeroAmount
            | LockError::ZeroTokenAddress
            | LockError::TimestampOverflow => ErrorKind::InvalidInput,
            LockError::InvalidStage { .. }
            | LockError::Unauthorized { .. }
            | LockError::TimelockActive { .. }
            | LockError::Reentrancy => ErrorKind::StateError,
            LockError::Transfer(e) => e.kind(),
        }
    }

    pub fn invalid_stage_for(operation: &'static str, stage: LockStage) -> Self {
        LockError::InvalidStage { operation, stage }
    }
}
