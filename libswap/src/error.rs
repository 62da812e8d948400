use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// The coarse failure taxonomy shared by every error type in this crate.
///
/// Monitoring code and callers that only care about *what class* of failure occurred match on this rather than on
/// the individual error enums.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Zero scalars, malformed hashlocks, non-canonical encodings, bad configuration.
    InvalidInput,
    /// Off-curve, small-order or identity points.
    PointValidationFailure,
    /// Challenge mismatches and rejected MSM witnesses.
    ProofInvalid,
    /// Wrong lifecycle stage, unauthorised caller or an unmet timelock.
    StateError,
    /// The token layer refused a transfer.
    TransferFailure,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "InvalidInput"),
            ErrorKind::PointValidationFailure => write!(f, "PointValidationFailure"),
            ErrorKind::ProofInvalid => write!(f, "ProofInvalid"),
            ErrorKind::StateError => write!(f, "StateError"),
            ErrorKind::TransferFailure => write!(f, "TransferFailure"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("error reading field '{field}': {error}")]
pub struct ReadError {
    field: String,
    error: String,
}

impl ReadError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self { field: field.into(), error: error.into() }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}
