pub mod address;
pub mod config;
pub mod cryptography;
pub mod error;
pub mod helpers;
pub mod monitor;
pub mod state_machine;
pub mod token;
pub mod wire;

#[cfg(test)]
mod tests;

pub use address::Address;
pub use config::SwapConfig;
pub use cryptography::{CurveGroup, Ed25519, Hashlock, SwapSecret};
pub use helpers::Timestamp;
pub use state_machine::{AtomicLock, CallContext, DeployParams, LockError, LockStage, SwapEvent};
