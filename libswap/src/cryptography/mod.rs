//! Cryptographic primitives
//!
//! Field and point arithmetic for Edwards25519 with hint-assisted decompression, the witness-checked scalar
//! multiplication the settlement layer relies on, and the DLEQ proof binding a hashlock to an adaptor point.
//!
//! Everything above the [`curve`] module is written against the [`CurveGroup`] trait rather than a concrete curve.

pub mod codec;
pub mod curve;
pub mod dleq;
pub mod field;
pub mod hashes;
pub mod key_splitting;
pub mod msm;
pub mod scalar;
pub mod secret;
pub mod witness;

pub use curve::{CurveGroup, Ed25519};
pub use hashes::Hashlock;
pub use secret::SwapSecret;
