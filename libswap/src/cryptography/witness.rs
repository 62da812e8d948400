//! Prover-side generation of the hints the verifier consumes.
//!
//! Everything here is off-chain tooling: square roots for compressed points, the four MSM decompositions of a DLEQ
//! proof, and the bundle a depositor hands to [`AtomicLock::deploy`](crate::state_machine::AtomicLock::deploy). None of
//! it is trusted by the verifying side.

use crate::config::SwapConfig;
use crate::cryptography::codec::{self, EncodedPoint, PointError, SqrtHint};
use crate::cryptography::curve::CurveGroup;
use crate::cryptography::dleq::{
    DleqError, DleqHints, DleqOutput, DleqProver, DleqVerificationInput, ScalarBytes,
};
use crate::cryptography::hashes::Hashlock;
use crate::cryptography::msm::{MsmError, MsmHint};
use crate::cryptography::secret::SwapSecret;
use crate::error::{ErrorKind, ReadError};
use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WitnessError {
    #[error("Could not encode the {which} point. {source}")]
    Point { which: &'static str, source: PointError },
    #[error("Could not build the MSM hint for {which}. {source}")]
    Msm { which: &'static str, source: MsmError },
    #[error("Proof generation failed. {0}")]
    Dleq(#[from] DleqError),
}

impl WitnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WitnessError::Point { source, .. } => source.kind(),
            WitnessError::Msm { source, .. } => source.kind(),
            WitnessError::Dleq(e) => e.kind(),
        }
    }
}

/// The square-root hint (the x-coordinate) for a point.
pub fn sqrt_hint_for<C: CurveGroup>(point: &C::Point) -> Result<SqrtHint, PointError> {
    codec::sqrt_hint_for(&C::compress(point)).ok_or(PointError::NotOnCurve)
}

pub fn encode_point<C: CurveGroup>(point: &C::Point) -> Result<EncodedPoint, PointError> {
    let compressed = C::compress(point);
    let hint = codec::sqrt_hint_for(&compressed).ok_or(PointError::NotOnCurve)?;
    Ok(EncodedPoint::new(compressed, hint))
}

/// Turns a proof into the complete verifier input: encoded points plus the four MSM hints.
pub fn build_verification_input<C: CurveGroup>(
    output: &DleqOutput<C>,
) -> Result<DleqVerificationInput, WitnessError> {
    let encode = |which: &'static str, point: &C::Point| {
        encode_point::<C>(point).map_err(|source| WitnessError::Point { which, source })
    };
    let hint = |which: &'static str, k: &C::Scalar, point: &C::Point| {
        MsmHint::generate::<C>(k, point).map_err(|source| WitnessError::Msm { which, source })
    };
    let proof = &output.proof;
    let neg_c = -proof.c;
    let hints = DleqHints {
        s_g: hint("s·G", &proof.s, &C::generator())?,
        neg_c_t: hint("(-c)·T", &neg_c, &output.adaptor_point)?,
        s_y: hint("s·Y", &proof.s, &C::second_generator())?,
        neg_c_u: hint("(-c)·U", &neg_c, &output.second_point)?,
    };
    Ok(DleqVerificationInput {
        hashlock: output.hashlock,
        adaptor_point: encode("adaptor", &output.adaptor_point)?,
        second_point: encode("second", &output.second_point)?,
        r1: encode("R1", &proof.r1)?,
        r2: encode("R2", &proof.r2)?,
        c: ScalarBytes::from_scalar::<C>(&proof.c),
        s: ScalarBytes::from_scalar::<C>(&proof.s),
        hints,
    })
}

/// The material a depositor needs to deploy a swap lock. The secret itself stays with the counterparty who will later
/// reveal it; only public values are in here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentWitness {
    pub hashlock: Hashlock,
    pub verification: DleqVerificationInput,
}

impl DeploymentWitness {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, ReadError> {
        serde_json::from_str(json).map_err(|e| ReadError::new("DeploymentWitness", e.to_string()))
    }
}

/// Runs the prover for `secret` and packages the result for deployment.
pub fn build_deployment<C: CurveGroup>(
    secret: &SwapSecret,
    hashlock: &Hashlock,
    config: &SwapConfig,
) -> Result<DeploymentWitness, WitnessError> {
    let output = DleqProver::<C>::from_config(config).prove(secret, hashlock)?;
    let verification = build_verification_input(&output)?;
    debug!("Deployment witness built for hashlock {hashlock} on {}", C::name());
    Ok(DeploymentWitness { hashlock: *hashlock, verification })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cryptography::curve::Ed25519;
    use crate::cryptography::dleq::DleqVerifier;
    use std::time::Duration;

    #[test]
    fn encoded_points_validate() {
        let g = Ed25519::generator();
        let encoded = encode_point::<Ed25519>(&g).unwrap();
        assert_eq!(codec::validate::<Ed25519>(&encoded).unwrap(), g);
        assert_eq!(&sqrt_hint_for::<Ed25519>(&g).unwrap(), &encoded.sqrt_hint);
    }

    #[test]
    fn deployment_witness_verifies_and_serializes() {
        let secret = SwapSecret::new([0x12; 32]);
        let config = SwapConfig::new(Duration::from_secs(7200));
        let witness = build_deployment::<Ed25519>(&secret, &secret.hashlock(), &config).unwrap();
        let verified = DleqVerifier::<Ed25519>::verify(&witness.verification).unwrap();
        assert_eq!(verified.hashlock(), &witness.hashlock);

        let json = witness.to_json().unwrap();
        let back = DeploymentWitness::from_json(&json).unwrap();
        assert_eq!(back, witness);
        assert!(DleqVerifier::<Ed25519>::verify(&back.verification).is_ok());
    }

    #[test]
    fn malformed_witness_json_is_a_read_error() {
        let err = DeploymentWitness::from_json("{\"hashlock\": \"00\"}").unwrap_err();
        assert_eq!(err.field(), "DeploymentWitness");
    }

    #[test]
    fn deployment_needs_matching_hashlock() {
        let secret = SwapSecret::new([0x12; 32]);
        let config = SwapConfig::new(Duration::from_secs(7200));
        let wrong = Hashlock::from_secret(&[0x34; 32]);
        let err = build_deployment::<Ed25519>(&secret, &wrong, &config).unwrap_err();
        assert_eq!(err, WitnessError::Dleq(DleqError::HashlockMismatch));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
