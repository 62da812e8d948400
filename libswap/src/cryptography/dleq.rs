//! Discrete-log equality proofs binding a hashlock to an adaptor point.
//!
//! The prover shows knowledge of a single `t` with `T = t·G` and `U = t·Y`, where `t` is the swap secret reduced mod n
//! and the hashlock `H = SHA-256(secret)` is bound into the Fiat-Shamir challenge. A verified proof therefore ties the
//! hashlock the settlement contract releases funds against to the adaptor point used on the other chain.
//!
//! ```text
//!   R1 = k·G,  R2 = k·Y
//!   c  = BLAKE2b-256(tag || tag || G || Y || T || U || R1 || R2 || H) mod n
//!   s  = k + c·t
//!   verify: s·G + (-c)·T == R1  and  s·Y + (-c)·U == R2
//! ```
//!
//! The verifier never multiplies a point by a full scalar itself. Each of the four products in the verification
//! equations arrives with an [`MsmHint`] that is checked by [`msm::verify`].

use crate::config::SwapConfig;
use crate::cryptography::codec::{validate, EncodedPoint, PointError};
use crate::cryptography::curve::CurveGroup;
use crate::cryptography::hashes::{challenge_hasher, nonce_hasher, Hashlock};
use crate::cryptography::msm::{self, MsmError, MsmHint};
use crate::cryptography::scalar::{self, ScalarError};
use crate::cryptography::secret::SwapSecret;
use crate::error::ErrorKind;
use crate::helpers::{array_from_hex, to_hex};
use digest::Digest;
use log::*;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use thiserror::Error;
use zeroize::Zeroizing;

/// Number of nonce derivations tried before giving up when no configuration is supplied.
pub const DEFAULT_NONCE_ATTEMPTS: u32 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DleqError {
    #[error("The secret reduces to zero modulo the group order.")]
    ZeroScalar,
    #[error("The hashlock does not match SHA-256 of the secret.")]
    HashlockMismatch,
    #[error("The adaptor point supplied is not t·G for this secret.")]
    PointMismatch,
    #[error("No usable nonce was found after {attempts} attempts.")]
    NonceExhausted { attempts: u32 },
    #[error("The {which} point is invalid. {source}")]
    InvalidPoint { which: &'static str, source: PointError },
    #[error("Invalid scalar in proof. {0}")]
    Scalar(#[from] ScalarError),
    #[error("The recomputed challenge does not match the proof's challenge.")]
    ChallengeMismatch,
    #[error("The MSM hint for {which} was rejected. {source}")]
    Msm { which: &'static str, source: MsmError },
    #[error("The DLEQ verification equations do not hold.")]
    EquationFailed,
}

impl DleqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DleqError::ZeroScalar
            | DleqError::HashlockMismatch
            | DleqError::PointMismatch
            | DleqError::NonceExhausted { .. } => ErrorKind::InvalidInput,
            DleqError::InvalidPoint { .. } => ErrorKind::PointValidationFailure,
            DleqError::Scalar(e) => e.kind(),
            DleqError::Msm { source, .. } => source.kind(),
            DleqError::ChallengeMismatch | DleqError::EquationFailed => ErrorKind::ProofInvalid,
        }
    }
}

/// The commitments, challenge and response of a DLEQ proof.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DleqProof<C: CurveGroup> {
    pub r1: C::Point,
    pub r2: C::Point,
    pub c: C::Scalar,
    pub s: C::Scalar,
}

impl<C: CurveGroup> Debug for DleqProof<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DleqProof")
            .field("r1", &C::compress(&self.r1))
            .field("r2", &C::compress(&self.r2))
            .field("c", &hex::encode(C::scalar_to_bytes(&self.c)))
            .field("s", &hex::encode(C::scalar_to_bytes(&self.s)))
            .finish()
    }
}

/// Everything a successful proof run produces: the public points, the proof and the hashlock it is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DleqOutput<C: CurveGroup> {
    /// `T = t·G`
    pub adaptor_point: C::Point,
    /// `U = t·Y`
    pub second_point: C::Point,
    pub proof: DleqProof<C>,
    pub hashlock: Hashlock,
}

/// The result of one nonce derivation. Degenerate values (a zero nonce, challenge or response) are retried with the
/// next counter value rather than failing the proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonceAttempt<T> {
    Ready(T),
    Retry,
}

#[derive(Clone, Copy, Debug)]
pub struct DleqProver<C: CurveGroup> {
    max_attempts: u32,
    _curve: PhantomData<C>,
}

impl<C: CurveGroup> Default for DleqProver<C> {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_ATTEMPTS)
    }
}

impl<C: CurveGroup> DleqProver<C> {
    pub fn new(max_attempts: u32) -> Self {
        DleqProver { max_attempts, _curve: PhantomData }
    }

    pub fn from_config(config: &SwapConfig) -> Self {
        Self::new(config.nonce_attempts())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Proves that `secret` opens `hashlock` and that `T = t·G`, `U = t·Y` share the same discrete log.
    pub fn prove(&self, secret: &SwapSecret, hashlock: &Hashlock) -> Result<DleqOutput<C>, DleqError> {
        let t = Zeroizing::new(secret.to_scalar::<C>());
        scalar::validate_nonzero::<C>(&t, "secret").map_err(|_| DleqError::ZeroScalar)?;
        if secret.hashlock() != *hashlock {
            return Err(DleqError::HashlockMismatch);
        }
        let g = C::generator();
        let y = C::second_generator();
        let adaptor_point = C::mul(&g, &t);
        let second_point = C::mul(&y, &t);

        let mut proof = None;
        for counter in 0..self.max_attempts {
            match Self::attempt(&t, hashlock, counter, &adaptor_point, &second_point) {
                NonceAttempt::Ready(p) => {
                    proof = Some(p);
                    break;
                }
                NonceAttempt::Retry => debug!("DLEQ nonce attempt {counter} was degenerate, retrying"),
            }
        }
        let proof = proof.ok_or(DleqError::NonceExhausted { attempts: self.max_attempts })?;

        // Final consistency checks before anything leaves the prover
        if C::mul(&g, &t) != adaptor_point {
            return Err(DleqError::PointMismatch);
        }
        if !hashlock.matches(secret.as_bytes()) {
            return Err(DleqError::HashlockMismatch);
        }
        trace!("DLEQ proof generated for hashlock {hashlock}");
        Ok(DleqOutput { adaptor_point, second_point, proof, hashlock: *hashlock })
    }

    /// As [`Self::prove`], additionally checking that the caller's adaptor point really is `t·G`.
    pub fn prove_for_adaptor(
        &self,
        secret: &SwapSecret,
        hashlock: &Hashlock,
        adaptor_point: &C::Point,
    ) -> Result<DleqOutput<C>, DleqError> {
        let output = self.prove(secret, hashlock)?;
        if output.adaptor_point != *adaptor_point {
            return Err(DleqError::PointMismatch);
        }
        Ok(output)
    }

    fn attempt(
        t: &C::Scalar,
        hashlock: &Hashlock,
        counter: u32,
        adaptor_point: &C::Point,
        second_point: &C::Point,
    ) -> NonceAttempt<DleqProof<C>> {
        let k = match derive_nonce::<C>(t, hashlock, counter) {
            NonceAttempt::Ready(k) => Zeroizing::new(k),
            NonceAttempt::Retry => return NonceAttempt::Retry,
        };
        let r1 = C::mul(&C::generator(), &k);
        let r2 = C::mul(&C::second_generator(), &k);
        let c = compute_challenge::<C>(adaptor_point, second_point, &r1, &r2, hashlock);
        if scalar::is_zero::<C>(&c) {
            return NonceAttempt::Retry;
        }
        let s = *k + c * *t;
        if scalar::is_zero::<C>(&s) {
            return NonceAttempt::Retry;
        }
        NonceAttempt::Ready(DleqProof { r1, r2, c, s })
    }
}

/// `k = BLAKE2b-512(nonce_tag || t || H || counter)` reduced mod n.
pub fn derive_nonce<C: CurveGroup>(t: &C::Scalar, hashlock: &Hashlock, counter: u32) -> NonceAttempt<C::Scalar> {
    let t_bytes = Zeroizing::new(C::scalar_to_bytes(t));
    let mut hasher = nonce_hasher();
    hasher.update(t_bytes.as_slice());
    hasher.update(hashlock.as_bytes());
    hasher.update(counter.to_le_bytes());
    let mut wide = Zeroizing::new([0u8; 64]);
    wide.copy_from_slice(&hasher.finalize());
    let k = scalar::reduce_wide::<C>(&wide);
    match scalar::is_zero::<C>(&k) {
        true => NonceAttempt::Retry,
        false => NonceAttempt::Ready(k),
    }
}

/// The Fiat-Shamir challenge over the generators, the public points, the commitments and the hashlock.
pub fn compute_challenge<C: CurveGroup>(
    adaptor_point: &C::Point,
    second_point: &C::Point,
    r1: &C::Point,
    r2: &C::Point,
    hashlock: &Hashlock,
) -> C::Scalar {
    let mut hasher = challenge_hasher();
    for point in [&C::generator(), &C::second_generator(), adaptor_point, second_point, r1, r2] {
        hasher.update(C::compress(point).as_bytes());
    }
    hasher.update(hashlock.as_bytes());
    scalar::hash_to_scalar::<C>(hasher.finalize().into())
}

/// A 32-byte little-endian scalar as it arrives on the wire. It is only interpreted (and checked for canonicity) by the
/// verifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalarBytes(#[serde(serialize_with = "to_hex", deserialize_with = "array_from_hex")] pub [u8; 32]);

impl ScalarBytes {
    pub fn from_scalar<C: CurveGroup>(scalar: &C::Scalar) -> Self {
        ScalarBytes(C::scalar_to_bytes(scalar))
    }
}

impl Debug for ScalarBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScalarBytes({})", hex::encode(self.0))
    }
}

/// The MSM witnesses for the four scalar multiplications in the verification equations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqHints {
    /// `s·G`
    pub s_g: MsmHint,
    /// `(-c)·T`
    pub neg_c_t: MsmHint,
    /// `s·Y`
    pub s_y: MsmHint,
    /// `(-c)·U`
    pub neg_c_u: MsmHint,
}

/// The complete, untrusted material submitted to the verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqVerificationInput {
    pub hashlock: Hashlock,
    pub adaptor_point: EncodedPoint,
    pub second_point: EncodedPoint,
    pub r1: EncodedPoint,
    pub r2: EncodedPoint,
    pub c: ScalarBytes,
    pub s: ScalarBytes,
    pub hints: DleqHints,
}

/// The points of a proof that passed verification. Only [`DleqVerifier::verify`] constructs this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifiedDleq<C: CurveGroup> {
    adaptor_point: C::Point,
    second_point: C::Point,
    hashlock: Hashlock,
}

impl<C: CurveGroup> VerifiedDleq<C> {
    pub fn adaptor_point(&self) -> &C::Point {
        &self.adaptor_point
    }

    pub fn second_point(&self) -> &C::Point {
        &self.second_point
    }

    pub fn hashlock(&self) -> &Hashlock {
        &self.hashlock
    }
}

pub struct DleqVerifier<C: CurveGroup> {
    _curve: PhantomData<C>,
}

impl<C: CurveGroup> DleqVerifier<C> {
    /// All-or-nothing verification. Any invalid point, scalar, hint or equation rejects the whole proof.
    pub fn verify(input: &DleqVerificationInput) -> Result<VerifiedDleq<C>, DleqError> {
        let t = Self::point("adaptor", &input.adaptor_point)?;
        let u = Self::point("second", &input.second_point)?;
        let r1 = Self::point("R1", &input.r1)?;
        let r2 = Self::point("R2", &input.r2)?;

        let c = scalar::from_canonical::<C>(input.c.0, "challenge")?;
        let s = scalar::from_canonical::<C>(input.s.0, "response")?;
        scalar::validate_nonzero::<C>(&c, "challenge")?;
        scalar::validate_nonzero::<C>(&s, "response")?;

        let expected = compute_challenge::<C>(&t, &u, &r1, &r2, &input.hashlock);
        if expected != c {
            debug!("DLEQ challenge mismatch for hashlock {}", input.hashlock);
            return Err(DleqError::ChallengeMismatch);
        }

        let neg_c = -c;
        let hints = &input.hints;
        let s_g = Self::msm("s·G", &s, &C::generator(), &hints.s_g)?;
        let neg_c_t = Self::msm("(-c)·T", &neg_c, &t, &hints.neg_c_t)?;
        let s_y = Self::msm("s·Y", &s, &C::second_generator(), &hints.s_y)?;
        let neg_c_u = Self::msm("(-c)·U", &neg_c, &u, &hints.neg_c_u)?;

        if s_g + neg_c_t != r1 || s_y + neg_c_u != r2 {
            debug!("DLEQ verification equations failed for hashlock {}", input.hashlock);
            return Err(DleqError::EquationFailed);
        }
        trace!("DLEQ proof verified for hashlock {}", input.hashlock);
        Ok(VerifiedDleq { adaptor_point: t, second_point: u, hashlock: input.hashlock })
    }

    fn point(which: &'static str, encoded: &EncodedPoint) -> Result<C::Point, DleqError> {
        validate::<C>(encoded).map_err(|source| DleqError::InvalidPoint { which, source })
    }

    fn msm(which: &'static str, k: &C::Scalar, p: &C::Point, hint: &MsmHint) -> Result<C::Point, DleqError> {
        msm::verify::<C>(k, p, hint).map_err(|source| DleqError::Msm { which, source })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cryptography::codec::SqrtHint;
    use crate::cryptography::curve::Ed25519;
    use crate::cryptography::field::FieldElement;
    use crate::cryptography::witness::{build_verification_input, encode_point};
    use curve25519_dalek::constants::EIGHT_TORSION;
    use curve25519_dalek::Scalar;

    fn secret() -> SwapSecret {
        SwapSecret::new([0x12; 32])
    }

    fn prove() -> DleqOutput<Ed25519> {
        let secret = secret();
        DleqProver::<Ed25519>::default().prove(&secret, &secret.hashlock()).unwrap()
    }

    #[test]
    fn proof_verifies() {
        let output = prove();
        let t = secret().to_scalar::<Ed25519>();
        assert_eq!(output.adaptor_point, Ed25519::generator() * t);
        assert_eq!(output.second_point, Ed25519::second_generator() * t);
        let input = build_verification_input(&output).unwrap();
        let verified = DleqVerifier::<Ed25519>::verify(&input).unwrap();
        assert_eq!(verified.adaptor_point(), &output.adaptor_point);
        assert_eq!(verified.hashlock(), &secret().hashlock());
    }

    #[test]
    fn proofs_are_deterministic() {
        assert_eq!(prove(), prove());
    }

    #[test]
    fn prover_rejects_bad_input() {
        let prover = DleqProver::<Ed25519>::default();
        let secret = secret();
        let other = SwapSecret::new([0x13; 32]);
        assert_eq!(prover.prove(&secret, &other.hashlock()), Err(DleqError::HashlockMismatch));
        let zero = SwapSecret::new([0u8; 32]);
        assert_eq!(prover.prove(&zero, &zero.hashlock()), Err(DleqError::ZeroScalar));
        let wrong_t = Ed25519::generator() * Scalar::from(7u64);
        assert_eq!(
            prover.prove_for_adaptor(&secret, &secret.hashlock(), &wrong_t),
            Err(DleqError::PointMismatch)
        );
        assert_eq!(
            DleqProver::<Ed25519>::new(0).prove(&secret, &secret.hashlock()),
            Err(DleqError::NonceExhausted { attempts: 0 })
        );
    }

    #[test]
    fn wrong_challenge_is_rejected() {
        let output = prove();
        let mut input = build_verification_input(&output).unwrap();
        input.c = ScalarBytes::from_scalar::<Ed25519>(&(output.proof.c + Scalar::ONE));
        assert_eq!(DleqVerifier::<Ed25519>::verify(&input), Err(DleqError::ChallengeMismatch));
    }

    #[test]
    fn wrong_hashlock_is_rejected() {
        let output = prove();
        let mut input = build_verification_input(&output).unwrap();
        input.hashlock = SwapSecret::new([0x13; 32]).hashlock();
        assert_eq!(DleqVerifier::<Ed25519>::verify(&input), Err(DleqError::ChallengeMismatch));
    }

    #[test]
    fn zero_and_non_canonical_scalars_are_rejected() {
        let output = prove();
        let mut input = build_verification_input(&output).unwrap();
        input.s = ScalarBytes([0u8; 32]);
        assert_eq!(DleqVerifier::<Ed25519>::verify(&input), Err(DleqError::Scalar(ScalarError::Zero("response"))));
        input.s = ScalarBytes([0xff; 32]);
        assert_eq!(
            DleqVerifier::<Ed25519>::verify(&input),
            Err(DleqError::Scalar(ScalarError::NonCanonical("response")))
        );
    }

    #[test]
    fn consistent_hints_for_a_shifted_response_fail_the_equations() {
        // Honest MSM hints for a wrong s get past the hint checks and must be caught by the final equations
        let mut output = prove();
        output.proof.s = output.proof.s + Scalar::ONE;
        let input = build_verification_input(&output).unwrap();
        assert_eq!(DleqVerifier::<Ed25519>::verify(&input), Err(DleqError::EquationFailed));

        let mut output = prove();
        output.proof.r2 = output.proof.r2 + Ed25519::second_generator();
        let input = build_verification_input(&output).unwrap();
        assert_eq!(DleqVerifier::<Ed25519>::verify(&input), Err(DleqError::ChallengeMismatch));
    }

    #[test]
    fn invalid_points_are_rejected() {
        let output = prove();
        let mut input = build_verification_input(&output).unwrap();
        input.adaptor_point.sqrt_hint = SqrtHint::new(FieldElement::one());
        assert_eq!(
            DleqVerifier::<Ed25519>::verify(&input),
            Err(DleqError::InvalidPoint { which: "adaptor", source: PointError::InvalidSqrtHint })
        );

        let mut input = build_verification_input(&output).unwrap();
        input.r1 = encode_point::<Ed25519>(&EIGHT_TORSION[2]).unwrap();
        let err = DleqVerifier::<Ed25519>::verify(&input).unwrap_err();
        assert_eq!(err, DleqError::InvalidPoint { which: "R1", source: PointError::SmallOrder });
        assert_eq!(err.kind(), ErrorKind::PointValidationFailure);
    }

    #[test]
    fn swapped_hints_are_rejected() {
        let output = prove();
        let mut input = build_verification_input(&output).unwrap();
        std::mem::swap(&mut input.hints.s_g, &mut input.hints.s_y);
        let err = DleqVerifier::<Ed25519>::verify(&input).unwrap_err();
        assert!(matches!(err, DleqError::Msm { which: "s·G", .. }), "{err}");
        assert_eq!(err.kind(), ErrorKind::ProofInvalid);
    }
}
