//! Witness-assisted scalar multiplication.
//!
//! The settlement layer cannot afford a full 256-bit double-and-add for every `k·P` it needs. Instead the prover
//! supplies the claimed result `Q` together with a short decomposition `(s1, s2)` of `k`:
//!
//! ```text
//!     s1 + k·s2 ≡ 0 (mod n),   0 < s1 < 2^128,   0 < |s2| < 2^128
//! ```
//!
//! If `s1·P + s2·Q` is the identity then `s2·(Q - k·P)` is the identity, and since both points live in the prime-order
//! subgroup and `s2` is nonzero mod n, `Q = k·P`. The check only needs 128 doublings.
//!
//! Nothing in an [`MsmHint`] is trusted. A hint that fails any part of the check is a hard failure.

use crate::cryptography::codec::{validate_point, AffinePoint, PointError};
use crate::cryptography::curve::CurveGroup;
use crate::cryptography::scalar;
use crate::error::ErrorKind;
use log::*;
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MsmError {
    #[error("The scalar being multiplied is zero.")]
    ZeroScalar,
    #[error("A component of the scalar decomposition is zero.")]
    ZeroComponent,
    #[error("The hint does not satisfy s1 + k·s2 = 0 (mod n).")]
    InvalidDecomposition,
    #[error("The claimed result point is invalid. {0}")]
    InvalidResultPoint(PointError),
    #[error("The claimed result point is not k·P.")]
    PointMismatch,
    #[error("The scalar decomposition does not fit into 128 bits.")]
    DecompositionOverflow,
}

impl MsmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MsmError::ZeroScalar => ErrorKind::InvalidInput,
            MsmError::InvalidResultPoint(_) => ErrorKind::PointValidationFailure,
            _ => ErrorKind::ProofInvalid,
        }
    }
}

/// A signed integer with magnitude below 2^128. Zero is always non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedHalfScalar {
    magnitude: u128,
    negative: bool,
}

impl SignedHalfScalar {
    pub fn new(magnitude: u128, negative: bool) -> Self {
        SignedHalfScalar { magnitude, negative: negative && magnitude != 0 }
    }

    pub fn positive(magnitude: u128) -> Self {
        Self::new(magnitude, false)
    }

    pub fn magnitude(&self) -> u128 {
        self.magnitude
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == 0
    }

    /// The value as a group scalar (negatives map to `n - |v|`).
    pub fn to_scalar<C: CurveGroup>(&self) -> C::Scalar {
        let s = C::Scalar::from(self.magnitude);
        match self.negative {
            true => -s,
            false => s,
        }
    }

    fn try_from_bigint(value: &BigInt) -> Option<Self> {
        let magnitude = value.abs().to_u128()?;
        Some(Self::new(magnitude, value.is_negative()))
    }
}

/// The prover-supplied witness for one scalar multiplication `k·P`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsmHint {
    /// The claimed result `k·P`.
    pub q: AffinePoint,
    pub s1: u128,
    pub s2: SignedHalfScalar,
}

impl MsmHint {
    /// Produces the hint for `k·P`. This is prover-side tooling; the verifier never calls it.
    pub fn generate<C: CurveGroup>(k: &C::Scalar, point: &C::Point) -> Result<Self, MsmError> {
        if scalar::is_zero::<C>(k) {
            return Err(MsmError::ZeroScalar);
        }
        let q = C::to_affine(&C::mul(point, k)).map_err(MsmError::InvalidResultPoint)?;
        let (s1, s2) = decompose::<C>(k)?;
        Ok(MsmHint { q, s1, s2 })
    }
}

/// Finds `(s1, s2)` with `s1 + k·s2 ≡ 0 (mod n)` and both below √n, by running the extended Euclidean algorithm on
/// `(n, k)` until the remainder drops below √n.
pub fn decompose<C: CurveGroup>(k: &C::Scalar) -> Result<(u128, SignedHalfScalar), MsmError> {
    let n = BigInt::from_biguint(Sign::Plus, C::order().clone());
    let k = BigInt::from_biguint(Sign::Plus, scalar::to_biguint::<C>(k));
    if k.is_zero() {
        return Err(MsmError::ZeroScalar);
    }
    let bound = n.sqrt();
    // invariant: r_i ≡ t_i·k (mod n)
    let (mut r0, mut r1) = (n, k);
    let (mut t0, mut t1) = (BigInt::zero(), BigInt::from(1));
    while r1 >= bound {
        let q = &r0 / &r1;
        let r2 = &r0 - &q * &r1;
        let t2 = &t0 - &q * &t1;
        r0 = std::mem::replace(&mut r1, r2);
        t0 = std::mem::replace(&mut t1, t2);
    }
    let s1 = r1.to_u128().ok_or(MsmError::DecompositionOverflow)?;
    let s2 = SignedHalfScalar::try_from_bigint(&-t1).ok_or(MsmError::DecompositionOverflow)?;
    if s1 == 0 || s2.is_zero() {
        return Err(MsmError::ZeroComponent);
    }
    Ok((s1, s2))
}

/// Checks `hint` against `k·point` and returns the (now trusted) result point.
///
/// `point` must already be validated by the caller (torsion-free, not small order).
pub fn verify<C: CurveGroup>(k: &C::Scalar, point: &C::Point, hint: &MsmHint) -> Result<C::Point, MsmError> {
    if scalar::is_zero::<C>(k) {
        return Err(MsmError::ZeroScalar);
    }
    if hint.s1 == 0 || hint.s2.is_zero() {
        return Err(MsmError::ZeroComponent);
    }
    let relation = C::Scalar::from(hint.s1) + *k * hint.s2.to_scalar::<C>();
    if !scalar::is_zero::<C>(&relation) {
        return Err(MsmError::InvalidDecomposition);
    }
    let q = C::from_affine(&hint.q).map_err(MsmError::InvalidResultPoint)?;
    validate_point::<C>(&q).map_err(MsmError::InvalidResultPoint)?;
    let signed_q = if hint.s2.is_negative() { -q } else { q };
    let check = double_and_add::<C>(hint.s1, point, hint.s2.magnitude(), &signed_q);
    if check != C::identity() {
        trace!("MSM hint rejected: s1·P + s2·Q is not the identity");
        return Err(MsmError::PointMismatch);
    }
    Ok(q)
}

/// `a·P + b·Q` with a shared doubling chain over 128 bits.
fn double_and_add<C: CurveGroup>(a: u128, p: &C::Point, b: u128, q: &C::Point) -> C::Point {
    let mut acc = C::identity();
    for i in (0..128).rev() {
        acc = C::double(&acc);
        if (a >> i) & 1 == 1 {
            acc = acc + *p;
        }
        if (b >> i) & 1 == 1 {
            acc = acc + *q;
        }
    }
    acc
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cryptography::curve::Ed25519;
    use crate::cryptography::field::FieldElement;
    use curve25519_dalek::{EdwardsPoint, Scalar};
    use num_bigint::BigUint;
    use rand::RngCore;

    fn random_scalar() -> Scalar {
        let mut bytes = [0u8; 64];
        rand::rng().fill_bytes(&mut bytes);
        Scalar::from_bytes_mod_order_wide(&bytes)
    }

    fn g() -> EdwardsPoint {
        Ed25519::generator()
    }

    #[test]
    fn valid_hints_verify() {
        for _ in 0..8 {
            let k = random_scalar();
            let p = g() * random_scalar();
            let hint = MsmHint::generate::<Ed25519>(&k, &p).unwrap();
            let q = verify::<Ed25519>(&k, &p, &hint).unwrap();
            assert_eq!(q, p * k);
        }
    }

    #[test]
    fn decomposition_is_short() {
        let bound = BigUint::from(1u8) << 127u32;
        for _ in 0..16 {
            let k = random_scalar();
            let (s1, s2) = decompose::<Ed25519>(&k).unwrap();
            assert!(BigUint::from(s1) < bound);
            assert!(BigUint::from(s2.magnitude()) < bound);
            assert_eq!(Scalar::from(s1) + k * s2.to_scalar::<Ed25519>(), Scalar::ZERO);
        }
    }

    #[test]
    fn edge_scalars() {
        let p = Ed25519::second_generator();
        for k in [Scalar::ONE, -Scalar::ONE, Scalar::from(2u64), -Scalar::from(12345u64)] {
            let hint = MsmHint::generate::<Ed25519>(&k, &p).unwrap();
            assert_eq!(verify::<Ed25519>(&k, &p, &hint).unwrap(), p * k);
        }
        let hint = MsmHint::generate::<Ed25519>(&Scalar::ONE, &p).unwrap();
        assert_eq!((hint.s1, hint.s2), (1, SignedHalfScalar::new(1, true)));
        let hint = MsmHint::generate::<Ed25519>(&-Scalar::ONE, &p).unwrap();
        assert_eq!((hint.s1, hint.s2), (1, SignedHalfScalar::positive(1)));
        assert_eq!(MsmHint::generate::<Ed25519>(&Scalar::ZERO, &p), Err(MsmError::ZeroScalar));
    }

    #[test]
    fn tampered_hints_are_rejected() {
        let k = random_scalar();
        let p = g() * random_scalar();
        let hint = MsmHint::generate::<Ed25519>(&k, &p).unwrap();

        let mut bad = hint.clone();
        bad.s1 += 1;
        assert_eq!(verify::<Ed25519>(&k, &p, &bad), Err(MsmError::InvalidDecomposition));

        let mut bad = hint.clone();
        bad.s2 = SignedHalfScalar::new(hint.s2.magnitude(), !hint.s2.is_negative());
        assert_eq!(verify::<Ed25519>(&k, &p, &bad), Err(MsmError::InvalidDecomposition));

        let mut bad = hint.clone();
        bad.s1 = 0;
        assert_eq!(verify::<Ed25519>(&k, &p, &bad), Err(MsmError::ZeroComponent));

        // right decomposition, wrong result point
        let mut bad = hint.clone();
        bad.q = Ed25519::to_affine(&(p * k + g())).unwrap();
        assert_eq!(verify::<Ed25519>(&k, &p, &bad), Err(MsmError::PointMismatch));

        // the hint for k is not a hint for k + 1
        assert!(verify::<Ed25519>(&(k + Scalar::ONE), &p, &hint).is_err());
    }

    #[test]
    fn invalid_result_points_are_rejected() {
        let k = random_scalar();
        let p = g();
        let mut hint = MsmHint::generate::<Ed25519>(&k, &p).unwrap();
        hint.q = AffinePoint::new(FieldElement::from(3u64), FieldElement::from(4u64));
        assert_eq!(verify::<Ed25519>(&k, &p, &hint), Err(MsmError::InvalidResultPoint(PointError::NotOnCurve)));

        // (0, -1) has order 2
        hint.q = AffinePoint::new(FieldElement::zero(), FieldElement::zero() - FieldElement::one());
        assert_eq!(verify::<Ed25519>(&k, &p, &hint), Err(MsmError::InvalidResultPoint(PointError::SmallOrder)));
    }
}
