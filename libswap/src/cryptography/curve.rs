//! The group capability the protocol code is written against.
//!
//! DLEQ proving, DLEQ verification and MSM witness checks only ever talk to a [`CurveGroup`]. The single
//! implementation, [`Ed25519`], delegates the actual arithmetic to curve25519-dalek.

use crate::cryptography::codec::{self, AffinePoint, CompressedPoint, PointError};
use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::traits::{Identity, IsIdentity};
use curve25519_dalek::{EdwardsPoint, Scalar};
use num_bigint::BigUint;
use num_traits::One;
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::LazyLock;
use zeroize::Zeroize;

pub trait CurveGroup {
    type Scalar: Copy
        + Debug
        + PartialEq
        + Eq
        + Zeroize
        + From<u64>
        + From<u128>
        + Add<Output = Self::Scalar>
        + Sub<Output = Self::Scalar>
        + Mul<Output = Self::Scalar>
        + Neg<Output = Self::Scalar>;
    type Point: Copy + Debug + PartialEq + Eq + Add<Output = Self::Point> + Neg<Output = Self::Point>;

    fn name() -> &'static str;

    /// The standard generator G.
    fn generator() -> Self::Point;

    /// A second generator Y whose discrete log relative to G is unknown.
    fn second_generator() -> Self::Point;

    fn identity() -> Self::Point;

    fn double(point: &Self::Point) -> Self::Point {
        *point + *point
    }

    /// Full-length, constant-time scalar multiplication.
    fn mul(point: &Self::Point, scalar: &Self::Scalar) -> Self::Point;

    fn compress(point: &Self::Point) -> CompressedPoint;

    fn to_affine(point: &Self::Point) -> Result<AffinePoint, PointError>;

    fn from_affine(affine: &AffinePoint) -> Result<Self::Point, PointError>;

    fn is_small_order(point: &Self::Point) -> bool;

    fn is_torsion_free(point: &Self::Point) -> bool;

    /// The prime order n of the group generated by G.
    fn order() -> &'static BigUint;

    fn scalar_from_bytes_mod_order(bytes: [u8; 32]) -> Self::Scalar;

    fn scalar_from_bytes_mod_order_wide(bytes: &[u8; 64]) -> Self::Scalar;

    fn scalar_from_canonical_bytes(bytes: [u8; 32]) -> Option<Self::Scalar>;

    fn scalar_to_bytes(scalar: &Self::Scalar) -> [u8; 32];
}

/// Monero's alternate generator H, the second base of Monero-side cross-group DLEQ proofs. It is the cofactor-cleared
/// hash of G to the curve, so its discrete log with respect to G is unknown.
const SECOND_GENERATOR_BYTES: [u8; 32] = [
    0x8b, 0x65, 0x59, 0x70, 0x15, 0x37, 0x99, 0xaf, 0x2a, 0xea, 0xdc, 0x9f, 0xf1, 0xad, 0xd0, 0xea, 0x6c, 0x72, 0x51,
    0xd5, 0x41, 0x54, 0xcf, 0xa9, 0x2c, 0x17, 0x3a, 0x0d, 0xd3, 0x9c, 0x1f, 0x94,
];

static SECOND_GENERATOR: LazyLock<EdwardsPoint> = LazyLock::new(|| {
    CompressedEdwardsY(SECOND_GENERATOR_BYTES).decompress().expect("Hardcoded second generator is not a valid point")
});

/// n = 2^252 + 27742317777372353535851937790883648493
static ED25519_ORDER: LazyLock<BigUint> = LazyLock::new(|| {
    (BigUint::one() << 252u32) + BigUint::from(27_742_317_777_372_353_535_851_937_790_883_648_493u128)
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ed25519;

impl CurveGroup for Ed25519 {
    type Scalar = Scalar;
    type Point = EdwardsPoint;

    fn name() -> &'static str {
        "Ed25519"
    }

    fn generator() -> EdwardsPoint {
        ED25519_BASEPOINT_POINT
    }

    fn second_generator() -> EdwardsPoint {
        *SECOND_GENERATOR
    }

    fn identity() -> EdwardsPoint {
        EdwardsPoint::identity()
    }

    fn mul(point: &EdwardsPoint, scalar: &Scalar) -> EdwardsPoint {
        point * scalar
    }

    fn compress(point: &EdwardsPoint) -> CompressedPoint {
        CompressedPoint::from_bytes(point.compress().to_bytes())
    }

    fn to_affine(point: &EdwardsPoint) -> Result<AffinePoint, PointError> {
        let compressed = Self::compress(point);
        let hint = codec::sqrt_hint_for(&compressed).ok_or(PointError::NotOnCurve)?;
        codec::try_decompress(&compressed, &hint)
    }

    fn from_affine(affine: &AffinePoint) -> Result<EdwardsPoint, PointError> {
        codec::assert_on_curve(affine)?;
        // An on-curve (x, y) is the unique point with that y and the parity of x, so dalek's decompression of our
        // compressed form yields exactly this point.
        CompressedEdwardsY(affine.compress().to_bytes()).decompress().ok_or(PointError::NotOnCurve)
    }

    fn is_small_order(point: &EdwardsPoint) -> bool {
        point.mul_by_cofactor().is_identity()
    }

    fn is_torsion_free(point: &EdwardsPoint) -> bool {
        point.is_torsion_free()
    }

    fn order() -> &'static BigUint {
        &ED25519_ORDER
    }

    fn scalar_from_bytes_mod_order(bytes: [u8; 32]) -> Scalar {
        Scalar::from_bytes_mod_order(bytes)
    }

    fn scalar_from_bytes_mod_order_wide(bytes: &[u8; 64]) -> Scalar {
        Scalar::from_bytes_mod_order_wide(bytes)
    }

    fn scalar_from_canonical_bytes(bytes: [u8; 32]) -> Option<Scalar> {
        Scalar::from_canonical_bytes(bytes).into_option()
    }

    fn scalar_to_bytes(scalar: &Scalar) -> [u8; 32] {
        scalar.to_bytes()
    }
}
