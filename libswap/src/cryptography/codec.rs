//! Point compression with hint-assisted decompression.
//!
//! A compressed Edwards25519 point is the little-endian y-coordinate with the parity of x in bit 255. Recovering x
//! normally costs a field exponentiation; here the sender ships the x-coordinate alongside as a [`SqrtHint`], and the
//! receiver only has to *square* it and compare against `(y²-1)/(d·y²+1)`. The hint is never trusted: a hint that does
//! not square to x² makes decompression fail.
//!
//! Decompression alone is not validation. Use [`validate`] (or [`assert_on_curve`] and [`reject_small_order`]
//! explicitly) before a decompressed point is used for anything.

use crate::cryptography::curve::CurveGroup;
use crate::cryptography::field::FieldElement;
use crate::error::ErrorKind;
use crate::helpers::{array_from_hex, bytes32_from_hex, to_hex};
use log::*;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PointError {
    #[error("The compressed y-coordinate is not a canonical field element.")]
    NonCanonicalEncoding,
    #[error("The square-root hint does not square to the recovered x² value.")]
    InvalidSqrtHint,
    #[error("The point does not satisfy the curve equation.")]
    NotOnCurve,
    #[error("The point is the identity.")]
    Identity,
    #[error("The point lies in the small-order (8-torsion) subgroup.")]
    SmallOrder,
    #[error("The point has a non-trivial torsion component.")]
    TorsionComponent,
}

impl PointError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PointValidationFailure
    }
}

/// The 32-byte compressed form of a curve point: y in little-endian with the sign of x in the top bit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressedPoint(#[serde(serialize_with = "to_hex", deserialize_with = "array_from_hex")] [u8; 32]);

impl CompressedPoint {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        CompressedPoint(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// The encoded sign (parity) of the x-coordinate.
    pub fn sign_bit(&self) -> bool {
        self.0[31] >> 7 == 1
    }

    /// The y-coordinate bytes with the sign bit cleared.
    pub fn y_bytes(&self) -> [u8; 32] {
        let mut y = self.0;
        y[31] &= 0x7f;
        y
    }

    pub fn from_hex(hex_str: &str) -> Option<Self> {
        bytes32_from_hex(hex_str).map(CompressedPoint)
    }

    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Debug for CompressedPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompressedPoint({})", self.as_hex())
    }
}

impl Display for CompressedPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

/// A claimed x-coordinate (up to sign) for a compressed point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqrtHint(FieldElement);

impl SqrtHint {
    pub fn new(value: FieldElement) -> Self {
        SqrtHint(value)
    }

    pub fn as_field_element(&self) -> &FieldElement {
        &self.0
    }
}

/// A point in affine coordinates on -x² + y² = 1 + d·x²·y².
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinePoint {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl AffinePoint {
    pub fn new(x: FieldElement, y: FieldElement) -> Self {
        AffinePoint { x, y }
    }

    pub fn identity() -> Self {
        AffinePoint { x: FieldElement::zero(), y: FieldElement::one() }
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y == FieldElement::one()
    }

    pub fn is_on_curve(&self) -> bool {
        let xx = self.x.square();
        let yy = self.y.square();
        let lhs = &yy - &xx;
        let rhs = FieldElement::one() + &(FieldElement::edwards_d() * &xx) * &yy;
        lhs == rhs
    }

    pub fn compress(&self) -> CompressedPoint {
        compress(self)
    }
}

/// A compressed point together with the hint needed to decompress it cheaply. This is the wire form of every point
/// the verifier receives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPoint {
    pub compressed: CompressedPoint,
    pub sqrt_hint: SqrtHint,
}

impl EncodedPoint {
    pub fn new(compressed: CompressedPoint, sqrt_hint: SqrtHint) -> Self {
        EncodedPoint { compressed, sqrt_hint }
    }
}

pub fn compress(point: &AffinePoint) -> CompressedPoint {
    let mut bytes = point.y.to_bytes();
    bytes[31] |= (point.x.is_negative() as u8) << 7;
    CompressedPoint(bytes)
}

/// Recovers the affine point encoded by `compressed`, using `hint` as the claimed x-coordinate.
///
/// Returns `None` if y is not canonical, if the hint fails the algebraic check, or if the encoding is the
/// non-canonical "negative zero" x.
pub fn decompress(compressed: &CompressedPoint, hint: &SqrtHint) -> Option<AffinePoint> {
    try_decompress(compressed, hint).ok()
}

pub(crate) fn try_decompress(compressed: &CompressedPoint, hint: &SqrtHint) -> Result<AffinePoint, PointError> {
    let y = FieldElement::from_canonical_bytes(&compressed.y_bytes()).ok_or(PointError::NonCanonicalEncoding)?;
    let x2 = x_squared(&y).ok_or(PointError::NotOnCurve)?;
    let x = hint.as_field_element();
    if x.square() != x2 {
        trace!("Square-root hint rejected for {compressed}");
        return Err(PointError::InvalidSqrtHint);
    }
    let sign = compressed.sign_bit();
    let x = if x.is_negative() != sign { -x } else { x.clone() };
    if x.is_zero() && sign {
        return Err(PointError::NonCanonicalEncoding);
    }
    Ok(AffinePoint { x, y })
}

/// x² = (y² - 1) / (d·y² + 1). The denominator never vanishes on Edwards25519 since d is not a square, but the
/// inversion is still checked.
fn x_squared(y: &FieldElement) -> Option<FieldElement> {
    let yy = y.square();
    let u = &yy - &FieldElement::one();
    let v = &(&yy * FieldElement::edwards_d()) + &FieldElement::one();
    Some(u * v.invert()?)
}

/// Computes the square-root hint for a compressed point. This is the expensive direction and is only used by witness
/// generation.
pub fn sqrt_hint_for(compressed: &CompressedPoint) -> Option<SqrtHint> {
    let y = FieldElement::from_canonical_bytes(&compressed.y_bytes())?;
    let x = x_squared(&y)?.sqrt()?;
    Some(SqrtHint(x))
}

pub fn assert_on_curve(point: &AffinePoint) -> Result<(), PointError> {
    match point.is_on_curve() {
        true => Ok(()),
        false => Err(PointError::NotOnCurve),
    }
}

/// Rejects the identity and the other seven points of the 8-torsion subgroup.
pub fn reject_small_order<C: CurveGroup>(point: &C::Point) -> Result<(), PointError> {
    if *point == C::identity() {
        return Err(PointError::Identity);
    }
    if C::is_small_order(point) {
        return Err(PointError::SmallOrder);
    }
    Ok(())
}

/// Full validation of a group element received from an untrusted source: not small order and free of torsion.
pub fn validate_point<C: CurveGroup>(point: &C::Point) -> Result<(), PointError> {
    reject_small_order::<C>(point)?;
    if !C::is_torsion_free(point) {
        return Err(PointError::TorsionComponent);
    }
    Ok(())
}

/// Decompresses `encoded` and runs every check a point must pass before the protocol may use it.
pub fn validate<C: CurveGroup>(encoded: &EncodedPoint) -> Result<C::Point, PointError> {
    let affine = try_decompress(&encoded.compressed, &encoded.sqrt_hint)?;
    assert_on_curve(&affine)?;
    let point = C::from_affine(&affine)?;
    validate_point::<C>(&point)?;
    Ok(point)
}
