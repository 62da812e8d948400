//! Arithmetic in GF(2^255 - 19), the base field of Edwards25519.
//!
//! curve25519-dalek keeps its field element type private, so the witness checks that need affine coordinates (square
//! root hints, MSM result points) run on this small big-integer implementation. It only ever handles public values and
//! makes no attempt at constant-time execution.

use crate::helpers::{array_from_hex, bytes32_from_hex};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::LazyLock;

static MODULUS: LazyLock<BigUint> = LazyLock::new(|| (BigUint::one() << 255u32) - 19u32);

/// The Edwards curve constant d = -121665/121666.
static EDWARDS_D: LazyLock<FieldElement> = LazyLock::new(|| {
    let num = -FieldElement::from(121_665u64);
    let den = FieldElement::from(121_666u64);
    // 121666 is a unit, so the pow-based inverse is exact
    num * den.pow(&(&*MODULUS - 2u32))
});

/// sqrt(-1) = 2^((p-1)/4)
static SQRT_M1: LazyLock<FieldElement> =
    LazyLock::new(|| FieldElement::from(2u64).pow(&((&*MODULUS - 1u32) >> 2usize)));

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn zero() -> Self {
        FieldElement(BigUint::zero())
    }

    pub fn one() -> Self {
        FieldElement(BigUint::one())
    }

    /// The field modulus p = 2^255 - 19.
    pub fn modulus() -> &'static BigUint {
        &MODULUS
    }

    pub fn edwards_d() -> &'static FieldElement {
        &EDWARDS_D
    }

    /// Reduces an arbitrary integer into the field.
    pub fn from_biguint(value: &BigUint) -> Self {
        FieldElement(value % &*MODULUS)
    }

    /// Interprets 32 little-endian bytes as a field element, rejecting values `>= p`.
    pub fn from_canonical_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let value = BigUint::from_bytes_le(bytes);
        if value >= *MODULUS {
            return None;
        }
        Some(FieldElement(value))
    }

    /// The canonical 32-byte little-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        let le = self.0.to_bytes_le();
        let mut out = [0u8; 32];
        out[..le.len()].copy_from_slice(&le);
        out
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The "sign" of a field element in the Ed25519 encoding: the parity of its canonical value.
    pub fn is_negative(&self) -> bool {
        self.0.bit(0)
    }

    pub fn square(&self) -> Self {
        self * self
    }

    pub fn pow(&self, exponent: &BigUint) -> Self {
        FieldElement(self.0.modpow(exponent, &MODULUS))
    }

    pub fn invert(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        Some(self.pow(&(&*MODULUS - 2u32)))
    }

    /// Computes a square root, returning the non-negative (even) one.
    ///
    /// This is the expensive operation the hint mechanism exists to avoid; it is only used to *produce* hints.
    pub fn sqrt(&self) -> Option<Self> {
        // p = 5 (mod 8): candidate = a^((p+3)/8) is a root of either a or -a
        let candidate = self.pow(&((&*MODULUS + 3u32) >> 3usize));
        let check = candidate.square();
        let root = if check == *self {
            candidate
        } else if check == -self {
            &candidate * &*SQRT_M1
        } else {
            return None;
        };
        match root.is_negative() {
            true => Some(-root),
            false => Some(root),
        }
    }

    pub fn as_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(hex_str: &str) -> Option<Self> {
        bytes32_from_hex(hex_str).and_then(|b| Self::from_canonical_bytes(&b))
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        FieldElement::from_biguint(&BigUint::from(value))
    }
}

impl Debug for FieldElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldElement({})", self.as_hex())
    }
}

impl Display for FieldElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.0.to_str_radix(16))
    }
}

impl<'a> Add<&'a FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &'a FieldElement) -> FieldElement {
        FieldElement((&self.0 + &rhs.0) % &*MODULUS)
    }
}

impl<'a> Sub<&'a FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &'a FieldElement) -> FieldElement {
        FieldElement((&self.0 + &*MODULUS - &rhs.0) % &*MODULUS)
    }
}

impl<'a> Mul<&'a FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &'a FieldElement) -> FieldElement {
        FieldElement((&self.0 * &rhs.0) % &*MODULUS)
    }
}

impl Neg for &FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        if self.is_zero() {
            return FieldElement::zero();
        }
        FieldElement(&*MODULUS - &self.0)
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        -&self
    }
}

macro_rules! owned_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<FieldElement> for FieldElement {
            type Output = FieldElement;

            fn $method(self, rhs: FieldElement) -> FieldElement {
                (&self).$method(&rhs)
            }
        }

        impl<'a> $trait<&'a FieldElement> for FieldElement {
            type Output = FieldElement;

            fn $method(self, rhs: &'a FieldElement) -> FieldElement {
                (&self).$method(rhs)
            }
        }

        impl $trait<FieldElement> for &FieldElement {
            type Output = FieldElement;

            fn $method(self, rhs: FieldElement) -> FieldElement {
                self.$method(&rhs)
            }
        }
    };
}

owned_binop!(Add, add);
owned_binop!(Sub, sub);
owned_binop!(Mul, mul);

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = array_from_hex(deserializer)?;
        FieldElement::from_canonical_bytes(&bytes)
            .ok_or_else(|| serde::de::Error::custom("field element is not canonical"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sqrt_m1_squares_to_minus_one() {
        assert_eq!(SQRT_M1.square(), -FieldElement::one());
    }

    #[test]
    fn d_matches_known_constant() {
        // d = 37095705934669439343138083508754565189542113879843219016388785533085940283555
        let expected = BigUint::parse_bytes(
            b"37095705934669439343138083508754565189542113879843219016388785533085940283555",
            10,
        )
        .unwrap();
        assert_eq!(FieldElement::edwards_d().as_biguint(), &expected);
    }

    #[test]
    fn sqrt_roundtrip() {
        for v in [0u64, 1, 4, 9, 1234567, 987654321] {
            let a = FieldElement::from(v).square();
            let root = a.sqrt().expect("a square has a root");
            assert_eq!(root.square(), a);
            assert!(!root.is_negative());
        }
        // 2 is a non-residue mod p
        assert!(FieldElement::from(2u64).sqrt().is_none());
    }

    #[test]
    fn canonical_encoding() {
        let mut bytes = [0xffu8; 32];
        bytes[31] = 0x7f;
        // 2^255 - 1 > p
        assert!(FieldElement::from_canonical_bytes(&bytes).is_none());
        let p_minus_one = FieldElement::zero() - FieldElement::one();
        let enc = p_minus_one.to_bytes();
        assert_eq!(FieldElement::from_canonical_bytes(&enc), Some(p_minus_one));
    }

    #[test]
    fn inverse() {
        let a = FieldElement::from(121_666u64);
        assert_eq!(&a * &a.invert().unwrap(), FieldElement::one());
        assert!(FieldElement::zero().invert().is_none());
    }
}
