//! Flat calldata encoding of the verifier input.
//!
//! The settlement layer receives every value as a 256-bit word split into two 128-bit limbs. Points travel as their
//! 32-byte compressed encoding followed by one field-element square-root hint. Signed half-scalars use the limb
//! convention of the settlement layer's curve library: `high == 1` marks a negative value whose magnitude is `low`.
//!
//! ```text
//!   H | T | hint | U | hint | R1 | hint | R2 | hint | c | s | 4 × (Qx, Qy, s1, s2)
//! ```

use crate::cryptography::codec::{AffinePoint, CompressedPoint, EncodedPoint, SqrtHint};
use crate::cryptography::dleq::{DleqHints, DleqVerificationInput, ScalarBytes};
use crate::cryptography::field::FieldElement;
use crate::cryptography::hashes::Hashlock;
use crate::cryptography::msm::{MsmHint, SignedHalfScalar};
use crate::error::ReadError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Number of words in an encoded [`DleqVerificationInput`].
pub const DLEQ_CALLDATA_WORDS: usize = 1 + 4 * 2 + 2 + 4 * 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct U256 {
    pub low: u128,
    pub high: u128,
}

impl U256 {
    pub const fn new(low: u128, high: u128) -> Self {
        U256 { low, high }
    }

    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut low = [0u8; 16];
        let mut high = [0u8; 16];
        low.copy_from_slice(&bytes[..16]);
        high.copy_from_slice(&bytes[16..]);
        U256 { low: u128::from_le_bytes(low), high: u128::from_le_bytes(high) }
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&self.low.to_le_bytes());
        bytes[16..].copy_from_slice(&self.high.to_le_bytes());
        bytes
    }
}

impl Display for U256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:032x}{:032x}", self.high, self.low)
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        U256 { low: value, high: 0 }
    }
}

impl From<&FieldElement> for U256 {
    fn from(value: &FieldElement) -> Self {
        U256::from_le_bytes(&value.to_bytes())
    }
}

impl From<SignedHalfScalar> for U256 {
    fn from(value: SignedHalfScalar) -> Self {
        U256 { low: value.magnitude(), high: value.is_negative() as u128 }
    }
}

/// Sequential reader over a calldata slice.
pub struct CalldataReader<'a> {
    words: &'a [U256],
    position: usize,
}

impl<'a> CalldataReader<'a> {
    pub fn new(words: &'a [U256]) -> Self {
        CalldataReader { words, position: 0 }
    }

    pub fn next_word(&mut self, field: &str) -> Result<U256, ReadError> {
        let word = self
            .words
            .get(self.position)
            .copied()
            .ok_or_else(|| ReadError::new(field, format!("calldata ended at word {}", self.position)))?;
        self.position += 1;
        Ok(word)
    }

    pub fn remaining(&self) -> usize {
        self.words.len().saturating_sub(self.position)
    }

    pub fn finish(self) -> Result<(), ReadError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(ReadError::new("calldata", format!("{n} unexpected trailing words"))),
        }
    }
}

pub trait ToCalldata {
    fn write_calldata(&self, out: &mut Vec<U256>);

    fn to_calldata(&self) -> Vec<U256> {
        let mut out = Vec::new();
        self.write_calldata(&mut out);
        out
    }
}

pub trait FromCalldata: Sized {
    fn read_calldata(reader: &mut CalldataReader<'_>, field: &str) -> Result<Self, ReadError>;

    /// Decodes a complete calldata slice, rejecting trailing words.
    fn from_calldata(words: &[U256]) -> Result<Self, ReadError> {
        let mut reader = CalldataReader::new(words);
        let value = Self::read_calldata(&mut reader, "")?;
        reader.finish()?;
        Ok(value)
    }
}

fn sub(field: &str, name: &str) -> String {
    match field.is_empty() {
        true => name.to_string(),
        false => format!("{field}.{name}"),
    }
}

impl ToCalldata for FieldElement {
    fn write_calldata(&self, out: &mut Vec<U256>) {
        out.push(U256::from(self));
    }
}

impl FromCalldata for FieldElement {
    fn read_calldata(reader: &mut CalldataReader<'_>, field: &str) -> Result<Self, ReadError> {
        let word = reader.next_word(field)?;
        FieldElement::from_canonical_bytes(&word.to_le_bytes())
            .ok_or_else(|| ReadError::new(field, "field element is not reduced modulo p"))
    }
}

impl ToCalldata for SignedHalfScalar {
    fn write_calldata(&self, out: &mut Vec<U256>) {
        out.push(U256::from(*self));
    }
}

impl FromCalldata for SignedHalfScalar {
    fn read_calldata(reader: &mut CalldataReader<'_>, field: &str) -> Result<Self, ReadError> {
        let word = reader.next_word(field)?;
        match word.high {
            0 => Ok(SignedHalfScalar::positive(word.low)),
            1 if word.low != 0 => Ok(SignedHalfScalar::new(word.low, true)),
            _ => Err(ReadError::new(field, format!("{word} is not a signed 128-bit value"))),
        }
    }
}

impl ToCalldata for EncodedPoint {
    fn write_calldata(&self, out: &mut Vec<U256>) {
        out.push(U256::from_le_bytes(self.compressed.as_bytes()));
        self.sqrt_hint.as_field_element().write_calldata(out);
    }
}

impl FromCalldata for EncodedPoint {
    fn read_calldata(reader: &mut CalldataReader<'_>, field: &str) -> Result<Self, ReadError> {
        let compressed = CompressedPoint::from_bytes(reader.next_word(&sub(field, "compressed"))?.to_le_bytes());
        let hint = FieldElement::read_calldata(reader, &sub(field, "sqrt_hint"))?;
        Ok(EncodedPoint::new(compressed, SqrtHint::new(hint)))
    }
}

impl ToCalldata for MsmHint {
    fn write_calldata(&self, out: &mut Vec<U256>) {
        self.q.x.write_calldata(out);
        self.q.y.write_calldata(out);
        out.push(U256::from(self.s1));
        self.s2.write_calldata(out);
    }
}

impl FromCalldata for MsmHint {
    fn read_calldata(reader: &mut CalldataReader<'_>, field: &str) -> Result<Self, ReadError> {
        let x = FieldElement::read_calldata(reader, &sub(field, "q.x"))?;
        let y = FieldElement::read_calldata(reader, &sub(field, "q.y"))?;
        let s1_field = sub(field, "s1");
        let s1 = reader.next_word(&s1_field)?;
        if s1.high != 0 {
            return Err(ReadError::new(s1_field, "s1 does not fit in 128 bits"));
        }
        let s2 = SignedHalfScalar::read_calldata(reader, &sub(field, "s2"))?;
        Ok(MsmHint { q: AffinePoint::new(x, y), s1: s1.low, s2 })
    }
}

impl ToCalldata for DleqVerificationInput {
    fn write_calldata(&self, out: &mut Vec<U256>) {
        out.push(U256::from_le_bytes(self.hashlock.as_bytes()));
        for point in [&self.adaptor_point, &self.second_point, &self.r1, &self.r2] {
            point.write_calldata(out);
        }
        out.push(U256::from_le_bytes(&self.c.0));
        out.push(U256::from_le_bytes(&self.s.0));
        for hint in [&self.hints.s_g, &self.hints.neg_c_t, &self.hints.s_y, &self.hints.neg_c_u] {
            hint.write_calldata(out);
        }
    }
}

impl FromCalldata for DleqVerificationInput {
    fn read_calldata(reader: &mut CalldataReader<'_>, field: &str) -> Result<Self, ReadError> {
        let hashlock = Hashlock::new(reader.next_word(&sub(field, "hashlock"))?.to_le_bytes());
        let adaptor_point = EncodedPoint::read_calldata(reader, &sub(field, "T"))?;
        let second_point = EncodedPoint::read_calldata(reader, &sub(field, "U"))?;
        let r1 = EncodedPoint::read_calldata(reader, &sub(field, "R1"))?;
        let r2 = EncodedPoint::read_calldata(reader, &sub(field, "R2"))?;
        let c = ScalarBytes(reader.next_word(&sub(field, "c"))?.to_le_bytes());
        let s = ScalarBytes(reader.next_word(&sub(field, "s"))?.to_le_bytes());
        let hints = DleqHints {
            s_g: MsmHint::read_calldata(reader, &sub(field, "hints.s_g"))?,
            neg_c_t: MsmHint::read_calldata(reader, &sub(field, "hints.neg_c_t"))?,
            s_y: MsmHint::read_calldata(reader, &sub(field, "hints.s_y"))?,
            neg_c_u: MsmHint::read_calldata(reader, &sub(field, "hints.neg_c_u"))?,
        };
        Ok(DleqVerificationInput { hashlock, adaptor_point, second_point, r1, r2, c, s, hints })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SwapConfig;
    use crate::cryptography::curve::Ed25519;
    use crate::cryptography::dleq::DleqVerifier;
    use crate::cryptography::secret::SwapSecret;
    use crate::cryptography::witness::build_deployment;
    use std::time::Duration;

    fn verification_input() -> DleqVerificationInput {
        let secret = SwapSecret::new([0x12; 32]);
        let config = SwapConfig::new(Duration::from_secs(3600));
        build_deployment::<Ed25519>(&secret, &secret.hashlock(), &config).unwrap().verification
    }

    #[test]
    fn limb_layout() {
        let mut bytes = [0u8; 32];
        bytes[0] = 1;
        bytes[16] = 2;
        let word = U256::from_le_bytes(&bytes);
        assert_eq!(word, U256::new(1, 2));
        assert_eq!(word.to_le_bytes(), bytes);
        assert_eq!(U256::from(SignedHalfScalar::new(5, true)), U256::new(5, 1));
    }

    #[test]
    fn calldata_decodes_to_a_verifiable_input() {
        let input = verification_input();
        let words = input.to_calldata();
        assert_eq!(words.len(), DLEQ_CALLDATA_WORDS);
        let decoded = DleqVerificationInput::from_calldata(&words).unwrap();
        assert_eq!(decoded, input);
        assert!(DleqVerifier::<Ed25519>::verify(&decoded).is_ok());
    }

    #[test]
    fn malformed_calldata_is_rejected() {
        let words = verification_input().to_calldata();
        let err = DleqVerificationInput::from_calldata(&words[..words.len() - 1]).unwrap_err();
        assert_eq!(err.field(), "hints.neg_c_u.s2");

        let mut long = words.clone();
        long.push(U256::default());
        assert_eq!(DleqVerificationInput::from_calldata(&long).unwrap_err().field(), "calldata");

        // the sqrt hint of T is word 2; p itself is not a canonical field element
        let mut bad = words.clone();
        bad[2] = U256::from_le_bytes(&{
            let mut p = [0xffu8; 32];
            p[0] = 0xed;
            p[31] = 0x7f;
            p
        });
        assert_eq!(DleqVerificationInput::from_calldata(&bad).unwrap_err().field(), "T.sqrt_hint");

        // s2 with a high limb of 2 is not a signed half-scalar
        let mut bad = words;
        let last = bad.len() - 1;
        bad[last].high = 2;
        assert_eq!(DleqVerificationInput::from_calldata(&bad).unwrap_err().field(), "hints.neg_c_u.s2");
    }
}
