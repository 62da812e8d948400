//! Hash primitives of the swap.
//!
//! The hashlock is SHA-256 over the raw secret, as the settlement layer checks it. The Fiat-Shamir challenge and the
//! nonce derivation use BLAKE2b. Provers that hash the challenge with SHA-256 under the same doubled `"DLEQ"` tag
//! produce proofs that do not verify here, and proofs from this crate do not verify against them.

use crate::helpers::{array_from_hex, bytes32_from_hex, to_hex};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512};
use digest::Digest;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt::{Debug, Display, Formatter};

pub type Blake2b256 = Blake2b<U32>;

/// Domain tag for the Fiat-Shamir challenge of the DLEQ proof.
pub const CHALLENGE_TAG: &[u8] = b"DLEQ";

/// Domain tag for deterministic DLEQ nonce derivation.
pub const NONCE_TAG: &[u8] = b"DLEQ-nonce";

/// A hasher primed with `BLAKE2b-256(tag) || BLAKE2b-256(tag)`, ready for the challenge transcript.
pub fn challenge_hasher() -> Blake2b256 {
    let tag_hash = Blake2b256::digest(CHALLENGE_TAG);
    let mut hasher = Blake2b256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    hasher
}

/// A hasher primed with the nonce domain tag.
pub fn nonce_hasher() -> Blake2b512 {
    let mut hasher = Blake2b512::new();
    hasher.update(NONCE_TAG);
    hasher
}

pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// SHA-256 commitment to a swap secret. Publishing the secret is the only way to satisfy it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hashlock(#[serde(serialize_with = "to_hex", deserialize_with = "array_from_hex")] [u8; 32]);

impl Hashlock {
    pub fn new(digest: [u8; 32]) -> Self {
        Hashlock(digest)
    }

    /// `SHA-256(secret)` over the raw 32 secret bytes (not the reduced scalar).
    pub fn from_secret(secret: &[u8; 32]) -> Self {
        Hashlock(Sha256::digest(secret).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Whether `secret` opens this hashlock.
    pub fn matches(&self, secret: &[u8; 32]) -> bool {
        Self::from_secret(secret) == *self
    }

    /// The digest as eight big-endian 32-bit words, the layout the settlement layer stores it in.
    pub fn to_u32_words(&self) -> [u32; 8] {
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(self.0.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        words
    }

    pub fn from_u32_words(words: &[u32; 8]) -> Self {
        let mut bytes = [0u8; 32];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        Hashlock(bytes)
    }

    pub fn from_hex(hex_str: &str) -> Option<Self> {
        bytes32_from_hex(hex_str).map(Hashlock)
    }

    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Debug for Hashlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hashlock({})", self.as_hex())
    }
}

impl Display for Hashlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sha256_of_known_secret() {
        // sha256 of 32 zero bytes
        let lock = Hashlock::from_secret(&[0u8; 32]);
        assert_eq!(lock.as_hex(), "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925");
        assert!(lock.matches(&[0u8; 32]));
        assert!(!lock.matches(&[1u8; 32]));
        assert!(!lock.is_zero());
        assert!(Hashlock::new([0u8; 32]).is_zero());
    }

    #[test]
    fn word_layout_is_big_endian() {
        let lock = Hashlock::from_hex("66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925").unwrap();
        let words = lock.to_u32_words();
        assert_eq!(words[0], 0x66687aad);
        assert_eq!(words[7], 0x0d5f2925);
        assert_eq!(Hashlock::from_u32_words(&words), lock);
    }

    #[test]
    fn challenge_hasher_is_tag_prefixed() {
        let tag = blake2b_256(CHALLENGE_TAG);
        let mut manual = Blake2b256::new();
        manual.update(tag);
        manual.update(tag);
        manual.update(b"payload");
        let mut primed = challenge_hasher();
        primed.update(b"payload");
        assert_eq!(primed.finalize(), manual.finalize());
    }

    #[test]
    fn hashlock_serde_is_hex() {
        let lock = Hashlock::from_secret(&[0x12; 32]);
        let json = serde_json::to_string(&lock).unwrap();
        assert_eq!(json, format!("\"{}\"", lock.as_hex()));
        let back: Hashlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lock);
    }
}
