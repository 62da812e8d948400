use crate::cryptography::hashes::Blake2b256;
use crate::helpers::{array_from_hex, bytes32_from_hex, to_hex};
use digest::Digest;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// An account or contract address on the settlement layer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(#[serde(serialize_with = "to_hex", deserialize_with = "array_from_hex")] [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Derives an address by hashing `parts` in order.
    pub fn derive(parts: &[&[u8]]) -> Self {
        let mut hasher = Blake2b256::new();
        for part in parts {
            hasher.update(part);
        }
        Address(hasher.finalize().into())
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_hex(hex_str: &str) -> Option<Self> {
        bytes32_from_hex(hex_str).map(Address)
    }

    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Abbreviated form, `0x` followed by the first and last four bytes.
impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hex = self.as_hex();
        write!(f, "0x{}…{}", &hex[..8], &hex[56..])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::derive(&[b"alice"]).is_zero());
    }

    #[test]
    fn derivation_depends_on_every_part() {
        let a = Address::derive(&[b"alice", b"bob"]);
        assert_eq!(a, Address::derive(&[b"alice", b"bob"]));
        assert_ne!(a, Address::derive(&[b"alice", b"carol"]));
        assert_eq!(Address::from_hex(&a.as_hex()), Some(a));
    }

    #[test]
    fn display_is_abbreviated() {
        let a = Address::new([0xab; 32]);
        assert_eq!(a.to_string(), "0xabababab…abababab");
    }
}
