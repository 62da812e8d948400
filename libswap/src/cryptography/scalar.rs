//! Scalars modulo the group order n, as seen by the protocol.
//!
//! Every scalar the protocol handles is reduced into `[0, n)`. Scalars that arrive from untrusted input are parsed with
//! [`from_canonical`], which rejects unreduced encodings rather than silently reducing them.

use crate::cryptography::curve::CurveGroup;
use crate::error::ErrorKind;
use num_bigint::BigUint;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScalarError {
    #[error("The {0} scalar is zero.")]
    Zero(&'static str),
    #[error("The {0} scalar is not a canonical encoding (it is not less than the group order).")]
    NonCanonical(&'static str),
}

impl ScalarError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Reduce 32 little-endian bytes modulo n.
pub fn reduce<C: CurveGroup>(bytes: [u8; 32]) -> C::Scalar {
    C::scalar_from_bytes_mod_order(bytes)
}

/// Reduce 64 little-endian bytes modulo n. Used for hash outputs so the result is close to uniform.
pub fn reduce_wide<C: CurveGroup>(bytes: &[u8; 64]) -> C::Scalar {
    C::scalar_from_bytes_mod_order_wide(bytes)
}

/// Interpret a 32-byte digest as a scalar. Domain separation is the responsibility of whoever produced the digest.
pub fn hash_to_scalar<C: CurveGroup>(digest: [u8; 32]) -> C::Scalar {
    reduce::<C>(digest)
}

pub fn from_canonical<C: CurveGroup>(bytes: [u8; 32], what: &'static str) -> Result<C::Scalar, ScalarError> {
    C::scalar_from_canonical_bytes(bytes).ok_or(ScalarError::NonCanonical(what))
}

pub fn is_zero<C: CurveGroup>(scalar: &C::Scalar) -> bool {
    *scalar == C::Scalar::from(0u64)
}

pub fn validate_nonzero<C: CurveGroup>(scalar: &C::Scalar, what: &'static str) -> Result<(), ScalarError> {
    match is_zero::<C>(scalar) {
        true => Err(ScalarError::Zero(what)),
        false => Ok(()),
    }
}

pub fn to_biguint<C: CurveGroup>(scalar: &C::Scalar) -> BigUint {
    BigUint::from_bytes_le(&C::scalar_to_bytes(scalar))
}

/// The inverse of [`to_biguint`]. The value is reduced modulo n first.
pub fn from_biguint<C: CurveGroup>(value: &BigUint) -> C::Scalar {
    let reduced = value % C::order();
    let le = reduced.to_bytes_le();
    let mut bytes = [0u8; 32];
    bytes[..le.len()].copy_from_slice(&le);
    reduce::<C>(bytes)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cryptography::curve::Ed25519;
    use curve25519_dalek::Scalar;

    #[test]
    fn reduction_wraps_at_the_order() {
        let n = Ed25519::order();
        let s = from_biguint::<Ed25519>(&(n + 5u32));
        assert_eq!(s, Scalar::from(5u64));
        assert_eq!(to_biguint::<Ed25519>(&s), BigUint::from(5u32));
        // 0x12 repeated is larger than n and must reduce
        let t = reduce::<Ed25519>([0x12; 32]);
        assert!(&to_biguint::<Ed25519>(&t) < n);
        assert_ne!(Ed25519::scalar_to_bytes(&t), [0x12; 32]);
    }

    #[test]
    fn canonical_parsing() {
        assert_eq!(
            from_canonical::<Ed25519>([0x12; 32], "response"),
            Err(ScalarError::NonCanonical("response"))
        );
        let one = from_canonical::<Ed25519>(Scalar::ONE.to_bytes(), "response").unwrap();
        assert_eq!(one, Scalar::ONE);
    }

    #[test]
    fn zero_is_rejected() {
        let zero = reduce::<Ed25519>([0u8; 32]);
        assert_eq!(validate_nonzero::<Ed25519>(&zero, "secret"), Err(ScalarError::Zero("secret")));
        assert!(validate_nonzero::<Ed25519>(&Scalar::ONE, "secret").is_ok());
        // n itself reduces to zero
        let mut n_bytes = [0u8; 32];
        let le = Ed25519::order().to_bytes_le();
        n_bytes[..le.len()].copy_from_slice(&le);
        assert!(is_zero::<Ed25519>(&reduce::<Ed25519>(n_bytes)));
    }
}
