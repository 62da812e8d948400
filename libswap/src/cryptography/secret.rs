use crate::cryptography::curve::CurveGroup;
use crate::cryptography::hashes::Hashlock;
use crate::cryptography::scalar;
use rand::{CryptoRng, RngCore};
use std::fmt::{Debug, Formatter};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The 32-byte swap secret. Its SHA-256 digest is the hashlock and its reduction modulo n is the adaptor scalar `t`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SwapSecret([u8; 32]);

impl SwapSecret {
    pub fn new(bytes: [u8; 32]) -> Self {
        SwapSecret(bytes)
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        SwapSecret(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `t = secret mod n`
    pub fn to_scalar<C: CurveGroup>(&self) -> C::Scalar {
        scalar::reduce::<C>(self.0)
    }

    pub fn hashlock(&self) -> Hashlock {
        Hashlock::from_secret(&self.0)
    }
}

impl Debug for SwapSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SwapSecret(***)")
    }
}

impl PartialEq for SwapSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SwapSecret {}
