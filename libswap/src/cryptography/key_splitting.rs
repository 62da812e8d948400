//! Splitting a spend key on the counterparty chain into a retained part and the adaptor scalar.
//!
//! The full spend key is `x = x_partial + t`. Only `T = t·G` (with its DLEQ proof) goes to the settlement layer. Once
//! the secret is revealed there, whoever holds `x_partial` recovers `x` and can sign an ordinary transaction.

use crate::cryptography::curve::CurveGroup;
use crate::cryptography::scalar;
use crate::cryptography::secret::SwapSecret;
use rand::{CryptoRng, RngCore};
use std::fmt::{Debug, Formatter};
use zeroize::Zeroizing;

pub struct SwapKeyPair<C: CurveGroup> {
    partial_key: Zeroizing<C::Scalar>,
    adaptor_scalar: Zeroizing<C::Scalar>,
    full_spend_key: Zeroizing<C::Scalar>,
    adaptor_point: C::Point,
    public_key: C::Point,
}

impl<C: CurveGroup> SwapKeyPair<C> {
    /// A fresh key pair and the swap secret its adaptor scalar is derived from.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> (Self, SwapSecret) {
        let secret = SwapSecret::random(rng);
        let mut wide = Zeroizing::new([0u8; 64]);
        rng.fill_bytes(wide.as_mut_slice());
        let partial = scalar::reduce_wide::<C>(&wide);
        (Self::from_parts(partial, &secret), secret)
    }

    pub fn from_parts(partial_key: C::Scalar, secret: &SwapSecret) -> Self {
        let adaptor_scalar = secret.to_scalar::<C>();
        let full_spend_key = partial_key + adaptor_scalar;
        let g = C::generator();
        SwapKeyPair {
            partial_key: Zeroizing::new(partial_key),
            adaptor_scalar: Zeroizing::new(adaptor_scalar),
            full_spend_key: Zeroizing::new(full_spend_key),
            adaptor_point: C::mul(&g, &adaptor_scalar),
            public_key: C::mul(&g, &full_spend_key),
        }
    }

    /// Reconstructs the full spend key once the secret has been published.
    pub fn recover(partial_key: &C::Scalar, revealed: &SwapSecret) -> Zeroizing<C::Scalar> {
        Zeroizing::new(*partial_key + revealed.to_scalar::<C>())
    }

    /// `T + x_partial·G == X`
    pub fn verify(&self) -> bool {
        let partial_public = C::mul(&C::generator(), &self.partial_key);
        self.adaptor_point + partial_public == self.public_key
    }

    pub fn partial_key(&self) -> &C::Scalar {
        &self.partial_key
    }

    pub fn adaptor_scalar(&self) -> &C::Scalar {
        &self.adaptor_scalar
    }

    pub fn full_spend_key(&self) -> &C::Scalar {
        &self.full_spend_key
    }

    pub fn adaptor_point(&self) -> &C::Point {
        &self.adaptor_point
    }

    pub fn public_key(&self) -> &C::Point {
        &self.public_key
    }
}

impl<C: CurveGroup> Debug for SwapKeyPair<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapKeyPair")
            .field("adaptor_point", &C::compress(&self.adaptor_point))
            .field("public_key", &C::compress(&self.public_key))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cryptography::curve::Ed25519;
    use crate::cryptography::dleq::DleqProver;
    use curve25519_dalek::Scalar;

    #[test]
    fn split_keys_recombine() {
        let mut rng = rand::rng();
        let (keys, secret) = SwapKeyPair::<Ed25519>::generate(&mut rng);
        assert!(keys.verify());
        let recovered = SwapKeyPair::<Ed25519>::recover(keys.partial_key(), &secret);
        assert_eq!(*recovered, *keys.full_spend_key());
        assert_eq!(Ed25519::generator() * *recovered, *keys.public_key());
    }

    #[test]
    fn adaptor_point_matches_the_dleq_statement() {
        let secret = SwapSecret::new([0x12; 32]);
        let keys = SwapKeyPair::<Ed25519>::from_parts(Scalar::from(99u64), &secret);
        let output = DleqProver::<Ed25519>::default()
            .prove_for_adaptor(&secret, &secret.hashlock(), keys.adaptor_point())
            .unwrap();
        assert_eq!(output.adaptor_point, *keys.adaptor_point());
    }

    #[test]
    fn wrong_secret_does_not_recover() {
        let secret = SwapSecret::new([0x12; 32]);
        let keys = SwapKeyPair::<Ed25519>::from_parts(Scalar::from(5u64), &secret);
        let recovered = SwapKeyPair::<Ed25519>::recover(keys.partial_key(), &SwapSecret::new([0x13; 32]));
        assert_ne!(*recovered, *keys.full_spend_key());
        let debug = format!("{keys:?}");
        assert!(debug.contains("adaptor_point"));
        assert!(!debug.contains("partial_key"));
    }
}
