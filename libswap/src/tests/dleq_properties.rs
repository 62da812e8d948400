//! Property tests for the DLEQ proof as the lock sees it: every secret yields a deployable witness, and any change to
//! the response or the challenge is refused.

use crate::config::SwapConfig;
use crate::cryptography::curve::{CurveGroup, Ed25519};
use crate::cryptography::dleq::{DleqError, DleqVerificationInput, DleqVerifier, ScalarBytes};
use crate::cryptography::secret::SwapSecret;
use crate::cryptography::witness::build_deployment;
use curve25519_dalek::Scalar;
use proptest::prelude::*;
use std::time::Duration;

fn witness_for(bytes: [u8; 32]) -> DleqVerificationInput {
    let secret = SwapSecret::new(bytes);
    let config = SwapConfig::new(Duration::from_secs(3600));
    let witness = build_deployment::<Ed25519>(&secret, &secret.hashlock(), &config);
    witness.expect("proof generation should succeed").verification
}

fn shifted(bytes: &ScalarBytes, delta: Scalar) -> ScalarBytes {
    let value = Scalar::from_canonical_bytes(bytes.0).expect("encoded scalars are canonical");
    ScalarBytes::from_scalar::<Ed25519>(&(value + delta))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn honest_proofs_verify(bytes in any::<[u8; 32]>()) {
        prop_assume!(Ed25519::scalar_from_bytes_mod_order(bytes) != Scalar::ZERO);
        let input = witness_for(bytes);
        let verified = DleqVerifier::<Ed25519>::verify(&input).expect("honest proof should verify");
        let t = SwapSecret::new(bytes).to_scalar::<Ed25519>();
        prop_assert_eq!(*verified.adaptor_point(), Ed25519::generator() * t);
        prop_assert_eq!(*verified.second_point(), Ed25519::second_generator() * t);
    }

    #[test]
    fn shifted_response_is_rejected(bytes in any::<[u8; 32]>(), up in any::<bool>()) {
        prop_assume!(Ed25519::scalar_from_bytes_mod_order(bytes) != Scalar::ZERO);
        let mut input = witness_for(bytes);
        let delta = if up { Scalar::ONE } else { -Scalar::ONE };
        input.s = shifted(&input.s, delta);
        let err = DleqVerifier::<Ed25519>::verify(&input).unwrap_err();
        prop_assert!(
            matches!(err, DleqError::Msm { .. } | DleqError::EquationFailed | DleqError::Scalar(_)),
            "unexpected error {err:?}"
        );
    }

    #[test]
    fn shifted_challenge_is_rejected(bytes in any::<[u8; 32]>()) {
        prop_assume!(Ed25519::scalar_from_bytes_mod_order(bytes) != Scalar::ZERO);
        let mut input = witness_for(bytes);
        input.c = shifted(&input.c, Scalar::ONE);
        let err = DleqVerifier::<Ed25519>::verify(&input).unwrap_err();
        prop_assert!(matches!(err, DleqError::ChallengeMismatch | DleqError::Scalar(_)), "unexpected error {err:?}");
    }
}
