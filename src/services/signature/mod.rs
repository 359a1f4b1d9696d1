//! Signature engine.
//!
//! The certificate's public-key algorithm OID selects one of two 521-bit
//! signature schemes. [`SignatureScheme::from_oid`] is the only place OIDs
//! are compared; everything downstream works with the enum.

mod ecdsa;
mod ed521;

pub use ecdsa::EcdsaP521Verifier;
pub use ed521::{Ed521SigningKey, Ed521Verifier, ED521_KEY_SIZE, ED521_SIGNATURE_SIZE};

use crate::domain::certificate::PublicKeyMaterial;
use crate::domain::crypto::DigestBytes;
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;

/// `id-ecPublicKey`; the curve is always secp521r1 on these terminals.
pub const ECDSA_PUBLIC_KEY_OID: &str = "1.2.840.10045.2.1";
/// Vendor arc for Ed521 public keys.
pub const ED521_PUBLIC_KEY_OID: &str = "1.3.6.1.4.1.44588.2.1";

/// A verification rule over a pre-computed digest.
pub trait SignatureVerifier {
    /// `Ok(false)` for a signature that does not verify; `Err` only for
    /// unusable key material.
    fn verify(&self, digest: &DigestBytes, signature: &[u8], public_key: &[u8])
        -> VerifyResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    /// ECDSA over NIST P-521, DER or raw `r || s` signatures.
    EcdsaP521,
    /// EdDSA over E-521 with SHAKE256 (132-byte output).
    Ed521,
}

impl SignatureScheme {
    pub fn from_oid(oid: &str) -> VerifyResult<Self> {
        match oid {
            ECDSA_PUBLIC_KEY_OID => Ok(SignatureScheme::EcdsaP521),
            ED521_PUBLIC_KEY_OID => Ok(SignatureScheme::Ed521),
            other => Err(VerifyError::UnsupportedAlgorithm(format!(
                "public key algorithm {other}"
            ))),
        }
    }

    #[must_use]
    pub fn oid(self) -> &'static str {
        match self {
            SignatureScheme::EcdsaP521 => ECDSA_PUBLIC_KEY_OID,
            SignatureScheme::Ed521 => ED521_PUBLIC_KEY_OID,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SignatureScheme::EcdsaP521 => "ecdsa-p521",
            SignatureScheme::Ed521 => "ed521-shake256",
        }
    }

    /// Digest algorithm the signed quantity must have.
    #[must_use]
    pub fn digest_algorithm(self) -> HashAlgorithm {
        HashAlgorithm::Sha512
    }

    fn verifier(self) -> &'static dyn SignatureVerifier {
        match self {
            SignatureScheme::EcdsaP521 => &EcdsaP521Verifier,
            SignatureScheme::Ed521 => &Ed521Verifier,
        }
    }
}

/// Stateless entry point used by the orchestrator.
pub struct SignatureEngine;

impl SignatureEngine {
    /// Verify `signature` over `digest` with the certificate key.
    ///
    /// Fails with `UnsupportedAlgorithm` for an unknown key OID,
    /// `InvalidInput` for a digest of the wrong length and
    /// `InvalidKeyMaterial` for a key that is not a curve point.
    pub fn verify(
        digest: &[u8],
        signature: &[u8],
        public_key: &PublicKeyMaterial<'_>,
    ) -> VerifyResult<bool> {
        let scheme = SignatureScheme::from_oid(public_key.algorithm_oid)?;
        let digest = DigestBytes::from_slice(scheme.digest_algorithm(), digest)?;
        let valid = scheme
            .verifier()
            .verify(&digest, signature, public_key.raw_point)?;
        log::debug!(
            "{} signature ({} bytes) {}",
            scheme.name(),
            signature.len(),
            if valid { "verified" } else { "did not verify" }
        );
        Ok(valid)
    }
}

impl std::fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_oid() {
        assert_eq!(
            SignatureScheme::from_oid("1.2.840.10045.2.1").unwrap(),
            SignatureScheme::EcdsaP521
        );
        assert_eq!(
            SignatureScheme::from_oid("1.3.6.1.4.1.44588.2.1").unwrap(),
            SignatureScheme::Ed521
        );
        let err = SignatureScheme::from_oid("1.2.840.113549.1.1.1").unwrap_err();
        assert!(matches!(err, VerifyError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn rejects_wrong_digest_length() {
        let key = PublicKeyMaterial {
            algorithm_oid: ED521_PUBLIC_KEY_OID,
            raw_point: &[0u8; 66],
        };
        let err = SignatureEngine::verify(&[0u8; 32], &[0u8; 132], &key).unwrap_err();
        assert!(matches!(err, VerifyError::InvalidInput(_)));
    }

    #[test]
    fn unsupported_algorithm_is_an_error_not_false() {
        let key = PublicKeyMaterial {
            algorithm_oid: "1.2.840.113549.1.1.1",
            raw_point: &[],
        };
        let err = SignatureEngine::verify(&[0u8; 64], &[], &key).unwrap_err();
        assert!(matches!(err, VerifyError::UnsupportedAlgorithm(_)));
    }
}
