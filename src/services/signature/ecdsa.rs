//! ECDSA over NIST P-521.

use p521::ecdsa::signature::hazmat::PrehashVerifier;
use p521::ecdsa::{Signature, VerifyingKey};

use super::SignatureVerifier;
use crate::domain::crypto::DigestBytes;
use crate::domain::tlv::{read_tlv, EncodingRules, Tag, TlvReader};
use crate::infra::error::{VerifyError, VerifyResult};

/// Size of one scalar (`r` or `s`) in bytes.
const SCALAR_SIZE: usize = 66;

pub struct EcdsaP521Verifier;

impl SignatureVerifier for EcdsaP521Verifier {
    fn verify(
        &self,
        digest: &DigestBytes,
        signature: &[u8],
        public_key: &[u8],
    ) -> VerifyResult<bool> {
        let key = VerifyingKey::from_sec1_bytes(public_key).map_err(|e| {
            VerifyError::InvalidKeyMaterial(format!("not a P-521 public key point: {e}"))
        })?;

        let Some(raw) = signature_scalars(signature) else {
            log::debug!("ECDSA signature is neither DER nor raw r||s");
            return Ok(false);
        };
        // Rejects r or s equal to zero or not below the group order.
        let Ok(signature) = Signature::from_slice(&raw) else {
            log::debug!("ECDSA signature scalars are out of range");
            return Ok(false);
        };
        Ok(key.verify_prehash(digest.as_slice(), &signature).is_ok())
    }
}

/// Fixed-width `r || s` from a DER `SEQUENCE { INTEGER, INTEGER }` or from
/// an already raw signature.
fn signature_scalars(signature: &[u8]) -> Option<[u8; 2 * SCALAR_SIZE]> {
    // A raw r may start with 0x30 too.
    der_scalars(signature).or_else(|| signature.try_into().ok())
}

fn der_scalars(signature: &[u8]) -> Option<[u8; 2 * SCALAR_SIZE]> {
    let (sequence, next) = read_tlv(signature, 0, EncodingRules::Strict).ok()?;
    if next != signature.len() || sequence.tag != Tag::SEQUENCE || !sequence.constructed {
        return None;
    }
    let mut children = TlvReader::children(signature, &sequence, EncodingRules::Strict);
    let r = children.next_node().ok()??;
    let s = children.next_node().ok()??;
    if !children.is_empty() {
        return None;
    }

    let mut raw = [0u8; 2 * SCALAR_SIZE];
    for (integer, half) in [r, s].iter().zip(raw.chunks_exact_mut(SCALAR_SIZE)) {
        if integer.tag != Tag::INTEGER || integer.constructed {
            return None;
        }
        let content = integer.content;
        if !matches!(content.first(), Some(b) if b & 0x80 == 0) {
            return None;
        }
        let magnitude = match content {
            [0x00, rest @ ..] if !rest.is_empty() => rest,
            other => other,
        };
        if magnitude.len() > SCALAR_SIZE {
            return None;
        }
        half[SCALAR_SIZE - magnitude.len()..].copy_from_slice(magnitude);
    }
    Some(raw)
}
