//! Signature engine dispatch over both 521-bit schemes.

mod common;

use common::fixtures::{self, TerminalKey};
use urna_verifier::domain::certificate::PublicKeyMaterial;
use urna_verifier::domain::crypto::{hash_file_bytes, signed_quantity};
use urna_verifier::{ErrorKind, SignatureEngine, SignatureScheme};

fn check(key: &TerminalKey, contents: &[u8], signature: &[u8], point: &[u8]) -> bool {
    let recorded = hash_file_bytes(contents);
    let material = PublicKeyMaterial {
        algorithm_oid: key.algorithm_oid(),
        raw_point: point,
    };
    SignatureEngine::verify(
        signed_quantity(recorded.as_slice()).as_slice(),
        signature,
        &material,
    )
    .unwrap()
}

#[test]
fn both_schemes_verify_record_signatures() {
    for key in [TerminalKey::ecdsa(), TerminalKey::ed521()] {
        let recorded = hash_file_bytes(b"boletim");
        let signature = key.sign_record(recorded.as_slice());
        assert!(check(&key, b"boletim", &signature, &key.public_point()));
        assert!(!check(&key, b"boletin", &signature, &key.public_point()));
    }
}

#[test]
fn ecdsa_accepts_der_and_raw_forms() {
    use p521::ecdsa::signature::hazmat::PrehashSigner;

    let TerminalKey::Ecdsa(signing) = TerminalKey::ecdsa() else {
        unreachable!()
    };
    let key = TerminalKey::ecdsa();
    let recorded = hash_file_bytes(b"log");
    let digest = signed_quantity(recorded.as_slice());
    let signature: p521::ecdsa::Signature = signing.sign_prehash(digest.as_slice()).unwrap();
    let raw = signature.to_bytes().to_vec();

    assert!(check(&key, b"log", &raw, &key.public_point()));
    assert!(check(
        &key,
        b"log",
        &fixtures::der_signature(&raw),
        &key.public_point()
    ));
}

#[test]
fn wrong_public_key_is_false_not_error() {
    let key = TerminalKey::ecdsa();
    let other = TerminalKey::other_ecdsa();
    let signature = key.sign_record(hash_file_bytes(b"bu").as_slice());
    assert!(!check(&key, b"bu", &signature, &other.public_point()));
}

#[test]
fn malformed_signature_is_false() {
    for key in [TerminalKey::ecdsa(), TerminalKey::ed521()] {
        assert!(!check(&key, b"bu", &[0x30, 0x03, 0x02, 0x01], &key.public_point()));
        assert!(!check(&key, b"bu", &[], &key.public_point()));
    }
}

#[test]
fn malformed_public_key_is_an_error() {
    for key in [TerminalKey::ecdsa(), TerminalKey::ed521()] {
        let material = PublicKeyMaterial {
            algorithm_oid: key.algorithm_oid(),
            raw_point: &[0x04, 0x00, 0x01],
        };
        let err = SignatureEngine::verify(&[0u8; 64], &[0u8; 132], &material).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKeyMaterial);
    }
}

#[test]
fn digest_of_wrong_length_is_invalid_input() {
    let key = TerminalKey::ecdsa();
    let point = key.public_point();
    let material = PublicKeyMaterial {
        algorithm_oid: key.algorithm_oid(),
        raw_point: &point,
    };
    let err = SignatureEngine::verify(&[0u8; 48], &[0u8; 132], &material).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn scheme_names_and_oids() {
    assert_eq!(SignatureScheme::EcdsaP521.oid(), "1.2.840.10045.2.1");
    assert_eq!(SignatureScheme::Ed521.oid(), "1.3.6.1.4.1.44588.2.1");
    assert_eq!(SignatureScheme::Ed521.to_string(), "ed521-shake256");
    assert_eq!(
        SignatureScheme::from_oid("1.3.101.112").unwrap_err().kind(),
        ErrorKind::UnsupportedAlgorithm
    );
}

/// Ed521 record signature produced outside this crate (deterministic
/// RFC 8032-style signer, SHAKE256 with 132-byte output). Both the public
/// point and `R` have the x-parity bit set.
const ED521_PUBLIC: &str = "eda2a276c15827506fd1d6aff89493151a117d0383d4b312b416bfd5704306735b92620e8810fbae95583e18553d4f990748dd4352033fb00fec36e956e70a379381";
const ED521_SIGNATURE: &str = "f21fa2c5280dc45148ebdf640821fd02afdae9c5d74727b90102dea17a763593ddaa2271426d744f7aeb5ef0afbf95e767b6c2eadb4b3390fafd3fded973c6ad1b808c6d2641556f575b19bb081633d2e1e8fc29bf9458fc375715beedc8610e691362db986bfaf231ce499dff1cd7abef829b540bca6ba395239328b05bdab6df450c00";
const ED521_SIGNED_QUANTITY: &str = "ad0cd11f803d0d7d13ee1cedfdfed27bb04549aba29017026ebaf2d16d459372c61d729531aa9b6b2b91d94f6e2aa910bccf815fd86cb97bf2e5081cabf1dd9f";

#[test]
fn ed521_external_vector_verifies() {
    let contents = b"boletim de urna, secao 0090";
    let digest = signed_quantity(hash_file_bytes(contents).as_slice());
    assert_eq!(hex::encode(digest.as_slice()), ED521_SIGNED_QUANTITY);

    let point = hex::decode(ED521_PUBLIC).unwrap();
    let signature = hex::decode(ED521_SIGNATURE).unwrap();
    let key = TerminalKey::ed521();
    assert!(check(&key, contents, &signature, &point));

    for bit in [0usize, 7, 65 * 8 + 7, 100 * 8 + 3] {
        let mut flipped = signature.clone();
        flipped[bit / 8] ^= 1 << (bit % 8);
        assert!(!check(&key, contents, &flipped, &point), "bit {bit}");
    }
    assert!(!check(&key, b"boletim de urna, secao 0091", &signature, &point));
}
