//! Terminal keys, certificates and envelopes built with the crate's own
//! schema encoder.

use p521::ecdsa::signature::hazmat::PrehashSigner;
use p521::ecdsa::{Signature, SigningKey, VerifyingKey};
use urna_verifier::domain::certificate::CERTIFICATE_MODULE;
use urna_verifier::domain::crypto::{hash_file_bytes, signed_quantity};
use urna_verifier::domain::envelope::{
    DigitalSignature, FileSignature, FileSignatureList, KeyDescriptor, SelfSignature,
    SignatureAlgorithmId, SignatureBlock, SignatureEnvelope, TerminalModel,
};
use urna_verifier::domain::schema::DecodedValue;
use urna_verifier::domain::tlv::{write_tlv, Tag};
use urna_verifier::services::signature::{
    Ed521SigningKey, ECDSA_PUBLIC_KEY_OID, ED521_PUBLIC_KEY_OID,
};

pub const COMMON_NAME: &str = "UE2000401234";
pub const TERMINAL_ID: &str = "00401234";

pub const BULLETIN_INDEX: usize = 0;
pub const LOG_INDEX: usize = 10;

pub const FILE_NAMES: [&str; 11] = [
    "o00406-0100700090001.bu",
    "o00406-0100700090001.imgbu",
    "o00406-0100700090001.rdv",
    "o00406-0100700090001.vscmr",
    "o00406-0100700090001.imgbu.sig",
    "o00406-0100700090001.rdv.sig",
    "o00406-0100700090001.bu.sig",
    "o00406-0100700090001.chv",
    "o00406-0100700090001.dvs",
    "o00406-0100700090001.ver",
    "o00406-0100700090001.logjez",
];

/// Key held by a simulated terminal.
pub enum TerminalKey {
    Ecdsa(SigningKey),
    Ed521(Ed521SigningKey),
}

impl TerminalKey {
    pub fn ecdsa() -> Self {
        let mut secret = [0u8; 66];
        secret[1] = 0x5C;
        secret[33] = 0x91;
        secret[65] = 0x07;
        TerminalKey::Ecdsa(SigningKey::from_slice(&secret).unwrap())
    }

    pub fn other_ecdsa() -> Self {
        let mut secret = [0u8; 66];
        secret[20] = 0x42;
        TerminalKey::Ecdsa(SigningKey::from_slice(&secret).unwrap())
    }

    pub fn ed521() -> Self {
        let seed: Vec<u8> = (1..=66).rev().collect();
        TerminalKey::Ed521(Ed521SigningKey::from_scalar_bytes(&seed).unwrap())
    }

    pub fn algorithm_oid(&self) -> &'static str {
        match self {
            TerminalKey::Ecdsa(_) => ECDSA_PUBLIC_KEY_OID,
            TerminalKey::Ed521(_) => ED521_PUBLIC_KEY_OID,
        }
    }

    pub fn public_point(&self) -> Vec<u8> {
        match self {
            TerminalKey::Ecdsa(key) => VerifyingKey::from(key)
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            TerminalKey::Ed521(key) => key.public_key().to_vec(),
        }
    }

    /// Signature over a record's recorded hash, as the terminal writes it.
    pub fn sign_record(&self, recorded_hash: &[u8]) -> Vec<u8> {
        let digest = signed_quantity(recorded_hash);
        match self {
            TerminalKey::Ecdsa(key) => {
                let signature: Signature = key.sign_prehash(digest.as_slice()).unwrap();
                der_signature(&signature.to_bytes())
            }
            TerminalKey::Ed521(key) => key.sign(digest.as_slice()),
        }
    }
}

/// `SEQUENCE { INTEGER r, INTEGER s }` from a raw `r || s`.
pub fn der_signature(raw: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for half in raw.chunks(raw.len() / 2) {
        let start = half
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(half.len() - 1);
        let mut content = Vec::new();
        if half[start] & 0x80 != 0 {
            content.push(0);
        }
        content.extend_from_slice(&half[start..]);
        write_tlv(&mut body, Tag::INTEGER, false, &content);
    }
    let mut out = Vec::new();
    write_tlv(&mut out, Tag::SEQUENCE, true, &body);
    out
}

/// Encoded attribute value with the given universal tag.
pub fn attribute_value(tag: Tag, text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    write_tlv(&mut out, tag, false, text.as_bytes());
    out
}

pub fn subject_name(common_name_value: Vec<u8>) -> DecodedValue {
    let country = DecodedValue::Sequence(vec![
        ("type", DecodedValue::ObjectIdentifier("2.5.4.6".to_string())),
        (
            "value",
            DecodedValue::Raw(attribute_value(Tag::PRINTABLE_STRING, "BR")),
        ),
    ]);
    let common_name = DecodedValue::Sequence(vec![
        ("type", DecodedValue::ObjectIdentifier("2.5.4.3".to_string())),
        ("value", DecodedValue::Raw(common_name_value)),
    ]);
    DecodedValue::Choice {
        alternative: "rdnSequence",
        value: Box::new(DecodedValue::List(vec![
            DecodedValue::List(vec![country]),
            DecodedValue::List(vec![common_name]),
        ])),
    }
}

/// DER certificate with the given key and Common Name attribute value.
pub fn certificate_with(algorithm_oid: &str, point: &[u8], common_name_value: Vec<u8>) -> Vec<u8> {
    let algorithm = DecodedValue::Sequence(vec![(
        "algorithm",
        DecodedValue::ObjectIdentifier(algorithm_oid.to_string()),
    )]);
    let tbs = DecodedValue::Sequence(vec![
        ("version", DecodedValue::Integer(2)),
        ("serialNumber", DecodedValue::Raw(vec![0x02, 0x02, 0x01, 0x2C])),
        ("signature", DecodedValue::Raw(vec![0x30, 0x00])),
        ("issuer", DecodedValue::Raw(vec![0x30, 0x00])),
        ("validity", DecodedValue::Raw(vec![0x30, 0x00])),
        ("subject", subject_name(common_name_value)),
        (
            "subjectPublicKeyInfo",
            DecodedValue::Sequence(vec![
                ("algorithm", algorithm.clone()),
                (
                    "subjectPublicKey",
                    DecodedValue::BitString {
                        unused_bits: 0,
                        bytes: point.to_vec(),
                    },
                ),
            ]),
        ),
    ]);
    let certificate = DecodedValue::Sequence(vec![
        ("tbsCertificate", tbs),
        ("signatureAlgorithm", algorithm),
        (
            "signatureValue",
            DecodedValue::BitString {
                unused_bits: 0,
                bytes: vec![0x00; 8],
            },
        ),
    ]);
    CERTIFICATE_MODULE.encode("Certificate", &certificate).unwrap()
}

pub fn certificate(key: &TerminalKey) -> Vec<u8> {
    certificate_with(
        key.algorithm_oid(),
        &key.public_point(),
        attribute_value(Tag::PRINTABLE_STRING, COMMON_NAME),
    )
}

/// Contents of the eleven result files; index 0 is the bulletin and index
/// 10 the log.
pub fn result_files() -> Vec<Vec<u8>> {
    FILE_NAMES
        .iter()
        .map(|name| format!("contents of {name}\n").into_bytes())
        .collect()
}

pub fn file_signature_list(key: &TerminalKey, contents: &[Vec<u8>]) -> FileSignatureList {
    let files = FILE_NAMES
        .iter()
        .zip(contents)
        .map(|(name, data)| {
            let hash = hash_file_bytes(data).into_vec();
            FileSignature {
                file_name: (*name).to_string(),
                signature: DigitalSignature {
                    length: 1056,
                    signature: key.sign_record(&hash),
                    hash,
                },
            }
        })
        .collect();
    FileSignatureList { files }
}

fn block(signed_content: Vec<u8>, certificate: Option<Vec<u8>>) -> SignatureBlock {
    SignatureBlock {
        created_at: "20221002T170512".to_string(),
        protocol_version: 7,
        self_signature: SelfSignature {
            signer: KeyDescriptor {
                user_name: "urna".to_string(),
                serial: 2_040_136,
            },
            hash_algorithm_code: 4,
            signature_algorithm: SignatureAlgorithmId::Ecdsa,
            key_bits: 521,
            digital_signature: DigitalSignature {
                length: 1056,
                hash: vec![0x5A; 64],
                signature: vec![0x30, 0x00],
            },
        },
        signed_content,
        certificate,
        key_set_id: Some("kset-2022".to_string()),
    }
}

/// Encoded envelope whose hardware block carries `files` and `certificate`.
pub fn envelope_with(files: &FileSignatureList, certificate: Option<Vec<u8>>) -> Vec<u8> {
    SignatureEnvelope {
        model: TerminalModel::Ue2020,
        software_signature: block(b"software".to_vec(), None),
        hardware_signature: block(files.encode().unwrap(), certificate),
    }
    .encode()
    .unwrap()
}

/// A genuine result package.
pub struct Package {
    pub envelope: Vec<u8>,
    pub bulletin: Vec<u8>,
    pub log: Vec<u8>,
}

pub fn package(key: &TerminalKey) -> Package {
    let contents = result_files();
    let files = file_signature_list(key, &contents);
    Package {
        envelope: envelope_with(&files, Some(certificate(key))),
        bulletin: contents[BULLETIN_INDEX].clone(),
        log: contents[LOG_INDEX].clone(),
    }
}
