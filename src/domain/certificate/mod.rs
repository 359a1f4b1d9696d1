//! Terminal certificate, decoded with strict (DER) rules.
//!
//! Only the parts needed for verification are modelled: the subject name and
//! the subject public key. Everything else in the TBS structure is captured
//! as raw `ANY` values and never interpreted.

mod subject;

pub use subject::{extract_common_name, render_distinguished_name, COMMON_NAME_OID};

use std::borrow::Cow;

use base64::Engine;

use crate::domain::schema::{
    encode, Alternative, DecodedValue, DefaultValue, Field, SchemaModule, SchemaType,
};
use crate::domain::tlv::{EncodingRules, Tag};
use crate::infra::error::{VerifyError, VerifyResult};

const ATTRIBUTE_TYPE_AND_VALUE_FIELDS: [Field; 2] = [
    Field::required("type", SchemaType::ObjectIdentifier),
    Field::required("value", SchemaType::Any),
];
const ATTRIBUTE_TYPE_AND_VALUE: SchemaType =
    SchemaType::Sequence(&ATTRIBUTE_TYPE_AND_VALUE_FIELDS);
const RELATIVE_DISTINGUISHED_NAME: SchemaType = SchemaType::SetOf(&ATTRIBUTE_TYPE_AND_VALUE);
const RDN_SEQUENCE: SchemaType = SchemaType::SequenceOf(&RELATIVE_DISTINGUISHED_NAME);

const NAME_ALTERNATIVES: [Alternative; 1] = [Alternative::new("rdnSequence", RDN_SEQUENCE)];
pub const NAME: SchemaType = SchemaType::Choice(&NAME_ALTERNATIVES);

const ALGORITHM_IDENTIFIER_FIELDS: [Field; 2] = [
    Field::required("algorithm", SchemaType::ObjectIdentifier),
    Field::optional("parameters", SchemaType::Any),
];
pub const ALGORITHM_IDENTIFIER: SchemaType = SchemaType::Sequence(&ALGORITHM_IDENTIFIER_FIELDS);

const SUBJECT_PUBLIC_KEY_INFO_FIELDS: [Field; 2] = [
    Field::required("algorithm", ALGORITHM_IDENTIFIER),
    Field::required("subjectPublicKey", SchemaType::BitString),
];
pub const SUBJECT_PUBLIC_KEY_INFO: SchemaType =
    SchemaType::Sequence(&SUBJECT_PUBLIC_KEY_INFO_FIELDS);

const TBS_CERTIFICATE_FIELDS: [Field; 10] = [
    Field::with_default(
        "version",
        SchemaType::Explicit(Tag::context(0), &SchemaType::Integer(None)),
        DefaultValue::Integer(0),
    ),
    // Serial numbers routinely exceed 64 bits.
    Field::required("serialNumber", SchemaType::Any),
    Field::required("signature", SchemaType::Any),
    Field::required("issuer", SchemaType::Any),
    Field::required("validity", SchemaType::Any),
    Field::required("subject", NAME),
    Field::required("subjectPublicKeyInfo", SUBJECT_PUBLIC_KEY_INFO),
    Field::optional("issuerUniqueID", SchemaType::BitString).implicit(Tag::context(1)),
    Field::optional("subjectUniqueID", SchemaType::BitString).implicit(Tag::context(2)),
    Field::optional(
        "extensions",
        SchemaType::Explicit(Tag::context(3), &SchemaType::Any),
    ),
];
pub const TBS_CERTIFICATE: SchemaType = SchemaType::Sequence(&TBS_CERTIFICATE_FIELDS);

const CERTIFICATE_FIELDS: [Field; 3] = [
    Field::required("tbsCertificate", TBS_CERTIFICATE),
    Field::required("signatureAlgorithm", ALGORITHM_IDENTIFIER),
    Field::required("signatureValue", SchemaType::BitString),
];
pub const CERTIFICATE: SchemaType = SchemaType::Sequence(&CERTIFICATE_FIELDS);

/// Certificate types, decoded with strict (DER) rules.
pub static CERTIFICATE_MODULE: SchemaModule = SchemaModule {
    name: "TerminalCertificate",
    rules: EncodingRules::Strict,
    types: &[
        ("Certificate", &CERTIFICATE),
        ("TBSCertificate", &TBS_CERTIFICATE),
        ("SubjectPublicKeyInfo", &SUBJECT_PUBLIC_KEY_INFO),
        ("AlgorithmIdentifier", &ALGORITHM_IDENTIFIER),
        ("Name", &NAME),
    ],
};

/// Public key view handed to the signature engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKeyMaterial<'a> {
    /// Dotted-decimal `subjectPublicKeyInfo.algorithm.algorithm`.
    pub algorithm_oid: &'a str,
    /// Contents of the `subjectPublicKey` bit string.
    pub raw_point: &'a [u8],
}

/// The decoded fields of a terminal certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCertificate {
    subject: DecodedValue,
    algorithm_oid: String,
    raw_point: Vec<u8>,
}

impl TerminalCertificate {
    /// Decode a DER certificate.
    pub fn decode(der: &[u8]) -> VerifyResult<Self> {
        let value = CERTIFICATE_MODULE.decode("Certificate", der)?;
        let tbs = value.field("tbsCertificate")?;
        let version = tbs.field("version")?.as_integer()?;
        let spki = tbs.field("subjectPublicKeyInfo")?;
        let algorithm_oid = spki.field("algorithm")?.field("algorithm")?.as_oid()?;
        let (unused_bits, raw_point) = spki.field("subjectPublicKey")?.as_bit_string()?;
        if unused_bits != 0 {
            return Err(VerifyError::InvalidKeyMaterial(format!(
                "public key bit string has {unused_bits} unused bits"
            )));
        }

        log::debug!(
            "Decoded v{} certificate, key algorithm {algorithm_oid}, {} key bytes",
            version + 1,
            raw_point.len()
        );

        Ok(Self {
            subject: tbs.field("subject")?.clone(),
            algorithm_oid: algorithm_oid.to_string(),
            raw_point: raw_point.to_vec(),
        })
    }

    /// Decode a certificate embedded in an envelope, unwrapping PEM armour
    /// when `accept_pem` allows it.
    pub fn from_embedded(bytes: &[u8], accept_pem: bool) -> VerifyResult<Self> {
        if is_pem(bytes) && !accept_pem {
            return Err(VerifyError::InvalidInput(
                "embedded certificate is PEM encoded and PEM input is disabled".to_string(),
            ));
        }
        Self::decode(&unwrap_pem(bytes)?)
    }

    /// Decoded subject `Name`.
    #[must_use]
    pub fn subject(&self) -> &DecodedValue {
        &self.subject
    }

    /// DER encoding of the subject `Name`.
    pub fn subject_der(&self) -> VerifyResult<Vec<u8>> {
        encode(&NAME, &self.subject, CERTIFICATE_MODULE.rules)
    }

    pub fn common_name(&self) -> VerifyResult<String> {
        extract_common_name(&self.subject)
    }

    /// Subject rendered as an RFC 4514 style string, for display only.
    #[must_use]
    pub fn subject_dn(&self) -> String {
        match self.subject_der() {
            Ok(der) => render_distinguished_name(&der),
            Err(e) => format!("Subject DN [{e}]"),
        }
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKeyMaterial<'_> {
        PublicKeyMaterial {
            algorithm_oid: &self.algorithm_oid,
            raw_point: &self.raw_point,
        }
    }
}

fn is_pem(bytes: &[u8]) -> bool {
    bytes.trim_ascii_start().starts_with(b"-----")
}

/// DER body of a PEM document, or the input unchanged when it is not PEM.
pub fn unwrap_pem(bytes: &[u8]) -> VerifyResult<Cow<'_, [u8]>> {
    if !is_pem(bytes) {
        return Ok(Cow::Borrowed(bytes));
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|e| VerifyError::MalformedEncoding(format!("PEM certificate is not text: {e}")))?;
    let body: String = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(body)
        .map(Cow::Owned)
        .map_err(|e| VerifyError::MalformedEncoding(format!("invalid PEM body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // SEQUENCE { SET { SEQUENCE { OID 2.5.4.3, PrintableString "UE01" } } }
    const SUBJECT: [u8; 17] = [
        0x30, 0x0F, 0x31, 0x0D, 0x30, 0x0B, 0x06, 0x03, 0x55, 0x04, 0x03, 0x13, 0x04, b'U', b'E',
        b'0', b'1',
    ];

    fn certificate(version: Option<u8>, point: &[u8]) -> Vec<u8> {
        let mut tbs = Vec::new();
        if let Some(v) = version {
            tbs.extend_from_slice(&[0xA0, 0x03, 0x02, 0x01, v]);
        }
        tbs.extend_from_slice(&[0x02, 0x01, 0x01]); // serial
        tbs.extend_from_slice(&[0x30, 0x00]); // signature
        tbs.extend_from_slice(&[0x30, 0x00]); // issuer
        tbs.extend_from_slice(&[0x30, 0x00]); // validity
        tbs.extend_from_slice(&SUBJECT);

        let mut algorithm = Vec::new();
        crate::domain::tlv::write_tlv(
            &mut algorithm,
            Tag::OBJECT_IDENTIFIER,
            false,
            &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01],
        );
        let mut algorithm_id = Vec::new();
        crate::domain::tlv::write_tlv(&mut algorithm_id, Tag::SEQUENCE, true, &algorithm);
        let mut bits = vec![0x00];
        bits.extend_from_slice(point);
        let mut spki = algorithm_id.clone();
        crate::domain::tlv::write_tlv(&mut spki, Tag::BIT_STRING, false, &bits);
        crate::domain::tlv::write_tlv(&mut tbs, Tag::SEQUENCE, true, &spki);

        let mut cert = Vec::new();
        crate::domain::tlv::write_tlv(&mut cert, Tag::SEQUENCE, true, &tbs);
        cert.extend_from_slice(&algorithm_id);
        cert.extend_from_slice(&[0x03, 0x01, 0x00]);
        let mut out = Vec::new();
        crate::domain::tlv::write_tlv(&mut out, Tag::SEQUENCE, true, &cert);
        out
    }

    #[test]
    fn decodes_subject_and_public_key() {
        let der = certificate(Some(2), &[0x04, 0xAA, 0xBB]);
        let cert = TerminalCertificate::decode(&der).unwrap();
        assert_eq!(cert.common_name().unwrap(), "UE01");
        assert_eq!(cert.subject_der().unwrap(), SUBJECT);

        let key = cert.public_key();
        assert_eq!(key.algorithm_oid, "1.2.840.10045.2.1");
        assert_eq!(key.raw_point, &[0x04, 0xAA, 0xBB]);
    }

    #[test]
    fn version_default_is_implied_when_absent() {
        let der = certificate(None, &[0x04]);
        assert!(TerminalCertificate::decode(&der).is_ok());
    }

    #[test]
    fn strict_rules_reject_explicit_default_version() {
        let der = certificate(Some(0), &[0x04]);
        let err = TerminalCertificate::decode(&der).unwrap_err();
        assert!(matches!(err, VerifyError::SchemaMismatch(_)));
    }

    #[test]
    fn pem_is_unwrapped_when_allowed() {
        let der = certificate(Some(2), &[0x04, 0x01]);
        let pem = format!(
            "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
            base64::engine::general_purpose::STANDARD.encode(&der)
        );
        let from_pem = TerminalCertificate::from_embedded(pem.as_bytes(), true).unwrap();
        assert_eq!(from_pem, TerminalCertificate::decode(&der).unwrap());
        assert!(TerminalCertificate::from_embedded(pem.as_bytes(), false).is_err());
        assert!(matches!(unwrap_pem(&der).unwrap(), Cow::Borrowed(_)));
    }
}
