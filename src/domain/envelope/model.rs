//! Typed view of the decoded envelope records.
//!
//! Each record converts from the generic [`DecodedValue`] tree and back, so
//! the same schema table drives both reading terminal output and building
//! envelopes for tests.

use std::fmt;

use super::{
    ENVELOPE_MODULE, FILE_SIGNATURE_LIST, HASH_ALGORITHMS, MODELS, SIGNATURE_ALGORITHMS,
    SIGNATURE_ENVELOPE,
};
use crate::domain::schema::{decode_all, encode, DecodedValue};
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;

/// Voting terminal generation that produced the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalModel {
    Ue2009,
    Ue2010,
    Ue2011,
    Ue2013,
    Ue2015,
    Ue2020,
    /// A model code outside the known table (accepted by lenient decoding).
    Unknown(i64),
}

impl TerminalModel {
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            9 => TerminalModel::Ue2009,
            10 => TerminalModel::Ue2010,
            11 => TerminalModel::Ue2011,
            13 => TerminalModel::Ue2013,
            15 => TerminalModel::Ue2015,
            20 => TerminalModel::Ue2020,
            other => TerminalModel::Unknown(other),
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            TerminalModel::Ue2009 => 9,
            TerminalModel::Ue2010 => 10,
            TerminalModel::Ue2011 => 11,
            TerminalModel::Ue2013 => 13,
            TerminalModel::Ue2015 => 15,
            TerminalModel::Ue2020 => 20,
            TerminalModel::Unknown(code) => code,
        }
    }
}

impl fmt::Display for TerminalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match lookup_name(&MODELS, self.code()) {
            Some(name) => write!(f, "{}", name.to_uppercase()),
            None => write!(f, "unknown model {}", self.code()),
        }
    }
}

/// Signature algorithm announced by the self-signature record.
///
/// Informational only: the algorithm actually used for verification comes
/// from the certificate's public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithmId {
    Rsa,
    Ecdsa,
    Cepesc,
    Unknown(i64),
}

impl SignatureAlgorithmId {
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => SignatureAlgorithmId::Rsa,
            2 => SignatureAlgorithmId::Ecdsa,
            3 => SignatureAlgorithmId::Cepesc,
            other => SignatureAlgorithmId::Unknown(other),
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            SignatureAlgorithmId::Rsa => 1,
            SignatureAlgorithmId::Ecdsa => 2,
            SignatureAlgorithmId::Cepesc => 3,
            SignatureAlgorithmId::Unknown(code) => code,
        }
    }
}

impl fmt::Display for SignatureAlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match lookup_name(&SIGNATURE_ALGORITHMS, self.code()) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "unknown({})", self.code()),
        }
    }
}

/// Recorded hash and signature over one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalSignature {
    /// Signature length in bits as declared by the terminal.
    pub length: i64,
    pub hash: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub user_name: String,
    pub serial: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfSignature {
    pub signer: KeyDescriptor,
    /// Raw `hashAlgorithm` code; see [`SelfSignature::hash_algorithm`].
    pub hash_algorithm_code: i64,
    pub signature_algorithm: SignatureAlgorithmId,
    pub key_bits: i64,
    pub digital_signature: DigitalSignature,
}

impl SelfSignature {
    /// Hash algorithm the terminal declares, when it is one this crate can
    /// recompute.
    #[must_use]
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        HashAlgorithm::from_envelope_code(self.hash_algorithm_code)
    }

    #[must_use]
    pub fn hash_algorithm_name(&self) -> Option<&'static str> {
        lookup_name(&HASH_ALGORITHMS, self.hash_algorithm_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlock {
    pub created_at: String,
    pub protocol_version: i64,
    pub self_signature: SelfSignature,
    /// Opaque content; for the hardware block this is an encoded
    /// [`FileSignatureList`].
    pub signed_content: Vec<u8>,
    pub certificate: Option<Vec<u8>>,
    pub key_set_id: Option<String>,
}

impl SignatureBlock {
    /// Decode the signed content as a file-signature list.
    pub fn file_signatures(&self) -> VerifyResult<FileSignatureList> {
        FileSignatureList::decode(&self.signed_content)
    }

    /// Embedded certificate, or `SchemaMismatch` when the block has none.
    pub fn certificate(&self) -> VerifyResult<&[u8]> {
        self.certificate.as_deref().ok_or_else(|| {
            VerifyError::SchemaMismatch("signature block carries no certificate".to_string())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    pub model: TerminalModel,
    pub software_signature: SignatureBlock,
    pub hardware_signature: SignatureBlock,
}

impl SignatureEnvelope {
    /// Decode a complete envelope record.
    pub fn decode(bytes: &[u8]) -> VerifyResult<Self> {
        let value = ENVELOPE_MODULE.decode("SignatureEnvelope", bytes)?;
        let envelope = Self::try_from(&value)?;
        log::debug!(
            "Decoded {} envelope ({} bytes of hardware signed content)",
            envelope.model,
            envelope.hardware_signature.signed_content.len()
        );
        Ok(envelope)
    }

    pub fn encode(&self) -> VerifyResult<Vec<u8>> {
        encode(
            &SIGNATURE_ENVELOPE,
            &DecodedValue::from(self),
            ENVELOPE_MODULE.rules,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSignature {
    pub file_name: String,
    pub signature: DigitalSignature,
}

/// Per-file records, addressed by position.
///
/// The terminal writes its records in a fixed order; the bulletin and log
/// positions are a contract with the vendor, not derived from `file_name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileSignatureList {
    pub files: Vec<FileSignature>,
}

impl FileSignatureList {
    pub fn decode(bytes: &[u8]) -> VerifyResult<Self> {
        let value = decode_all(&FILE_SIGNATURE_LIST, bytes, ENVELOPE_MODULE.rules)?;
        Self::try_from(&value)
    }

    pub fn encode(&self) -> VerifyResult<Vec<u8>> {
        encode(
            &FILE_SIGNATURE_LIST,
            &DecodedValue::from(self),
            ENVELOPE_MODULE.rules,
        )
    }

    /// Record at `index`, or `SchemaMismatch` when the list is too short.
    pub fn record(&self, index: usize) -> VerifyResult<&FileSignature> {
        self.files.get(index).ok_or_else(|| {
            VerifyError::SchemaMismatch(format!(
                "file signature list has {} records, no record at position {index}",
                self.files.len()
            ))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileSignature> {
        self.files.iter()
    }
}

fn lookup_name(table: &[(&'static str, i64)], code: i64) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, value)| *value == code)
        .map(|(name, _)| *name)
}

impl TryFrom<&DecodedValue> for DigitalSignature {
    type Error = VerifyError;

    fn try_from(value: &DecodedValue) -> VerifyResult<Self> {
        Ok(Self {
            length: value.field("length")?.as_integer()?,
            hash: value.field("hash")?.as_bytes()?.to_vec(),
            signature: value.field("signature")?.as_bytes()?.to_vec(),
        })
    }
}

impl TryFrom<&DecodedValue> for KeyDescriptor {
    type Error = VerifyError;

    fn try_from(value: &DecodedValue) -> VerifyResult<Self> {
        Ok(Self {
            user_name: value.field("userName")?.as_text()?.to_string(),
            serial: value.field("serial")?.as_integer()?,
        })
    }
}

impl TryFrom<&DecodedValue> for SelfSignature {
    type Error = VerifyError;

    fn try_from(value: &DecodedValue) -> VerifyResult<Self> {
        let signature_algorithm = value.field("signatureAlgorithm")?;
        Ok(Self {
            signer: KeyDescriptor::try_from(value.field("signer")?)?,
            hash_algorithm_code: value
                .field("hashAlgorithm")?
                .field("algorithm")?
                .as_integer()?,
            signature_algorithm: SignatureAlgorithmId::from_code(
                signature_algorithm.field("algorithm")?.as_integer()?,
            ),
            key_bits: signature_algorithm.field("bits")?.as_integer()?,
            digital_signature: DigitalSignature::try_from(value.field("digitalSignature")?)?,
        })
    }
}

impl TryFrom<&DecodedValue> for SignatureBlock {
    type Error = VerifyError;

    fn try_from(value: &DecodedValue) -> VerifyResult<Self> {
        Ok(Self {
            created_at: value.field("createdAt")?.as_text()?.to_string(),
            protocol_version: value.field("protocolVersion")?.as_integer()?,
            self_signature: SelfSignature::try_from(value.field("selfSignature")?)?,
            signed_content: value.field("signedContent")?.as_bytes()?.to_vec(),
            certificate: value
                .get("certificate")
                .map(|v| v.as_bytes().map(<[u8]>::to_vec))
                .transpose()?,
            key_set_id: value
                .get("keySetId")
                .map(|v| v.as_text().map(str::to_string))
                .transpose()?,
        })
    }
}

impl TryFrom<&DecodedValue> for SignatureEnvelope {
    type Error = VerifyError;

    fn try_from(value: &DecodedValue) -> VerifyResult<Self> {
        Ok(Self {
            model: TerminalModel::from_code(value.field("model")?.as_integer()?),
            software_signature: SignatureBlock::try_from(value.field("softwareSignature")?)?,
            hardware_signature: SignatureBlock::try_from(value.field("hardwareSignature")?)?,
        })
    }
}

impl TryFrom<&DecodedValue> for FileSignature {
    type Error = VerifyError;

    fn try_from(value: &DecodedValue) -> VerifyResult<Self> {
        Ok(Self {
            file_name: value.field("fileName")?.as_text()?.to_string(),
            signature: DigitalSignature::try_from(value.field("signature")?)?,
        })
    }
}

impl TryFrom<&DecodedValue> for FileSignatureList {
    type Error = VerifyError;

    fn try_from(value: &DecodedValue) -> VerifyResult<Self> {
        let files = value
            .field("files")?
            .as_list()?
            .iter()
            .map(FileSignature::try_from)
            .collect::<VerifyResult<Vec<_>>>()?;
        Ok(Self { files })
    }
}

fn enumerated(table: &[(&'static str, i64)], value: i64) -> DecodedValue {
    DecodedValue::Enumerated {
        value,
        name: lookup_name(table, value),
    }
}

impl From<&DigitalSignature> for DecodedValue {
    fn from(signature: &DigitalSignature) -> Self {
        DecodedValue::Sequence(vec![
            ("length", DecodedValue::Integer(signature.length)),
            ("hash", DecodedValue::Bytes(signature.hash.clone())),
            ("signature", DecodedValue::Bytes(signature.signature.clone())),
        ])
    }
}

impl From<&SelfSignature> for DecodedValue {
    fn from(record: &SelfSignature) -> Self {
        DecodedValue::Sequence(vec![
            (
                "signer",
                DecodedValue::Sequence(vec![
                    ("userName", DecodedValue::Text(record.signer.user_name.clone())),
                    ("serial", DecodedValue::Integer(record.signer.serial)),
                ]),
            ),
            (
                "hashAlgorithm",
                DecodedValue::Sequence(vec![(
                    "algorithm",
                    enumerated(&HASH_ALGORITHMS, record.hash_algorithm_code),
                )]),
            ),
            (
                "signatureAlgorithm",
                DecodedValue::Sequence(vec![
                    (
                        "algorithm",
                        enumerated(&SIGNATURE_ALGORITHMS, record.signature_algorithm.code()),
                    ),
                    ("bits", DecodedValue::Integer(record.key_bits)),
                ]),
            ),
            (
                "digitalSignature",
                DecodedValue::from(&record.digital_signature),
            ),
        ])
    }
}

impl From<&SignatureBlock> for DecodedValue {
    fn from(block: &SignatureBlock) -> Self {
        let mut fields = vec![
            ("createdAt", DecodedValue::Text(block.created_at.clone())),
            ("protocolVersion", DecodedValue::Integer(block.protocol_version)),
            ("selfSignature", DecodedValue::from(&block.self_signature)),
            ("signedContent", DecodedValue::Bytes(block.signed_content.clone())),
        ];
        if let Some(certificate) = &block.certificate {
            fields.push(("certificate", DecodedValue::Bytes(certificate.clone())));
        }
        if let Some(key_set_id) = &block.key_set_id {
            fields.push(("keySetId", DecodedValue::Text(key_set_id.clone())));
        }
        DecodedValue::Sequence(fields)
    }
}

impl From<&SignatureEnvelope> for DecodedValue {
    fn from(envelope: &SignatureEnvelope) -> Self {
        DecodedValue::Sequence(vec![
            ("model", enumerated(&MODELS, envelope.model.code())),
            (
                "softwareSignature",
                DecodedValue::from(&envelope.software_signature),
            ),
            (
                "hardwareSignature",
                DecodedValue::from(&envelope.hardware_signature),
            ),
        ])
    }
}

impl From<&FileSignatureList> for DecodedValue {
    fn from(list: &FileSignatureList) -> Self {
        let files = list
            .files
            .iter()
            .map(|file| {
                DecodedValue::Sequence(vec![
                    ("fileName", DecodedValue::Text(file.file_name.clone())),
                    ("signature", DecodedValue::from(&file.signature)),
                ])
            })
            .collect();
        DecodedValue::Sequence(vec![("files", DecodedValue::List(files))])
    }
}
