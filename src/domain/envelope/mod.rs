//! Voting-terminal signature envelope.
//!
//! The envelope is a BER structure produced by the terminal when it closes
//! an election: a model identifier followed by a software and a hardware
//! self-signature block. The hardware block's signed content is itself a
//! [`FileSignatureList`] carrying the per-file hash and signature records.

mod model;

pub use model::{
    DigitalSignature, FileSignature, FileSignatureList, KeyDescriptor, SelfSignature,
    SignatureAlgorithmId, SignatureBlock, SignatureEnvelope, TerminalModel,
};

use crate::domain::schema::{Field, SchemaModule, SchemaType, StringKind};
use crate::domain::tlv::EncodingRules;

const GENERAL_STRING: SchemaType = SchemaType::SizedString {
    kind: StringKind::General,
    min: None,
    max: None,
};

/// Creation time, `YYYYMMDDThhmmss`.
const CREATED_AT: SchemaType = SchemaType::SizedString {
    kind: StringKind::General,
    min: Some(15),
    max: Some(15),
};

const KEY_SET_ID: SchemaType = SchemaType::SizedString {
    kind: StringKind::General,
    min: Some(1),
    max: Some(15),
};

pub(crate) const MODELS: [(&str, i64); 6] = [
    ("ue2009", 9),
    ("ue2010", 10),
    ("ue2011", 11),
    ("ue2013", 13),
    ("ue2015", 15),
    ("ue2020", 20),
];

pub(crate) const HASH_ALGORITHMS: [(&str, i64); 4] =
    [("sha1", 1), ("sha256", 2), ("sha384", 3), ("sha512", 4)];

pub(crate) const SIGNATURE_ALGORITHMS: [(&str, i64); 3] =
    [("rsa", 1), ("ecdsa", 2), ("cepesc", 3)];

const DIGITAL_SIGNATURE_FIELDS: [Field; 3] = [
    Field::required("length", SchemaType::Integer(None)),
    Field::required("hash", SchemaType::OctetString),
    Field::required("signature", SchemaType::OctetString),
];
pub const DIGITAL_SIGNATURE: SchemaType = SchemaType::Sequence(&DIGITAL_SIGNATURE_FIELDS);

const KEY_DESCRIPTOR_FIELDS: [Field; 2] = [
    Field::required("userName", GENERAL_STRING),
    Field::required("serial", SchemaType::Integer(None)),
];
pub const KEY_DESCRIPTOR: SchemaType = SchemaType::Sequence(&KEY_DESCRIPTOR_FIELDS);

const HASH_ALGORITHM_FIELDS: [Field; 1] = [Field::required(
    "algorithm",
    SchemaType::Enumerated(&HASH_ALGORITHMS),
)];

const SIGNATURE_ALGORITHM_FIELDS: [Field; 2] = [
    Field::required("algorithm", SchemaType::Enumerated(&SIGNATURE_ALGORITHMS)),
    Field::required("bits", SchemaType::Integer(None)),
];

const SELF_SIGNATURE_FIELDS: [Field; 4] = [
    Field::required("signer", KEY_DESCRIPTOR),
    Field::required("hashAlgorithm", SchemaType::Sequence(&HASH_ALGORITHM_FIELDS)),
    Field::required(
        "signatureAlgorithm",
        SchemaType::Sequence(&SIGNATURE_ALGORITHM_FIELDS),
    ),
    Field::required("digitalSignature", DIGITAL_SIGNATURE),
];
pub const SELF_SIGNATURE: SchemaType = SchemaType::Sequence(&SELF_SIGNATURE_FIELDS);

const SIGNATURE_BLOCK_FIELDS: [Field; 6] = [
    Field::required("createdAt", CREATED_AT),
    Field::required("protocolVersion", SchemaType::Integer(Some((2, 99_999_999)))),
    Field::required("selfSignature", SELF_SIGNATURE),
    Field::required("signedContent", SchemaType::OctetString),
    Field::optional("certificate", SchemaType::OctetString),
    Field::optional("keySetId", KEY_SET_ID),
];
pub const SIGNATURE_BLOCK: SchemaType = SchemaType::Sequence(&SIGNATURE_BLOCK_FIELDS);

const SIGNATURE_ENVELOPE_FIELDS: [Field; 3] = [
    Field::required("model", SchemaType::Enumerated(&MODELS)),
    Field::required("softwareSignature", SIGNATURE_BLOCK),
    Field::required("hardwareSignature", SIGNATURE_BLOCK),
];
pub const SIGNATURE_ENVELOPE: SchemaType = SchemaType::Sequence(&SIGNATURE_ENVELOPE_FIELDS);

const FILE_SIGNATURE_FIELDS: [Field; 2] = [
    Field::required("fileName", GENERAL_STRING),
    Field::required("signature", DIGITAL_SIGNATURE),
];
pub const FILE_SIGNATURE: SchemaType = SchemaType::Sequence(&FILE_SIGNATURE_FIELDS);

const FILE_SIGNATURE_LIST_FIELDS: [Field; 1] =
    [Field::required("files", SchemaType::SequenceOf(&FILE_SIGNATURE))];
pub const FILE_SIGNATURE_LIST: SchemaType = SchemaType::Sequence(&FILE_SIGNATURE_LIST_FIELDS);

/// Envelope types, decoded with lenient (BER) rules.
pub static ENVELOPE_MODULE: SchemaModule = SchemaModule {
    name: "UrnaSignatures",
    rules: EncodingRules::Lenient,
    types: &[
        ("SignatureEnvelope", &SIGNATURE_ENVELOPE),
        ("SignatureBlock", &SIGNATURE_BLOCK),
        ("SelfSignature", &SELF_SIGNATURE),
        ("KeyDescriptor", &KEY_DESCRIPTOR),
        ("DigitalSignature", &DIGITAL_SIGNATURE),
        ("FileSignature", &FILE_SIGNATURE),
        ("FileSignatureList", &FILE_SIGNATURE_LIST),
    ],
};
