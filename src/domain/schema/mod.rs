//! Declarative schema model driving the structure decoder and encoder.
//!
//! Schemas are plain `const` data: every type reference is `&'static`, so a
//! schema module is a compiled-in, immutable table that any number of
//! threads can decode against without coordination.

mod decode;
mod encode;
mod value;

pub use decode::{decode, decode_all, SchemaDecoder};
pub use encode::{encode, SchemaEncoder};
pub use value::DecodedValue;

use crate::domain::tlv::{EncodingRules, Tag};
use crate::infra::error::{VerifyError, VerifyResult};

/// Character set of a restricted string type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Utf8,
    Numeric,
    Printable,
    Teletex,
    Ia5,
    Visible,
    General,
    Universal,
    Bmp,
}

impl StringKind {
    #[must_use]
    pub const fn tag(self) -> Tag {
        match self {
            StringKind::Utf8 => Tag::UTF8_STRING,
            StringKind::Numeric => Tag::NUMERIC_STRING,
            StringKind::Printable => Tag::PRINTABLE_STRING,
            StringKind::Teletex => Tag::TELETEX_STRING,
            StringKind::Ia5 => Tag::IA5_STRING,
            StringKind::Visible => Tag::VISIBLE_STRING,
            StringKind::General => Tag::GENERAL_STRING,
            StringKind::Universal => Tag::UNIVERSAL_STRING,
            StringKind::Bmp => Tag::BMP_STRING,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            StringKind::Utf8 => "UTF8String",
            StringKind::Numeric => "NumericString",
            StringKind::Printable => "PrintableString",
            StringKind::Teletex => "TeletexString",
            StringKind::Ia5 => "IA5String",
            StringKind::Visible => "VisibleString",
            StringKind::General => "GeneralString",
            StringKind::Universal => "UniversalString",
            StringKind::Bmp => "BMPString",
        }
    }
}

/// One ASN.1 type description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    /// Ordered named fields.
    Sequence(&'static [Field]),
    /// Homogeneous ordered list.
    SequenceOf(&'static SchemaType),
    /// Homogeneous unordered list (DER requires ascending encodings).
    SetOf(&'static SchemaType),
    /// Exactly one of several alternatives, selected by tag.
    Choice(&'static [Alternative]),
    /// Integer with a name table.
    Enumerated(&'static [(&'static str, i64)]),
    /// Integer with an optional inclusive range constraint.
    Integer(Option<(i64, i64)>),
    OctetString,
    /// Restricted character string with optional size bounds (in characters).
    SizedString {
        kind: StringKind,
        min: Option<usize>,
        max: Option<usize>,
    },
    BitString,
    ObjectIdentifier,
    /// Any single element, captured verbatim.
    Any,
    /// `[tag] EXPLICIT inner`.
    Explicit(Tag, &'static SchemaType),
}

impl SchemaType {
    /// Tag this type is encoded with, or `None` when it is determined by
    /// the value (`CHOICE`, `ANY`).
    #[must_use]
    pub const fn tag(&self) -> Option<Tag> {
        match self {
            SchemaType::Sequence(_) | SchemaType::SequenceOf(_) => Some(Tag::SEQUENCE),
            SchemaType::SetOf(_) => Some(Tag::SET),
            SchemaType::Choice(_) | SchemaType::Any => None,
            SchemaType::Enumerated(_) => Some(Tag::ENUMERATED),
            SchemaType::Integer(_) => Some(Tag::INTEGER),
            SchemaType::OctetString => Some(Tag::OCTET_STRING),
            SchemaType::SizedString { kind, .. } => Some(kind.tag()),
            SchemaType::BitString => Some(Tag::BIT_STRING),
            SchemaType::ObjectIdentifier => Some(Tag::OBJECT_IDENTIFIER),
            SchemaType::Explicit(tag, _) => Some(*tag),
        }
    }

    /// Whether values of this type are encoded in constructed form.
    #[must_use]
    pub const fn is_constructed(&self) -> bool {
        matches!(
            self,
            SchemaType::Sequence(_)
                | SchemaType::SequenceOf(_)
                | SchemaType::SetOf(_)
                | SchemaType::Explicit(..)
        )
    }

    /// Short human readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            SchemaType::Sequence(_) => "SEQUENCE".to_string(),
            SchemaType::SequenceOf(_) => "SEQUENCE OF".to_string(),
            SchemaType::SetOf(_) => "SET OF".to_string(),
            SchemaType::Choice(_) => "CHOICE".to_string(),
            SchemaType::Enumerated(_) => "ENUMERATED".to_string(),
            SchemaType::Integer(_) => "INTEGER".to_string(),
            SchemaType::OctetString => "OCTET STRING".to_string(),
            SchemaType::SizedString { kind, .. } => kind.name().to_string(),
            SchemaType::BitString => "BIT STRING".to_string(),
            SchemaType::ObjectIdentifier => "OBJECT IDENTIFIER".to_string(),
            SchemaType::Any => "ANY".to_string(),
            SchemaType::Explicit(tag, inner) => format!("{tag} EXPLICIT {}", inner.describe()),
        }
    }
}

/// Constant default value attached to a sequence field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Integer(i64),
    Enumerated(i64),
}

impl DefaultValue {
    #[must_use]
    pub const fn value(self) -> i64 {
        match self {
            DefaultValue::Integer(v) | DefaultValue::Enumerated(v) => v,
        }
    }
}

/// Presence rule of a sequence field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    Default(DefaultValue),
}

/// Named member of a `SEQUENCE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: SchemaType,
    /// `[tag] IMPLICIT` override of the type's own tag.
    pub tag: Option<Tag>,
    pub presence: Presence,
}

impl Field {
    #[must_use]
    pub const fn required(name: &'static str, ty: SchemaType) -> Self {
        Self {
            name,
            ty,
            tag: None,
            presence: Presence::Required,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, ty: SchemaType) -> Self {
        Self {
            name,
            ty,
            tag: None,
            presence: Presence::Optional,
        }
    }

    #[must_use]
    pub const fn with_default(name: &'static str, ty: SchemaType, default: DefaultValue) -> Self {
        Self {
            name,
            ty,
            tag: None,
            presence: Presence::Default(default),
        }
    }

    #[must_use]
    pub const fn implicit(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Tag expected on the wire for this field.
    #[must_use]
    pub const fn wire_tag(&self) -> Option<Tag> {
        match self.tag {
            Some(tag) => Some(tag),
            None => self.ty.tag(),
        }
    }
}

/// Named alternative of a `CHOICE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alternative {
    pub name: &'static str,
    pub ty: SchemaType,
    pub tag: Option<Tag>,
}

impl Alternative {
    #[must_use]
    pub const fn new(name: &'static str, ty: SchemaType) -> Self {
        Self { name, ty, tag: None }
    }

    #[must_use]
    pub const fn implicit(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    #[must_use]
    pub const fn wire_tag(&self) -> Option<Tag> {
        match self.tag {
            Some(tag) => Some(tag),
            None => self.ty.tag(),
        }
    }
}

/// A named collection of types sharing one set of encoding rules.
#[derive(Debug)]
pub struct SchemaModule {
    pub name: &'static str,
    pub rules: EncodingRules,
    pub types: &'static [(&'static str, &'static SchemaType)],
}

impl SchemaModule {
    /// Look up a type by name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&'static SchemaType> {
        self.types
            .iter()
            .find(|(name, _)| *name == type_name)
            .map(|(_, ty)| *ty)
    }

    /// Decode a complete buffer as `type_name`.
    pub fn decode(
        &self,
        type_name: &str,
        buffer: &[u8],
    ) -> VerifyResult<DecodedValue> {
        decode_all(self.lookup(type_name)?, buffer, self.rules)
    }

    /// Encode a value as `type_name`.
    pub fn encode(
        &self,
        type_name: &str,
        value: &DecodedValue,
    ) -> VerifyResult<Vec<u8>> {
        encode(self.lookup(type_name)?, value, self.rules)
    }

    fn lookup(&self, type_name: &str) -> VerifyResult<&'static SchemaType> {
        self.get(type_name).ok_or_else(|| {
            VerifyError::SchemaMismatch(format!(
                "module {} has no type named {type_name}",
                self.name
            ))
        })
    }
}
