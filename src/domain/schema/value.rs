//! Decoded value tree.

use std::fmt;

use crate::infra::error::{VerifyError, VerifyResult};

/// Result of decoding one schema type.
///
/// Owned by the caller; nothing in the tree borrows from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    /// `SEQUENCE` members in schema order. Absent optional members are
    /// omitted; absent members with a `DEFAULT` carry the default value.
    Sequence(Vec<(&'static str, DecodedValue)>),
    /// `SEQUENCE OF` / `SET OF` elements in wire order.
    List(Vec<DecodedValue>),
    Choice {
        alternative: &'static str,
        value: Box<DecodedValue>,
    },
    /// `name` is `None` for a value outside the enumeration's table.
    Enumerated {
        value: i64,
        name: Option<&'static str>,
    },
    Integer(i64),
    Bytes(Vec<u8>),
    Text(String),
    BitString {
        unused_bits: u8,
        bytes: Vec<u8>,
    },
    /// Dotted-decimal object identifier.
    ObjectIdentifier(String),
    /// Complete encoding (identifier, length and content) of an `ANY`.
    Raw(Vec<u8>),
}

impl DecodedValue {
    /// Sequence member lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        match self {
            DecodedValue::Sequence(fields) => fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Sequence member lookup that fails with `SchemaMismatch`.
    pub fn field(&self, name: &str) -> VerifyResult<&DecodedValue> {
        self.get(name).ok_or_else(|| {
            VerifyError::SchemaMismatch(format!("missing field `{name}` in {}", self.kind()))
        })
    }

    pub fn as_integer(&self) -> VerifyResult<i64> {
        match self {
            DecodedValue::Integer(v) | DecodedValue::Enumerated { value: v, .. } => Ok(*v),
            other => Err(other.unexpected("INTEGER")),
        }
    }

    pub fn as_enumerated(&self) -> VerifyResult<(i64, Option<&'static str>)> {
        match self {
            DecodedValue::Enumerated { value, name } => Ok((*value, *name)),
            other => Err(other.unexpected("ENUMERATED")),
        }
    }

    pub fn as_bytes(&self) -> VerifyResult<&[u8]> {
        match self {
            DecodedValue::Bytes(b) => Ok(b),
            other => Err(other.unexpected("OCTET STRING")),
        }
    }

    pub fn as_text(&self) -> VerifyResult<&str> {
        match self {
            DecodedValue::Text(t) => Ok(t),
            other => Err(other.unexpected("character string")),
        }
    }

    pub fn as_list(&self) -> VerifyResult<&[DecodedValue]> {
        match self {
            DecodedValue::List(items) => Ok(items),
            other => Err(other.unexpected("SEQUENCE OF")),
        }
    }

    pub fn as_choice(&self) -> VerifyResult<(&'static str, &DecodedValue)> {
        match self {
            DecodedValue::Choice { alternative, value } => Ok((alternative, value)),
            other => Err(other.unexpected("CHOICE")),
        }
    }

    pub fn as_bit_string(&self) -> VerifyResult<(u8, &[u8])> {
        match self {
            DecodedValue::BitString { unused_bits, bytes } => Ok((*unused_bits, bytes)),
            other => Err(other.unexpected("BIT STRING")),
        }
    }

    pub fn as_oid(&self) -> VerifyResult<&str> {
        match self {
            DecodedValue::ObjectIdentifier(oid) => Ok(oid),
            other => Err(other.unexpected("OBJECT IDENTIFIER")),
        }
    }

    pub fn as_raw(&self) -> VerifyResult<&[u8]> {
        match self {
            DecodedValue::Raw(raw) => Ok(raw),
            other => Err(other.unexpected("ANY")),
        }
    }

    /// Variant name, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedValue::Sequence(_) => "SEQUENCE",
            DecodedValue::List(_) => "SEQUENCE OF",
            DecodedValue::Choice { .. } => "CHOICE",
            DecodedValue::Enumerated { .. } => "ENUMERATED",
            DecodedValue::Integer(_) => "INTEGER",
            DecodedValue::Bytes(_) => "OCTET STRING",
            DecodedValue::Text(_) => "character string",
            DecodedValue::BitString { .. } => "BIT STRING",
            DecodedValue::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            DecodedValue::Raw(_) => "ANY",
        }
    }

    fn unexpected(&self, expected: &str) -> VerifyError {
        VerifyError::SchemaMismatch(format!("expected {expected}, found {}", self.kind()))
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Sequence(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} {value}")?;
                }
                write!(f, " }}")
            }
            DecodedValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            DecodedValue::Choice { alternative, value } => write!(f, "{alternative}: {value}"),
            DecodedValue::Enumerated {
                value,
                name: Some(name),
            } => write!(f, "{name}({value})"),
            DecodedValue::Enumerated { value, name: None } => write!(f, "{value}"),
            DecodedValue::Integer(v) => write!(f, "{v}"),
            DecodedValue::Bytes(b) | DecodedValue::Raw(b) => write!(f, "'{}'H", hex::encode(b)),
            DecodedValue::Text(t) => write!(f, "{t:?}"),
            DecodedValue::BitString { unused_bits, bytes } => {
                write!(f, "'{}'H ({unused_bits} unused bits)", hex::encode(bytes))
            }
            DecodedValue::ObjectIdentifier(oid) => write!(f, "{oid}"),
        }
    }
}
