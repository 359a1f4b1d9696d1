//! Schema-driven structure encoder, the inverse of the decoder.
//!
//! Always emits definite, minimal lengths. Under strict rules `DEFAULT`
//! values are omitted and `SET OF` elements are sorted, giving DER output.

use der::asn1::ObjectIdentifier;

use super::decode::{check_charset, check_size};
use super::{DecodedValue, Presence, SchemaType, StringKind};
use crate::domain::tlv::{write_tlv, EncodingRules, Tag};
use crate::infra::error::{VerifyError, VerifyResult};

/// Encode `value` as `schema`.
pub fn encode(
    schema: &SchemaType,
    value: &DecodedValue,
    rules: EncodingRules,
) -> VerifyResult<Vec<u8>> {
    SchemaEncoder::new(rules).encode(schema, value)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaEncoder {
    rules: EncodingRules,
}

impl SchemaEncoder {
    #[must_use]
    pub fn new(rules: EncodingRules) -> Self {
        Self { rules }
    }

    pub fn encode(&self, schema: &SchemaType, value: &DecodedValue) -> VerifyResult<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(&mut out, schema, None, value)?;
        Ok(out)
    }

    fn encode_into(
        &self,
        out: &mut Vec<u8>,
        schema: &SchemaType,
        implicit: Option<Tag>,
        value: &DecodedValue,
    ) -> VerifyResult<()> {
        match schema {
            SchemaType::Choice(alternatives) => {
                let (name, inner) = value.as_choice()?;
                let alternative = alternatives
                    .iter()
                    .find(|alt| alt.name == name)
                    .ok_or_else(|| {
                        VerifyError::NoMatchingAlternative(format!(
                            "CHOICE has no alternative named `{name}`"
                        ))
                    })?;
                return self.encode_into(out, &alternative.ty, alternative.tag, inner);
            }
            SchemaType::Any => {
                let raw = value.as_raw()?;
                if implicit.is_some() {
                    return Err(VerifyError::SchemaMismatch(
                        "ANY cannot carry an implicit tag".to_string(),
                    ));
                }
                out.extend_from_slice(raw);
                return Ok(());
            }
            _ => {}
        }

        let Some(tag) = implicit.or_else(|| schema.tag()) else {
            unreachable!("only CHOICE and ANY are untagged")
        };
        let content = self.content(schema, value)?;
        write_tlv(out, tag, schema.is_constructed(), &content);
        Ok(())
    }

    fn content(&self, schema: &SchemaType, value: &DecodedValue) -> VerifyResult<Vec<u8>> {
        let mut content = Vec::new();
        match schema {
            SchemaType::Sequence(fields) => {
                for field in *fields {
                    let Some(member) = value.get(field.name) else {
                        if field.presence == Presence::Required {
                            return Err(VerifyError::SchemaMismatch(format!(
                                "cannot encode SEQUENCE without required field `{}`",
                                field.name
                            )));
                        }
                        continue;
                    };
                    if let Presence::Default(default) = field.presence {
                        if self.rules.is_strict()
                            && member.as_integer().ok() == Some(default.value())
                        {
                            continue;
                        }
                    }
                    self.encode_into(&mut content, &field.ty, field.tag, member)?;
                }
            }
            SchemaType::SequenceOf(item) => {
                for element in value.as_list()? {
                    self.encode_into(&mut content, item, None, element)?;
                }
            }
            SchemaType::SetOf(item) => {
                let mut elements = value
                    .as_list()?
                    .iter()
                    .map(|element| self.encode(item, element))
                    .collect::<VerifyResult<Vec<_>>>()?;
                if self.rules.is_strict() {
                    elements.sort();
                }
                content = elements.concat();
            }
            SchemaType::Enumerated(table) => {
                let (number, _) = value.as_enumerated()?;
                if self.rules.is_strict() && !table.iter().any(|(_, v)| *v == number) {
                    return Err(VerifyError::UnknownEnumValue(format!(
                        "{number} is not in the enumeration"
                    )));
                }
                content = integer_content(number);
            }
            SchemaType::Integer(range) => {
                let number = value.as_integer()?;
                if let Some((min, max)) = range {
                    if self.rules.is_strict() && !(*min..=*max).contains(&number) {
                        return Err(VerifyError::SchemaMismatch(format!(
                            "INTEGER {number} is outside {min}..{max}"
                        )));
                    }
                }
                content = integer_content(number);
            }
            SchemaType::OctetString => content.extend_from_slice(value.as_bytes()?),
            SchemaType::SizedString { kind, min, max } => {
                let text = value.as_text()?;
                if self.rules.is_strict() {
                    check_charset(*kind, text, 0)?;
                    check_size(*kind, text, *min, *max, 0)?;
                }
                content = text_content(*kind, text);
            }
            SchemaType::BitString => {
                let (unused_bits, bytes) = value.as_bit_string()?;
                content.push(unused_bits);
                content.extend_from_slice(bytes);
            }
            SchemaType::ObjectIdentifier => {
                let dotted = value.as_oid()?;
                let oid = ObjectIdentifier::new(dotted).map_err(|e| {
                    VerifyError::InvalidInput(format!("invalid object identifier `{dotted}`: {e}"))
                })?;
                content.extend_from_slice(oid.as_bytes());
            }
            SchemaType::Explicit(_, inner) => self.encode_into(&mut content, inner, None, value)?,
            SchemaType::Choice(_) | SchemaType::Any => unreachable!("encoded without a header"),
        }
        Ok(content)
    }
}

/// Minimal two's complement big-endian encoding.
fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn text_content(kind: StringKind, text: &str) -> Vec<u8> {
    match kind {
        StringKind::Bmp => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        StringKind::Universal => text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect(),
        _ => text.as_bytes().to_vec(),
    }
}
