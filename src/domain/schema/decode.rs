//! Schema-driven structure decoder.
//!
//! Walks TLV elements produced by [`crate::domain::tlv`] against a
//! [`SchemaType`] and builds an owned [`DecodedValue`] tree. Constructed
//! content is only descended into when the schema asks for structure; leaf
//! types never recurse.

use der::asn1::ObjectIdentifier;

use super::{Alternative, DecodedValue, DefaultValue, Field, Presence, SchemaType, StringKind};
use crate::domain::tlv::{read_tlv, EncodingRules, Tag, TlvNode, TlvReader, MAX_NESTING};
use crate::infra::error::{VerifyError, VerifyResult};

/// Decode one value of `schema` starting at `offset`.
///
/// Returns the decoded value and the offset just past the element.
pub fn decode(
    schema: &SchemaType,
    buffer: &[u8],
    offset: usize,
    rules: EncodingRules,
) -> VerifyResult<(DecodedValue, usize)> {
    SchemaDecoder::new(rules).decode_at(schema, buffer, offset)
}

/// Decode a buffer that holds exactly one value of `schema`.
///
/// Trailing bytes are an error under strict rules and ignored (with a log
/// entry) under lenient rules.
pub fn decode_all(
    schema: &SchemaType,
    buffer: &[u8],
    rules: EncodingRules,
) -> VerifyResult<DecodedValue> {
    let (value, next) = decode(schema, buffer, 0, rules)?;
    if next < buffer.len() {
        if rules.is_strict() {
            return Err(VerifyError::malformed_at(
                next,
                format!("{} trailing bytes after the encoded value", buffer.len() - next),
            ));
        }
        log::debug!(
            "Ignoring {} trailing bytes after {}",
            buffer.len() - next,
            schema.describe()
        );
    }
    Ok(value)
}

/// Stateless decoder bound to one set of encoding rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaDecoder {
    rules: EncodingRules,
}

impl SchemaDecoder {
    #[must_use]
    pub fn new(rules: EncodingRules) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> EncodingRules {
        self.rules
    }

    pub fn decode_at(
        &self,
        schema: &SchemaType,
        buffer: &[u8],
        offset: usize,
    ) -> VerifyResult<(DecodedValue, usize)> {
        let (node, next) = read_tlv(buffer, offset, self.rules)?;
        let value = self.decode_node(buffer, schema, schema.tag(), &node)?;
        Ok((value, next))
    }

    fn decode_node(
        &self,
        buffer: &[u8],
        schema: &SchemaType,
        expected: Option<Tag>,
        node: &TlvNode<'_>,
    ) -> VerifyResult<DecodedValue> {
        match schema {
            SchemaType::Choice(alternatives) => {
                return self.decode_choice(buffer, alternatives, node);
            }
            SchemaType::Any => return Ok(DecodedValue::Raw(node.raw.to_vec())),
            _ => {}
        }

        if let Some(tag) = expected {
            if node.tag != tag {
                return Err(VerifyError::SchemaMismatch(format!(
                    "expected {} with tag {tag}, found tag {} at offset {}",
                    schema.describe(),
                    node.tag,
                    node.offset
                )));
            }
        }

        match schema {
            SchemaType::Sequence(fields) => {
                self.require_constructed(schema, node)?;
                self.decode_sequence(buffer, fields, node)
            }
            SchemaType::SequenceOf(item) => {
                self.require_constructed(schema, node)?;
                self.decode_list(buffer, item, node).map(DecodedValue::List)
            }
            SchemaType::SetOf(item) => {
                self.require_constructed(schema, node)?;
                if self.rules.is_strict() {
                    let raws: Vec<&[u8]> = TlvReader::children(buffer, node, self.rules)
                        .collect_nodes()?
                        .into_iter()
                        .map(|child| child.raw)
                        .collect();
                    if raws.windows(2).any(|pair| pair[0] > pair[1]) {
                        return Err(VerifyError::SchemaMismatch(format!(
                            "SET OF elements at offset {} are not in ascending order",
                            node.offset
                        )));
                    }
                }
                self.decode_list(buffer, item, node).map(DecodedValue::List)
            }
            SchemaType::Enumerated(table) => {
                self.require_primitive(schema, node)?;
                let value = self.decode_integer(node)?;
                let name = table
                    .iter()
                    .find(|(_, v)| *v == value)
                    .map(|(name, _)| *name);
                if name.is_none() {
                    if self.rules.is_strict() {
                        return Err(VerifyError::UnknownEnumValue(format!(
                            "{value} at offset {} is not in the enumeration",
                            node.offset
                        )));
                    }
                    log::warn!(
                        "Enumerated value {value} at offset {} has no name; passing it through",
                        node.offset
                    );
                }
                Ok(DecodedValue::Enumerated { value, name })
            }
            SchemaType::Integer(range) => {
                self.require_primitive(schema, node)?;
                let value = self.decode_integer(node)?;
                if let Some((min, max)) = range {
                    if self.rules.is_strict() && !(*min..=*max).contains(&value) {
                        return Err(VerifyError::SchemaMismatch(format!(
                            "INTEGER {value} at offset {} is outside {min}..{max}",
                            node.offset
                        )));
                    }
                }
                Ok(DecodedValue::Integer(value))
            }
            SchemaType::OctetString => self
                .string_octets(buffer, node, Tag::OCTET_STRING, 0)
                .map(DecodedValue::Bytes),
            SchemaType::SizedString { kind, min, max } => {
                let octets = self.string_octets(buffer, node, kind.tag(), 0)?;
                let text = decode_text(*kind, octets, node.offset)?;
                if self.rules.is_strict() {
                    check_charset(*kind, &text, node.offset)?;
                    check_size(*kind, &text, *min, *max, node.offset)?;
                }
                Ok(DecodedValue::Text(text))
            }
            SchemaType::BitString => {
                self.require_primitive(schema, node)?;
                self.decode_bit_string(node)
            }
            SchemaType::ObjectIdentifier => {
                self.require_primitive(schema, node)?;
                let oid = ObjectIdentifier::from_bytes(node.content).map_err(|e| {
                    VerifyError::malformed_at(node.offset, format!("invalid OBJECT IDENTIFIER: {e}"))
                })?;
                Ok(DecodedValue::ObjectIdentifier(oid.to_string()))
            }
            SchemaType::Explicit(_, inner) => {
                self.require_constructed(schema, node)?;
                let mut reader = TlvReader::children(buffer, node, self.rules);
                let Some(child) = reader.next_node()? else {
                    return Err(VerifyError::SchemaMismatch(format!(
                        "explicit tag {} at offset {} wraps no value",
                        node.tag, node.offset
                    )));
                };
                if !reader.is_empty() {
                    return Err(VerifyError::SchemaMismatch(format!(
                        "explicit tag {} at offset {} wraps more than one value",
                        node.tag, node.offset
                    )));
                }
                self.decode_node(buffer, inner, inner.tag(), &child)
            }
            SchemaType::Choice(_) | SchemaType::Any => unreachable!("handled above"),
        }
    }

    fn decode_sequence(
        &self,
        buffer: &[u8],
        fields: &[Field],
        node: &TlvNode<'_>,
    ) -> VerifyResult<DecodedValue> {
        let mut reader = TlvReader::children(buffer, node, self.rules);
        let mut members = Vec::with_capacity(fields.len());

        for field in fields {
            let next = reader.peek()?;
            match next {
                Some(child) if accepts(&field.ty, field.tag, child.tag) => {
                    reader.next_node()?;
                    let value = self.decode_node(buffer, &field.ty, field.wire_tag(), &child)?;
                    if let Presence::Default(default) = field.presence {
                        let is_default = value.as_integer().ok() == Some(default.value());
                        if self.rules.is_strict() && is_default {
                            return Err(VerifyError::SchemaMismatch(format!(
                                "field `{}` at offset {} encodes its DEFAULT value",
                                field.name, child.offset
                            )));
                        }
                    }
                    members.push((field.name, value));
                }
                _ => match field.presence {
                    Presence::Optional => {}
                    Presence::Default(default) => {
                        members.push((field.name, default_value(&field.ty, default)));
                    }
                    Presence::Required => return Err(missing_field(field, next.as_ref())),
                },
            }
        }

        if !reader.is_empty() {
            if self.rules.is_strict() {
                let extra = reader.peek()?.map_or(0, |n| n.offset);
                return Err(VerifyError::SchemaMismatch(format!(
                    "unexpected element at offset {extra} after the last SEQUENCE field"
                )));
            }
            let skipped = reader.collect_nodes()?.len();
            log::debug!(
                "Skipping {skipped} unknown trailing element(s) in SEQUENCE at offset {}",
                node.offset
            );
        }

        Ok(DecodedValue::Sequence(members))
    }

    fn decode_list(
        &self,
        buffer: &[u8],
        item: &SchemaType,
        node: &TlvNode<'_>,
    ) -> VerifyResult<Vec<DecodedValue>> {
        let mut reader = TlvReader::children(buffer, node, self.rules);
        let mut items = Vec::new();
        while let Some(child) = reader.next_node()? {
            items.push(self.decode_node(buffer, item, item.tag(), &child)?);
        }
        Ok(items)
    }

    fn decode_choice(
        &self,
        buffer: &[u8],
        alternatives: &[Alternative],
        node: &TlvNode<'_>,
    ) -> VerifyResult<DecodedValue> {
        let alternative = alternatives
            .iter()
            .find(|alt| accepts(&alt.ty, alt.tag, node.tag))
            .ok_or_else(|| {
                VerifyError::NoMatchingAlternative(format!(
                    "no alternative of CHOICE {{{}}} accepts tag {} at offset {}",
                    alternative_names(alternatives),
                    node.tag,
                    node.offset
                ))
            })?;
        let value = self.decode_node(buffer, &alternative.ty, alternative.wire_tag(), node)?;
        Ok(DecodedValue::Choice {
            alternative: alternative.name,
            value: Box::new(value),
        })
    }

    fn decode_integer(&self, node: &TlvNode<'_>) -> VerifyResult<i64> {
        let content = node.content;
        if content.is_empty() {
            return Err(VerifyError::malformed_at(node.offset, "empty INTEGER"));
        }
        if self.rules.is_strict()
            && content.len() > 1
            && ((content[0] == 0x00 && content[1] & 0x80 == 0)
                || (content[0] == 0xFF && content[1] & 0x80 != 0))
        {
            return Err(VerifyError::malformed_at(
                node.offset,
                "INTEGER is not minimally encoded",
            ));
        }

        let negative = content[0] & 0x80 != 0;
        let pad = if negative { 0xFF } else { 0x00 };
        let mut significant = content;
        while significant.len() > 1
            && significant[0] == pad
            && (significant[1] & 0x80 != 0) == negative
        {
            significant = &significant[1..];
        }
        if significant.len() > 8 {
            return Err(VerifyError::SchemaMismatch(format!(
                "INTEGER at offset {} does not fit in 64 bits",
                node.offset
            )));
        }
        let mut bytes = [pad; 8];
        bytes[8 - significant.len()..].copy_from_slice(significant);
        Ok(i64::from_be_bytes(bytes))
    }

    fn decode_bit_string(&self, node: &TlvNode<'_>) -> VerifyResult<DecodedValue> {
        let Some((&unused_bits, bytes)) = node.content.split_first() else {
            return Err(VerifyError::malformed_at(
                node.offset,
                "BIT STRING without an unused-bits octet",
            ));
        };
        if unused_bits > 7 || (bytes.is_empty() && unused_bits != 0) {
            return Err(VerifyError::malformed_at(
                node.offset,
                format!("invalid BIT STRING unused-bits count {unused_bits}"),
            ));
        }
        if self.rules.is_strict() && unused_bits > 0 {
            let mask = (1u8 << unused_bits) - 1;
            if bytes.last().is_some_and(|last| last & mask != 0) {
                return Err(VerifyError::malformed_at(
                    node.offset,
                    "BIT STRING padding bits are not zero",
                ));
            }
        }
        Ok(DecodedValue::BitString {
            unused_bits,
            bytes: bytes.to_vec(),
        })
    }

    /// Content octets of a string type, joining BER segments when allowed.
    ///
    /// Segments must carry `segment_tag` (or OCTET STRING, the form X.690
    /// gives restricted character strings) and may nest at most
    /// [`MAX_NESTING`] levels.
    fn string_octets(
        &self,
        buffer: &[u8],
        node: &TlvNode<'_>,
        segment_tag: Tag,
        depth: usize,
    ) -> VerifyResult<Vec<u8>> {
        if !node.constructed {
            return Ok(node.content.to_vec());
        }
        if self.rules.is_strict() {
            return Err(VerifyError::malformed_at(
                node.offset,
                "constructed string encoding is not allowed",
            ));
        }
        let mut octets = Vec::with_capacity(node.content.len());
        let mut reader = TlvReader::children(buffer, node, self.rules);
        while let Some(segment) = reader.next_node()? {
            if depth >= MAX_NESTING {
                return Err(VerifyError::malformed_at(
                    segment.offset,
                    "string segments nested too deep",
                ));
            }
            if segment.tag != segment_tag && segment.tag != Tag::OCTET_STRING {
                return Err(VerifyError::malformed_at(
                    segment.offset,
                    format!("string segment has tag {}, expected {segment_tag}", segment.tag),
                ));
            }
            octets.extend(self.string_octets(buffer, &segment, segment_tag, depth + 1)?);
        }
        Ok(octets)
    }

    fn require_constructed(&self, schema: &SchemaType, node: &TlvNode<'_>) -> VerifyResult<()> {
        if node.constructed {
            Ok(())
        } else {
            Err(VerifyError::SchemaMismatch(format!(
                "{} at offset {} must use the constructed form",
                schema.describe(),
                node.offset
            )))
        }
    }

    fn require_primitive(&self, schema: &SchemaType, node: &TlvNode<'_>) -> VerifyResult<()> {
        if node.constructed {
            Err(VerifyError::SchemaMismatch(format!(
                "{} at offset {} must use the primitive form",
                schema.describe(),
                node.offset
            )))
        } else {
            Ok(())
        }
    }
}

/// Whether an element tagged `tag` can start a value of `ty`.
fn accepts(ty: &SchemaType, implicit: Option<Tag>, tag: Tag) -> bool {
    if let Some(expected) = implicit {
        return expected == tag;
    }
    match ty {
        SchemaType::Choice(alternatives) => alternatives
            .iter()
            .any(|alt| accepts(&alt.ty, alt.tag, tag)),
        SchemaType::Any => true,
        other => other.tag() == Some(tag),
    }
}

fn default_value(ty: &SchemaType, default: DefaultValue) -> DecodedValue {
    match (default, ty) {
        (DefaultValue::Enumerated(value), SchemaType::Enumerated(table)) => {
            DecodedValue::Enumerated {
                value,
                name: table.iter().find(|(_, v)| *v == value).map(|(n, _)| *n),
            }
        }
        (DefaultValue::Enumerated(value), _) => DecodedValue::Enumerated { value, name: None },
        (DefaultValue::Integer(value), _) => DecodedValue::Integer(value),
    }
}

fn missing_field(field: &Field, found: Option<&TlvNode<'_>>) -> VerifyError {
    match (found, &field.ty) {
        (Some(node), SchemaType::Choice(alternatives)) => {
            VerifyError::NoMatchingAlternative(format!(
                "field `{}`: no alternative of CHOICE {{{}}} accepts tag {} at offset {}",
                field.name,
                alternative_names(alternatives),
                node.tag,
                node.offset
            ))
        }
        (Some(node), ty) => VerifyError::SchemaMismatch(format!(
            "field `{}`: expected {}{}, found tag {} at offset {}",
            field.name,
            ty.describe(),
            field
                .wire_tag()
                .map(|tag| format!(" with tag {tag}"))
                .unwrap_or_default(),
            node.tag,
            node.offset
        )),
        (None, ty) => VerifyError::SchemaMismatch(format!(
            "missing required field `{}` ({})",
            field.name,
            ty.describe()
        )),
    }
}

fn alternative_names(alternatives: &[Alternative]) -> String {
    alternatives
        .iter()
        .map(|alt| alt.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Text of a string value.
///
/// The legacy 8-bit types (General, Teletex and the ASCII subsets) are read
/// as UTF-8 and fall back to Latin-1 when the octets are not valid UTF-8.
/// The encoder always writes UTF-8, so re-encoding a Latin-1 value with
/// characters above 0x7F does not reproduce the original octets.
fn decode_text(kind: StringKind, octets: Vec<u8>, offset: usize) -> VerifyResult<String> {
    match kind {
        StringKind::Bmp => {
            if octets.len() % 2 != 0 {
                return Err(VerifyError::malformed_at(offset, "BMPString has an odd length"));
            }
            let units: Vec<u16> = octets
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|e| VerifyError::malformed_at(offset, format!("invalid BMPString: {e}")))
        }
        StringKind::Universal => {
            if octets.len() % 4 != 0 {
                return Err(VerifyError::malformed_at(
                    offset,
                    "UniversalString length is not a multiple of 4",
                ));
            }
            octets
                .chunks_exact(4)
                .map(|quad| {
                    char::from_u32(u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]]))
                        .ok_or_else(|| {
                            VerifyError::malformed_at(offset, "invalid UniversalString character")
                        })
                })
                .collect()
        }
        StringKind::Utf8 => String::from_utf8(octets)
            .map_err(|e| VerifyError::malformed_at(offset, format!("invalid UTF8String: {e}"))),
        // Legacy 8-bit string types: UTF-8 when it parses, Latin-1 otherwise.
        _ => Ok(match String::from_utf8(octets) {
            Ok(text) => text,
            Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
        }),
    }
}

pub(super) fn check_charset(kind: StringKind, text: &str, offset: usize) -> VerifyResult<()> {
    let allowed: fn(char) -> bool = match kind {
        StringKind::Printable => |c| c.is_ascii_alphanumeric() || " '()+,-./:=?".contains(c),
        StringKind::Numeric => |c| c.is_ascii_digit() || c == ' ',
        StringKind::Ia5 => |c| c.is_ascii(),
        StringKind::Visible => |c| (' '..='~').contains(&c),
        _ => return Ok(()),
    };
    match text.chars().find(|&c| !allowed(c)) {
        Some(c) => Err(VerifyError::SchemaMismatch(format!(
            "{} at offset {offset} contains disallowed character {c:?}",
            kind.name()
        ))),
        None => Ok(()),
    }
}

pub(super) fn check_size(
    kind: StringKind,
    text: &str,
    min: Option<usize>,
    max: Option<usize>,
    offset: usize,
) -> VerifyResult<()> {
    let size = text.chars().count();
    if min.is_some_and(|min| size < min) || max.is_some_and(|max| size > max) {
        return Err(VerifyError::SchemaMismatch(format!(
            "{} of {size} characters at offset {offset} violates its size constraint",
            kind.name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::Alternative;

    const POINT_FIELDS: [Field; 3] = [
        Field::required("x", SchemaType::Integer(None)),
        Field::optional("label", SchemaType::OctetString),
        Field::with_default("y", SchemaType::Integer(None), DefaultValue::Integer(7))
            .implicit(Tag::context(0)),
    ];
    const POINT: SchemaType = SchemaType::Sequence(&POINT_FIELDS);

    const SHAPE_ALTERNATIVES: [Alternative; 2] = [
        Alternative::new("count", SchemaType::Integer(None)),
        Alternative::new("point", POINT),
    ];
    const SHAPE: SchemaType = SchemaType::Choice(&SHAPE_ALTERNATIVES);

    #[test]
    fn latin1_general_string_reencodes_as_utf8() {
        const GENERAL: SchemaType = SchemaType::SizedString {
            kind: StringKind::General,
            min: None,
            max: None,
        };
        // GeneralString "Seção" in Latin-1
        let buf = [0x1B, 0x05, b'S', b'e', 0xE7, 0xE3, b'o'];
        let value = decode_all(&GENERAL, &buf, EncodingRules::Lenient).unwrap();
        assert_eq!(value, DecodedValue::Text("Seção".to_string()));

        let reencoded = crate::domain::schema::encode(&GENERAL, &value, EncodingRules::Lenient)
            .unwrap();
        assert_eq!(reencoded, "\x1B\x07Seção".as_bytes());
        assert_eq!(
            decode_all(&GENERAL, &reencoded, EncodingRules::Lenient).unwrap(),
            value
        );
    }

    #[test]
    fn optional_and_default_fields() {
        // SEQUENCE { INTEGER 3 }
        let buf = [0x30, 0x03, 0x02, 0x01, 0x03];
        let value = decode_all(&POINT, &buf, EncodingRules::Strict).unwrap();
        assert_eq!(
            value,
            DecodedValue::Sequence(vec![
                ("x", DecodedValue::Integer(3)),
                ("y", DecodedValue::Integer(7)),
            ])
        );

        // SEQUENCE { INTEGER 3, [0] 9 }
        let buf = [0x30, 0x06, 0x02, 0x01, 0x03, 0x80, 0x01, 0x09];
        let value = decode_all(&POINT, &buf, EncodingRules::Strict).unwrap();
        assert_eq!(value.get("y"), Some(&DecodedValue::Integer(9)));
        assert!(value.get("label").is_none());
    }

    #[test]
    fn strict_rejects_encoded_default() {
        let buf = [0x30, 0x06, 0x02, 0x01, 0x03, 0x80, 0x01, 0x07];
        assert!(decode_all(&POINT, &buf, EncodingRules::Strict).is_err());
        assert!(decode_all(&POINT, &buf, EncodingRules::Lenient).is_ok());
    }

    #[test]
    fn required_field_mismatch() {
        // SEQUENCE { OCTET STRING }: x is missing
        let buf = [0x30, 0x02, 0x04, 0x00];
        let err = decode_all(&POINT, &buf, EncodingRules::Lenient).unwrap_err();
        assert!(matches!(err, VerifyError::SchemaMismatch(_)));
    }

    #[test]
    fn choice_selects_by_tag() {
        let value = decode_all(&SHAPE, &[0x02, 0x01, 0x05], EncodingRules::Strict).unwrap();
        assert_eq!(
            value,
            DecodedValue::Choice {
                alternative: "count",
                value: Box::new(DecodedValue::Integer(5)),
            }
        );

        let err = decode_all(&SHAPE, &[0x04, 0x00], EncodingRules::Strict).unwrap_err();
        assert!(matches!(err, VerifyError::NoMatchingAlternative(_)));
    }

    #[test]
    fn negative_and_padded_integers() {
        let int = SchemaType::Integer(None);
        let value = decode_all(&int, &[0x02, 0x01, 0xFF], EncodingRules::Strict).unwrap();
        assert_eq!(value, DecodedValue::Integer(-1));

        let padded = [0x02, 0x02, 0x00, 0x05];
        assert_eq!(
            decode_all(&int, &padded, EncodingRules::Lenient).unwrap(),
            DecodedValue::Integer(5)
        );
        assert!(decode_all(&int, &padded, EncodingRules::Strict).is_err());
    }

    #[test]
    fn enumerated_unknown_value_by_mode() {
        const COLOURS: SchemaType = SchemaType::Enumerated(&[("red", 1), ("green", 2)]);
        let buf = [0x0A, 0x01, 0x09];
        let value = decode_all(&COLOURS, &buf, EncodingRules::Lenient).unwrap();
        assert_eq!(value, DecodedValue::Enumerated { value: 9, name: None });

        let err = decode_all(&COLOURS, &buf, EncodingRules::Strict).unwrap_err();
        assert!(matches!(err, VerifyError::UnknownEnumValue(_)));

        let known = decode_all(&COLOURS, &[0x0A, 0x01, 0x02], EncodingRules::Strict).unwrap();
        assert_eq!(known.as_enumerated().unwrap(), (2, Some("green")));
    }

    #[test]
    fn lenient_joins_segmented_octet_strings() {
        // constructed OCTET STRING { 'AA'H, 'BBCC'H }
        let buf = [0x24, 0x07, 0x04, 0x01, 0xAA, 0x04, 0x02, 0xBB, 0xCC];
        let value = decode_all(&SchemaType::OctetString, &buf, EncodingRules::Lenient).unwrap();
        assert_eq!(value, DecodedValue::Bytes(vec![0xAA, 0xBB, 0xCC]));
        assert!(decode_all(&SchemaType::OctetString, &buf, EncodingRules::Strict).is_err());
    }

    #[test]
    fn sized_string_constraints_in_strict_mode() {
        const CODE: SchemaType = SchemaType::SizedString {
            kind: StringKind::Printable,
            min: Some(1),
            max: Some(3),
        };
        let too_long = [0x13, 0x04, b'A', b'B', b'C', b'D'];
        assert!(decode_all(&CODE, &too_long, EncodingRules::Strict).is_err());
        assert_eq!(
            decode_all(&CODE, &too_long, EncodingRules::Lenient).unwrap(),
            DecodedValue::Text("ABCD".to_string())
        );

        let bad_charset = [0x13, 0x01, b'*'];
        assert!(decode_all(&CODE, &bad_charset, EncodingRules::Strict).is_err());
    }

    #[test]
    fn general_string_falls_back_to_latin1() {
        const NAME: SchemaType = SchemaType::SizedString {
            kind: StringKind::General,
            min: None,
            max: None,
        };
        let buf = [0x1B, 0x03, b'S', 0xE3, b'o'];
        let value = decode_all(&NAME, &buf, EncodingRules::Lenient).unwrap();
        assert_eq!(value, DecodedValue::Text("S\u{e3}o".to_string()));
    }

    #[test]
    fn bit_string_and_oid() {
        let bits = decode_all(
            &SchemaType::BitString,
            &[0x03, 0x03, 0x00, 0x04, 0xAB],
            EncodingRules::Strict,
        )
        .unwrap();
        assert_eq!(bits.as_bit_string().unwrap(), (0, &[0x04, 0xAB][..]));

        let bad_padding = [0x03, 0x02, 0x01, 0x01];
        assert!(decode_all(&SchemaType::BitString, &bad_padding, EncodingRules::Strict).is_err());

        // 2.5.4.3
        let oid = decode_all(
            &SchemaType::ObjectIdentifier,
            &[0x06, 0x03, 0x55, 0x04, 0x03],
            EncodingRules::Strict,
        )
        .unwrap();
        assert_eq!(oid.as_oid().unwrap(), "2.5.4.3");

        // Last subidentifier octet still has its continuation bit set.
        let err = decode_all(
            &SchemaType::ObjectIdentifier,
            &[0x06, 0x02, 0x55, 0x84],
            EncodingRules::Lenient,
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::MalformedEncoding(_)));
    }

    #[test]
    fn strict_rejects_trailing_members_and_bytes() {
        const ONE: [Field; 1] = [Field::required("x", SchemaType::Integer(None))];
        const SINGLE: SchemaType = SchemaType::Sequence(&ONE);
        let extra_member = [0x30, 0x05, 0x02, 0x01, 0x01, 0x05, 0x00];
        assert!(decode_all(&SINGLE, &extra_member, EncodingRules::Strict).is_err());
        assert!(decode_all(&SINGLE, &extra_member, EncodingRules::Lenient).is_ok());

        let trailing = [0x30, 0x03, 0x02, 0x01, 0x01, 0xFF];
        assert!(decode_all(&SINGLE, &trailing, EncodingRules::Strict).is_err());
        assert!(decode_all(&SINGLE, &trailing, EncodingRules::Lenient).is_ok());
    }

    #[test]
    fn explicit_wrapper() {
        const VERSION: SchemaType = SchemaType::Explicit(Tag::context(0), &SchemaType::Integer(None));
        let buf = [0xA0, 0x03, 0x02, 0x01, 0x02];
        assert_eq!(
            decode_all(&VERSION, &buf, EncodingRules::Strict).unwrap(),
            DecodedValue::Integer(2)
        );
    }

    #[test]
    fn decode_returns_next_offset() {
        let buf = [0x02, 0x01, 0x01, 0x02, 0x01, 0x02];
        let int = SchemaType::Integer(None);
        let (first, next) = decode(&int, &buf, 0, EncodingRules::Strict).unwrap();
        let (second, end) = decode(&int, &buf, next, EncodingRules::Strict).unwrap();
        assert_eq!(first, DecodedValue::Integer(1));
        assert_eq!(second, DecodedValue::Integer(2));
        assert_eq!(end, buf.len());
    }
}
