//! Tag-length-value reader and writer.
//!
//! This layer knows nothing about schemas: it splits a buffer into
//! `(tag, constructed, content)` triples and leaves recursion to the schema
//! decoder. Content is always a borrowed slice of the input buffer.
//!
//! Two rule sets are supported:
//! - [`EncodingRules::Lenient`] follows BER: non-minimal lengths and tags are
//!   accepted, constructed values may use the indefinite length form.
//! - [`EncodingRules::Strict`] follows DER: only definite, minimal lengths and
//!   minimal tag numbers are accepted.

use std::fmt;

use crate::infra::error::{VerifyError, VerifyResult};

/// Nesting bound for indefinite-length scanning and BER string segments.
pub(crate) const MAX_NESTING: usize = 64;

/// Tag class, bits 8-7 of the identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagClass {
    Universal,
    Application,
    Context,
    Private,
}

impl TagClass {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::Context,
            _ => TagClass::Private,
        }
    }

    fn bits(self) -> u8 {
        match self {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::Context => 0x80,
            TagClass::Private => 0xC0,
        }
    }
}

/// Tag class plus tag number; the constructed bit lives on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub class: TagClass,
    pub number: u32,
}

impl Tag {
    pub const END_OF_CONTENTS: Tag = Tag::universal(0);
    pub const BOOLEAN: Tag = Tag::universal(1);
    pub const INTEGER: Tag = Tag::universal(2);
    pub const BIT_STRING: Tag = Tag::universal(3);
    pub const OCTET_STRING: Tag = Tag::universal(4);
    pub const NULL: Tag = Tag::universal(5);
    pub const OBJECT_IDENTIFIER: Tag = Tag::universal(6);
    pub const ENUMERATED: Tag = Tag::universal(10);
    pub const UTF8_STRING: Tag = Tag::universal(12);
    pub const SEQUENCE: Tag = Tag::universal(16);
    pub const SET: Tag = Tag::universal(17);
    pub const NUMERIC_STRING: Tag = Tag::universal(18);
    pub const PRINTABLE_STRING: Tag = Tag::universal(19);
    pub const TELETEX_STRING: Tag = Tag::universal(20);
    pub const IA5_STRING: Tag = Tag::universal(22);
    pub const VISIBLE_STRING: Tag = Tag::universal(26);
    pub const GENERAL_STRING: Tag = Tag::universal(27);
    pub const UNIVERSAL_STRING: Tag = Tag::universal(28);
    pub const BMP_STRING: Tag = Tag::universal(30);

    #[must_use]
    pub const fn universal(number: u32) -> Self {
        Self {
            class: TagClass::Universal,
            number,
        }
    }

    #[must_use]
    pub const fn context(number: u32) -> Self {
        Self {
            class: TagClass::Context,
            number,
        }
    }

    #[must_use]
    pub const fn application(number: u32) -> Self {
        Self {
            class: TagClass::Application,
            number,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            TagClass::Universal => write!(f, "[UNIVERSAL {}]", self.number),
            TagClass::Application => write!(f, "[APPLICATION {}]", self.number),
            TagClass::Context => write!(f, "[{}]", self.number),
            TagClass::Private => write!(f, "[PRIVATE {}]", self.number),
        }
    }
}

/// Length/tag canonicality rules applied while reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingRules {
    /// BER-style reading, used for the vendor envelope.
    #[default]
    Lenient,
    /// DER-style reading, used for certificates.
    Strict,
}

impl EncodingRules {
    #[must_use]
    pub fn is_strict(self) -> bool {
        matches!(self, EncodingRules::Strict)
    }
}

/// One tag-length-value element borrowed from an input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvNode<'a> {
    pub tag: Tag,
    pub constructed: bool,
    /// Content octets (end-of-contents marker excluded for indefinite form).
    pub content: &'a [u8],
    /// The complete encoding: identifier, length and content octets.
    pub raw: &'a [u8],
    /// Offset of the identifier octet within the buffer it was read from.
    pub offset: usize,
    /// Offset of the first content octet within that buffer.
    pub content_offset: usize,
    pub indefinite: bool,
}

/// Read one TLV element starting at `offset`.
///
/// Returns the node and the offset of the first byte after it.
pub fn read_tlv(
    buffer: &[u8],
    offset: usize,
    rules: EncodingRules,
) -> VerifyResult<(TlvNode<'_>, usize)> {
    read_node(buffer, offset, rules, 0)
}

fn read_node(
    buffer: &[u8],
    offset: usize,
    rules: EncodingRules,
    depth: usize,
) -> VerifyResult<(TlvNode<'_>, usize)> {
    if depth > MAX_NESTING {
        return Err(VerifyError::malformed_at(offset, "nesting too deep"));
    }
    if buffer.len().saturating_sub(offset) < 2 {
        return Err(VerifyError::malformed_at(
            offset,
            "fewer than 2 bytes remain for a tag and length header",
        ));
    }

    let (tag, constructed, mut pos) = read_tag(buffer, offset, rules)?;
    let Some(&first) = buffer.get(pos) else {
        return Err(VerifyError::malformed_at(pos, "missing length octet"));
    };
    pos += 1;

    if first == 0x80 {
        if rules.is_strict() {
            return Err(VerifyError::malformed_at(
                offset,
                "indefinite length is not allowed",
            ));
        }
        if !constructed {
            return Err(VerifyError::malformed_at(
                offset,
                "indefinite length on a primitive encoding",
            ));
        }
        let start = pos;
        let mut cursor = pos;
        loop {
            if buffer.len().saturating_sub(cursor) >= 2
                && buffer[cursor] == 0
                && buffer[cursor + 1] == 0
            {
                let node = TlvNode {
                    tag,
                    constructed,
                    content: &buffer[start..cursor],
                    raw: &buffer[offset..cursor + 2],
                    offset,
                    content_offset: start,
                    indefinite: true,
                };
                return Ok((node, cursor + 2));
            }
            let (_, next) = read_node(buffer, cursor, rules, depth + 1)?;
            cursor = next;
        }
    }

    let length = if first & 0x80 == 0 {
        usize::from(first)
    } else {
        let count = usize::from(first & 0x7f);
        if count == 0x7f {
            return Err(VerifyError::malformed_at(offset, "reserved length octet 0xff"));
        }
        if count > std::mem::size_of::<usize>() {
            return Err(VerifyError::malformed_at(
                offset,
                format!("length of {count} octets does not fit in memory"),
            ));
        }
        if pos + count > buffer.len() {
            return Err(VerifyError::malformed_at(
                offset,
                "long-form length claims more bytes than remain",
            ));
        }
        let length_octets = &buffer[pos..pos + count];
        if rules.is_strict() && length_octets[0] == 0 {
            return Err(VerifyError::malformed_at(
                offset,
                "non-minimal length: leading zero octet",
            ));
        }
        let length = length_octets
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        if rules.is_strict() && length < 0x80 {
            return Err(VerifyError::malformed_at(
                offset,
                "non-minimal length: long form used for a short length",
            ));
        }
        pos += count;
        length
    };

    let end = pos
        .checked_add(length)
        .filter(|&end| end <= buffer.len())
        .ok_or_else(|| {
            VerifyError::malformed_at(
                offset,
                format!(
                    "content length {length} exceeds the {} bytes remaining",
                    buffer.len() - pos
                ),
            )
        })?;

    let node = TlvNode {
        tag,
        constructed,
        content: &buffer[pos..end],
        raw: &buffer[offset..end],
        offset,
        content_offset: pos,
        indefinite: false,
    };
    Ok((node, end))
}

fn read_tag(buffer: &[u8], offset: usize, rules: EncodingRules) -> VerifyResult<(Tag, bool, usize)> {
    let identifier = buffer[offset];
    let class = TagClass::from_bits(identifier >> 6);
    let constructed = identifier & 0x20 != 0;
    let low = identifier & 0x1f;
    let mut pos = offset + 1;

    if low != 0x1f {
        return Ok((
            Tag {
                class,
                number: u32::from(low),
            },
            constructed,
            pos,
        ));
    }

    // High tag number form: base-128, most significant group first.
    let mut number: u32 = 0;
    let mut groups = 0;
    loop {
        let Some(&byte) = buffer.get(pos) else {
            return Err(VerifyError::malformed_at(
                offset,
                "tag number continuation runs past the end of the buffer",
            ));
        };
        if groups == 0 && byte == 0x80 {
            return Err(VerifyError::malformed_at(
                offset,
                "tag number starts with an empty base-128 group",
            ));
        }
        groups += 1;
        if groups > 5 || number > (u32::MAX >> 7) {
            return Err(VerifyError::malformed_at(offset, "tag number overflows 32 bits"));
        }
        number = (number << 7) | u32::from(byte & 0x7f);
        pos += 1;
        if byte & 0x80 == 0 {
            break;
        }
    }

    if rules.is_strict() && number < 0x1f {
        return Err(VerifyError::malformed_at(
            offset,
            format!("tag number {number} must use the single-octet form"),
        ));
    }

    Ok((Tag { class, number }, constructed, pos))
}

/// Sequential reader over a window of sibling TLV elements.
///
/// Offsets stay relative to the full input buffer so that diagnostics point
/// at the right place even deep inside nested values.
#[derive(Debug, Clone)]
pub struct TlvReader<'a> {
    buffer: &'a [u8],
    pos: usize,
    end: usize,
    rules: EncodingRules,
}

impl<'a> TlvReader<'a> {
    /// Reader over a whole buffer.
    #[must_use]
    pub fn new(buffer: &'a [u8], rules: EncodingRules) -> Self {
        Self {
            buffer,
            pos: 0,
            end: buffer.len(),
            rules,
        }
    }

    /// Reader over the content octets of a constructed `node` read from `buffer`.
    #[must_use]
    pub fn children(buffer: &'a [u8], node: &TlvNode<'a>, rules: EncodingRules) -> Self {
        Self {
            buffer,
            pos: node.content_offset,
            end: node.content_offset + node.content.len(),
            rules,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Look at the next element without consuming it.
    pub fn peek(&self) -> VerifyResult<Option<TlvNode<'a>>> {
        if self.is_empty() {
            return Ok(None);
        }
        read_tlv(&self.buffer[..self.end], self.pos, self.rules).map(|(node, _)| Some(node))
    }

    /// Consume and return the next element.
    pub fn next_node(&mut self) -> VerifyResult<Option<TlvNode<'a>>> {
        if self.is_empty() {
            return Ok(None);
        }
        let (node, next) = read_tlv(&self.buffer[..self.end], self.pos, self.rules)?;
        self.pos = next;
        Ok(Some(node))
    }

    /// Read every remaining element.
    pub fn collect_nodes(mut self) -> VerifyResult<Vec<TlvNode<'a>>> {
        let mut nodes = Vec::new();
        while let Some(node) = self.next_node()? {
            nodes.push(node);
        }
        Ok(nodes)
    }
}

/// Append a definite, minimal-length TLV element to `out`.
pub fn write_tlv(out: &mut Vec<u8>, tag: Tag, constructed: bool, content: &[u8]) {
    let mut identifier = tag.class.bits();
    if constructed {
        identifier |= 0x20;
    }
    if tag.number < 0x1f {
        // number < 31 always fits in the low five bits
        #[allow(clippy::cast_possible_truncation)]
        out.push(identifier | tag.number as u8);
    } else {
        out.push(identifier | 0x1f);
        let mut groups = Vec::with_capacity(5);
        let mut number = tag.number;
        loop {
            #[allow(clippy::cast_possible_truncation)]
            groups.push((number & 0x7f) as u8);
            number >>= 7;
            if number == 0 {
                break;
            }
        }
        let last = groups.len() - 1;
        for (i, group) in groups.iter().rev().enumerate() {
            out.push(if i == last { *group } else { group | 0x80 });
        }
    }
    write_length(out, content.len());
    out.extend_from_slice(content);
}

fn write_length(out: &mut Vec<u8>, length: usize) {
    if length < 0x80 {
        #[allow(clippy::cast_possible_truncation)]
        out.push(length as u8);
        return;
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];
    #[allow(clippy::cast_possible_truncation)]
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}
