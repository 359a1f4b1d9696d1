//! Subject name walking.

use der::Decode;
use x509_cert::name::Name;

use crate::domain::schema::DecodedValue;
use crate::domain::tlv::{read_tlv, EncodingRules, Tag};
use crate::infra::error::{VerifyError, VerifyResult};

/// `id-at-commonName`.
pub const COMMON_NAME_OID: &str = "2.5.4.3";

/// Tags a Common Name value may carry. UTF8String is what current terminals
/// write; older ones use PrintableString or an untyped OCTET STRING.
const COMMON_NAME_TAGS: [Tag; 3] = [Tag::PRINTABLE_STRING, Tag::OCTET_STRING, Tag::UTF8_STRING];

/// Find the Common Name in a decoded subject `Name` and return its text.
///
/// The first Common Name in RDN order wins. A subject without one is a
/// `SchemaMismatch`; a Common Name in any other string type is an
/// `UnexpectedAttributeEncoding`.
pub fn extract_common_name(subject: &DecodedValue) -> VerifyResult<String> {
    let (_, rdn_sequence) = subject.as_choice()?;
    for rdn in rdn_sequence.as_list()? {
        for attribute in rdn.as_list()? {
            if attribute.field("type")?.as_oid()? != COMMON_NAME_OID {
                continue;
            }
            let raw = attribute.field("value")?.as_raw()?;
            return common_name_text(raw);
        }
    }
    Err(VerifyError::SchemaMismatch(
        "certificate subject has no Common Name".to_string(),
    ))
}

fn common_name_text(raw: &[u8]) -> VerifyResult<String> {
    let (node, _) = read_tlv(raw, 0, EncodingRules::Strict)?;
    if node.constructed || !COMMON_NAME_TAGS.contains(&node.tag) {
        return Err(VerifyError::UnexpectedAttributeEncoding(format!(
            "Common Name is encoded with tag {} (identifier octet {:#04x})",
            node.tag,
            raw.first().copied().unwrap_or_default()
        )));
    }
    String::from_utf8(node.content.to_vec()).map_err(|e| {
        VerifyError::UnexpectedAttributeEncoding(format!("Common Name is not UTF-8: {e}"))
    })
}

/// Render a DER `Name` for display, falling back to a hex prefix when it
/// cannot be parsed.
#[must_use]
pub fn render_distinguished_name(der: &[u8]) -> String {
    match Name::from_der(der) {
        Ok(name) => name.to_string(),
        Err(e) => {
            log::debug!("Subject DN could not be rendered: {e}");
            format!(
                "Subject DN [{}]",
                hex::encode(&der[..std::cmp::min(16, der.len())])
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::certificate::NAME;
    use crate::domain::schema::decode_all;

    fn subject(value: &[u8]) -> DecodedValue {
        let mut atv = vec![0x06, 0x03, 0x55, 0x04, 0x03];
        atv.extend_from_slice(value);
        let mut seq = Vec::new();
        crate::domain::tlv::write_tlv(&mut seq, Tag::SEQUENCE, true, &atv);
        let mut set = Vec::new();
        crate::domain::tlv::write_tlv(&mut set, Tag::SET, true, &seq);
        let mut name = Vec::new();
        crate::domain::tlv::write_tlv(&mut name, Tag::SEQUENCE, true, &set);
        decode_all(&NAME, &name, EncodingRules::Strict).unwrap()
    }

    #[test]
    fn accepts_printable_octet_and_utf8() {
        assert_eq!(
            extract_common_name(&subject(&[0x13, 0x02, b'U', b'E'])).unwrap(),
            "UE"
        );
        assert_eq!(
            extract_common_name(&subject(&[0x04, 0x02, b'U', b'E'])).unwrap(),
            "UE"
        );
        assert_eq!(
            extract_common_name(&subject(&[0x0C, 0x03, b'S', 0xC3, 0xA3])).unwrap(),
            "S\u{e3}"
        );
    }

    #[test]
    fn rejects_other_string_types() {
        let err = extract_common_name(&subject(&[0x16, 0x02, b'U', b'E'])).unwrap_err();
        assert!(matches!(err, VerifyError::UnexpectedAttributeEncoding(_)));
    }

    #[test]
    fn missing_common_name() {
        let name = [0x30, 0x00];
        let value = decode_all(&NAME, &name, EncodingRules::Strict).unwrap();
        let err = extract_common_name(&value).unwrap_err();
        assert!(matches!(err, VerifyError::SchemaMismatch(_)));
    }

    #[test]
    fn renders_or_falls_back() {
        let der = [
            0x30, 0x0F, 0x31, 0x0D, 0x30, 0x0B, 0x06, 0x03, 0x55, 0x04, 0x03, 0x13, 0x04, b'U',
            b'E', b'0', b'1',
        ];
        assert_eq!(render_distinguished_name(&der), "CN=UE01");
        assert!(render_distinguished_name(&[0xFF]).starts_with("Subject DN ["));
    }
}
