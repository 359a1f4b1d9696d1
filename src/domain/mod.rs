pub mod certificate;
pub mod crypto;
pub mod envelope;
pub mod schema;
pub mod tlv; // BER/DER tag-length-value reader
pub mod verification;
