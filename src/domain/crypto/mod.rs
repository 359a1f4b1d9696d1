//! Digest types and hashing helpers.
//!
//! Result files are identified by their SHA-512 digest. `DigestBytes` pairs a
//! digest with its algorithm and guarantees the length matches, so the
//! signature engine never sees a truncated or oversized hash.

mod digest_bytes;
mod hash;

pub use digest_bytes::{DigestBytes, DigestBytesError};
pub use hash::{hash_file_bytes, signed_quantity};
