//! Hash computation for result files and signed quantities.

use sha2::{Digest, Sha256, Sha384, Sha512};

use super::DigestBytes;
use crate::HashAlgorithm;

impl HashAlgorithm {
    /// Hash `data` with this algorithm.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> DigestBytes {
        let bytes = match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        };
        DigestBytes {
            algo: self,
            bytes: bytes.into_boxed_slice(),
        }
    }
}

/// SHA-512 of a result file, the quantity recorded by the terminal.
#[must_use]
pub fn hash_file_bytes(data: &[u8]) -> DigestBytes {
    HashAlgorithm::Sha512.digest(data)
}

/// Digest handed to the signature engine for a record: the terminal signs
/// the SHA-512 of the recorded file hash, not the hash itself.
#[must_use]
pub fn signed_quantity(recorded_hash: &[u8]) -> DigestBytes {
    HashAlgorithm::Sha512.digest(recorded_hash)
}
