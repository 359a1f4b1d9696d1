//! Urna Verifier Library
//!
//! Authenticity verification for the result files of electronic voting
//! terminals. A terminal closes an election by writing a results bulletin,
//! an event log and a signature envelope; this library decodes the envelope,
//! extracts the terminal certificate, and checks both files against the
//! hashes and signatures the terminal recorded.
//!
//! Layers:
//! - `domain`: TLV reader, schema-driven decoder/encoder, envelope and
//!   certificate models, digests and report types
//! - `services`: signature schemes and the verification sequence
//! - `pipelines`: path-level workflow used by the CLI
//! - `infra`: configuration and error types

pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

pub use infra::{config, error};

use std::fmt;
use std::str::FromStr;

pub use domain::certificate::TerminalCertificate;
pub use domain::envelope::{FileSignatureList, SignatureEnvelope};
pub use domain::tlv::EncodingRules;
pub use domain::verification::{FileVerification, VerificationReport};
pub use error::{ErrorKind, VerifyError, VerifyResult};
pub use pipelines::verify::VerifyWorkflow;
pub use services::signature::{SignatureEngine, SignatureScheme};
pub use services::verification::{VerificationOptions, VerificationService};

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Map an envelope `hashAlgorithm` code. SHA-1 (code 1) and unknown
    /// codes have no counterpart here.
    #[must_use]
    pub fn from_envelope_code(code: i64) -> Option<Self> {
        match code {
            2 => Some(HashAlgorithm::Sha256),
            3 => Some(HashAlgorithm::Sha384),
            4 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(VerifyError::UnsupportedAlgorithm(format!(
                "hash algorithm {other}"
            ))),
        }
    }
}

/// Verify a bulletin and log against their signature envelope with the
/// default record positions.
pub fn verify_result_files(
    envelope: &[u8],
    bulletin: &[u8],
    log: &[u8],
) -> VerifyResult<VerificationReport> {
    VerificationService::new().verify(envelope, bulletin, log)
}
