//! Verification service: checks result files against a signature envelope.
//!
//! Sequence: decode envelope, take the hardware signature block, decode its
//! file-signature list, pick the bulletin and log records by position,
//! decode the embedded certificate, then hash and verify each file. Any
//! structural failure aborts with an error; hash or signature mismatches are
//! reported in the `VerificationReport`.

use crate::domain::certificate::{PublicKeyMaterial, TerminalCertificate};
use crate::domain::crypto::{hash_file_bytes, signed_quantity};
use crate::domain::envelope::{FileSignature, SignatureEnvelope};
use crate::domain::verification::{FileVerification, VerificationReport};
use crate::infra::config::VerifierConfiguration;
use crate::infra::error::VerifyResult;
use crate::services::signature::{SignatureEngine, SignatureScheme};

/// Knobs of the verification sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationOptions {
    /// Position of the results bulletin record in the file-signature list.
    pub bulletin_index: usize,
    /// Position of the terminal log record in the file-signature list.
    pub log_index: usize,
    pub accept_pem_certificates: bool,
    /// Characters stripped from the Common Name to get the terminal id.
    pub terminal_id_prefix_len: usize,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            bulletin_index: 0,
            log_index: 10,
            accept_pem_certificates: true,
            terminal_id_prefix_len: 4,
        }
    }
}

impl From<&VerifierConfiguration> for VerificationOptions {
    fn from(config: &VerifierConfiguration) -> Self {
        Self {
            bulletin_index: config.record_positions.bulletin_index,
            log_index: config.record_positions.log_index,
            accept_pem_certificates: config.accept_pem_certificates,
            terminal_id_prefix_len: config.terminal_id_prefix_len,
        }
    }
}

/// Service performing structural & cryptographic verification of a result
/// package.
#[derive(Debug, Clone, Default)]
pub struct VerificationService {
    options: VerificationOptions,
}

impl VerificationService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: VerificationOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &VerificationOptions {
        &self.options
    }

    /// Verify the bulletin and log files against `envelope`.
    pub fn verify(
        &self,
        envelope: &[u8],
        bulletin_bytes: &[u8],
        log_bytes: &[u8],
    ) -> VerifyResult<VerificationReport> {
        let envelope = SignatureEnvelope::decode(envelope)?;
        let hardware = &envelope.hardware_signature;
        let files = hardware.file_signatures()?;
        log::debug!("File signature list holds {} records", files.len());

        let bulletin_record = files.record(self.options.bulletin_index)?;
        let log_record = files.record(self.options.log_index)?;

        let certificate = TerminalCertificate::from_embedded(
            hardware.certificate()?,
            self.options.accept_pem_certificates,
        )?;
        let public_key = certificate.public_key();
        let scheme = SignatureScheme::from_oid(public_key.algorithm_oid)?;
        let common_name = certificate.common_name()?;
        let subject_dn = certificate.subject_dn();
        log::info!("Terminal certificate {subject_dn} uses {scheme}");

        let bulletin = Self::check_file(bulletin_record, bulletin_bytes, &public_key)?;
        let terminal_log = Self::check_file(log_record, log_bytes, &public_key)?;

        let report = VerificationReport {
            terminal_id: common_name
                .chars()
                .skip(self.options.terminal_id_prefix_len)
                .collect(),
            common_name,
            subject_dn,
            algorithm: scheme.name().to_string(),
            bulletin,
            log: terminal_log,
        };
        if report.success() {
            log::info!("Result files of terminal {} verified", report.terminal_id);
        } else {
            log::warn!(
                "Result files of terminal {} failed verification",
                report.terminal_id
            );
        }
        Ok(report)
    }

    /// Hash `contents` and verify the record's signature over its recorded
    /// hash; the two results are reported separately.
    fn check_file(
        record: &FileSignature,
        contents: &[u8],
        public_key: &PublicKeyMaterial<'_>,
    ) -> VerifyResult<FileVerification> {
        let recorded_hash = &record.signature.hash;
        let recomputed_hash = hash_file_bytes(contents);
        let signature_valid = SignatureEngine::verify(
            signed_quantity(recorded_hash).as_slice(),
            &record.signature.signature,
            public_key,
        )?;

        let verification = FileVerification {
            file_name: record.file_name.clone(),
            recorded_hash: recorded_hash.clone(),
            recomputed_hash: recomputed_hash.into_vec(),
            signature_valid,
        };
        log::info!("{verification}");
        Ok(verification)
    }
}
