//! `VerifyWorkflow`: high-level facade for verifying a terminal's result files.
//!
//! Delegates to `VerificationService`; this layer only adds file reading and
//! configuration plumbing.

use std::path::Path;

use crate::{
    domain::envelope::{FileSignatureList, SignatureEnvelope},
    domain::verification::VerificationReport,
    infra::config::VerifierConfiguration,
    services::verification::{VerificationOptions, VerificationService},
    VerifyError, VerifyResult,
};

/// Decoded envelope together with its hardware file-signature list.
#[derive(Debug, Clone)]
pub struct EnvelopeInspection {
    pub envelope: SignatureEnvelope,
    pub files: FileSignatureList,
}

/// Orchestrates verification of one result package.
pub struct VerifyWorkflow {
    svc: VerificationService,
}

impl Default for VerifyWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl VerifyWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            svc: VerificationService::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &VerifierConfiguration) -> Self {
        Self {
            svc: VerificationService::with_options(VerificationOptions::from(config)),
        }
    }

    /// Run verification over in-memory envelope, bulletin and log bytes.
    pub fn run(
        &self,
        envelope: &[u8],
        bulletin: &[u8],
        log: &[u8],
    ) -> VerifyResult<VerificationReport> {
        self.svc.verify(envelope, bulletin, log)
    }

    /// Read the three files and verify them.
    pub fn run_paths(
        &self,
        envelope: impl AsRef<Path>,
        bulletin: impl AsRef<Path>,
        log: impl AsRef<Path>,
    ) -> VerifyResult<VerificationReport> {
        let envelope = read_input(envelope.as_ref(), "envelope")?;
        let bulletin = read_input(bulletin.as_ref(), "bulletin")?;
        let log = read_input(log.as_ref(), "log")?;
        self.run(&envelope, &bulletin, &log)
    }

    /// Decode an envelope file without checking any signature.
    pub fn inspect_path(envelope: impl AsRef<Path>) -> VerifyResult<EnvelopeInspection> {
        let bytes = read_input(envelope.as_ref(), "envelope")?;
        Self::inspect(&bytes)
    }

    pub fn inspect(envelope: &[u8]) -> VerifyResult<EnvelopeInspection> {
        let envelope = SignatureEnvelope::decode(envelope)?;
        let files = envelope.hardware_signature.file_signatures()?;
        Ok(EnvelopeInspection { envelope, files })
    }
}

fn read_input(path: &Path, what: &str) -> VerifyResult<Vec<u8>> {
    log::debug!("Reading {what} file: {}", path.display());
    std::fs::read(path).map_err(|e| {
        VerifyError::IoError(format!(
            "Failed to read {what} file {}: {e}",
            path.display()
        ))
    })
}
