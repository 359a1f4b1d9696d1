//! Error types for result-file verification.
//! Error handling types and result definitions shared by every layer.

use thiserror::Error;

use crate::domain::crypto::DigestBytesError;

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Comprehensive error types for verification operations.
///
/// Signature or hash mismatches are never reported through this type; they
/// are ordinary outcomes carried by the verification report.
#[derive(Error, Debug, miette::Diagnostic)]
pub enum VerifyError {
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("No matching CHOICE alternative: {0}")]
    NoMatchingAlternative(String),

    #[error("Unknown enumerated value: {0}")]
    UnknownEnumValue(String),

    #[error("Unexpected attribute encoding: {0}")]
    UnexpectedAttributeEncoding(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Failure category of a [`VerifyError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedEncoding,
    SchemaMismatch,
    NoMatchingAlternative,
    UnknownEnumValue,
    UnexpectedAttributeEncoding,
    UnsupportedAlgorithm,
    InvalidKeyMaterial,
    InvalidInput,
    Io,
    Configuration,
}

impl VerifyError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::MalformedEncoding(_) => ErrorKind::MalformedEncoding,
            VerifyError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            VerifyError::NoMatchingAlternative(_) => ErrorKind::NoMatchingAlternative,
            VerifyError::UnknownEnumValue(_) => ErrorKind::UnknownEnumValue,
            VerifyError::UnexpectedAttributeEncoding(_) => ErrorKind::UnexpectedAttributeEncoding,
            VerifyError::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            VerifyError::InvalidKeyMaterial(_) => ErrorKind::InvalidKeyMaterial,
            VerifyError::InvalidInput(_) => ErrorKind::InvalidInput,
            VerifyError::IoError(_) => ErrorKind::Io,
            VerifyError::ConfigurationError(_) => ErrorKind::Configuration,
        }
    }

    /// Shorthand for a malformed-encoding error anchored at a buffer offset.
    pub(crate) fn malformed_at(offset: usize, reason: impl AsRef<str>) -> Self {
        VerifyError::MalformedEncoding(format!("{} (offset {offset})", reason.as_ref()))
    }
}

impl From<std::io::Error> for VerifyError {
    fn from(error: std::io::Error) -> Self {
        VerifyError::IoError(error.to_string())
    }
}

impl From<DigestBytesError> for VerifyError {
    fn from(error: DigestBytesError) -> Self {
        VerifyError::InvalidInput(error.to_string())
    }
}
