//! Verification domain types for voting-terminal result files.
//!
//! Aggregates the outcome of checking each result file against its record in
//! the envelope. The hash comparison and the signature check are kept as
//! separate facts: a substituted file with an intact signature and a genuine
//! file with a broken signature must be told apart.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of checking one result file against its envelope record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVerification {
    /// Name stored in the record (informational; records are addressed by
    /// position).
    pub file_name: String,
    /// Hash the terminal recorded for the file.
    #[serde(with = "hex")]
    pub recorded_hash: Vec<u8>,
    /// SHA-512 of the file bytes that were presented.
    #[serde(with = "hex")]
    pub recomputed_hash: Vec<u8>,
    /// True if the record's signature over the recorded hash verifies.
    pub signature_valid: bool,
}

impl FileVerification {
    /// True if the presented file is the one the terminal recorded.
    #[must_use]
    pub fn hash_matches(&self) -> bool {
        self.recorded_hash == self.recomputed_hash
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.hash_matches() && self.signature_valid
    }

    #[must_use]
    pub fn recorded_hex(&self) -> String {
        hex::encode(&self.recorded_hash)
    }

    #[must_use]
    pub fn recomputed_hex(&self) -> String {
        hex::encode(&self.recomputed_hash)
    }
}

impl fmt::Display for FileVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |ok: bool| if ok { "ok" } else { "FAILED" };
        write!(
            f,
            "{}: hash {}, signature {}",
            self.file_name,
            mark(self.hash_matches()),
            mark(self.signature_valid)
        )
    }
}

/// Result of verifying a result package against its signature envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Common Name of the terminal certificate.
    pub common_name: String,
    /// Common Name without its fixed prefix.
    pub terminal_id: String,
    /// Full subject distinguished name, for display.
    pub subject_dn: String,
    /// Signature scheme selected from the certificate key.
    pub algorithm: String,
    pub bulletin: FileVerification,
    pub log: FileVerification,
}

impl VerificationReport {
    /// Overall success indicator: both files match and both signatures
    /// verify.
    #[must_use]
    pub fn success(&self) -> bool {
        self.bulletin.success() && self.log.success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(recorded: u8, recomputed: u8, signature_valid: bool) -> FileVerification {
        FileVerification {
            file_name: "bulletin.dat".to_string(),
            recorded_hash: vec![recorded; 64],
            recomputed_hash: vec![recomputed; 64],
            signature_valid,
        }
    }

    #[test]
    fn hash_and_signature_are_independent() {
        let substituted = file(1, 2, true);
        assert!(!substituted.hash_matches());
        assert!(substituted.signature_valid);
        assert!(!substituted.success());

        let forged = file(1, 1, false);
        assert!(forged.hash_matches());
        assert!(!forged.success());

        assert!(file(3, 3, true).success());
        assert_eq!(
            substituted.to_string(),
            "bulletin.dat: hash FAILED, signature ok"
        );
        assert_eq!(substituted.recorded_hex(), "01".repeat(64));
        assert_eq!(substituted.recomputed_hex(), "02".repeat(64));
    }

    #[test]
    fn report_serializes_hashes_as_hex() {
        let report = VerificationReport {
            common_name: "UE2020123456".to_string(),
            terminal_id: "2020123456".to_string(),
            subject_dn: "CN=UE2020123456".to_string(),
            algorithm: "ecdsa-p521".to_string(),
            bulletin: file(0xAB, 0xAB, true),
            log: file(0x01, 0x02, true),
        };
        assert!(!report.success());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["bulletin"]["recorded_hash"], "ab".repeat(64));
        assert_eq!(json["log"]["signature_valid"], true);

        let back: VerificationReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
