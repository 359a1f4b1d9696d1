//! Service layer module root.
//! Contains the signature schemes and the verification sequence.

pub mod signature;
pub mod verification;

pub use signature::{SignatureEngine, SignatureScheme, SignatureVerifier};
pub use verification::{VerificationOptions, VerificationService};
