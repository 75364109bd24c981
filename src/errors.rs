//! Error types for licence issuance and verification.
//!
//! Verification failures keep distinct variants so callers can tell a
//! forged licence (`InvalidSignature`) from an expired one
//! (`OutsideValidityWindow`) and from a damaged string (`DecodeError`).

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Licensing errors.
#[derive(Debug, Error)]
pub enum LicenceError {
    /// The entropy source failed while allocating a licence id.
    #[error("identity allocation failed: {0}")]
    AllocationError(String),

    /// Canonical or transport serialization failed.
    #[error("encoding failed: {0}")]
    EncodingError(String),

    /// The private key was rejected or signing failed.
    #[error("signing failed: {0}")]
    SigningError(String),

    /// The signature does not match the licence contents or the public key.
    #[error("licence signature invalid")]
    InvalidSignature,

    /// The licence is not valid at the requested instant.
    #[error("outside of licence valid times ({valid_from} to {valid_until})")]
    OutsideValidityWindow {
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    },

    /// The transport string is malformed.
    #[error("corrupt licence: {0}")]
    DecodeError(String),

    /// The licence terms are inconsistent (inverted window, empty run period).
    #[error("invalid licence terms: {0}")]
    InvalidTerms(String),

    /// Key material could not be decoded.
    #[error("key error: {0}")]
    KeyError(String),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Reading a key or configuration file failed.
    #[error("storage error: {0}")]
    StorageError(#[from] std::io::Error),
}

impl LicenceError {
    /// Returns true for verification-time outcomes the caller is expected
    /// to handle (deny the feature, report a corrupt or expired licence).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LicenceError::InvalidSignature
                | LicenceError::OutsideValidityWindow { .. }
                | LicenceError::DecodeError(_)
        )
    }

    /// Returns true if the licence must be treated as untrusted.
    pub fn is_forged(&self) -> bool {
        matches!(self, LicenceError::InvalidSignature)
    }

    /// Returns true if the licence is authentic but not valid right now.
    pub fn is_expired(&self) -> bool {
        matches!(self, LicenceError::OutsideValidityWindow { .. })
    }
}

/// Result type for licence operations.
pub type LicenceResult<T> = Result<T, LicenceError>;
