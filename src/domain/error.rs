//! Error kinds surfaced to the user

use thiserror::Error;

/// Why an address was refused by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("invalid address")]
    InvalidFormat,
    #[error("address already tracked")]
    Duplicate,
}

/// Every failure the tracker reports. None of them is fatal.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid address: {0}")]
    InvalidFormat(String),

    #[error("address already tracked: {0}")]
    Duplicate(String),

    #[error("lookup failed: {0}")]
    NetworkFailure(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("failed to read {path}: {reason}")]
    ParseFailure { path: String, reason: String },
}

impl TrackerError {
    pub fn rejected(reason: RejectReason, input: &str) -> Self {
        match reason {
            RejectReason::InvalidFormat => TrackerError::InvalidFormat(input.to_string()),
            RejectReason::Duplicate => TrackerError::Duplicate(input.to_string()),
        }
    }

    pub fn parse_failure(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        TrackerError::ParseFailure {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
