//! Error types for WotVouch.
//!
//! Every failure is terminal for the vouch (and the batch) it occurs in.
//! Nothing here is ever downgraded to a warning.

use crate::identity::{SigId, Uid};

/// Which part of a vouch's declared subject disagreed with the local identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectField {
    Username,
    Uid,
    EldestKid,
}

impl SubjectField {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Uid => "uid",
            Self::EldestKid => "eldest kid",
        }
    }
}

impl std::fmt::Display for SubjectField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vouch verification error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum VouchError {
    #[error("Error loading user {uid}: {reason}")]
    IdentityLoadFailed { uid: Uid, reason: String },

    #[error("Error loading myself: {0}")]
    SelfLoadFailed(String),

    #[error("Could not find link {sig_id} in the sigchain of {uid}")]
    LinkNotFound { uid: Uid, sig_id: SigId },

    #[error("Link {0} is revoked")]
    LinkRevoked(SigId),

    #[error("Link {sig_id} is not a web-of-trust vouch (found {kind})")]
    WrongLinkType { sig_id: SigId, kind: &'static str },

    #[error("Expansion does not match its on-chain commitment {expansion_id}")]
    ExpansionHashMismatch { expansion_id: String },

    #[error("Expansion does not fit the web-of-trust schema: {0}")]
    ExpansionDecodeError(String),

    #[error("Vouch {field} isn't me: {actual} != {expected}")]
    SubjectMismatch {
        field: SubjectField,
        expected: String,
        actual: String,
    },

    #[error("Unknown username verification method: {0}")]
    UnknownVerificationMethod(String),

    #[error("Confidence field {field} must be {expected}")]
    BadFieldType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Could not look up username for {uid}: {reason}")]
    IdentityLookupFailed { uid: Uid, reason: String },

    #[error("Confidence field {field} does not fit the canonical schema: {reason}")]
    SchemaMismatch { field: &'static str, reason: String },

    #[error("Fetching pending vouches failed: {0}")]
    RemoteFetchFailed(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VouchError {
    /// True for the errors raised by the call context rather than by the data.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, VouchError>;
