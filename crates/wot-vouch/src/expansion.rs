//! Sig expansions: off-chain vouch details bound to an on-chain hash.
//!
//! A vouch link commits to its human-readable details by hash only. The
//! server hands back the details as JSON text; an `ExpansionExtractor`
//! releases those bytes only if they match the commitment, and only then
//! are they decoded into the web-of-trust expansion schema:
//!
//! ```json
//! {
//!   "user": {
//!     "eldest": { "KID": "...", "Seqno": 1 },
//!     "seq_tail": { "PayloadHash": "...", "Seqno": 9, "SigID": "..." },
//!     "UID": "...",
//!     "Username": "..."
//!   },
//!   "confidence": { "username_verified_via": "video", "vouched_by": ["..."] },
//!   "vouch_text": ["..."]
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{Result, VouchError};
use crate::identity::{Kid, Seqno, Uid};

/// Hash commitment to an expansion object, as recorded in a chain link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpansionId(pub String);

impl ExpansionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExpansionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Releases expansion bytes only when they match their commitment.
pub trait ExpansionExtractor {
    /// Return the exact expansion bytes for `expansion_id`.
    ///
    /// Must fail with `VouchError::ExpansionHashMismatch` unless the bytes
    /// hash to `expansion_id`.
    fn extract(&self, expansion_id: &ExpansionId, expansion_json: &str) -> Result<Vec<u8>>;
}

/// Extractor whose commitment is the hex SHA-256 of the exact JSON bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Extractor;

impl Sha256Extractor {
    /// The identifier a producer commits to for `bytes`.
    pub fn expansion_id_for(bytes: &[u8]) -> ExpansionId {
        ExpansionId(hex::encode(Sha256::digest(bytes)))
    }
}

impl ExpansionExtractor for Sha256Extractor {
    fn extract(&self, expansion_id: &ExpansionId, expansion_json: &str) -> Result<Vec<u8>> {
        let mismatch = || VouchError::ExpansionHashMismatch {
            expansion_id: expansion_id.0.clone(),
        };

        let committed = hex::decode(expansion_id.as_str()).map_err(|_| mismatch())?;
        let actual = Sha256::digest(expansion_json.as_bytes());

        if committed.as_slice() != actual.as_slice() {
            return Err(mismatch());
        }

        Ok(expansion_json.as_bytes().to_vec())
    }
}

/// Eldest key of the vouched-for user, as signed by the voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionEldest {
    #[serde(rename = "KID", alias = "kid")]
    pub kid: Kid,
    #[serde(rename = "Seqno", alias = "seqno", default)]
    pub seqno: Seqno,
}

/// Tip of the vouched-for user's chain when the vouch was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionSeqTail {
    #[serde(rename = "PayloadHash", alias = "payload_hash", default)]
    pub payload_hash: String,
    #[serde(rename = "Seqno", alias = "seqno", default)]
    pub seqno: Seqno,
    #[serde(rename = "SigID", alias = "sig_id", default)]
    pub sig_id: String,
}

/// The user a vouch is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionUser {
    pub eldest: ExpansionEldest,
    #[serde(default)]
    pub seq_tail: Option<ExpansionSeqTail>,
    #[serde(rename = "UID", alias = "uid")]
    pub uid: Uid,
    #[serde(rename = "Username", alias = "username")]
    pub username: String,
}

/// Decoded web-of-trust expansion. Stays inside the crate: only
/// verified `PendingVouch` records leave it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ExpansionDetails {
    pub user: ExpansionUser,
    #[serde(default)]
    pub confidence: Option<Map<String, Value>>,
    #[serde(rename = "vouch_text", default, deserialize_with = "null_as_empty")]
    pub vouch_texts: Vec<String>,
}

/// Decode a list field, reading an explicit `null` as an empty list.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Decode hash-verified expansion bytes into the web-of-trust schema.
pub(crate) fn decode_expansion(bytes: &[u8]) -> Result<ExpansionDetails> {
    serde_json::from_slice(bytes).map_err(|e| VouchError::ExpansionDecodeError(e.to_string()))
}
