//! WotVouch: web-of-trust pending vouch verification.
//!
//! Takes "pending vouch" claims reported by an untrusted server and
//! proves each one against the voucher's verified signature chain
//! before it is surfaced: the chain link must exist, be a vouch and
//! not be revoked, the off-chain expansion must hash to the on-chain
//! commitment, the vouch must name the local identity, and its
//! confidence metadata must normalize into the canonical record.

pub mod chain;
pub mod confidence;
pub mod context;
pub mod error;
pub mod expansion;
pub mod fetch;
pub mod identity;
pub mod pending;
pub mod storage;
pub mod subject;
pub mod time;

// Re-export primary types
pub use chain::{ChainLink, ChainLinkResolver, LinkBody, VerifiedUser, VouchChainLink};
pub use confidence::{normalize_confidence, Confidence, UsernameLookup, UsernameVerificationType};
pub use context::{CancellationToken, VouchContext};
pub use error::{Result, SubjectField, VouchError};
pub use expansion::{ExpansionExtractor, ExpansionId, Sha256Extractor};
pub use fetch::{fetch_pending_vouches, PendingVouchApi, PendingVouchResponse};
pub use identity::{Kid, LocalIdentity, LocalIdentityLoader, Seqno, SigId, Uid, UserVersion};
pub use pending::{transform_pending, PendingVouch, ServerPendingVouch, VouchServices};
