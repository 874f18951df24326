//! Sigchain view: verified users and their typed chain links.
//!
//! Chain links arrive here already signature-verified and with their
//! revocation state settled by the sigchain loader. This module only
//! describes them:
//! - `ChainLink` with a closed `LinkBody` variant type
//! - `VouchChainLink`, the narrowed web-of-trust vouch variant
//! - `VerifiedUser`, a loaded identity with its links
//! - `ChainLinkResolver`, the seam to whatever loads sigchains

pub mod classify;
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::context::VouchContext;
use crate::error::Result;
use crate::expansion::ExpansionId;
use crate::identity::{Kid, Seqno, SigId, Uid, UserVersion};

pub use classify::get_vouch_chain_link;
pub use memory::MemoryChains;

/// Payload of a chain link, by link type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkBody {
    /// Establishes a new key lineage.
    Eldest { kid: Kid },
    /// Delegates a signing key.
    Sibkey { kid: Kid },
    /// Delegates an encryption key.
    Subkey { kid: Kid },
    /// Revokes earlier links.
    Revoke { sig_ids: Vec<SigId> },
    /// Follows another user.
    Track { uid: Uid },
    /// Stops following another user.
    Untrack { uid: Uid },
    /// Proves an account on an external service.
    WebServiceBinding {
        service: String,
        remote_username: String,
    },
    /// Vouches for another user; details live in a hash-committed expansion.
    #[serde(rename = "wot.vouch")]
    WotVouch { expansion_id: ExpansionId },
    /// Accepts or rejects a vouch received from someone else.
    #[serde(rename = "wot.react")]
    WotReact { vouch_sig_id: SigId, accepted: bool },
}

impl LinkBody {
    /// Return a stable string representation of the link type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Eldest { .. } => "eldest",
            Self::Sibkey { .. } => "sibkey",
            Self::Subkey { .. } => "subkey",
            Self::Revoke { .. } => "revoke",
            Self::Track { .. } => "track",
            Self::Untrack { .. } => "untrack",
            Self::WebServiceBinding { .. } => "web_service_binding",
            Self::WotVouch { .. } => "wot.vouch",
            Self::WotReact { .. } => "wot.react",
        }
    }
}

/// One verified entry of a sigchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub seqno: Seqno,
    pub sig_id: SigId,
    /// Set when a later link revoked this one.
    #[serde(default)]
    pub revoked: bool,
    pub body: LinkBody,
}

/// A chain link known to be a live web-of-trust vouch.
///
/// Only produced by [`classify::get_vouch_chain_link`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VouchChainLink {
    pub seqno: Seqno,
    pub sig_id: SigId,
    /// Commitment to the off-chain vouch details.
    pub expansion_id: ExpansionId,
}

/// A user whose sigchain has been loaded and verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub uid: Uid,
    pub username: String,
    pub eldest_kid: Kid,
    pub eldest_seqno: Seqno,
    #[serde(default)]
    pub links: Vec<ChainLink>,
}

impl VerifiedUser {
    /// Find the link signed with `sig_id`, if any.
    pub fn link_from_sig_id(&self, sig_id: &SigId) -> Option<&ChainLink> {
        self.links.iter().find(|l| &l.sig_id == sig_id)
    }

    /// The user at its current key lineage.
    pub fn to_user_version(&self) -> UserVersion {
        UserVersion {
            uid: self.uid.clone(),
            eldest_seqno: self.eldest_seqno,
        }
    }
}

/// Loads a user's verified sigchain.
pub trait ChainLinkResolver {
    /// Load `uid` with its signature-verified, revocation-settled links.
    ///
    /// Implementations should fail with `VouchError::IdentityLoadFailed`
    /// and must honour `ctx`.
    fn load_user(&self, ctx: &VouchContext, uid: &Uid) -> Result<VerifiedUser>;
}
