//! Pending vouch assembly: from one untrusted server record to a verified vouch.
//!
//! Steps, each fatal for the record on failure:
//! 1. Find the vouch link in the voucher's sigchain (exists, live, a vouch)
//! 2. Extract the expansion against the link's hash commitment
//! 3. Decode the expansion into the web-of-trust schema
//! 4. Check the vouch is about the local identity
//! 5. Normalize the confidence object
//! 6. Build the `PendingVouch`

use serde::{Deserialize, Serialize};

use crate::chain::{get_vouch_chain_link, ChainLinkResolver};
use crate::confidence::{normalize_confidence, Confidence, UsernameLookup};
use crate::context::VouchContext;
use crate::error::{Result, VouchError};
use crate::expansion::{decode_expansion, ExpansionExtractor};
use crate::identity::{LocalIdentity, LocalIdentityLoader, Seqno, SigId, Uid, UserVersion};
use crate::subject::assert_vouch_is_for_me;

/// A pending vouch as reported by the server. Untrusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPendingVouch {
    #[serde(rename = "voucher")]
    pub voucher_uid: Uid,
    #[serde(default)]
    pub voucher_eldest_seqno: Seqno,
    pub sig_id: SigId,
    pub expansion_json: String,
}

/// A vouch for the local user that passed every check.
///
/// Only [`transform_pending`] builds these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingVouch {
    voucher: UserVersion,
    proof: SigId,
    vouch_texts: Vec<String>,
    confidence: Confidence,
}

impl PendingVouch {
    /// The voucher at its current key lineage.
    pub fn voucher(&self) -> &UserVersion {
        &self.voucher
    }

    /// Sig id of the vouch link.
    pub fn proof(&self) -> &SigId {
        &self.proof
    }

    pub fn vouch_texts(&self) -> &[String] {
        &self.vouch_texts
    }

    pub fn confidence(&self) -> &Confidence {
        &self.confidence
    }
}

/// The collaborators a verification run talks to.
#[derive(Clone, Copy)]
pub struct VouchServices<'a> {
    pub chains: &'a dyn ChainLinkResolver,
    pub expansions: &'a dyn ExpansionExtractor,
    pub usernames: &'a dyn UsernameLookup,
    pub me: &'a dyn LocalIdentityLoader,
}

/// Verify one server-reported pending vouch.
pub fn transform_pending(
    ctx: &VouchContext,
    services: &VouchServices<'_>,
    server: &ServerPendingVouch,
) -> Result<PendingVouch> {
    let (link, voucher) =
        get_vouch_chain_link(ctx, services.chains, &server.voucher_uid, &server.sig_id)?;

    let expansion = services
        .expansions
        .extract(&link.expansion_id, &server.expansion_json)?;

    let details = decode_expansion(&expansion)?;

    ctx.check()?;
    let me = load_me(ctx, services.me)?;
    if let Err(e) = assert_vouch_is_for_me(&me, &details.user) {
        log::debug!(
            "web-of-trust pending vouch user-section doesn't look right: {:?}",
            details.user
        );
        return Err(e);
    }

    let confidence = normalize_confidence(
        ctx,
        services.usernames,
        details.confidence.unwrap_or_default(),
    )?;

    Ok(PendingVouch {
        voucher: voucher.to_user_version(),
        proof: server.sig_id.clone(),
        vouch_texts: details.vouch_texts,
        confidence,
    })
}

fn load_me(ctx: &VouchContext, loader: &dyn LocalIdentityLoader) -> Result<LocalIdentity> {
    loader.load_me(ctx).map_err(|e| match e {
        VouchError::SelfLoadFailed(_) => e,
        e if e.is_interrupt() => e,
        other => VouchError::SelfLoadFailed(other.to_string()),
    })
}
