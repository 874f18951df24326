//! Vouch link classification: from a reported sig id to a live vouch link.
//!
//! Checks, in order:
//! 1. The voucher loads
//! 2. A link with the reported sig id exists in the voucher's chain
//! 3. That link is not revoked
//! 4. That link is a web-of-trust vouch

use crate::context::VouchContext;
use crate::error::{Result, VouchError};
use crate::identity::{SigId, Uid};

use super::{ChainLinkResolver, LinkBody, VerifiedUser, VouchChainLink};

/// Resolve `sig_id` in `uid`'s sigchain and narrow it to a vouch link.
///
/// Returns the vouch link together with the loaded voucher.
pub fn get_vouch_chain_link(
    ctx: &VouchContext,
    resolver: &dyn ChainLinkResolver,
    uid: &Uid,
    sig_id: &SigId,
) -> Result<(VouchChainLink, VerifiedUser)> {
    ctx.check()?;

    let user = resolver.load_user(ctx, uid).map_err(|e| match e {
        VouchError::IdentityLoadFailed { .. } => e,
        e if e.is_interrupt() => e,
        other => VouchError::IdentityLoadFailed {
            uid: uid.clone(),
            reason: other.to_string(),
        },
    })?;

    if &user.uid != uid {
        return Err(VouchError::IdentityLoadFailed {
            uid: uid.clone(),
            reason: format!("resolver returned a different user: {}", user.uid),
        });
    }

    let link = user
        .link_from_sig_id(sig_id)
        .ok_or_else(|| VouchError::LinkNotFound {
            uid: uid.clone(),
            sig_id: sig_id.clone(),
        })?;

    // A revoked link never backs a vouch, whatever it says.
    if link.revoked {
        return Err(VouchError::LinkRevoked(sig_id.clone()));
    }

    let vouch = match &link.body {
        LinkBody::WotVouch { expansion_id } => VouchChainLink {
            seqno: link.seqno,
            sig_id: link.sig_id.clone(),
            expansion_id: expansion_id.clone(),
        },
        other @ (LinkBody::Eldest { .. }
        | LinkBody::Sibkey { .. }
        | LinkBody::Subkey { .. }
        | LinkBody::Revoke { .. }
        | LinkBody::Track { .. }
        | LinkBody::Untrack { .. }
        | LinkBody::WebServiceBinding { .. }
        | LinkBody::WotReact { .. }) => {
            return Err(VouchError::WrongLinkType {
                sig_id: sig_id.clone(),
                kind: other.kind(),
            })
        }
    };

    Ok((vouch, user))
}
