//! Batch fetch: verify every pending vouch the server reports, or none.
//!
//! One call to the `wot/pending` endpoint, then each reported record is
//! assembled in the order received. The first record that fails to
//! verify fails the whole fetch with that record's error; good records
//! seen before it are discarded.

use serde::{Deserialize, Serialize};

use crate::context::VouchContext;
use crate::error::{Result, VouchError};
use crate::expansion::null_as_empty;
use crate::pending::{transform_pending, PendingVouch, ServerPendingVouch, VouchServices};

/// Endpoint the pending vouches are read from.
pub const PENDING_ENDPOINT: &str = "wot/pending";

/// Application status envelope the server may wrap responses in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatus {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

/// Body of a `wot/pending` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVouchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppStatus>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pending: Vec<ServerPendingVouch>,
}

impl PendingVouchResponse {
    /// The reported records, or `RemoteFetchFailed` for a non-OK status.
    pub fn into_pending(self) -> Result<Vec<ServerPendingVouch>> {
        if let Some(status) = &self.status {
            if status.code != 0 {
                return Err(VouchError::RemoteFetchFailed(format!(
                    "server status {} ({}): {}",
                    status.code, status.name, status.desc
                )));
            }
        }
        Ok(self.pending)
    }
}

/// Decode a raw `wot/pending` response body.
pub fn decode_pending_response(body: &[u8]) -> Result<PendingVouchResponse> {
    serde_json::from_slice(body)
        .map_err(|e| VouchError::RemoteFetchFailed(format!("malformed response: {e}")))
}

/// Authenticated access to the `wot/pending` endpoint.
pub trait PendingVouchApi {
    /// Perform the request. Transport and auth failures should be reported
    /// as `VouchError::RemoteFetchFailed`; `ctx` must be honoured.
    fn get_pending(&self, ctx: &VouchContext) -> Result<PendingVouchResponse>;
}

/// Fetch and verify all pending vouches for the local user.
pub fn fetch_pending_vouches(
    ctx: &VouchContext,
    api: &dyn PendingVouchApi,
    services: &VouchServices<'_>,
) -> Result<Vec<PendingVouch>> {
    ctx.check()?;

    let response = api.get_pending(ctx).map_err(|e| {
        log::debug!("error fetching pending web-of-trust vouches: {e}");
        match e {
            VouchError::RemoteFetchFailed(_) => e,
            e if e.is_interrupt() => e,
            other => VouchError::RemoteFetchFailed(other.to_string()),
        }
    })?;
    let pending = response.into_pending()?;

    let mut res = Vec::with_capacity(pending.len());
    for (index, server) in pending.iter().enumerate() {
        ctx.check()?;
        match transform_pending(ctx, services, server) {
            Ok(vouch) => res.push(vouch),
            Err(e) => {
                log::debug!(
                    "error validating server-reported pending web-of-trust vouch #{index} ({}): {e}",
                    server.sig_id
                );
                return Err(e);
            }
        }
    }

    log::debug!("found {} pending web-of-trust vouches", res.len());
    Ok(res)
}
