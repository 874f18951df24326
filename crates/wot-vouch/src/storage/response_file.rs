//! Recorded `wot/pending` responses used in place of the live endpoint.

use std::path::PathBuf;

use crate::context::VouchContext;
use crate::error::{Result, VouchError};
use crate::fetch::{decode_pending_response, PendingVouchApi, PendingVouchResponse};

/// A `wot/pending` response body saved to disk.
#[derive(Debug, Clone)]
pub struct ResponseFile {
    path: PathBuf,
}

impl ResponseFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PendingVouchApi for ResponseFile {
    fn get_pending(&self, ctx: &VouchContext) -> Result<PendingVouchResponse> {
        ctx.check()?;
        let body = std::fs::read(&self.path).map_err(|e| {
            VouchError::RemoteFetchFailed(format!("reading {}: {e}", self.path.display()))
        })?;
        ctx.check()?;
        decode_pending_response(&body)
    }
}
