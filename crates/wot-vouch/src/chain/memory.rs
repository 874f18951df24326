//! In-memory sigchain collaborator.
//!
//! Holds already-verified users keyed by uid. Serves as both the chain
//! resolver and the uid → username lookup, so a whole pipeline can run
//! deterministically without a network.

use std::collections::HashMap;

use crate::confidence::UsernameLookup;
use crate::context::VouchContext;
use crate::error::{Result, VouchError};
use crate::identity::Uid;

use super::{ChainLinkResolver, VerifiedUser};

/// Verified users held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryChains {
    users: HashMap<Uid, VerifiedUser>,
}

impl MemoryChains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub fn insert(&mut self, user: VerifiedUser) {
        self.users.insert(user.uid.clone(), user);
    }

    /// Mutable access, for tests that flip link state in place.
    pub fn get_mut(&mut self, uid: &Uid) -> Option<&mut VerifiedUser> {
        self.users.get_mut(uid)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl ChainLinkResolver for MemoryChains {
    fn load_user(&self, ctx: &VouchContext, uid: &Uid) -> Result<VerifiedUser> {
        ctx.check()?;
        self.users
            .get(uid)
            .cloned()
            .ok_or_else(|| VouchError::IdentityLoadFailed {
                uid: uid.clone(),
                reason: "no such user".into(),
            })
    }
}

impl UsernameLookup for MemoryChains {
    fn lookup_username(&self, ctx: &VouchContext, uid: &Uid) -> Result<String> {
        ctx.check()?;
        self.users
            .get(uid)
            .map(|u| u.username.clone())
            .ok_or_else(|| VouchError::IdentityLookupFailed {
                uid: uid.clone(),
                reason: "no such user".into(),
            })
    }
}
