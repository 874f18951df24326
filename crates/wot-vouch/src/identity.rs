//! Identity identifiers: uids, key ids, signature ids, and user versions.
//!
//! All identifiers are opaque strings compared exactly; no case folding
//! or normalization is ever applied.

use serde::{Deserialize, Serialize};

use crate::context::VouchContext;
use crate::error::Result;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// User identifier.
    Uid
);

string_id!(
    /// Key identifier.
    Kid
);

string_id!(
    /// Signature identifier of a chain link.
    SigId
);

/// Position of a link within a sigchain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Seqno(pub u64);

impl std::fmt::Display for Seqno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user pinned to one key lineage: the uid plus the seqno of its
/// current eldest link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserVersion {
    pub uid: Uid,
    pub eldest_seqno: Seqno,
}

impl std::fmt::Display for UserVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%{}", self.uid, self.eldest_seqno)
    }
}

/// The currently logged-in user, as known locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    pub username: String,
    pub uid: Uid,
    pub eldest_kid: Kid,
}

impl LocalIdentity {
    pub fn new(username: impl Into<String>, uid: Uid, eldest_kid: Kid) -> Self {
        Self {
            username: username.into(),
            uid,
            eldest_kid,
        }
    }
}

/// Loads the local identity independently of anything a server reported.
pub trait LocalIdentityLoader {
    /// Return the currently loaded local user.
    ///
    /// Failures should be reported as `VouchError::SelfLoadFailed`.
    fn load_me(&self, ctx: &VouchContext) -> Result<LocalIdentity>;
}

impl LocalIdentityLoader for LocalIdentity {
    fn load_me(&self, ctx: &VouchContext) -> Result<LocalIdentity> {
        ctx.check()?;
        Ok(self.clone())
    }
}
