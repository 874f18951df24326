//! Verified sigchain persistence.
//!
//! Stores `VerifiedUser` records as JSON files and the local identity
//! alongside them:
//!
//! ```text
//! {base_dir}/
//! ├── me.json
//! └── chains/
//!     └── {uid}.json
//! ```
//!
//! File format for chains:
//! ```json
//! { "version": 1, "user": { ... VerifiedUser ... } }
//! ```
//!
//! File format for the local identity:
//! ```json
//! { "version": 1, "me": { ... LocalIdentity ... } }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chain::{ChainLinkResolver, VerifiedUser};
use crate::confidence::UsernameLookup;
use crate::context::VouchContext;
use crate::error::{Result, VouchError};
use crate::identity::{LocalIdentity, LocalIdentityLoader, Uid};

// ── File format constants ─────────────────────────────────────────────────────

const CHAIN_FILE_VERSION: u32 = 1;

const CHAINS_DIR: &str = "chains";
const ME_FILE: &str = "me.json";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct ChainFile {
    version: u32,
    user: VerifiedUser,
}

#[derive(Debug, Serialize, Deserialize)]
struct MeFile {
    version: u32,
    me: LocalIdentity,
}

// ── ChainStore ────────────────────────────────────────────────────────────────

/// Filesystem-backed store of verified sigchains.
///
/// Files are trusted as already verified: whatever wrote them is the
/// sigchain loader. The store is safe for single-process use.
pub struct ChainStore {
    base_dir: PathBuf,
}

impl ChainStore {
    /// Create a new `ChainStore` rooted at `base_dir`.
    ///
    /// Creates the `chains/` sub-directory if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns `VouchError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(CHAINS_DIR))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ── Chain persistence ─────────────────────────────────────────────────────

    /// Persist a verified user to `chains/{uid}.json`, replacing any previous one.
    pub fn save_user(&self, user: &VerifiedUser) -> Result<()> {
        let file = ChainFile {
            version: CHAIN_FILE_VERSION,
            user: user.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| VouchError::Serialization(e.to_string()))?;

        let path = self.user_path(&user.uid)?;
        std::fs::write(&path, json.as_bytes())?;
        Ok(())
    }

    /// Load a verified user by uid.
    ///
    /// # Errors
    ///
    /// Returns `VouchError::Storage` if there is no chain for `uid`,
    /// `VouchError::InvalidFileFormat` for malformed files, or
    /// `VouchError::Io` for filesystem errors.
    pub fn load(&self, uid: &Uid) -> Result<VerifiedUser> {
        let path = self.user_path(uid)?;
        if !path.exists() {
            return Err(VouchError::Storage(format!("no chain stored for {uid}")));
        }

        let bytes = std::fs::read(&path)?;
        let file: ChainFile = serde_json::from_slice(&bytes).map_err(|e| {
            VouchError::InvalidFileFormat(format!(
                "failed to parse chain file {}: {e}",
                path.display()
            ))
        })?;
        check_version(file.version, &path)?;
        Ok(file.user)
    }

    /// List the uids of all stored chains, sorted.
    pub fn list_users(&self) -> Result<Vec<Uid>> {
        let mut uids = Vec::new();
        for entry in std::fs::read_dir(self.base_dir.join(CHAINS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".json") {
                uids.push(Uid::new(stem));
            }
        }
        uids.sort();
        Ok(uids)
    }

    // ── Local identity ────────────────────────────────────────────────────────

    /// Persist the local identity to `me.json`.
    pub fn save_me(&self, me: &LocalIdentity) -> Result<()> {
        let file = MeFile {
            version: CHAIN_FILE_VERSION,
            me: me.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| VouchError::Serialization(e.to_string()))?;
        std::fs::write(self.base_dir.join(ME_FILE), json.as_bytes())?;
        Ok(())
    }

    /// Read the local identity from `me.json`.
    pub fn read_me(&self) -> Result<LocalIdentity> {
        let path = self.base_dir.join(ME_FILE);
        let bytes = std::fs::read(&path)?;
        let file: MeFile = serde_json::from_slice(&bytes).map_err(|e| {
            VouchError::InvalidFileFormat(format!(
                "failed to parse identity file {}: {e}",
                path.display()
            ))
        })?;
        check_version(file.version, &path)?;
        Ok(file.me)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// `{base_dir}/chains/{uid}.json`, refusing uids that are not plain names.
    fn user_path(&self, uid: &Uid) -> Result<PathBuf> {
        let valid = !uid.as_str().is_empty()
            && uid
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(VouchError::Storage(format!("invalid uid: {uid:?}")));
        }
        Ok(self
            .base_dir
            .join(CHAINS_DIR)
            .join(format!("{}.json", uid.as_str())))
    }
}

fn check_version(version: u32, path: &Path) -> Result<()> {
    if version != CHAIN_FILE_VERSION {
        return Err(VouchError::InvalidFileFormat(format!(
            "unsupported version {version} in {}",
            path.display()
        )));
    }
    Ok(())
}

impl ChainLinkResolver for ChainStore {
    fn load_user(&self, ctx: &VouchContext, uid: &Uid) -> Result<VerifiedUser> {
        ctx.check()?;
        let user = self.load(uid).map_err(|e| VouchError::IdentityLoadFailed {
            uid: uid.clone(),
            reason: e.to_string(),
        })?;
        ctx.check()?;
        Ok(user)
    }
}

impl UsernameLookup for ChainStore {
    fn lookup_username(&self, ctx: &VouchContext, uid: &Uid) -> Result<String> {
        ctx.check()?;
        let user = self.load(uid).map_err(|e| VouchError::IdentityLookupFailed {
            uid: uid.clone(),
            reason: e.to_string(),
        })?;
        Ok(user.username)
    }
}

impl LocalIdentityLoader for ChainStore {
    fn load_me(&self, ctx: &VouchContext) -> Result<LocalIdentity> {
        ctx.check()?;
        self.read_me()
            .map_err(|e| VouchError::SelfLoadFailed(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
