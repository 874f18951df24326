//! Filesystem-backed collaborators for offline verification.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.wot/`:
//!
//! ```text
//! ~/.wot/
//! ├── me.json            # the local identity
//! └── chains/
//!     └── {uid}.json       # one verified sigchain per user
//! ```
//!
//! Recorded `wot/pending` response bodies can live anywhere; they are
//! read through [`ResponseFile`].
//!
//! # Modules
//!
//! - [`chain_store`]: verified user chains and the local identity.
//! - [`response_file`]: a recorded server response used as the remote.

pub mod chain_store;
pub mod response_file;

pub use chain_store::ChainStore;
pub use response_file::ResponseFile;
