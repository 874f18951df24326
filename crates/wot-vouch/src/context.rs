//! Per-call context: cooperative cancellation and deadlines.
//!
//! Every collaborator call receives a `&VouchContext`. Long-running
//! collaborators (network, disk) call [`VouchContext::check`] before and
//! after their blocking work; the pipeline itself checks between steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Result, VouchError};

/// Shared cancellation signal.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation and deadline carried through one verification call.
#[derive(Debug, Clone, Default)]
pub struct VouchContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl VouchContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Attach an externally owned cancellation token.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// The token this context observes.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail with `Cancelled` or `DeadlineExceeded` if the call must stop.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(VouchError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(VouchError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}
