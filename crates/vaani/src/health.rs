//! Session health flag for the remote synthesis channel.
//!
//! The first remote failure of a session (timeout, transport error, bad
//! response) marks the channel unavailable for the rest of the process
//! lifetime, so every later narration goes straight to on-device
//! synthesis instead of paying the budget again. The flag is shared
//! state, created by the caller and handed to the narrator, never a
//! global.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared, monotonic "remote channel is down" flag.
///
/// `mark_unavailable` is one-way: nothing resets the flag short of a
/// process restart. Clones share the underlying state, so the narrator
/// and the tasks it spawns all observe the same session.
#[derive(Debug, Clone)]
pub struct SessionHealth {
    remote_unavailable: Arc<AtomicBool>,
}

impl SessionHealth {
    /// Create a fresh session (remote channel presumed healthy).
    #[must_use]
    pub fn new() -> Self {
        Self {
            remote_unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the remote channel has failed at some point this session.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.remote_unavailable.load(Ordering::SeqCst)
    }

    /// Record a remote failure, degrading the session permanently.
    ///
    /// Idempotent; concurrent callers may both flip the flag without harm.
    pub fn mark_unavailable(&self) {
        if !self.remote_unavailable.swap(true, Ordering::SeqCst) {
            tracing::warn!("remote synthesis marked unavailable for this session");
        }
    }
}

impl Default for SessionHealth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_healthy() {
        let health = SessionHealth::new();
        assert!(!health.is_unavailable());
    }

    #[test]
    fn marking_is_permanent_and_idempotent() {
        let health = SessionHealth::new();

        health.mark_unavailable();
        assert!(health.is_unavailable());

        health.mark_unavailable();
        assert!(health.is_unavailable());
    }

    #[test]
    fn clone_shares_state() {
        let session = SessionHealth::new();
        let observer = session.clone();

        session.mark_unavailable();
        assert!(observer.is_unavailable());
    }
}
