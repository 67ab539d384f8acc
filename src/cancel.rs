//! Cooperative cancellation for load operations.
//!
//! Each load owns a token issued from a source; starting a new load
//! through the same slot cancels and replaces the previous source, so a
//! superseded load notices at the next poll point and stops before it
//! can touch shared state or the UI sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Owning side of a cancellation flag.
#[derive(Debug, Default)]
pub struct CancelSource {
    flag: Arc<AtomicBool>,
}

impl CancelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a token observing this source.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            flag: self.flag.clone(),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Observing side, polled at folder boundaries, batch boundaries and
/// immediately before every shared-state commit.
#[derive(Clone, Debug)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that is never canceled. Useful for tests and for callers
    /// that manage their own supersede policy.
    pub fn noop() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::noop()
    }
}

/// Lock-protected slot holding the current load's cancellation source.
///
/// `begin` cancels whatever was in flight and installs a fresh source,
/// which is the "a newer load always supersedes the previous one"
/// behavior rapid user actions rely on.
#[derive(Debug, Default)]
pub struct CancelSlot {
    current: Mutex<Option<CancelSource>>,
}

impl CancelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the previous source, installs a new one and returns its
    /// token for the load about to start.
    pub fn begin(&self) -> CancelToken {
        let mut slot = self.current.lock();
        if let Some(prev) = slot.take() {
            prev.cancel();
        }
        let source = CancelSource::new();
        let token = source.token();
        *slot = Some(source);
        token
    }

    /// Cancels the in-flight load, if any, without starting a new one.
    pub fn cancel_current(&self) {
        if let Some(source) = self.current.lock().take() {
            source.cancel();
        }
    }
}
