//! Cooperative cancellation for long-running timeline sweeps.
//!
//! A partition-wide insert can touch thousands of slots. Rather than holding a
//! transaction open for the whole sweep, callers pass a [`CancellationGuard`]
//! that the engine polls once per impacted slot; a tripped guard aborts the
//! sweep with a clean [`Cancelled`] error and no partial diff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Why a sweep was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Cancelled {
    /// The guard's deadline passed before the sweep finished.
    #[error("step deadline exceeded")]
    DeadlineExceeded,
    /// An external party requested cancellation through the shared flag.
    #[error("cancellation requested")]
    Requested,
}

/// Checkpoint token polled by the insert sweep.
///
/// A guard can carry a deadline, a shared flag, both, or neither. The
/// deadline is checked first.
#[derive(Debug, Clone, Default)]
pub struct CancellationGuard {
    deadline: Option<Instant>,
    flag: Option<Arc<AtomicBool>>,
}

impl CancellationGuard {
    /// A guard that never trips.
    pub fn none() -> Self {
        Self::default()
    }

    /// A guard that trips once `deadline` passes.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }

    /// A guard that trips `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A guard that trips when `flag` is set. The caller keeps a clone of the
    /// `Arc` and may set the flag from any thread.
    pub fn with_flag(flag: Arc<AtomicBool>) -> Self {
        Self {
            flag: Some(flag),
            ..Self::default()
        }
    }

    /// Attach a deadline to an existing guard.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Poll the guard. `Err` when the deadline passed or the flag is set.
    pub fn check(&self) -> Result<(), Cancelled> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Cancelled::DeadlineExceeded);
            }
        }
        if let Some(flag) = &self.flag {
            if flag.load(Ordering::Relaxed) {
                return Err(Cancelled::Requested);
            }
        }
        Ok(())
    }
}
