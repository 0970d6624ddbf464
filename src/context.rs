//! Request-scoped deadline and cancellation.
//!
//! Every fetch-side operation takes a [`Context`]. Once the context is done
//! (cancelled explicitly or past its deadline) no further upstream calls are
//! dispatched and callers waiting on results return what they already have.
//!
//! Contexts derived with [`Context::with_timeout`] share the parent's
//! cancellation token: cancelling either one cancels both.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::HuginnError;

#[derive(Debug, Default)]
struct Token {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Deadline and cancellation carried through a request.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    token: Arc<Token>,
}

impl Context {
    /// A context that is never done unless cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that is done `timeout` from now, or earlier if the
    /// parent deadline comes first.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context with an absolute deadline. The earlier of the two
    /// deadlines wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };
        Self {
            deadline: Some(deadline),
            token: Arc::clone(&self.token),
        }
    }

    /// Cancel this context and every context sharing its token.
    pub fn cancel(&self) {
        self.token.cancelled.store(true, Ordering::SeqCst);
        self.token.notify.notify_waiters();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Whether the context has been cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Why the context is done, or `None` while it is still live.
    ///
    /// Explicit cancellation takes precedence over an expired deadline.
    pub fn err(&self) -> Option<HuginnError> {
        if self.token.cancelled.load(Ordering::SeqCst) {
            return Some(HuginnError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(HuginnError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is done.
    pub async fn done(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed.
            let notified = self.token.notify.notified();
            if self.token.cancelled.load(Ordering::SeqCst) {
                return;
            }
            match self.deadline {
                Some(deadline) => {
                    tokio::select! {
                        _ = notified => {}
                        _ = tokio::time::sleep_until(deadline) => return,
                    }
                }
                None => notified.await,
            }
        }
    }
}
