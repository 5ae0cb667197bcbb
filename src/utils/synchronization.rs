//! Synchronization utilities for multi-threaded operations.
//!
//! # Key Components
//!
//! - [`CancellationToken`] - A shared flag that lets a caller abort a running disassembly
//!
//! A token is cloned into every worker of a request. Once any clone is cancelled, all other
//! clones observe it the next time they poll, and the work they were doing is abandoned.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{Error, Result};

/// A cheaply clonable cancellation flag.
///
/// Cancellation is cooperative: long running operations poll [`CancellationToken::check`]
/// between members and every few hundred instructions, and unwind with
/// [`crate::Error::Cancelled`] once the flag is set. Cancelling is idempotent and cannot be
/// undone.
///
/// # Examples
///
/// ```rust
/// use ilscope::CancellationToken;
/// use std::thread;
///
/// let token = CancellationToken::new();
/// let worker = token.clone();
///
/// let handle = thread::spawn(move || {
///     while !worker.is_cancelled() {
///         thread::yield_now();
///     }
/// });
///
/// token.cancel();
/// handle.join().unwrap();
/// assert!(token.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation to every clone of this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`CancellationToken::cancel`] was called on any clone
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Polls the token
    ///
    /// # Errors
    /// Returns [`crate::Error::Cancelled`] if the token was cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        assert!(token.check().is_ok());

        token.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(clone.check(), Err(Error::Cancelled)));

        // Idempotent
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_across_threads() {
        let token = CancellationToken::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let worker = token.clone();
                thread::spawn(move || {
                    while worker.check().is_ok() {
                        thread::yield_now();
                    }
                })
            })
            .collect();

        token.cancel();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
