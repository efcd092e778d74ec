//! Open/closed state shared by every in-flight call.

use crate::{Error, Result};
use std::sync::{PoisonError, RwLock};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A one-way open→closed flag.
///
/// Calls check it under the read lock; [`Lifecycle::close`] flips it under the
/// write lock exactly once and wakes every task parked on [`Lifecycle::closed`].
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    closed: RwLock<bool>,
    signal: CancellationToken,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.closed.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails with [`Error::Closed`] once the client has been closed.
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    /// Resolves once the client has been closed.
    pub(crate) fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.signal.cancelled()
    }

    /// Marks the client closed. Returns `true` only for the call that
    /// performed the transition.
    pub(crate) fn close(&self) -> bool {
        let mut closed = self.closed.write().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return false;
        }
        *closed = true;
        self.signal.cancel();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_close_transitions_once() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_closed());
        assert!(lifecycle.ensure_open().is_ok());

        assert!(lifecycle.close());
        assert!(!lifecycle.close());
        assert!(lifecycle.is_closed());
        assert!(matches!(lifecycle.ensure_open(), Err(Error::Closed)));
    }

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let lifecycle = Arc::new(Lifecycle::new());

        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.closed().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        lifecycle.close();
        waiter.await.unwrap();

        // Already closed: resolves immediately.
        lifecycle.closed().await;
    }

    #[test]
    fn test_concurrent_close_has_single_winner() {
        let lifecycle = Arc::new(Lifecycle::new());

        let winners: usize = (0..8)
            .map(|_| {
                let lifecycle = lifecycle.clone();
                std::thread::spawn(move || lifecycle.close())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| usize::from(handle.join().unwrap()))
            .sum();

        assert_eq!(winners, 1);
        assert!(lifecycle.is_closed());
    }
}
