//! Cancellation tokens for fan-out suggestion queries.
//!
//! Each engine level derives a child token from the one it was handed.
//! Once the level has gathered enough distinct suggestions it cancels its
//! own token, which stops every task it dispatched (and everything those
//! tasks dispatched in turn) without touching sibling subtrees.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag telling in-flight work to stop early.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    parent: Option<Arc<CancellationToken>>,
}

impl CancellationToken {
    /// Creates a root token that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token for calls that are never interrupted.
    ///
    /// Nobody else holds a clone, so it can never be cancelled from outside.
    #[must_use]
    pub fn never() -> Self {
        Self::new()
    }

    /// Creates a token that is cancelled when either it or `self` is.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Signals every holder of this token, and of tokens derived from it, to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once this token or any ancestor has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Returns `Some(())` while active, `None` once cancelled.
    ///
    /// This enables use with the `?` operator for early returns.
    #[inline]
    #[must_use]
    pub fn check(&self) -> Option<()> {
        if self.is_cancelled() {
            None
        } else {
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_active() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_some());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        clone.cancel();

        assert!(token.is_cancelled());
        assert!(token.check().is_none());
    }

    #[test]
    fn parent_cancel_reaches_children() {
        let root = CancellationToken::new();
        let grandchild = root.child().child();

        root.cancel();

        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn child_cancel_does_not_reach_parent_or_siblings() {
        let root = CancellationToken::never();
        let left = root.child();
        let right = root.child();

        left.cancel();

        assert!(left.is_cancelled());
        assert!(!root.is_cancelled());
        assert!(!right.is_cancelled());
    }
}
