use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Rotation {
    credential_index: usize,
    primary_exhausted: bool,
}

/// Point-in-time copy of the rotation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouterStatus {
    pub credential_index: usize,
    pub primary_exhausted: bool,
}

/// Process-wide credential rotation state.
///
/// Only the router mutates it, through `advance` and `mark_exhausted`.
/// `reset` is the sole way back from exhaustion.
#[derive(Debug)]
pub struct RouterState {
    credential_count: usize,
    inner: Mutex<Rotation>,
}

impl RouterState {
    pub fn new(credential_count: usize) -> Self {
        Self {
            credential_count,
            inner: Mutex::new(Rotation::default()),
        }
    }

    pub fn credential_count(&self) -> usize {
        self.credential_count
    }

    pub async fn snapshot(&self) -> RouterStatus {
        let rotation = self.inner.lock().await;
        RouterStatus {
            credential_index: rotation.credential_index,
            primary_exhausted: rotation.primary_exhausted,
        }
    }

    /// Move past `attempted` and return the index now selected.
    ///
    /// A no-op when another request already moved the index, so concurrent
    /// failures on one credential advance it once.
    pub async fn advance(&self, attempted: usize) -> usize {
        let mut rotation = self.inner.lock().await;
        if self.credential_count > 0 && rotation.credential_index == attempted {
            rotation.credential_index = (attempted + 1) % self.credential_count;
        }
        rotation.credential_index
    }

    /// Returns true if this call performed the transition
    pub async fn mark_exhausted(&self) -> bool {
        let mut rotation = self.inner.lock().await;
        let newly = !rotation.primary_exhausted;
        rotation.primary_exhausted = true;
        newly
    }

    pub async fn reset(&self) {
        let mut rotation = self.inner.lock().await;
        *rotation = Rotation::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_advance_wraps_around() {
        let state = RouterState::new(3);
        assert_eq!(state.advance(0).await, 1);
        assert_eq!(state.advance(1).await, 2);
        assert_eq!(state.advance(2).await, 0);
    }

    #[tokio::test]
    async fn test_stale_advance_is_ignored() {
        let state = RouterState::new(3);
        assert_eq!(state.advance(0).await, 1);
        // A second request that also failed on credential 0
        assert_eq!(state.advance(0).await, 1);
        assert_eq!(state.snapshot().await.credential_index, 1);
    }

    #[tokio::test]
    async fn test_exhaustion_is_sticky_until_reset() {
        let state = RouterState::new(2);
        state.advance(0).await;
        assert!(state.mark_exhausted().await);
        assert!(!state.mark_exhausted().await);
        assert!(state.snapshot().await.primary_exhausted);

        state.reset().await;
        let status = state.snapshot().await;
        assert!(!status.primary_exhausted);
        assert_eq!(status.credential_index, 0);
    }

    #[tokio::test]
    async fn test_no_credentials_keeps_index_zero() {
        let state = RouterState::new(0);
        assert_eq!(state.advance(0).await, 0);
    }
}
