use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Headless browser sessions shared by every browser-backed capability.
///
/// A permit is held for the whole of one scrape or one map search and is
/// released when it drops, on success, error, timeout or cancellation alike.
#[derive(Clone)]
pub struct BrowserSessions {
    semaphore: Arc<Semaphore>,
    max_sessions: usize,
}

pub type SessionPermit = OwnedSemaphorePermit;

impl BrowserSessions {
    pub fn new(max_sessions: usize) -> Self {
        let max_sessions = max_sessions.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
        }
    }

    /// One session at a time.
    pub fn exclusive() -> Self {
        Self::new(1)
    }

    pub async fn acquire(&self) -> Result<SessionPermit, AcquireError> {
        self.semaphore.clone().acquire_owned().await
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

impl Default for BrowserSessions {
    fn default() -> Self {
        Self::exclusive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn permit_is_released_on_drop() {
        let sessions = BrowserSessions::exclusive();
        let permit = sessions.acquire().await.unwrap();
        assert_eq!(sessions.available(), 0);
        drop(permit);
        assert_eq!(sessions.available(), 1);
    }

    #[tokio::test]
    async fn second_session_waits_for_the_first() {
        let sessions = BrowserSessions::exclusive();
        let held = sessions.acquire().await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(50), sessions.acquire()).await;
        assert!(waiting.is_err());

        drop(held);
        assert!(sessions.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn permit_is_released_when_the_holder_is_cancelled() {
        let sessions = BrowserSessions::exclusive();
        let inner = sessions.clone();
        let task = tokio::spawn(async move {
            let _permit = inner.acquire().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        task.abort();
        let _ = task.await;
        assert_eq!(sessions.available(), 1);
    }

    #[test]
    fn zero_is_clamped_to_one() {
        assert_eq!(BrowserSessions::new(0).max_sessions(), 1);
    }
}
