use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};

/// Pipeline runs spawned by request handlers. Nothing waits on them while
/// serving; on shutdown `drain` gives them a grace period to finish.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    set: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.lock();
        // Reap finished runs so the set only holds live ones.
        while let Some(result) = set.try_join_next() {
            if let Err(e) = result {
                warn!(error = %e, "Background task ended abnormally");
            }
        }
        set.spawn(task);
    }

    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    /// Wait up to `grace` for every task, then abort the rest. Returns how
    /// many were aborted.
    pub async fn drain(&self, grace: Duration) -> usize {
        let mut set = std::mem::take(&mut *self.lock());
        let pending = set.len();
        if pending == 0 {
            return 0;
        }
        info!(pending, grace_secs = grace.as_secs(), "Draining background tasks");

        let finished = tokio::time::timeout(grace, async {
            while let Some(result) = set.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "Background task ended abnormally");
                }
            }
        })
        .await;

        if finished.is_ok() {
            info!("All background tasks finished");
            return 0;
        }

        let aborted = set.len();
        warn!(aborted, "Grace period elapsed, aborting background tasks");
        set.shutdown().await;
        aborted
    }
}
