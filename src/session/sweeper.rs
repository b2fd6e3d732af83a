//! Background session sweeper.
//!
//! Periodically evicts sessions idle for longer than the store's max lifetime.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::store::SessionStore;

/// Handle to a running sweeper task.
///
/// Dropping the handle closes the shutdown channel, which also ends the task.
pub struct Sweeper {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep loop on the current tokio runtime.
    pub fn spawn(store: Arc<SessionStore>) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let cutoff = store.max_lifetime();
        let mut ticker = interval(store.sweep_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handle = tokio::spawn(async move {
            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        let evicted = store.expire_older_than(cutoff);
                        if evicted > 0 {
                            info!(
                                evicted,
                                active_sessions = store.len(),
                                "Session sweep completed"
                            );
                        } else {
                            debug!("Session sweep: no expired sessions");
                        }
                    }
                }
            }

            debug!("Session sweeper stopped");
        });

        Sweeper {
            shutdown_tx,
            handle,
        }
    }

    /// Signal the task and wait until it has exited.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Session sweeper task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::SessionOptions;
    use std::time::Duration;

    fn test_store() -> Arc<SessionStore> {
        let options = SessionOptions::new("session", 2).with_sweep_interval(Duration::from_millis(500));
        Arc::new(SessionStore::new(&options))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_idle_sessions() {
        let store = test_store();
        let session = store.create(1);
        let sweeper = Sweeper::spawn(Arc::clone(&store));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(store.peek(session.token().as_str()).is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.peek(session.token().as_str()).is_none());
        assert!(store.stats().last_sweep_at.is_some());

        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_sweeping() {
        let store = test_store();
        let sweeper = Sweeper::spawn(Arc::clone(&store));
        sweeper.stop().await;

        let session = store.create(1);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(store.peek(session.token().as_str()).is_some());
        assert!(store.stats().last_sweep_at.is_none());
        assert_eq!(Arc::strong_count(&store), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_ends_task() {
        let store = test_store();
        drop(Sweeper::spawn(Arc::clone(&store)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(Arc::strong_count(&store), 1);
    }
}
