//! Background Expiry Sweeper
//!
//! Deletion and expiration leave dead entries in the map: a deleted key is
//! tombstoned rather than erased, and an expired key simply stops
//! resolving. Without a sweeper, a key that is never touched again would
//! stay in memory forever.
//!
//! The sweeper is a Tokio task that wakes on an interval, asks the engine
//! to drop every entry that is no longer live, and goes back to sleep.
//! Because `StorageEngine::sweep_dead` only removes entries that already
//! fail the liveness predicate, the sweeper never changes observable
//! behavior.

use crate::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Interval between sweeps
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// Dropping the handle stops the background task.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// Returns a handle that stops the sweeper when dropped.
    pub fn start(engine: Arc<StorageEngine>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweeper_loop(engine, config, shutdown_rx));
        info!("background expiry sweeper started");

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    ///
    /// Called automatically when the handle is dropped.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let removed = engine.sweep_dead();
        if removed > 0 {
            debug!(
                removed = removed,
                remaining = engine.len(),
                "reclaimed dead entries"
            );
        }
    }
}

/// Starts the expiry sweeper with default configuration.
pub fn start_expiry_sweeper(engine: Arc<StorageEngine>) -> ExpirySweeper {
    ExpirySweeper::start(engine, ExpiryConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::engine::{now_millis, NO_EXPIRY};
    use bytes::Bytes;

    fn key(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[tokio::test]
    async fn test_sweeper_reclaims_dead_entries() {
        let engine = Arc::new(StorageEngine::new());

        for i in 0..10 {
            engine.set(
                key(&format!("short:{}", i)),
                Bytes::from("value"),
                now_millis() + 30,
            );
        }
        engine.set(key("persistent"), Bytes::from("value"), NO_EXPIRY);
        engine.set(key("deleted"), Bytes::from("value"), NO_EXPIRY);
        engine.delete(&key("deleted")).unwrap();

        assert_eq!(engine.len(), 12);

        let config = ExpiryConfig {
            interval: Duration::from_millis(10),
        };
        let _sweeper = ExpirySweeper::start(Arc::clone(&engine), config);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(engine.len(), 1);
        assert!(engine.exists(&key("persistent")));
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_drop() {
        let engine = Arc::new(StorageEngine::new());

        {
            let _sweeper = ExpirySweeper::start(
                Arc::clone(&engine),
                ExpiryConfig {
                    interval: Duration::from_millis(10),
                },
            );
            tokio::time::sleep(Duration::from_millis(30)).await;
            // Sweeper is dropped here
        }

        // Give the task a moment to observe the shutdown and exit.
        tokio::time::sleep(Duration::from_millis(20)).await;

        engine.set(key("k"), Bytes::from("value"), now_millis() - 1);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The dead entry stays in the map, but it still does not resolve.
        assert_eq!(engine.len(), 1);
        assert!(engine.get(&key("k")).is_err());
    }
}
