//! Background sweep of abandoned PKCE sessions
//!
//! Flows that never receive a callback would otherwise stay in the session
//! store forever. The sweeper removes entries older than the store TTL on a
//! fixed interval and shuts down through a cancellation token.

use std::sync::Arc;
use std::time::Duration;

use moneymon_common::PkceSessionStore;
use moneymon_domain::{MoneymonError, Result};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Periodic sweeper with explicit start/stop lifecycle.
pub struct SessionSweeper {
    store: Arc<PkceSessionStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SessionSweeper {
    pub fn new(store: Arc<PkceSessionStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the sweep loop.
    ///
    /// # Errors
    /// Returns an error if the sweeper is already running.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running().await {
            return Err(MoneymonError::Internal("session sweeper already running".into()));
        }

        // Fresh token so a stopped sweeper can be restarted.
        self.cancellation_token = CancellationToken::new();

        let store = Arc::clone(&self.store);
        let interval = self.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sweep_loop(store, interval, cancel).await;
        });
        *self.task_handle.lock().await = Some(handle);

        info!(interval_secs = interval.as_secs(), "session sweeper started");
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// # Errors
    /// Returns an error if the sweeper is not running, the task panicked or
    /// it did not finish within five seconds.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running().await {
            return Err(MoneymonError::Internal("session sweeper not running".into()));
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "session sweeper task panicked");
                    return Err(MoneymonError::Internal(format!("sweeper task panicked: {e}")));
                }
                Err(_) => {
                    warn!("session sweeper did not stop within timeout");
                    return Err(MoneymonError::Internal("sweeper stop timed out".into()));
                }
            }
        }

        info!("session sweeper stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        let guard = self.task_handle.lock().await;
        guard.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Sweep once immediately, returning the number of removed sessions.
    pub fn sweep_once(&self) -> usize {
        self.store.sweep()
    }

    async fn sweep_loop(
        store: Arc<PkceSessionStore>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("session sweeper cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = store.sweep();
                    if removed > 0 {
                        debug!(removed, remaining = store.len(), "swept expired pkce sessions");
                    }
                }
            }
        }
    }
}

impl Drop for SessionSweeper {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
