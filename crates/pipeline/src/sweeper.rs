//! Background reclamation of dead rate windows and cache entries

use crate::gate::Gate;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle to a running sweeper; dropping it stops the task
#[derive(Debug)]
pub struct SweeperHandle {
    handle: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop sweeping and wait for the task to wind down
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

/// Spawn a task that sweeps the gate's stores every `interval`
///
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper(gate: Arc<Gate>, interval: Duration) -> SweeperHandle {
    let interval = interval.max(Duration::from_millis(1));
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        info!(interval_secs = interval.as_secs(), "gate sweeper started");
        loop {
            ticker.tick().await;
            let report = gate.sweep();
            if report.windows > 0 || report.entries > 0 {
                debug!(
                    windows = report.windows,
                    entries = report.entries,
                    "sweeper reclaimed dead state"
                );
            }
        }
    });

    SweeperHandle {
        handle: Some(handle),
    }
}

impl Gate {
    /// Spawn the sweeper at the configured interval
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        spawn_sweeper(Arc::clone(self), self.sweep_interval())
    }
}
