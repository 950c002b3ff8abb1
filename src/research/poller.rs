//! Polling lifecycle manager.
//!
//! Drives one remote task from submission to a terminal state:
//! - one immediate status fetch, then one fetch per fixed interval;
//! - every snapshot is published to consumers through a watch channel;
//! - transient fetch errors are logged and retried on the next tick;
//! - a terminal status, an explicit `cancel()`, or dropping the handle all
//!   stop the loop, and a fetch that resolves after a stop is discarded
//!   rather than published.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::{DeepResearchClient, ResearchTask};
use crate::error::RelayError;

/// Where status snapshots come from. Seam for tests; production uses the
/// deep-research client.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    async fn fetch(&self, task_id: &str) -> Result<ResearchTask, RelayError>;
}

#[async_trait]
impl StatusSource for DeepResearchClient {
    async fn fetch(&self, task_id: &str) -> Result<ResearchTask, RelayError> {
        self.status(task_id).await
    }
}

/// Handle to a running poll loop.
///
/// Dropping the handle stops the loop; no tick outlives its consumer.
pub struct PollHandle {
    task_id: String,
    snapshots: watch::Receiver<Option<ResearchTask>>,
    stop: watch::Sender<bool>,
}

impl PollHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Subscribe to snapshot updates. The channel closes once the loop ends.
    pub fn snapshots(&self) -> watch::Receiver<Option<ResearchTask>> {
        self.snapshots.clone()
    }

    /// Stop polling. Guaranteed to prevent any further snapshot from being
    /// published, including one whose fetch is already in flight.
    pub fn cancel(&self) {
        let _ = self.stop.send(true);
    }
}

pub struct TaskPoller;

impl TaskPoller {
    /// Start polling `task_id` every `interval`, beginning immediately.
    pub fn spawn(
        source: Arc<dyn StatusSource>,
        task_id: String,
        interval: Duration,
    ) -> PollHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(None::<ResearchTask>);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let loop_task_id = task_id.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // Fires on cancel() and when the handle is dropped.
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        let fetched = tokio::select! {
                            biased;
                            _ = stop_rx.changed() => None,
                            result = source.fetch(&loop_task_id) => Some(result),
                        };

                        let Some(result) = fetched else { break };
                        if *stop_rx.borrow() {
                            break;
                        }

                        match result {
                            Ok(snapshot) => {
                                let terminal = snapshot.status.is_terminal();
                                let _ = snapshot_tx.send(Some(snapshot));
                                if terminal {
                                    tracing::debug!(task_id = %loop_task_id, "poll loop reached terminal status");
                                    break;
                                }
                            }
                            // Transient failure: keep the job alive, retry
                            // on the next tick.
                            Err(e) => {
                                tracing::warn!(task_id = %loop_task_id, error = %e, "status poll failed, will retry");
                            }
                        }
                    }
                }
            }
        });

        PollHandle {
            task_id,
            snapshots: snapshot_rx,
            stop: stop_tx,
        }
    }
}
