//! TaskSweeper - 期限切れタスクの停止と stopping タスクの再駆動
//!
//! Time-based cancellation lives here: tasks past their `end_time` are asked
//! to stop, and tasks parked in `stopping` are polled until their nodes let
//! go. One task's error never aborts the rest of the sweep.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::lifecycle::TaskOperations;
use crate::config::SweepConfig;
use crate::domain::TaskState;
use crate::error::StitchError;

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub stopped: usize,
    pub errors: usize,
}

pub struct TaskSweeper {
    ops: Arc<TaskOperations>,
    config: SweepConfig,
}

impl TaskSweeper {
    pub fn new(ops: Arc<TaskOperations>, config: SweepConfig) -> Self {
        Self { ops, config }
    }

    /// `mark_stopping` every expired task. Returns `(handled, errors)`.
    pub async fn sweep_expired(&self) -> Result<(usize, usize), StitchError> {
        let expired = self.ops.search_expired().await?;
        let mut handled = 0;
        let mut errors = 0;
        for task in expired {
            let task_id = task.task_id;
            if task.state.shutting_down() {
                // already stopping; `sweep_stopping` drives it
                continue;
            }
            info!(job_id = %task.job_id, %task_id, "stopping expired task");
            match self.ops.mark_stopping(task).await {
                Ok(_) => handled += 1,
                Err(err) => {
                    errors += 1;
                    warn!(%task_id, error = %err, "failed to stop expired task");
                }
            }
        }
        Ok((handled, errors))
    }

    /// Re-drive `stopping` for every task in that state. Returns
    /// `(stopped, errors)`.
    pub async fn sweep_stopping(&self) -> Result<(usize, usize), StitchError> {
        let stopping = self
            .ops
            .search_states(None, Some(&[TaskState::Stopping]))
            .await?;
        let mut stopped = 0;
        let mut errors = 0;
        for task in stopping {
            let task_id = task.task_id;
            match self.ops.stopping(task).await {
                Ok(task) if task.state == TaskState::Stopped => stopped += 1,
                Ok(_) => {}
                Err(err) => {
                    errors += 1;
                    warn!(%task_id, error = %err, "failed to drive stopping task");
                }
            }
        }
        Ok((stopped, errors))
    }

    pub async fn sweep_once(&self) -> Result<SweepReport, StitchError> {
        let (expired, mut errors) = self.sweep_expired().await?;
        let mut stopped = 0;
        if self.config.drive_stopping {
            let (n, e) = self.sweep_stopping().await?;
            stopped = n;
            errors += e;
        }

        let report = SweepReport {
            expired,
            stopped,
            errors,
        };
        debug!(?report, "sweep finished");
        Ok(report)
    }

    /// Run `sweep_once` every `interval` until shut down. The first sweep
    /// runs immediately.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });
        SweeperHandle { shutdown_tx, join }
    }

    async fn run(&self, shutdown_rx: &mut watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval());
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // handle dropped without a shutdown request
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            // store outages are retried on the next tick
            if let Err(err) = self.sweep_once().await {
                warn!(error = %err, "sweep failed");
            }
        }
        debug!("sweeper stopped");
    }
}

/// Handle to a running sweeper. Dropping it also stops the sweeper.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop after the sweep in progress, if any.
    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(err) = self.join.await {
            error!(error = %err, "sweeper task failed");
        }
    }
}
