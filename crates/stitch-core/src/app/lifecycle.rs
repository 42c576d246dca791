//! Task lifecycle state machine.
//!
//! ```text
//! init -> waiting -> scheduled -> setting_up -> running -> stopping -> stopped
//!   \________\___________\____________\___________/  (failure)
//! ```
//!
//! `set_state` is the only place a task's state is written. Every transition
//! is idempotent under re-application: two drivers racing on the same task
//! converge instead of erroring.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::context::Context;
use crate::domain::{Event, JobId, Task, TaskError, TaskId, TaskState};
use crate::error::StitchError;
use crate::ports::StorageType;

/// Name of the task's private work queue.
pub fn work_queue_name(task_id: TaskId) -> String {
    task_id.to_string().to_lowercase()
}

/// Drives tasks through their lifecycle. See also `prereq` (failure cascade)
/// and `matcher` (pool matching) for the rest of this type's operations.
pub struct TaskOperations {
    pub(super) ctx: Context,
}

impl TaskOperations {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    // ========================================
    // Queries
    // ========================================

    pub async fn get_by_task_id(&self, task_id: TaskId) -> Result<Option<Task>, StitchError> {
        Ok(self.ctx.tasks.get(task_id).await?)
    }

    /// Tasks that exist among `task_ids`, in the given order.
    pub async fn get_by_task_ids(&self, task_ids: &[TaskId]) -> Result<Vec<Task>, StitchError> {
        let mut found = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            if let Some(task) = self.ctx.tasks.get(*task_id).await? {
                found.push(task);
            }
        }
        Ok(found)
    }

    pub async fn get_by_job_id(&self, job_id: JobId) -> Result<Vec<Task>, StitchError> {
        Ok(self.ctx.tasks.search_by_job(job_id).await?)
    }

    pub async fn get_by_job_id_and_task_id(
        &self,
        job_id: JobId,
        task_id: TaskId,
    ) -> Result<Option<Task>, StitchError> {
        Ok(self
            .ctx
            .tasks
            .get(task_id)
            .await?
            .filter(|t| t.job_id == job_id))
    }

    pub async fn search_states(
        &self,
        job_id: Option<JobId>,
        states: Option<&[TaskState]>,
    ) -> Result<Vec<Task>, StitchError> {
        Ok(self.ctx.tasks.search_states(job_id, states).await?)
    }

    /// Tasks past their `end_time` that have not reached `stopped`.
    pub async fn search_expired(&self) -> Result<Vec<Task>, StitchError> {
        Ok(self.ctx.tasks.search_expired(self.ctx.clock.now()).await?)
    }

    // ========================================
    // Transitions
    // ========================================

    /// Provision the task's work queue and move it to `waiting`.
    pub async fn init(&self, task: Task) -> Result<Task, StitchError> {
        self.ctx
            .queues
            .create_queue(&work_queue_name(task.task_id), StorageType::Corpus)
            .await?;
        self.set_state(task, TaskState::Waiting).await
    }

    /// The single mutation primitive for `Task::state`.
    ///
    /// Persists the task and emits exactly one event. Setting the current
    /// state again is a no-op, and a stopped task is never moved.
    pub async fn set_state(&self, task: Task, state: TaskState) -> Result<Task, StitchError> {
        if task.state == state {
            return Ok(task);
        }
        if task.state.is_terminal() {
            warn!(
                job_id = %task.job_id,
                task_id = %task.task_id,
                requested = %state,
                "ignoring state change on stopped task"
            );
            return Ok(task);
        }

        let owes_start = task.state.in_started_phase() || state.in_started_phase();
        let mut task = Task { state, ..task };
        if owes_start {
            task = self.on_start(task).await?;
        }

        self.ctx.tasks.replace(&task).await?;
        info!(job_id = %task.job_id, task_id = %task.task_id, state = %task.state, "task state updated");

        let event = Event::for_transition(&task);
        if let Err(err) = self.ctx.events.send_event(event).await {
            warn!(task_id = %task.task_id, error = %err, "failed to send task event");
        }

        Ok(task)
    }

    /// Start bookkeeping: stamp `end_time` and tell the job, once.
    async fn on_start(&self, mut task: Task) -> Result<Task, StitchError> {
        if task.end_time.is_some() {
            return Ok(task);
        }

        task.end_time = Some(end_time(self.ctx.clock.now(), &task));

        match self.ctx.jobs.get(task.job_id).await? {
            Some(job) => self.ctx.jobs.on_start(&job).await?,
            None => debug!(job_id = %task.job_id, task_id = %task.task_id, "job not found on task start"),
        }

        Ok(task)
    }

    /// Ask a task to stop. A task that never started is failed instead.
    pub async fn mark_stopping(&self, task: Task) -> Result<Task, StitchError> {
        if task.state.shutting_down() {
            debug!(
                job_id = %task.job_id,
                task_id = %task.task_id,
                "ignoring post-task stop calls"
            );
            return Ok(task);
        }

        if !task.state.has_started() {
            return self
                .mark_failed(task, TaskError::task_failed("task never started"), None)
                .await;
        }

        self.set_state(task, TaskState::Stopping).await
    }

    /// Tell the task's nodes to stop it, and finish the task once none are
    /// left. Safe to call repeatedly; a poller re-invokes it until the task
    /// reaches `stopped`.
    pub async fn stopping(&self, task: Task) -> Result<Task, StitchError> {
        info!(job_id = %task.job_id, task_id = %task.task_id, "stopping task");

        self.ctx.nodes.stop_task(task.task_id).await?;
        let remaining = self.ctx.nodes.nodes_by_task(task.task_id).await?;
        if remaining.is_empty() {
            return self.stopped(task).await;
        }

        debug!(
            task_id = %task.task_id,
            remaining = remaining.len(),
            "waiting for nodes to release task"
        );
        Ok(task)
    }

    async fn stopped(&self, task: Task) -> Result<Task, StitchError> {
        let task = self.set_state(task, TaskState::Stopped).await?;
        self.ctx
            .queues
            .delete_queue(&work_queue_name(task.task_id), StorageType::Corpus)
            .await?;

        // TODO: unschedule the task from the pools it was handed to once the
        // scheduler records pool assignments.
        if let Some(job) = self.ctx.jobs.get(task.job_id).await? {
            self.ctx.jobs.stop_if_all_done(&job).await?;
        }

        Ok(task)
    }
}

fn end_time(now: DateTime<Utc>, task: &Task) -> DateTime<Utc> {
    now.checked_add_signed(task.config.task.duration())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
