//! Prerequisite gating and failure propagation.
//!
//! A task may proceed once every prerequisite has *started*; completion is not
//! required, so producer and consumer tasks overlap.
//!
//! When a task fails, every task of the same job that lists it as a
//! prerequisite fails too, transitively. The walk is an explicit worklist over
//! the job's task set, fetched once. Each task is assigned an error at most
//! once, so the walk ends even when prerequisite lists form a cycle.

use std::collections::HashMap;

use tracing::{debug, error, warn};

use super::lifecycle::TaskOperations;
use crate::domain::{DependencyGraph, Task, TaskError, TaskId, TaskState};
use crate::error::StitchError;

impl TaskOperations {
    /// `true` once every prerequisite has started.
    ///
    /// `false` either means "not yet" (some prerequisite hasn't started; the
    /// task is left untouched) or "never" (a prerequisite no longer exists;
    /// the task has been failed).
    pub async fn check_prereq_tasks(&self, task: &Task) -> Result<bool, StitchError> {
        for prereq_id in &task.config.prereq_tasks {
            match self.ctx.tasks.get(*prereq_id).await? {
                None => {
                    let mut error = TaskError::invalid_request("unable to find prerequisite task");
                    error.errors.push(format!("task_id:{prereq_id}"));
                    self.mark_failed(task.clone(), error, None).await?;
                    return Ok(false);
                }
                Some(prereq) if !prereq.state.has_started() => {
                    debug!(
                        task_id = %task.task_id,
                        prereq_id = %prereq_id,
                        prereq_state = %prereq.state,
                        "prerequisite not started yet"
                    );
                    return Ok(false);
                }
                Some(_) => {}
            }
        }
        Ok(true)
    }

    /// Record `error` on the task, stop it, and fail its dependents.
    ///
    /// No-op when the task is already shutting down or already carries an
    /// error. `tasks_in_job` may be passed by callers that already hold the
    /// job's task set.
    pub async fn mark_failed(
        &self,
        task: Task,
        error: TaskError,
        tasks_in_job: Option<Vec<Task>>,
    ) -> Result<Task, StitchError> {
        if ignores_failure(&task) {
            return Ok(task);
        }

        let tasks_in_job = match tasks_in_job {
            Some(tasks) => tasks,
            None => self.ctx.tasks.search_by_job(task.job_id).await?,
        };
        let mut job_tasks: HashMap<TaskId, Task> =
            tasks_in_job.into_iter().map(|t| (t.task_id, t)).collect();
        let root_id = task.task_id;
        let root = task.clone();
        job_tasks.insert(root_id, task);

        let graph = DependencyGraph::from_tasks(job_tasks.values());
        if let Some(cycle) = graph.detect_cycle() {
            warn!(
                job_id = %root.job_id,
                cycle = ?cycle.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "prerequisite cycle in job"
            );
        }

        let mut pending: Vec<(TaskId, TaskError)> = vec![(root_id, error)];
        while let Some((task_id, error)) = pending.pop() {
            let Some(current) = job_tasks.get(&task_id).cloned() else {
                continue;
            };
            if ignores_failure(&current) {
                continue;
            }
            // the job set may be a stale snapshot; the stored record decides
            let current = match self.ctx.tasks.get(task_id).await? {
                Some(stored) if ignores_failure(&stored) => {
                    job_tasks.insert(task_id, stored);
                    continue;
                }
                Some(stored) => stored,
                None => current,
            };

            error!(job_id = %current.job_id, task_id = %current.task_id, %error, "task failed");
            let failed = self.fail_task(current, error).await?;
            job_tasks.insert(task_id, failed);

            // reversed so the lowest id is failed first
            for dependent in graph.dependents(task_id).into_iter().rev() {
                pending.push((
                    dependent,
                    TaskError::task_failed(format!("prerequisite task failed.  task_id:{task_id}")),
                ));
            }
        }

        Ok(job_tasks.remove(&root_id).unwrap_or(root))
    }

    async fn fail_task(&self, mut task: Task, error: TaskError) -> Result<Task, StitchError> {
        task.error = Some(error);
        let task = self.set_state(task, TaskState::Stopping).await?;
        self.stopping(task).await
    }
}

fn ignores_failure(task: &Task) -> bool {
    if task.state.shutting_down() {
        debug!(
            job_id = %task.job_id,
            task_id = %task.task_id,
            "ignoring post-task stop failures"
        );
        return true;
    }
    if task.error.is_some() {
        debug!(
            job_id = %task.job_id,
            task_id = %task.task_id,
            "ignoring additional task error"
        );
        return true;
    }
    false
}
