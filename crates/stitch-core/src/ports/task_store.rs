//! TaskStore port - Task レコードの正本（source of truth）
//!
//! キーは task_id、partition は job_id です。
//!
//! # 設計原則
//! - 書き込みは `replace` による read-modify-write のみ（CAS なし）
//! - 競合による lost update は許容し、遷移側の冪等性と次回 sweep で収束させる

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{JobId, Task, TaskId, TaskState};

/// Failure of a record store or directory backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation failed: {0}")]
    OperationFailed(String),
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Keyed lookup. `Ok(None)` when no such task exists.
    async fn get(&self, task_id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Every task in the job's partition.
    async fn search_by_job(&self, job_id: JobId) -> Result<Vec<Task>, StoreError>;

    /// Filter by job and/or state set. `None` means "don't filter on this".
    async fn search_states(
        &self,
        job_id: Option<JobId>,
        states: Option<&[TaskState]>,
    ) -> Result<Vec<Task>, StoreError>;

    /// Tasks whose `end_time` is before `now` and whose state is one of
    /// `TaskState::AVAILABLE_STATES`.
    async fn search_expired(&self, now: DateTime<Utc>) -> Result<Vec<Task>, StoreError>;

    /// Persist the whole record, overwriting whatever is stored.
    async fn replace(&self, task: &Task) -> Result<(), StoreError>;
}
