//! JobDirectory port - ジョブの参照と集約状態の更新

use async_trait::async_trait;

use super::task_store::StoreError;
use crate::domain::{Job, JobId};

#[async_trait]
pub trait JobDirectory: Send + Sync {
    async fn get(&self, job_id: JobId) -> Result<Option<Job>, StoreError>;

    /// A task of this job started. Must be idempotent.
    async fn on_start(&self, job: &Job) -> Result<(), StoreError>;

    /// A task of this job stopped; the directory decides whether the job is
    /// done.
    async fn stop_if_all_done(&self, job: &Job) -> Result<(), StoreError>;
}
