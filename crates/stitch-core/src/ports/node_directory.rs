//! NodeDirectory port - タスクを実行中のノード

use async_trait::async_trait;

use super::task_store::StoreError;
use crate::domain::{NodeId, TaskId};

#[async_trait]
pub trait NodeDirectory: Send + Sync {
    /// Nodes currently assigned `task_id`.
    async fn nodes_by_task(&self, task_id: TaskId) -> Result<Vec<NodeId>, StoreError>;

    /// Ask every node assigned `task_id` to stop it. Nodes release the
    /// assignment on their own schedule.
    async fn stop_task(&self, task_id: TaskId) -> Result<(), StoreError>;
}
