//! WorkQueue port - タスク専用のワークキューの作成と削除

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Storage account class a queue lives in. Task work queues are corpus
/// queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Corpus,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("failed to create queue {name}: {reason}")]
    CreateFailed { name: String, reason: String },

    #[error("failed to delete queue {name}: {reason}")]
    DeleteFailed { name: String, reason: String },
}

#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn create_queue(&self, name: &str, storage: StorageType) -> Result<(), QueueError>;

    /// Deleting a queue that does not exist succeeds.
    async fn delete_queue(&self, name: &str, storage: StorageType) -> Result<(), QueueError>;
}
