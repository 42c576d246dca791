use thiserror::Error;

use crate::domain::{ErrorCode, TaskError};
use crate::ports::{QueueError, StoreError};

/// Errors that escape the lifecycle core.
///
/// Domain failures (missing prerequisite, task never started, cascaded
/// failure) are recorded on the task instead and never show up here.
#[derive(Debug, Error)]
pub enum StitchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("invalid task configuration: {0}")]
    InvalidArgument(TaskError),
}

impl StitchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StitchError::Store(_) | StitchError::Queue(_) => ErrorCode::DependencyError,
            StitchError::InvalidArgument(err) => err.code,
        }
    }
}
