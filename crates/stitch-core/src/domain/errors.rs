//! Errors - タスクに記録されるエラー値
//!
//! ここで定義する `TaskError` は「返す」エラーではなく、Task レコードに
//! 記録される値です。呼び出し元に伝播するインフラ系のエラーは
//! `crate::error::StitchError` を参照してください。

use serde::{Deserialize, Serialize};
use std::fmt;

/// ErrorCode はエラーの分類（閉じた集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Execution or dependency failure recorded on a task.
    TaskFailed,

    /// A referenced prerequisite task could not be found.
    InvalidRequest,

    /// The task configuration is structurally invalid.
    InvalidArgument,

    /// An external collaborator (store, queue) failed.
    DependencyError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::TaskFailed => "TASK_FAILED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::DependencyError => "DEPENDENCY_ERROR",
        }
    }
}

/// A code plus ordered, human-readable details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    pub code: ErrorCode,
    pub errors: Vec<String>,
}

impl TaskError {
    pub fn new(code: ErrorCode, errors: Vec<String>) -> Self {
        Self { code, errors }
    }

    pub fn task_failed(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::TaskFailed, vec![detail.into()])
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, vec![detail.into()])
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, vec![detail.into()])
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_details_in_order() {
        let err = TaskError::new(
            ErrorCode::TaskFailed,
            vec!["first".to_string(), "second".to_string()],
        );
        assert_eq!(err.to_string(), "TASK_FAILED: first; second");
    }

    #[test]
    fn code_serializes_like_as_str() {
        let s = serde_json::to_string(&ErrorCode::InvalidRequest).unwrap();
        assert_eq!(s, format!("\"{}\"", ErrorCode::InvalidRequest.as_str()));
    }
}
