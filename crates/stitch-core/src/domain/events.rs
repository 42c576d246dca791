//! Events - タスクのライフサイクルイベント
//!
//! `set_state` が 1 回完了するごとに、ちょうど 1 つのイベントが送られます。
//! どの形のイベントになるかは `Event::for_transition` が決めます（純粋関数）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::TaskError;
use super::ids::{JobId, TaskId};
use super::state::TaskState;
use super::task::{Task, TaskConfig, UserInfo};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    TaskStateUpdated {
        job_id: JobId,
        task_id: TaskId,
        state: TaskState,
        end_time: Option<DateTime<Utc>>,
        config: TaskConfig,
    },
    TaskStopped {
        job_id: JobId,
        task_id: TaskId,
        user_info: Option<UserInfo>,
        config: TaskConfig,
    },
    TaskFailed {
        job_id: JobId,
        task_id: TaskId,
        error: TaskError,
        user_info: Option<UserInfo>,
        config: TaskConfig,
    },
}

impl Event {
    /// The event describing a task that has just been moved into its current
    /// state.
    pub fn for_transition(task: &Task) -> Self {
        match (task.state, &task.error) {
            (TaskState::Stopped, Some(error)) => Event::TaskFailed {
                job_id: task.job_id,
                task_id: task.task_id,
                error: error.clone(),
                user_info: task.user_info.clone(),
                config: task.config.clone(),
            },
            (TaskState::Stopped, None) => Event::TaskStopped {
                job_id: task.job_id,
                task_id: task.task_id,
                user_info: task.user_info.clone(),
                config: task.config.clone(),
            },
            (state, _) => Event::TaskStateUpdated {
                job_id: task.job_id,
                task_id: task.task_id,
                state,
                end_time: task.end_time,
                config: task.config.clone(),
            },
        }
    }

    pub fn task_id(&self) -> TaskId {
        match self {
            Event::TaskStateUpdated { task_id, .. }
            | Event::TaskStopped { task_id, .. }
            | Event::TaskFailed { task_id, .. } => *task_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::TaskStateUpdated { .. } => "task_state_updated",
            Event::TaskStopped { .. } => "task_stopped",
            Event::TaskFailed { .. } => "task_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::{TaskDetails, TaskType};
    use rstest::rstest;

    fn task(state: TaskState, error: Option<TaskError>) -> Task {
        let mut task = Task::new(
            JobId::from_u128(1),
            TaskId::from_u128(2),
            TaskConfig::new(TaskDetails::new(TaskType::LibfuzzerFuzz, 1, "fuzz.exe")),
        );
        task.state = state;
        task.error = error;
        task
    }

    #[test]
    fn stopped_with_error_is_failed() {
        let err = TaskError::task_failed("boom");
        let event = Event::for_transition(&task(TaskState::Stopped, Some(err.clone())));
        assert!(matches!(event, Event::TaskFailed { error, .. } if error == err));
    }

    #[test]
    fn stopped_without_error_is_stopped() {
        let event = Event::for_transition(&task(TaskState::Stopped, None));
        assert_eq!(event.kind(), "task_stopped");
    }

    #[rstest]
    #[case::waiting(TaskState::Waiting, None)]
    #[case::running(TaskState::Running, None)]
    #[case::stopping_failed(TaskState::Stopping, Some(TaskError::task_failed("x")))]
    fn other_states_are_state_updates(
        #[case] state: TaskState,
        #[case] error: Option<TaskError>,
    ) {
        let event = Event::for_transition(&task(state, error));
        assert!(matches!(event, Event::TaskStateUpdated { state: s, .. } if s == state));
    }

    #[test]
    fn event_is_tagged_by_type() {
        let event = Event::for_transition(&task(TaskState::Running, None));
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["event_type"], "task_state_updated");
        assert_eq!(v["state"], "running");
    }
}
