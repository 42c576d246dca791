//! State - タスクとジョブの状態
//!
//! # タスクの状態遷移
//! - init → waiting → scheduled → setting_up → running → stopping → stopped
//! - 失敗時はどの状態からでも stopping → stopped（error 付き）
//! - stopped は終端。以後は変更されない

use serde::{Deserialize, Serialize};
use std::fmt;

/// TaskState はタスクのライフサイクル状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Created, work queue not provisioned yet.
    Init,

    /// Work queue exists; waiting on prerequisites / a pool.
    Waiting,

    /// Handed to a pool, no node has picked it up.
    Scheduled,

    /// A node is preparing the task.
    SettingUp,

    Running,

    /// Nodes were asked to stop the task; waiting for them to let go.
    Stopping,

    /// Terminal.
    Stopped,
}

impl TaskState {
    /// Every non-terminal state. The expiry sweep looks for tasks past their
    /// `end_time` in any of these.
    pub const AVAILABLE_STATES: [TaskState; 6] = [
        TaskState::Init,
        TaskState::Waiting,
        TaskState::Scheduled,
        TaskState::SettingUp,
        TaskState::Running,
        TaskState::Stopping,
    ];

    /// The task has begun consuming compute resources.
    pub fn has_started(self) -> bool {
        matches!(
            self,
            TaskState::SettingUp | TaskState::Running | TaskState::Stopping | TaskState::Stopped
        )
    }

    /// The task is tearing down or torn down.
    pub fn shutting_down(self) -> bool {
        matches!(self, TaskState::Stopping | TaskState::Stopped)
    }

    pub fn is_terminal(self) -> bool {
        self == TaskState::Stopped
    }

    /// Running or setting up: the phase in which start bookkeeping is owed.
    pub fn in_started_phase(self) -> bool {
        matches!(self, TaskState::Running | TaskState::SettingUp)
    }

    pub fn is_available(self) -> bool {
        Self::AVAILABLE_STATES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Init => "init",
            TaskState::Waiting => "waiting",
            TaskState::Scheduled => "scheduled",
            TaskState::SettingUp => "setting_up",
            TaskState::Running => "running",
            TaskState::Stopping => "stopping",
            TaskState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JobState はジョブの集約状態
///
/// - init: まだどのタスクも開始していない
/// - enabled: 少なくとも 1 つのタスクが開始した
/// - stopped: 全タスクが終了した
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Init,
    Enabled,
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::init(TaskState::Init, false, false)]
    #[case::waiting(TaskState::Waiting, false, false)]
    #[case::scheduled(TaskState::Scheduled, false, false)]
    #[case::setting_up(TaskState::SettingUp, true, false)]
    #[case::running(TaskState::Running, true, false)]
    #[case::stopping(TaskState::Stopping, true, true)]
    #[case::stopped(TaskState::Stopped, true, true)]
    fn state_predicates(
        #[case] state: TaskState,
        #[case] started: bool,
        #[case] shutting_down: bool,
    ) {
        assert_eq!(state.has_started(), started);
        assert_eq!(state.shutting_down(), shutting_down);
    }

    #[test]
    fn only_stopped_is_outside_available_states() {
        assert!(!TaskState::Stopped.is_available());
        assert!(TaskState::Stopping.is_available());
        assert_eq!(TaskState::AVAILABLE_STATES.len(), 6);
    }

    #[test]
    fn serializes_as_snake_case() {
        let s = serde_json::to_string(&TaskState::SettingUp).unwrap();
        assert_eq!(s, "\"setting_up\"");
        assert_eq!(TaskState::SettingUp.to_string(), "setting_up");
    }
}
