//! Task record and its immutable configuration.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::TaskError;
use super::ids::{JobId, TaskId};
use super::pool::PoolName;
use super::state::TaskState;

/// Kind of fuzzing work a task performs. Opaque to the lifecycle; carried so
/// events describe the task fully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    LibfuzzerFuzz,
    LibfuzzerCoverage,
    LibfuzzerCrashReport,
    LibfuzzerMerge,
    GenericAnalysis,
    GenericGenerator,
    GenericCrashReport,
    GenericMerge,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        f.write_str(&s)
    }
}

/// Task-type parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    pub task_type: TaskType,

    /// Execution budget in hours, counted from the moment the task starts.
    pub duration: u64,

    pub target_exe: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_options: Vec<String>,
}

impl TaskDetails {
    pub fn new(task_type: TaskType, duration: u64, target_exe: impl Into<String>) -> Self {
        Self {
            task_type,
            duration,
            target_exe: target_exe.into(),
            target_options: Vec::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        i64::try_from(self.duration)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX)
    }
}

/// Run the task on `count` nodes of a named pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPool {
    pub count: u64,
    pub pool_name: PoolName,
}

/// Run the task on a VM of the given shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskVm {
    pub region: String,
    pub sku: String,
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reboot_after_setup: Option<bool>,
}

impl TaskVm {
    pub fn new(region: impl Into<String>, sku: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            sku: sku.into(),
            image: image.into(),
            reboot_after_setup: None,
        }
    }
}

/// Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub task: TaskDetails,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<TaskPool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<TaskVm>,

    /// Tasks that must have started before this one may proceed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prereq_tasks: Vec<TaskId>,
}

impl TaskConfig {
    pub fn new(task: TaskDetails) -> Self {
        Self {
            task,
            pool: None,
            vm: None,
            prereq_tasks: Vec::new(),
        }
    }

    pub fn with_pool(mut self, pool_name: impl Into<PoolName>, count: u64) -> Self {
        self.pool = Some(TaskPool {
            count,
            pool_name: pool_name.into(),
        });
        self
    }

    pub fn with_vm(mut self, vm: TaskVm) -> Self {
        self.vm = Some(vm);
        self
    }

    pub fn with_prereqs(mut self, prereq_tasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.prereq_tasks.extend(prereq_tasks);
        self
    }

    pub fn pool_name(&self) -> Option<&PoolName> {
        self.pool.as_ref().map(|p| &p.pool_name)
    }
}

/// Attribution metadata. Never inspected, only forwarded into events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upn: Option<String>,
}

/// The control-plane record of a task.
///
/// `state` and `error` are only changed through `TaskOperations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub job_id: JobId,
    pub task_id: TaskId,
    pub state: TaskState,
    pub config: TaskConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

impl Task {
    pub fn new(job_id: JobId, task_id: TaskId, config: TaskConfig) -> Self {
        Self {
            job_id,
            task_id,
            state: TaskState::Init,
            config,
            error: None,
            end_time: None,
            user_info: None,
        }
    }

    pub fn with_user_info(mut self, user_info: UserInfo) -> Self {
        self.user_info = Some(user_info);
        self
    }

    /// Does this task list `task_id` among its prerequisites?
    pub fn depends_on(&self, task_id: TaskId) -> bool {
        self.config.prereq_tasks.contains(&task_id)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.state.is_available() && self.end_time.is_some_and(|end| end < now)
    }
}
