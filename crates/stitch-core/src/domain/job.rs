//! Job record: the lifecycle boundary shared by a set of tasks.
//!
//! The task lifecycle only ever asks two things of a job: "a task started" and
//! "check whether all tasks are done". Both are implemented here as pure
//! record transitions so any `JobDirectory` can reuse them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use super::state::{JobState, TaskState};
use super::task::UserInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub project: String,
    pub name: String,
    pub build: String,

    /// Hours the job stays enabled after its first task starts.
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub state: JobState,
    pub config: JobConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

impl Job {
    pub fn new(job_id: JobId, config: JobConfig) -> Self {
        Self {
            job_id,
            state: JobState::Init,
            config,
            end_time: None,
            user_info: None,
        }
    }

    /// Record that one of the job's tasks started. Only the first call has an
    /// effect; returns whether the record changed.
    pub fn mark_started(&mut self, now: DateTime<Utc>) -> bool {
        if self.end_time.is_some() || self.state == JobState::Stopped {
            return false;
        }
        let duration = i64::try_from(self.config.duration)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        self.end_time = Some(now.checked_add_signed(duration).unwrap_or(DateTime::<Utc>::MAX_UTC));
        self.state = JobState::Enabled;
        true
    }

    /// Stop the job once every task has stopped. An empty task set keeps the
    /// job alive: tasks may still be added.
    pub fn stop_if_all_done(&mut self, task_states: &[TaskState]) -> bool {
        if self.state == JobState::Stopped || task_states.is_empty() {
            return false;
        }
        if !task_states.iter().all(|s| s.is_terminal()) {
            return false;
        }
        self.state = JobState::Stopped;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn job() -> Job {
        Job::new(
            JobId::from_u128(1),
            JobConfig {
                project: "proj".to_string(),
                name: "name".to_string(),
                build: "build".to_string(),
                duration: 24,
            },
        )
    }

    #[test]
    fn first_start_enables_job_once() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut job = job();

        assert!(job.mark_started(now));
        assert_eq!(job.state, JobState::Enabled);
        assert_eq!(job.end_time, Some(now + Duration::hours(24)));

        let later = now + Duration::hours(1);
        assert!(!job.mark_started(later));
        assert_eq!(job.end_time, Some(now + Duration::hours(24)));
    }

    #[test]
    fn stopped_job_is_not_restarted() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut job = job();
        job.state = JobState::Stopped;

        assert!(!job.mark_started(now));
        assert_eq!(job.state, JobState::Stopped);
        assert!(job.end_time.is_none());
    }

    #[test]
    fn stops_when_every_task_stopped() {
        let mut job = job();
        assert!(job.stop_if_all_done(&[TaskState::Stopped, TaskState::Stopped]));
        assert_eq!(job.state, JobState::Stopped);
        assert!(!job.stop_if_all_done(&[TaskState::Stopped]));
    }

    #[rstest]
    #[case::running(TaskState::Running)]
    #[case::stopping(TaskState::Stopping)]
    #[case::waiting(TaskState::Waiting)]
    fn stays_while_any_task_live(#[case] live: TaskState) {
        let mut job = job();
        assert!(!job.stop_if_all_done(&[TaskState::Stopped, live]));
        assert_eq!(job.state, JobState::Init);
    }

    #[test]
    fn empty_task_set_does_not_stop_job() {
        let mut job = job();
        assert!(!job.stop_if_all_done(&[]));
        assert_eq!(job.state, JobState::Init);
    }
}
