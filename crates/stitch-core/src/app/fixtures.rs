//! Shared test harness: an in-memory backend with one job, a fixed clock and
//! terse task construction.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::lifecycle::TaskOperations;
use crate::domain::{Job, JobConfig, JobId, Task, TaskConfig, TaskDetails, TaskId, TaskState, TaskType};
use crate::impls::InMemoryBackend;
use crate::ports::FixedClock;

pub(crate) struct Harness {
    pub backend: InMemoryBackend,
    pub ops: Arc<TaskOperations>,
    pub job_id: JobId,
    pub now: DateTime<Utc>,
}

impl Harness {
    pub async fn new() -> Self {
        let now = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        let backend = InMemoryBackend::new(Arc::new(FixedClock::new(now)));
        let job_id = JobId::from_u128(1);
        backend
            .jobs
            .insert(Job::new(
                job_id,
                JobConfig {
                    project: "demo".to_string(),
                    name: "fuzz".to_string(),
                    build: "1".to_string(),
                    duration: 24,
                },
            ))
            .await;
        let ops = Arc::new(TaskOperations::new(backend.context()));
        Self {
            backend,
            ops,
            job_id,
            now,
        }
    }

    /// A task of the harness job in `state`, running on `pool-A` for two hours.
    pub async fn add_task(&self, id: u128, state: TaskState, prereqs: &[u128]) -> Task {
        let config = TaskConfig::new(TaskDetails::new(TaskType::LibfuzzerFuzz, 2, "fuzz.exe"))
            .with_pool("pool-A", 1)
            .with_prereqs(prereqs.iter().map(|p| TaskId::from_u128(*p)));
        let mut task = Task::new(self.job_id, TaskId::from_u128(id), config);
        task.state = state;
        self.backend.tasks.insert(task.clone()).await;
        task
    }

    pub async fn reload(&self, id: u128) -> Task {
        self.backend
            .tasks
            .all()
            .await
            .into_iter()
            .find(|t| t.task_id == TaskId::from_u128(id))
            .expect("task exists")
    }
}
