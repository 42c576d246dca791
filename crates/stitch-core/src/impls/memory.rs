//! In-memory implementations of every port.
//!
//! All state lives behind `tokio::sync::Mutex`; no lock is held across a call
//! into another port.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::event_sinks::RecordingEventSink;
use crate::app::Context;
use crate::domain::{Job, JobId, NodeId, Pool, PoolName, Scaleset, Task, TaskId, TaskState};
use crate::ports::{
    Clock, JobDirectory, NodeDirectory, PoolDirectory, QueueError, ScalesetDirectory, StorageType,
    StoreError, TaskStore, WorkQueue,
};

// ========================================
// TaskStore
// ========================================

#[derive(Default)]
pub struct InMemoryTaskStore {
    records: Mutex<BTreeMap<TaskId, Task>>,
    unavailable: AtomicBool,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, task: Task) {
        self.records.lock().await.insert(task.task_id, task);
    }

    pub async fn all(&self) -> Vec<Task> {
        self.records.lock().await.values().cloned().collect()
    }

    /// Make every following call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory task store".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get(&self, task_id: TaskId) -> Result<Option<Task>, StoreError> {
        self.check_available()?;
        Ok(self.records.lock().await.get(&task_id).cloned())
    }

    async fn search_by_job(&self, job_id: JobId) -> Result<Vec<Task>, StoreError> {
        self.search_states(Some(job_id), None).await
    }

    async fn search_states(
        &self,
        job_id: Option<JobId>,
        states: Option<&[TaskState]>,
    ) -> Result<Vec<Task>, StoreError> {
        self.check_available()?;
        let records = self.records.lock().await;
        Ok(records
            .values()
            .filter(|t| job_id.is_none_or(|j| t.job_id == j))
            .filter(|t| states.is_none_or(|s| s.contains(&t.state)))
            .cloned()
            .collect())
    }

    async fn search_expired(&self, now: DateTime<Utc>) -> Result<Vec<Task>, StoreError> {
        self.check_available()?;
        let records = self.records.lock().await;
        Ok(records
            .values()
            .filter(|t| t.is_expired(now))
            .cloned()
            .collect())
    }

    async fn replace(&self, task: &Task) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.lock().await.insert(task.task_id, task.clone());
        Ok(())
    }
}

// ========================================
// Pools / Scalesets
// ========================================

#[derive(Default)]
struct InventoryState {
    pools: HashMap<PoolName, Pool>,
    scalesets: Vec<Scaleset>,
}

/// Pools and scale sets in one place; implements both directories.
#[derive(Default)]
pub struct InMemoryInventory {
    state: Mutex<InventoryState>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_pool(&self, pool: Pool) {
        self.state.lock().await.pools.insert(pool.name.clone(), pool);
    }

    pub async fn add_scaleset(&self, scaleset: Scaleset) {
        self.state.lock().await.scalesets.push(scaleset);
    }
}

#[async_trait]
impl PoolDirectory for InMemoryInventory {
    async fn get_by_name(&self, name: &PoolName) -> Result<Option<Pool>, StoreError> {
        Ok(self.state.lock().await.pools.get(name).cloned())
    }
}

#[async_trait]
impl ScalesetDirectory for InMemoryInventory {
    async fn search_by_sku_image(
        &self,
        sku: &str,
        image: &str,
    ) -> Result<Vec<Scaleset>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .scalesets
            .iter()
            .filter(|s| s.matches(sku, image))
            .cloned()
            .collect())
    }

    async fn search_by_pool(&self, pool_name: &PoolName) -> Result<Vec<Scaleset>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .scalesets
            .iter()
            .filter(|s| &s.pool_name == pool_name)
            .cloned()
            .collect())
    }
}

// ========================================
// Nodes
// ========================================

#[derive(Default)]
struct NodeState {
    assignments: HashMap<TaskId, BTreeSet<NodeId>>,
    stop_requests: Vec<TaskId>,
}

/// Node assignments are driven by the test (or demo) through
/// `assign` / `unassign`; `stop_task` only records the request.
#[derive(Default)]
pub struct InMemoryNodeDirectory {
    state: Mutex<NodeState>,
}

impl InMemoryNodeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn assign(&self, task_id: TaskId, node_id: NodeId) {
        let mut state = self.state.lock().await;
        state.assignments.entry(task_id).or_default().insert(node_id);
    }

    pub async fn unassign(&self, task_id: TaskId, node_id: NodeId) {
        let mut state = self.state.lock().await;
        if let Some(nodes) = state.assignments.get_mut(&task_id) {
            nodes.remove(&node_id);
            if nodes.is_empty() {
                state.assignments.remove(&task_id);
            }
        }
    }

    pub async fn stop_requests(&self) -> Vec<TaskId> {
        self.state.lock().await.stop_requests.clone()
    }
}

#[async_trait]
impl NodeDirectory for InMemoryNodeDirectory {
    async fn nodes_by_task(&self, task_id: TaskId) -> Result<Vec<NodeId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .get(&task_id)
            .map(|nodes| nodes.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn stop_task(&self, task_id: TaskId) -> Result<(), StoreError> {
        self.state.lock().await.stop_requests.push(task_id);
        Ok(())
    }
}

// ========================================
// Work queues
// ========================================

#[derive(Default)]
pub struct InMemoryWorkQueue {
    queues: Mutex<HashSet<(String, StorageType)>>,
    fail_creates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn exists(&self, name: &str, storage: StorageType) -> bool {
        self.queues
            .lock()
            .await
            .contains(&(name.to_string(), storage))
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn create_queue(&self, name: &str, storage: StorageType) -> Result<(), QueueError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(QueueError::CreateFailed {
                name: name.to_string(),
                reason: "queue service unavailable".to_string(),
            });
        }
        self.queues.lock().await.insert((name.to_string(), storage));
        Ok(())
    }

    async fn delete_queue(&self, name: &str, storage: StorageType) -> Result<(), QueueError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(QueueError::DeleteFailed {
                name: name.to_string(),
                reason: "queue service unavailable".to_string(),
            });
        }
        self.queues.lock().await.remove(&(name.to_string(), storage));
        Ok(())
    }
}

// ========================================
// Jobs
// ========================================

#[derive(Default)]
struct JobDirectoryState {
    jobs: HashMap<JobId, Job>,
    start_notifications: Vec<JobId>,
    completion_checks: Vec<JobId>,
}

/// Job bookkeeping backed by the in-memory task store: "stop if all done"
/// looks at the job's task partition.
pub struct InMemoryJobDirectory {
    state: Mutex<JobDirectoryState>,
    tasks: Arc<InMemoryTaskStore>,
    clock: Arc<dyn Clock>,
}

impl InMemoryJobDirectory {
    pub fn new(tasks: Arc<InMemoryTaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(JobDirectoryState::default()),
            tasks,
            clock,
        }
    }

    pub async fn insert(&self, job: Job) {
        self.state.lock().await.jobs.insert(job.job_id, job);
    }

    pub async fn job(&self, job_id: JobId) -> Option<Job> {
        self.state.lock().await.jobs.get(&job_id).cloned()
    }

    pub async fn start_notifications(&self) -> Vec<JobId> {
        self.state.lock().await.start_notifications.clone()
    }

    pub async fn completion_checks(&self) -> Vec<JobId> {
        self.state.lock().await.completion_checks.clone()
    }
}

#[async_trait]
impl JobDirectory for InMemoryJobDirectory {
    async fn get(&self, job_id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.job(job_id).await)
    }

    async fn on_start(&self, job: &Job) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        state.start_notifications.push(job.job_id);
        if let Some(stored) = state.jobs.get_mut(&job.job_id) {
            stored.mark_started(now);
        }
        Ok(())
    }

    async fn stop_if_all_done(&self, job: &Job) -> Result<(), StoreError> {
        let task_states: Vec<TaskState> = self
            .tasks
            .search_by_job(job.job_id)
            .await?
            .into_iter()
            .map(|t| t.state)
            .collect();

        let mut state = self.state.lock().await;
        state.completion_checks.push(job.job_id);
        if let Some(stored) = state.jobs.get_mut(&job.job_id) {
            stored.stop_if_all_done(&task_states);
        }
        Ok(())
    }
}

// ========================================
// Backend
// ========================================

/// Every in-memory port wired together, with typed handles kept for
/// inspection.
pub struct InMemoryBackend {
    pub tasks: Arc<InMemoryTaskStore>,
    pub jobs: Arc<InMemoryJobDirectory>,
    pub inventory: Arc<InMemoryInventory>,
    pub nodes: Arc<InMemoryNodeDirectory>,
    pub queues: Arc<InMemoryWorkQueue>,
    pub events: Arc<RecordingEventSink>,
    pub clock: Arc<dyn Clock>,
}

impl InMemoryBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let tasks = Arc::new(InMemoryTaskStore::new());
        Self {
            jobs: Arc::new(InMemoryJobDirectory::new(tasks.clone(), clock.clone())),
            tasks,
            inventory: Arc::new(InMemoryInventory::new()),
            nodes: Arc::new(InMemoryNodeDirectory::new()),
            queues: Arc::new(InMemoryWorkQueue::new()),
            events: Arc::new(RecordingEventSink::new()),
            clock,
        }
    }

    pub fn context(&self) -> Context {
        Context {
            tasks: self.tasks.clone(),
            jobs: self.jobs.clone(),
            pools: self.inventory.clone(),
            scalesets: self.inventory.clone(),
            nodes: self.nodes.clone(),
            queues: self.queues.clone(),
            events: self.events.clone(),
            clock: self.clock.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobConfig, TaskConfig, TaskDetails, TaskType};
    use crate::ports::FixedClock;
    use chrono::{Duration, TimeZone};

    fn task(job: u128, id: u128, state: TaskState) -> Task {
        let mut task = Task::new(
            JobId::from_u128(job),
            TaskId::from_u128(id),
            TaskConfig::new(TaskDetails::new(TaskType::GenericMerge, 1, "merge.exe")),
        );
        task.state = state;
        task
    }

    #[tokio::test]
    async fn search_states_filters_by_job_and_state() {
        let store = InMemoryTaskStore::new();
        store.insert(task(1, 1, TaskState::Running)).await;
        store.insert(task(1, 2, TaskState::Waiting)).await;
        store.insert(task(2, 3, TaskState::Running)).await;

        let running = store
            .search_states(None, Some(&[TaskState::Running]))
            .await
            .unwrap();
        assert_eq!(running.len(), 2);

        let job1_running = store
            .search_states(Some(JobId::from_u128(1)), Some(&[TaskState::Running]))
            .await
            .unwrap();
        assert_eq!(job1_running.len(), 1);
        assert_eq!(job1_running[0].task_id, TaskId::from_u128(1));

        let everything = store.search_states(None, None).await.unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[tokio::test]
    async fn search_expired_skips_stopped_and_future_tasks() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let store = InMemoryTaskStore::new();

        let mut expired = task(1, 1, TaskState::Running);
        expired.end_time = Some(now - Duration::hours(1));
        let mut stopped = task(1, 2, TaskState::Stopped);
        stopped.end_time = Some(now - Duration::hours(1));
        let mut future = task(1, 3, TaskState::Running);
        future.end_time = Some(now + Duration::hours(1));

        for t in [expired, stopped, future] {
            store.insert(t).await;
        }

        let found = store.search_expired(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task_id, TaskId::from_u128(1));
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryTaskStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.get(TaskId::from_u128(1)).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn unassigning_last_node_clears_task() {
        let nodes = InMemoryNodeDirectory::new();
        let task_id = TaskId::from_u128(1);
        let node = NodeId::from_u128(9);

        nodes.assign(task_id, node).await;
        assert_eq!(nodes.nodes_by_task(task_id).await.unwrap(), vec![node]);

        nodes.unassign(task_id, node).await;
        assert!(nodes.nodes_by_task(task_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn job_directory_stops_job_once_tasks_stopped() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let tasks = Arc::new(InMemoryTaskStore::new());
        let jobs = InMemoryJobDirectory::new(tasks.clone(), clock);
        let job = Job::new(
            JobId::from_u128(1),
            JobConfig {
                project: "p".to_string(),
                name: "n".to_string(),
                build: "b".to_string(),
                duration: 1,
            },
        );
        jobs.insert(job.clone()).await;

        tasks.insert(task(1, 1, TaskState::Stopped)).await;
        tasks.insert(task(1, 2, TaskState::Running)).await;
        jobs.stop_if_all_done(&job).await.unwrap();
        assert_eq!(jobs.job(job.job_id).await.unwrap().state, crate::domain::JobState::Init);

        tasks.insert(task(1, 2, TaskState::Stopped)).await;
        jobs.stop_if_all_done(&job).await.unwrap();
        assert_eq!(
            jobs.job(job.job_id).await.unwrap().state,
            crate::domain::JobState::Stopped
        );
        assert_eq!(jobs.completion_checks().await.len(), 2);
    }
}
