//! stitch demo
//!
//! In-memory walkthrough of a three-task pipeline: start, prerequisite
//! gating, a failure that cascades down the pipeline, and the sweeper
//! finishing the stop once the last node lets go.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stitch_core::domain::{
    Job, JobConfig, NodeId, Os, Pool, PoolId, PoolName, Scaleset, ScalesetId, Task, TaskConfig,
    TaskDetails, TaskError, TaskId, TaskState, TaskType,
};
use stitch_core::impls::{InMemoryBackend, TracingEventSink};
use stitch_core::ports::{IdGenerator, SystemClock, UlidGenerator};
use stitch_core::{SweepConfig, TaskOperations, TaskSweeper};

/// Run the task lifecycle against in-memory collaborators.
#[derive(Parser, Debug)]
#[command(name = "stitch", about = "Task lifecycle demo against an in-memory backend")]
struct Args {
    /// Hours each task may run once started
    #[arg(long, default_value = "2")]
    duration_hours: u64,

    /// Pool the pipeline is scheduled to
    #[arg(long, default_value = "pool-A")]
    pool: String,

    /// Seconds between sweeps
    #[arg(long, default_value = "1")]
    sweep_interval_secs: u64,

    /// Stop the fuzzer cleanly instead of failing it
    #[arg(long)]
    no_failure: bool,

    /// Log events as they happen instead of printing them at the end
    #[arg(long)]
    log_events: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stitch_core=info")),
        )
        .init();

    let backend = InMemoryBackend::new(Arc::new(SystemClock));
    let mut ctx = backend.context();
    if args.log_events {
        ctx.events = Arc::new(TracingEventSink);
    }
    let ops = Arc::new(TaskOperations::new(ctx));
    let ids = UlidGenerator::new(SystemClock);

    // (A) inventory: one pool backed by one scale set
    let pool_name = PoolName::new(args.pool.clone());
    backend
        .inventory
        .add_pool(Pool::new(PoolId::from_u128(1), pool_name.clone(), Os::Linux))
        .await;
    backend
        .inventory
        .add_scaleset(Scaleset {
            scaleset_id: ScalesetId::from_u128(1),
            pool_name: pool_name.clone(),
            region: "westus2".to_string(),
            vm_sku: "Standard_D2s_v3".to_string(),
            image: "Canonical:UbuntuServer:18.04-LTS:latest".to_string(),
        })
        .await;

    // (B) job + pipeline: fuzz <- coverage <- report
    let job_id = ids.generate_job_id();
    backend
        .jobs
        .insert(Job::new(
            job_id,
            JobConfig {
                project: "demo".to_string(),
                name: "libpng".to_string(),
                build: "1".to_string(),
                duration: 24,
            },
        ))
        .await;

    let new_task = |task_type: TaskType, prereqs: Vec<TaskId>| {
        let config = TaskConfig::new(TaskDetails::new(task_type, args.duration_hours, "fuzz.exe"))
            .with_pool(pool_name.clone(), 1)
            .with_prereqs(prereqs);
        Task::new(job_id, ids.generate_task_id(), config)
    };
    let fuzz = new_task(TaskType::LibfuzzerFuzz, vec![]);
    let coverage = new_task(TaskType::LibfuzzerCoverage, vec![fuzz.task_id]);
    let report = new_task(TaskType::LibfuzzerCrashReport, vec![coverage.task_id]);
    for task in [&fuzz, &coverage, &report] {
        backend.tasks.insert(task.clone()).await;
    }

    let fuzz = ops.init(fuzz).await?;
    let coverage = ops.init(coverage).await?;
    let report = ops.init(report).await?;

    // (C) coverage has to wait for the fuzzer to start
    info!(ready = ops.check_prereq_tasks(&coverage).await?, "coverage before fuzzer start");

    let fuzz = start(&ops, fuzz).await?;
    let fuzz_id = fuzz.task_id;
    let node = NodeId::from_u128(1);
    backend.nodes.assign(fuzz_id, node).await;

    info!(ready = ops.check_prereq_tasks(&coverage).await?, "coverage after fuzzer start");
    let coverage = start(&ops, coverage).await?;
    if let Some(vm) = ops.get_repro_vm_config(&coverage).await? {
        info!(sku = %vm.sku, image = %vm.image, region = %vm.region, "repro vm");
    }
    info!(ready = ops.check_prereq_tasks(&report).await?, "report after coverage start");

    // (D) the fuzzer goes away; its node is still draining
    if args.no_failure {
        ops.mark_stopping(fuzz).await?;
    } else {
        ops.mark_failed(fuzz, TaskError::task_failed("fuzzer crashed"), None)
            .await?;
    }

    // (E) the sweeper finishes the stop once the node lets go
    let handle = TaskSweeper::new(
        ops.clone(),
        SweepConfig {
            interval_secs: args.sweep_interval_secs,
            drive_stopping: true,
        },
    )
    .spawn();
    backend.nodes.unassign(fuzz_id, node).await;
    let settle = Duration::from_secs(args.sweep_interval_secs.max(1)) + Duration::from_millis(200);
    tokio::time::sleep(settle).await;
    handle.shutdown_and_join().await;

    for task in ops.get_by_job_id(job_id).await? {
        let error = task.error.as_ref().map(ToString::to_string).unwrap_or_default();
        println!("{} {} {}", task.task_id, task.state, error);
    }
    if let Some(job) = backend.jobs.job(job_id).await {
        println!("{} {:?}", job.job_id, job.state);
    }
    if !args.log_events {
        for event in backend.events.events().await {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    Ok(())
}

/// Walk a waiting task to `running` on its pool.
async fn start(ops: &TaskOperations, task: Task) -> Result<Task, Box<dyn std::error::Error>> {
    if ops.get_pool(&task).await?.is_none() {
        return Err(format!("no pool for {}", task.task_id).into());
    }
    let task = ops.set_state(task, TaskState::Scheduled).await?;
    let task = ops.set_state(task, TaskState::SettingUp).await?;
    Ok(ops.set_state(task, TaskState::Running).await?)
}
