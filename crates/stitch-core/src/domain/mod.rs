//! Domain model: task / job / pool records, lifecycle states, events and the
//! error values recorded on tasks.

pub mod errors;
pub mod events;
pub mod graph;
pub mod ids;
pub mod job;
pub mod pool;
pub mod state;
pub mod task;

pub use self::errors::{ErrorCode, TaskError};
pub use self::events::Event;
pub use self::graph::DependencyGraph;
pub use self::ids::{JobId, NodeId, PoolId, ScalesetId, TaskId};
pub use self::job::{Job, JobConfig};
pub use self::pool::{Os, Pool, PoolName, Scaleset};
pub use self::state::{JobState, TaskState};
pub use self::task::{Task, TaskConfig, TaskDetails, TaskPool, TaskType, TaskVm, UserInfo};
