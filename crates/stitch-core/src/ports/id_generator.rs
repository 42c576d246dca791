//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: Clock の時刻を timestamp 部に使う ULID

use crate::domain::{JobId, NodeId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_job_id(&self) -> JobId;

    fn generate_task_id(&self) -> TaskId;

    fn generate_node_id(&self) -> NodeId;
}

/// Time-ordered ids; the timestamp part comes from the clock so a
/// `FixedClock` yields ids sharing one timestamp.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or_default();
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_job_id(&self) -> JobId {
        JobId::from(self.next())
    }

    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next())
    }

    fn generate_node_id(&self) -> NodeId {
        NodeId::from(self.next())
    }
}
