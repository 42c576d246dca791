//! Context - ports の束
//!
//! `TaskOperations` が触れる外部コラボレーターはすべてここに集まります。

use std::sync::Arc;

use crate::ports::{
    Clock, EventSink, JobDirectory, NodeDirectory, PoolDirectory, ScalesetDirectory, TaskStore,
    WorkQueue,
};

#[derive(Clone)]
pub struct Context {
    pub tasks: Arc<dyn TaskStore>,
    pub jobs: Arc<dyn JobDirectory>,
    pub pools: Arc<dyn PoolDirectory>,
    pub scalesets: Arc<dyn ScalesetDirectory>,
    pub nodes: Arc<dyn NodeDirectory>,
    pub queues: Arc<dyn WorkQueue>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
}
