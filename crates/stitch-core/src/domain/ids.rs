//! Domain identifiers (strongly-typed IDs).
//!
//! ULID をベースに Phantom type でラップしています。
//! `TaskId` と `JobId` は同じ 128-bit 表現ですが、型としては混同できません。
//!
//! - task_id はワークキュー名にもそのまま使われます（`Display` は prefix 付き、
//!   `as_ulid()` が素の値）。
//! - job_id は TaskStore の partition key です。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"job-", "task-", ...）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// Build an id from a raw integer. Handy for fixtures where readable ids
    /// matter more than time ordering.
    pub fn from_u128(value: u128) -> Self {
        Self::from_ulid(Ulid::from_bytes(value.to_be_bytes()))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {}

impl IdMarker for Job {
    fn prefix() -> &'static str {
        "job-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {}

impl IdMarker for Node {
    fn prefix() -> &'static str {
        "node-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scaleset {}

impl IdMarker for Scaleset {
    fn prefix() -> &'static str {
        "scaleset-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pool {}

impl IdMarker for Pool {
    fn prefix() -> &'static str {
        "pool-"
    }
}

/// Identifier of a Job (lifecycle boundary shared by its tasks).
pub type JobId = Id<Job>;

/// Identifier of a Task. Also names the task's private work queue.
pub type TaskId = Id<Task>;

/// Identifier of a worker node (machine id).
pub type NodeId = Id<Node>;

pub type ScalesetId = Id<Scaleset>;

pub type PoolId = Id<Pool>;
