//! App - アプリケーション層
//!
//! ports を組み合わせてタスクのライフサイクルを実装します。
//!
//! # 主要コンポーネント
//! - **TaskOperations**: 状態遷移（lifecycle）、前提タスク判定と失敗の伝播（prereq）、
//!   プール選択（matcher）
//! - **TaskSweeper**: 期限切れタスクの停止と stopping タスクの再駆動
//! - **Context**: TaskOperations が使う port の束

pub mod context;
pub mod lifecycle;
pub mod matcher;
pub mod prereq;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::context::Context;
pub use self::lifecycle::{TaskOperations, work_queue_name};
pub use self::sweeper::{SweepReport, SweeperHandle, TaskSweeper};
