//! stitch-core
//!
//! Task lifecycle core for a fuzzing orchestrator: the task state machine,
//! prerequisite gating with failure propagation, and pool matching.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, state, task, job, pool, events, errors, graph）
//! - **ports**: 外部コラボレーターの抽象（TaskStore, PoolDirectory, WorkQueue, EventSink, など）
//! - **app**: TaskOperations と TaskSweeper
//! - **impls**: 開発・テスト用のインメモリ実装
//! - **config**: sweeper の設定
//! - **error**: コアから外に出るエラー型

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;

pub use crate::app::{Context, SweepReport, SweeperHandle, TaskOperations, TaskSweeper};
pub use crate::config::SweepConfig;
pub use crate::error::StitchError;
