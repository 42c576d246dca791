//! Ports - 外部コラボレーターへのインターフェース
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! ライフサイクルのコアはこれらの trait 越しにしか外部に触れません。
//!
//! - TaskStore: Task レコードの正本
//! - PoolDirectory / ScalesetDirectory / NodeDirectory: 計算資源の在庫（読み取り専用）
//! - JobDirectory: ジョブの参照と集約状態の更新
//! - WorkQueue: タスク専用キューの作成・削除
//! - EventSink: ライフサイクルイベントの送信

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod job_directory;
pub mod node_directory;
pub mod pool_directory;
pub mod task_store;
pub mod work_queue;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::{EventSink, EventSinkError};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::job_directory::JobDirectory;
pub use self::node_directory::NodeDirectory;
pub use self::pool_directory::{PoolDirectory, ScalesetDirectory};
pub use self::task_store::{StoreError, TaskStore};
pub use self::work_queue::{QueueError, StorageType, WorkQueue};
