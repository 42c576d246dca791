//! Impls - ports の実装（開発用・テスト用）
//!
//! - **memory**: 全 port のインメモリ実装と、それらを束ねた `InMemoryBackend`
//! - **event_sinks**: `TracingEventSink`（ログ出力）, `RecordingEventSink`（記録のみ）
//!
//! 本番用の実装（テーブルストレージ、キューサービスなど）は別クレートに置きます。

pub mod event_sinks;
pub mod memory;

pub use self::event_sinks::{RecordingEventSink, TracingEventSink};
pub use self::memory::{
    InMemoryBackend, InMemoryInventory, InMemoryJobDirectory, InMemoryNodeDirectory,
    InMemoryTaskStore, InMemoryWorkQueue,
};
