//! EventSink port - ライフサイクルイベントの送信
//!
//! 配送の信頼性（at-least-once）は sink 側の責務です。コアから見ると
//! fire-and-forget で、送信失敗はログに残すだけで遷移は巻き戻しません。

use async_trait::async_trait;

use crate::domain::Event;

#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to send {kind} event: {reason}")]
pub struct EventSinkError {
    pub kind: &'static str,
    pub reason: String,
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send_event(&self, event: Event) -> Result<(), EventSinkError>;
}
