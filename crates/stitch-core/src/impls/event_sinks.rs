//! EventSink implementations.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{Event, TaskId};
use crate::ports::{EventSink, EventSinkError};

/// Logs each event as structured JSON. Useful where no bus is wired up.
#[derive(Debug, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn send_event(&self, event: Event) -> Result<(), EventSinkError> {
        let payload = serde_json::to_string(&event).map_err(|e| EventSinkError {
            kind: event.kind(),
            reason: e.to_string(),
        })?;
        info!(event_type = event.kind(), task_id = %event.task_id(), %payload, "event");
        Ok(())
    }
}

/// Keeps every event in memory, in send order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    pub async fn events_for(&self, task_id: TaskId) -> Vec<Event> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.task_id() == task_id)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn send_event(&self, event: Event) -> Result<(), EventSinkError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}
