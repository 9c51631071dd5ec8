//! Job lifecycle events.
//!
//! The worker publishes every observed job state change on a broadcast
//! channel so API layers can stream progress without polling the store.
//! Publishing with no subscribers is a no-op.

use serde::Serialize;
use tokio::sync::broadcast;

use vgen_models::{JobId, JobState};

const DEFAULT_CAPACITY: usize = 256;

/// One job state change.
#[derive(Debug, Clone, Serialize)]
pub struct JobEvent {
    pub job_id: JobId,
    pub state: JobState,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobEvent {
    pub fn new(job_id: JobId, state: JobState, progress: u8) -> Self {
        Self {
            job_id,
            state,
            progress,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Broadcast bus for job events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JobEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: JobEvent) {
        // send only fails when there are no subscribers.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let id = JobId::new();
        bus.publish(JobEvent::new(id.clone(), JobState::Running, 10));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.job_id, id);
        assert_eq!(event.state, JobState::Running);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(JobEvent::new(JobId::new(), JobState::Failed, 0).with_message("boom"));
    }
}
