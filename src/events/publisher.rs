use crate::config::EventsConfig;
use crate::state_machine::{LifecycleState, TransitionRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Broadcast publisher for lifecycle and admission events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

/// Audit payload for one applied state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub entity_kind: String,
    pub entity_id: i64,
    pub from_state: String,
    pub to_state: String,
    pub reason: String,
    pub transitioned_at: chrono::DateTime<chrono::Utc>,
}

impl<S: LifecycleState> From<&TransitionRecord<S>> for TransitionEvent {
    fn from(record: &TransitionRecord<S>) -> Self {
        Self {
            entity_kind: S::ENTITY_KIND.to_string(),
            entity_id: record.entity_id,
            from_state: record.from_state.to_string(),
            to_state: record.to_state.to_string(),
            reason: record.reason.clone(),
            transitioned_at: record.transitioned_at,
        }
    }
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Publish an event with the given name and context
    pub async fn publish(
        &self,
        event_name: impl Into<String>,
        context: Value,
    ) -> Result<(), PublishError> {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        // send() only fails when nobody is subscribed, which is not an error here
        if self.sender.send(event).is_err() {
            tracing::trace!("Event published with no subscribers");
        }
        Ok(())
    }

    /// Publish every transition in `records` under the entity kind's transition event name.
    pub async fn publish_transitions<S: LifecycleState>(
        &self,
        records: &[TransitionRecord<S>],
    ) -> Result<(), PublishError> {
        for record in records {
            let payload = serde_json::to_value(TransitionEvent::from(record))?;
            self.publish(super::transition_event_name(S::ENTITY_KIND), payload)
                .await?;
        }
        Ok(())
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::from_config(&EventsConfig::default())
    }
}
