//! Post-write events and the broadcast bus that carries them.
//!
//! The document store publishes a [`PostEvent`] after every successful
//! create or update. Subscribers (the index worker, telemetry) each get an
//! independent stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{ContentTree, PostId};

// ============================================================================
// Post Event
// ============================================================================

/// A post was durably written.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PostEvent {
    /// A post was created.
    Created {
        post_id: PostId,
        content: ContentTree,
    },
    /// A post was updated.
    Updated {
        post_id: PostId,
        content: ContentTree,
    },
}

impl PostEvent {
    pub fn created(post_id: impl Into<PostId>, content: ContentTree) -> Self {
        PostEvent::Created {
            post_id: post_id.into(),
            content,
        }
    }

    pub fn updated(post_id: impl Into<PostId>, content: ContentTree) -> Self {
        PostEvent::Updated {
            post_id: post_id.into(),
            content,
        }
    }

    pub fn post_id(&self) -> &PostId {
        match self {
            PostEvent::Created { post_id, .. } | PostEvent::Updated { post_id, .. } => post_id,
        }
    }

    pub fn content(&self) -> &ContentTree {
        match self {
            PostEvent::Created { content, .. } | PostEvent::Updated { content, .. } => content,
        }
    }

    /// Namespaced event type (e.g. `"post.created"`).
    pub fn event_type(&self) -> &'static str {
        match self {
            PostEvent::Created { .. } => "post.created",
            PostEvent::Updated { .. } => "post.updated",
        }
    }
}

/// Envelope adding identity and timing to a [`PostEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: PostEvent,
}

impl EventEnvelope {
    pub fn new(event: PostEvent) -> Self {
        Self {
            event_id: crate::uuid_utils::new_v7(),
            event_type: event.event_type().to_string(),
            occurred_at: Utc::now(),
            payload: event,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast-based bus distributing post events to multiple consumers.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Dropped silently when nobody is subscribed.
    pub fn emit(&self, event: PostEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            post_id = %envelope.payload.post_id(),
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to enveloped events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
