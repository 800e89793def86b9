//! Fan-out of accepted webhook events to subscribers.
//!
//! Every accepted event is published on two scopes (the originating
//! location and the connection as a whole), each under two topics: the
//! generic webhook stream carrying the full event, and a stream named
//! after the event's action carrying only its `data` payload. There is no
//! ambient emitter; components hold a router instance and subscribe on
//! the scope they care about.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use tracing::debug;

/// Unique identifier for a nello location.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct LocationId(pub String);

impl LocationId {
    /// Create a new location ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the location ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LocationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The scope an event is published on.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum Scope {
    /// The whole connection, regardless of originating location
    Connection,
    /// A single location
    Location(LocationId),
}

/// One webhook notification as received from the nello service.
///
/// `action` is an open string rather than a closed enum: the service may
/// introduce new actions at any time, and a body without an action field
/// is still delivered on the generic topic. The timestamp is assigned on
/// ingestion, never taken from the payload.
#[derive(Debug, Clone, Serialize)]
pub struct InboundEvent {
    /// The action named by the notification (`swipe`, `geo`, `tw`, `deny`, ...)
    pub action: Option<String>,
    /// Free-form payload whose shape depends on the action
    pub data: Value,
    /// When this event was accepted by the listener
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// Create an event stamped with the current time.
    pub fn new(action: Option<String>, data: Value) -> Self {
        Self {
            action,
            data,
            received_at: Utc::now(),
        }
    }
}

#[derive(Default)]
struct Subscribers {
    /// Generic webhook streams, per scope
    webhook: HashMap<Scope, Vec<UnboundedSender<InboundEvent>>>,
    /// Per-action streams, per (scope, action)
    actions: HashMap<(Scope, String), Vec<UnboundedSender<Value>>>,
}

/// Typed publish/subscribe router for inbound webhook events.
///
/// Subscribers on the same topic are delivered to in insertion order; a
/// subscriber whose receiver has gone away is skipped and pruned without
/// affecting the others. Events published on a topic with no subscribers
/// are discarded.
#[derive(Clone, Default)]
pub struct EventRouter {
    subscribers: Arc<RwLock<Subscribers>>,
}

impl EventRouter {
    /// Create a new router with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the generic webhook stream on a scope.
    ///
    /// The receiver yields the full [`InboundEvent`] for every accepted
    /// notification on that scope.
    pub async fn subscribe_webhook(&self, scope: Scope) -> UnboundedReceiver<InboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subs = self.subscribers.write().await;
        subs.webhook.entry(scope).or_default().push(tx);
        rx
    }

    /// Subscribe to a specific action on a scope.
    ///
    /// The receiver yields only the `data` payload of matching events.
    pub async fn subscribe_action(
        &self,
        scope: Scope,
        action: impl Into<String>,
    ) -> UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subs = self.subscribers.write().await;
        subs.actions
            .entry((scope, action.into()))
            .or_default()
            .push(tx);
        rx
    }

    /// Publish an accepted event for a location.
    ///
    /// The event goes out on the location scope and the connection scope,
    /// first to the generic webhook subscribers (full event) and then to
    /// the subscribers of the event's action (payload only). A body
    /// without an action has no action topic to name and is delivered on
    /// the generic streams alone.
    pub async fn publish(&self, location: &LocationId, event: InboundEvent) {
        let mut subs = self.subscribers.write().await;

        for scope in [Scope::Location(location.clone()), Scope::Connection] {
            if let Some(senders) = subs.webhook.get_mut(&scope) {
                senders.retain(|tx| tx.send(event.clone()).is_ok());
            }

            if let Some(action) = &event.action {
                if let Some(senders) = subs.actions.get_mut(&(scope, action.clone())) {
                    senders.retain(|tx| tx.send(event.data.clone()).is_ok());
                }
            }
        }

        debug!(location = %location, action = ?event.action, "published inbound event");
    }
}
