//! Top-level connection handle.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use nello_api::{AccessToken, NelloClient};
use webhook_server::{EventRouter, InboundEvent, Scope};

use crate::error::SdkError;
use crate::location::Location;
use crate::subscription::SubscriptionManager;

/// A connection to the nello service.
///
/// Owns the REST client, the event router and the webhook subscription
/// manager. [`Location`] handles borrow all three, so a `Nello` can be
/// created once and handed around cheaply via [`Nello::location`].
#[derive(Clone)]
pub struct Nello {
    client: NelloClient,
    manager: SubscriptionManager,
}

impl Nello {
    /// Connect with an already-retrieved access token.
    pub fn connect(token: AccessToken) -> Self {
        Self::from_client(NelloClient::new(token))
    }

    /// Build a connection over an existing client (tests, custom base URLs).
    pub fn from_client(client: NelloClient) -> Self {
        let router = Arc::new(EventRouter::new());
        let manager = SubscriptionManager::new(Arc::new(client.clone()), router);
        Self { client, manager }
    }

    /// A handle for one location, by ID.
    ///
    /// No request is made; the ID is not checked against the service
    /// until the handle is used.
    pub fn location(&self, id: impl Into<String>) -> Location {
        Location::new(id.into(), self.client.clone(), self.manager.clone())
    }

    /// Fetch every location visible to this token, as handles.
    pub async fn locations(&self) -> Result<Vec<Location>, SdkError> {
        let infos = self.client.locations().await?;
        Ok(infos
            .into_iter()
            .map(|info| {
                Location::with_info(info, self.client.clone(), self.manager.clone())
            })
            .collect())
    }

    /// Subscribe to every accepted webhook event, regardless of location.
    pub async fn events(&self) -> UnboundedReceiver<InboundEvent> {
        self.manager
            .router()
            .subscribe_webhook(Scope::Connection)
            .await
    }

    /// Subscribe to one action across all locations.
    pub async fn action_events(&self, action: impl Into<String>) -> UnboundedReceiver<Value> {
        self.manager
            .router()
            .subscribe_action(Scope::Connection, action)
            .await
    }

    /// The router webhook events are published through.
    pub fn router(&self) -> &Arc<EventRouter> {
        self.manager.router()
    }

    /// The subscription manager shared by all location handles.
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.manager
    }

    /// Stop every local webhook listener.
    ///
    /// Remote registrations are left in place; use
    /// [`Location::unlisten`] to remove one from the service too.
    pub async fn shutdown(&self) {
        self.manager.shutdown_all().await;
    }
}
