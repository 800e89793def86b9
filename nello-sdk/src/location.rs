//! Per-location handle.

use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use nello_api::{LocationInfo, NelloClient, TimeWindowInfo};
use webhook_server::{InboundEvent, LocationId, Scope};

use crate::config::WebhookConfig;
use crate::error::SdkError;
use crate::subscription::{RegistrationOutcome, SubscriptionManager};

/// One nello location: a door, its time windows and its webhook.
///
/// The handle composes the REST client and the subscription manager; it
/// holds no state of its own beyond the ID, so it is cheap to clone and
/// safe to recreate at any time.
#[derive(Clone)]
pub struct Location {
    id: LocationId,
    info: Option<LocationInfo>,
    client: NelloClient,
    manager: SubscriptionManager,
}

impl Location {
    pub(crate) fn new(id: String, client: NelloClient, manager: SubscriptionManager) -> Self {
        Self {
            id: LocationId::new(id),
            info: None,
            client,
            manager,
        }
    }

    pub(crate) fn with_info(
        info: LocationInfo,
        client: NelloClient,
        manager: SubscriptionManager,
    ) -> Self {
        Self {
            id: LocationId::new(info.location_id.clone()),
            info: Some(info),
            client,
            manager,
        }
    }

    /// The location's ID.
    pub fn id(&self) -> &LocationId {
        &self.id
    }

    /// The address and metadata from the listing, when fetched that way.
    pub fn info(&self) -> Option<&LocationInfo> {
        self.info.as_ref()
    }

    /// Open the door.
    pub async fn open_door(&self) -> Result<(), SdkError> {
        self.client.open_door(self.id.as_str()).await?;
        Ok(())
    }

    /// List the time windows of this location, calendars parsed.
    pub async fn time_windows(&self) -> Result<Vec<TimeWindowInfo>, SdkError> {
        Ok(self.client.time_windows(self.id.as_str()).await?)
    }

    /// Fetch one time window by ID.
    pub async fn time_window(&self, tw_id: &str) -> Result<TimeWindowInfo, SdkError> {
        Ok(self.client.time_window(self.id.as_str(), tw_id).await?)
    }

    /// Create a time window from ICS text.
    pub async fn add_time_window(
        &self,
        name: &str,
        ical: &str,
    ) -> Result<TimeWindowInfo, SdkError> {
        Ok(self
            .client
            .create_time_window(self.id.as_str(), name, ical)
            .await?)
    }

    /// Delete one time window.
    pub async fn remove_time_window(&self, tw_id: &str) -> Result<(), SdkError> {
        self.client
            .delete_time_window(self.id.as_str(), tw_id)
            .await?;
        Ok(())
    }

    /// Delete every time window of this location.
    pub async fn remove_all_time_windows(&self) -> Result<(), SdkError> {
        for tw in self.time_windows().await? {
            self.remove_time_window(&tw.id).await?;
        }
        Ok(())
    }

    /// Register a webhook for this location, optionally binding a local
    /// listener for it.
    ///
    /// See [`SubscriptionManager::register`] for the ordering and error
    /// semantics.
    pub async fn listen(&self, config: WebhookConfig) -> Result<RegistrationOutcome, SdkError> {
        self.manager.register(&self.id, config).await
    }

    /// Remove the webhook registration, stopping any local listener.
    ///
    /// Returns whether this process held a registration for the location.
    pub async fn unlisten(&self) -> Result<bool, SdkError> {
        self.manager.deregister(&self.id).await
    }

    /// Whether a local listener is currently serving this location.
    pub async fn is_listening(&self) -> bool {
        self.manager.is_listening(&self.id).await
    }

    /// Subscribe to every accepted webhook event for this location.
    pub async fn events(&self) -> UnboundedReceiver<InboundEvent> {
        self.manager
            .router()
            .subscribe_webhook(Scope::Location(self.id.clone()))
            .await
    }

    /// Subscribe to one action on this location.
    pub async fn action_events(&self, action: impl Into<String>) -> UnboundedReceiver<Value> {
        self.manager
            .router()
            .subscribe_action(Scope::Location(self.id.clone()), action)
            .await
    }
}
