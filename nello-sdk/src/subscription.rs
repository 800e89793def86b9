//! Webhook registration lifecycle.
//!
//! The manager ties the three lower layers together: it records webhook
//! URLs with the nello service, optionally binds a local listener for
//! deliveries, and wires accepted events into the shared [`EventRouter`].
//! One registration exists per location at a time; registering again
//! replaces it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

use nello_api::WebhookApi;
use webhook_server::{
    EventRouter, ListenerHandle, LocationId, ServerConfig, ServerError, Transport, WebhookServer,
};

use crate::config::WebhookConfig;
use crate::error::SdkError;

/// The state a registration ended up in.
///
/// A registration is never rolled back halfway: once the service has
/// accepted the URL the remote side stays registered, and a listener that
/// failed to bind afterwards is reported rather than papered over.
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// Remote registration succeeded and a local listener is serving
    Active {
        /// The URL registered with the service
        url: String,
        /// The port the listener is bound on
        port: u16,
    },
    /// Remote registration succeeded; no listener was requested
    RemoteOnly {
        /// The URL registered with the service
        url: String,
    },
    /// Remote registration succeeded but the local listener could not bind.
    ///
    /// The service will deliver to a URL nothing local is serving; callers
    /// decide whether to retry the bind or deregister.
    PartiallyActive {
        /// The URL registered with the service
        url: String,
        /// Why the bind failed
        bind_error: ServerError,
    },
}

/// One location's webhook registration as this process knows it.
pub struct WebhookRegistration {
    location_id: LocationId,
    external_url: String,
    subscribed_actions: Vec<String>,
    listener: Option<ListenerHandle>,
}

impl WebhookRegistration {
    /// The location this registration belongs to.
    pub fn location_id(&self) -> &LocationId {
        &self.location_id
    }

    /// The URL the service was told to deliver to.
    pub fn external_url(&self) -> &str {
        &self.external_url
    }

    /// The actions the service was asked to deliver.
    pub fn subscribed_actions(&self) -> &[String] {
        &self.subscribed_actions
    }

    /// Whether a local listener is serving this registration.
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .map(|handle| !handle.is_stopped())
            .unwrap_or(false)
    }

    /// The port of the local listener, when one is serving.
    pub fn listener_port(&self) -> Option<u16> {
        self.listener
            .as_ref()
            .filter(|handle| !handle.is_stopped())
            .map(ListenerHandle::port)
    }
}

/// Where the webhook URL points, as the listener needs to see it.
struct Endpoint {
    external: String,
    port: u16,
    path: String,
}

/// Manages webhook registrations across locations.
///
/// Clones share the same registration table and router.
#[derive(Clone)]
pub struct SubscriptionManager {
    api: Arc<dyn WebhookApi>,
    router: Arc<EventRouter>,
    registrations: Arc<RwLock<HashMap<LocationId, WebhookRegistration>>>,
}

impl SubscriptionManager {
    /// Create a manager over an API handle and a router.
    pub fn new(api: Arc<dyn WebhookApi>, router: Arc<EventRouter>) -> Self {
        Self {
            api,
            router,
            registrations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The router accepted events are published through.
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    /// Register a webhook for a location.
    ///
    /// The steps run in a fixed order so that failures happen as early as
    /// possible: TLS material is resolved first (reading any files), the
    /// URL is parsed, and a port already owned by another location's
    /// listener is rejected, all before the service is contacted. Only
    /// then is the URL recorded remotely, and only after that is a local
    /// listener bound when `listen` is set. A previous registration for
    /// the same location is replaced, its listener stopped.
    ///
    /// # Errors
    ///
    /// - [`SdkError::Server`] when the TLS configuration is incomplete or
    ///   its files cannot be read
    /// - [`SdkError::InvalidWebhookUrl`] when the URL does not parse
    /// - [`SdkError::ListenerConflict`] when another location's listener
    ///   owns the port
    /// - [`SdkError::Api`] when the service rejects the registration
    ///
    /// A bind failure after the service accepted the URL is not an error:
    /// it is returned as [`RegistrationOutcome::PartiallyActive`].
    pub async fn register(
        &self,
        location: &LocationId,
        config: WebhookConfig,
    ) -> Result<RegistrationOutcome, SdkError> {
        let transport = Transport::select(config.ssl.as_ref())?;
        let endpoint = resolve_endpoint(&config.url, transport.is_secure())?;

        if config.listen {
            let registrations = self.registrations.read().await;
            for (other, registration) in registrations.iter() {
                if other != location && registration.listener_port() == Some(endpoint.port) {
                    return Err(SdkError::ListenerConflict {
                        port: endpoint.port,
                        location: other.to_string(),
                    });
                }
            }
        }

        self.api
            .register_webhook(location.as_str(), &endpoint.external, &config.actions)
            .await?;
        info!(location = %location, url = %endpoint.external, "webhook registered");

        // Replace any previous registration for this location, releasing
        // its listener so the port can be reused.
        if let Some(mut previous) = self.registrations.write().await.remove(location) {
            if let Some(handle) = previous.listener.as_mut() {
                handle.stop().await;
            }
        }

        let (listener, outcome) = if config.listen {
            let server_config = ServerConfig {
                bind_path: endpoint.path.clone(),
                port: endpoint.port,
                allowed_methods: config.methods.clone(),
                transport,
            };

            match WebhookServer::start(server_config, location.clone(), self.router.clone()).await
            {
                Ok(handle) => {
                    let port = handle.port();
                    (
                        Some(handle),
                        RegistrationOutcome::Active {
                            url: endpoint.external.clone(),
                            port,
                        },
                    )
                }
                Err(bind_error) => {
                    warn!(
                        location = %location,
                        error = %bind_error,
                        "webhook registered remotely but the local listener failed to bind"
                    );
                    (
                        None,
                        RegistrationOutcome::PartiallyActive {
                            url: endpoint.external.clone(),
                            bind_error,
                        },
                    )
                }
            }
        } else {
            (
                None,
                RegistrationOutcome::RemoteOnly {
                    url: endpoint.external.clone(),
                },
            )
        };

        self.registrations.write().await.insert(
            location.clone(),
            WebhookRegistration {
                location_id: location.clone(),
                external_url: endpoint.external,
                subscribed_actions: config.actions,
                listener,
            },
        );

        Ok(outcome)
    }

    /// Remove the webhook registration for a location.
    ///
    /// The local listener is stopped whether or not the service call
    /// succeeds, so the socket is always released. A remote failure is
    /// propagated after that. Returns whether a registration existed in
    /// this process.
    pub async fn deregister(&self, location: &LocationId) -> Result<bool, SdkError> {
        let existing = self.registrations.write().await.remove(location);
        let existed = existing.is_some();

        if let Some(mut registration) = existing {
            if let Some(handle) = registration.listener.as_mut() {
                handle.stop().await;
            }
        }

        self.api.remove_webhook(location.as_str()).await?;
        info!(location = %location, "webhook deregistered");
        Ok(existed)
    }

    /// Whether a location currently has a live local listener.
    pub async fn is_listening(&self, location: &LocationId) -> bool {
        self.registrations
            .read()
            .await
            .get(location)
            .map(WebhookRegistration::is_listening)
            .unwrap_or(false)
    }

    /// Stop every local listener without touching remote registrations.
    pub async fn shutdown_all(&self) {
        let mut registrations = self.registrations.write().await;
        for registration in registrations.values_mut() {
            if let Some(handle) = registration.listener.as_mut() {
                handle.stop().await;
            }
        }
        registrations.clear();
    }
}

/// Parse the external URL and derive what the listener needs from it.
///
/// A URL without a scheme gets one matching the transport, mirroring how
/// the service expects registered URLs to look.
fn resolve_endpoint(raw: &str, secure: bool) -> Result<Endpoint, SdkError> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else if secure {
        format!("https://{raw}")
    } else {
        format!("http://{raw}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|err| SdkError::InvalidWebhookUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(SdkError::InvalidWebhookUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {:?}", parsed.scheme()),
        });
    }

    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| SdkError::InvalidWebhookUrl {
            url: raw.to_string(),
            reason: "no port and no default for scheme".to_string(),
        })?;

    let path = if parsed.path().is_empty() {
        "/".to_string()
    } else {
        parsed.path().to_string()
    };

    Ok(Endpoint {
        external: parsed.to_string(),
        port,
        path,
    })
}
