//! Webhook registration configuration.

use webhook_server::{ServerConfig, TlsConfig};

/// Configuration for registering a webhook on a location.
///
/// Only the external URL is mandatory. By default the registration is
/// remote-only (`listen = false`), subscribes to all documented actions
/// and allows the methods the service is known to use.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// External URL the nello service should deliver to
    pub url: String,
    /// TLS material; absent means a plaintext listener
    pub ssl: Option<TlsConfig>,
    /// Actions to subscribe to
    pub actions: Vec<String>,
    /// Whether to also bind a local listener for the URL
    pub listen: bool,
    /// HTTP methods the listener accepts
    pub methods: Vec<String>,
}

impl WebhookConfig {
    /// Create a configuration with the documented defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ssl: None,
            actions: Self::default_actions(),
            listen: false,
            methods: ServerConfig::default_methods(),
        }
    }

    /// The actions the nello service documents: `swipe`, `geo`, `tw`, `deny`.
    pub fn default_actions() -> Vec<String> {
        ["swipe", "geo", "tw", "deny"]
            .iter()
            .map(|a| a.to_string())
            .collect()
    }

    /// Set the TLS material for a secure listener.
    pub fn ssl(mut self, ssl: TlsConfig) -> Self {
        self.ssl = Some(ssl);
        self
    }

    /// Replace the subscribed actions.
    pub fn actions(mut self, actions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether to bind a local listener after registering remotely.
    pub fn listen(mut self, listen: bool) -> Self {
        self.listen = listen;
        self
    }

    /// Replace the allowed HTTP methods.
    pub fn methods(mut self, methods: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }
}
