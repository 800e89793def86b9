//! REST client for the nello.io public API.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::AccessToken;
use crate::error::{ApiError, Result};
use crate::models::{Envelope, LocationInfo, RawTimeWindow, TimeWindowInfo};

/// Default base URL of the nello public API.
pub const DEFAULT_BASE_URL: &str = "https://public-api.nello.io/v1/";

/// The slice of the API the subscription layer needs: recording and
/// removing a webhook URL for a location.
///
/// Kept as a trait so the subscription manager can be exercised against a
/// recording mock instead of the live service.
#[async_trait]
pub trait WebhookApi: Send + Sync {
    /// Record `url` as the webhook endpoint for a location.
    async fn register_webhook(
        &self,
        location_id: &str,
        url: &str,
        actions: &[String],
    ) -> Result<()>;

    /// Remove the webhook registration for a location.
    async fn remove_webhook(&self, location_id: &str) -> Result<()>;
}

/// Authenticated client for the nello REST resources.
#[derive(Debug, Clone)]
pub struct NelloClient {
    http: reqwest::Client,
    base_url: String,
    token: AccessToken,
}

impl NelloClient {
    /// Create a client against the public API.
    pub fn new(token: AccessToken) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a client against a different base URL (tests, proxies).
    pub fn with_base_url(token: AccessToken, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    /// Send a request and unwrap the nello envelope.
    ///
    /// Non-2xx statuses and envelopes with `result.success != true` both
    /// map to [`ApiError::RemoteCallFailed`]; a body that is not the
    /// envelope shape at all is [`ApiError::MalformedEnvelope`].
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "nello api request");

        let mut request = self
            .http
            .request(method, &url)
            .header(reqwest::header::AUTHORIZATION, self.token.header_value());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::RemoteCallFailed {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|err| ApiError::MalformedEnvelope(err.to_string()))?;

        if !envelope.result.success {
            return Err(ApiError::RemoteCallFailed {
                status: status.as_u16(),
                message: envelope
                    .result
                    .message
                    .unwrap_or_else(|| "service reported failure".to_string()),
            });
        }

        Ok(envelope.data)
    }

    /// Like [`Self::request`], but the payload is mandatory.
    async fn expect_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        self.request(method, path, body).await?.ok_or_else(|| {
            ApiError::MalformedEnvelope("missing data payload".to_string())
        })
    }

    /// Fire a request where only envelope success matters.
    async fn command(&self, method: Method, path: &str, body: Option<&Value>) -> Result<()> {
        self.request::<Value>(method, path, body).await.map(drop)
    }

    /// List all locations visible to this token.
    pub async fn locations(&self) -> Result<Vec<LocationInfo>> {
        self.expect_data(Method::GET, "locations/", None).await
    }

    /// Open the door of a location.
    pub async fn open_door(&self, location_id: &str) -> Result<()> {
        self.command(
            Method::PUT,
            &format!("locations/{location_id}/open/"),
            None,
        )
        .await
    }

    /// List the time windows of a location.
    ///
    /// Each entry's ICS calendar is enriched into a
    /// [`nello_ical::TimeWindowDescriptor`]; a calendar that does not
    /// parse fails the whole listing rather than being silently dropped.
    pub async fn time_windows(&self, location_id: &str) -> Result<Vec<TimeWindowInfo>> {
        let raw: Vec<RawTimeWindow> = self
            .expect_data(Method::GET, &format!("locations/{location_id}/tw/"), None)
            .await?;

        raw.into_iter().map(enrich_time_window).collect()
    }

    /// Fetch a single time window from the listing.
    ///
    /// The API has no per-window GET, so this filters the listing and
    /// yields [`ApiError::NotFound`] when the ID is absent.
    pub async fn time_window(&self, location_id: &str, tw_id: &str) -> Result<TimeWindowInfo> {
        self.time_windows(location_id)
            .await?
            .into_iter()
            .find(|tw| tw.id == tw_id)
            .ok_or_else(|| ApiError::NotFound(format!("time window {tw_id}")))
    }

    /// Create a time window from ICS text.
    ///
    /// The calendar is validated locally before anything is sent, so a
    /// malformed one never reaches the service.
    pub async fn create_time_window(
        &self,
        location_id: &str,
        name: &str,
        ical: &str,
    ) -> Result<TimeWindowInfo> {
        nello_ical::parse(ical)?;

        let body = json!({"name": name, "ical": ical});
        let raw: RawTimeWindow = self
            .expect_data(
                Method::POST,
                &format!("locations/{location_id}/tw/"),
                Some(&body),
            )
            .await?;
        enrich_time_window(raw)
    }

    /// Delete a time window.
    pub async fn delete_time_window(&self, location_id: &str, tw_id: &str) -> Result<()> {
        self.command(
            Method::DELETE,
            &format!("locations/{location_id}/tw/{tw_id}/"),
            None,
        )
        .await
    }
}

#[async_trait]
impl WebhookApi for NelloClient {
    async fn register_webhook(
        &self,
        location_id: &str,
        url: &str,
        actions: &[String],
    ) -> Result<()> {
        let body = json!({"url": url, "actions": actions});
        self.command(
            Method::PUT,
            &format!("locations/{location_id}/webhook/"),
            Some(&body),
        )
        .await
    }

    async fn remove_webhook(&self, location_id: &str) -> Result<()> {
        self.command(
            Method::DELETE,
            &format!("locations/{location_id}/webhook/"),
            None,
        )
        .await
    }
}

fn enrich_time_window(raw: RawTimeWindow) -> Result<TimeWindowInfo> {
    Ok(TimeWindowInfo {
        id: raw.id,
        name: raw.name,
        enabled: raw.enabled,
        state: raw.state,
        ical: nello_ical::parse(&raw.ical)?,
    })
}
