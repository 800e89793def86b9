//! OAuth client-credentials token exchange.

use serde::Deserialize;

use crate::error::{ApiError, Result};

/// Default token endpoint of the nello auth service.
pub const DEFAULT_TOKEN_URL: &str = "https://auth.nello.io/oauth/token/";

/// A bearer token retrieved from the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    /// Token type, normally `Bearer`
    pub token_type: String,
    /// The access token itself
    pub access_token: String,
}

impl AccessToken {
    /// Construct a token from parts already at hand (the legacy
    /// `tokenType`/`tokenAccess` configuration form).
    pub fn new(token_type: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            token_type: token_type.into(),
            access_token: access_token.into(),
        }
    }

    /// The value for an `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Client-credentials authentication against the nello auth service.
#[derive(Debug)]
pub struct Auth {
    client_id: String,
    client_secret: String,
    token_url: String,
    http: reqwest::Client,
}

impl Auth {
    /// Create an auth client for the given credentials.
    ///
    /// # Errors
    ///
    /// [`ApiError::MissingCredentials`] when either value is empty.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(ApiError::MissingCredentials);
        }

        Ok(Self {
            client_id,
            client_secret,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// Point the client at a different token endpoint (tests).
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Retrieve a new token via the client-credentials grant.
    ///
    /// Sends the form-encoded body
    /// `grant_type=client_credentials&client_id=...&client_secret=...`.
    pub async fn retrieve_token(&self) -> Result<AccessToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::RemoteCallFailed {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<AccessToken>()
            .await
            .map_err(|err| ApiError::MalformedEnvelope(err.to_string()))
    }
}
