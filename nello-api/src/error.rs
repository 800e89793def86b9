//! Error types for the nello-api crate.

/// Errors from talking to the nello service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client ID or secret missing when constructing the auth client
    #[error("No client ID / client secret provided")]
    MissingCredentials,

    /// The transport layer failed (DNS, TLS, connect, timeout)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status or `result.success != true`
    #[error("Remote call failed ({status}): {message}")]
    RemoteCallFailed {
        /// HTTP status code, or 200 for an unsuccessful envelope
        status: u16,
        /// Message from the envelope or status line
        message: String,
    },

    /// The response body was not the documented envelope shape
    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),

    /// A requested location or time window is absent from the listing
    #[error("Not found: {0}")]
    NotFound(String),

    /// A time-window calendar could not be parsed
    #[error(transparent)]
    Calendar(#[from] nello_ical::IcalError),
}

/// Convenience type alias for Results using ApiError.
pub type Result<T> = std::result::Result<T, ApiError>;
