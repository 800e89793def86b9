//! Error type for the top-level SDK.

/// Errors surfaced by the SDK facade.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// The nello service or the auth endpoint failed
    #[error(transparent)]
    Api(#[from] nello_api::ApiError),

    /// A time-window calendar could not be parsed
    #[error(transparent)]
    Calendar(#[from] nello_ical::IcalError),

    /// The webhook listener could not be configured or bound
    #[error(transparent)]
    Server(#[from] webhook_server::ServerError),

    /// The external webhook URL could not be parsed
    #[error("Invalid webhook URL {url:?}: {reason}")]
    InvalidWebhookUrl {
        /// The URL as supplied
        url: String,
        /// Why parsing failed
        reason: String,
    },

    /// Another location in this process already owns a listener on the port
    #[error("Port {port} is already owned by the listener for location {location}")]
    ListenerConflict {
        /// The contested port
        port: u16,
        /// The location holding it
        location: String,
    },
}
