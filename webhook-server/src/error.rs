//! Error types for the webhook-server crate.

use std::path::PathBuf;

/// Errors that can occur while configuring or running the listener.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// TLS was requested but the private key or certificate is missing
    #[error("Incomplete TLS configuration: {0}")]
    IncompleteTlsConfig(String),

    /// A key/cert/CA file path could not be read
    #[error("Failed to load certificate material from {path}: {source}")]
    CertificateLoad {
        /// The path that was supplied
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The listening socket could not be bound
    #[error("Failed to bind listener on port {port}: {reason}")]
    BindFailed {
        /// The requested port
        port: u16,
        /// Why binding failed
        reason: String,
    },
}

/// Convenience type alias for Results using ServerError.
pub type Result<T> = std::result::Result<T, ServerError>;
