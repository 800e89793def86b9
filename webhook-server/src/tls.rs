//! Transport selection for the webhook listener.
//!
//! Whether the listener binds a TLS or plaintext server is decided up
//! front, before any remote registration happens: key and certificate
//! material is resolved (and file paths read) at selection time so that a
//! misconfigured listener never gets as far as a bind attempt.

use std::path::PathBuf;

use crate::error::{Result, ServerError};

/// One piece of TLS material, supplied either inline as PEM text or as a
/// path to read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsItem {
    /// PEM text supplied directly
    Inline(String),
    /// Path to a PEM file, read synchronously at selection time
    Path(PathBuf),
}

impl TlsItem {
    /// Classify a bare string the way the original nello client did: a
    /// value containing no `.` is treated as inline material, anything
    /// else as a file path.
    ///
    /// This heuristic exists only for configurations migrated from the
    /// legacy client; new callers should construct [`TlsItem::Inline`] or
    /// [`TlsItem::Path`] explicitly.
    pub fn guess(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.contains('.') {
            Self::Path(PathBuf::from(value))
        } else {
            Self::Inline(value)
        }
    }

    /// Resolve this item into PEM bytes, reading the file if needed.
    fn load(&self) -> Result<Vec<u8>> {
        match self {
            Self::Inline(pem) => Ok(pem.clone().into_bytes()),
            Self::Path(path) => std::fs::read(path).map_err(|source| {
                ServerError::CertificateLoad {
                    path: path.clone(),
                    source,
                }
            }),
        }
    }

    /// Whether the item is present but effectively empty.
    fn is_empty(&self) -> bool {
        match self {
            Self::Inline(pem) => pem.trim().is_empty(),
            Self::Path(path) => path.as_os_str().is_empty(),
        }
    }
}

/// TLS configuration for the webhook listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// Private key
    pub key: Option<TlsItem>,
    /// Certificate
    pub cert: Option<TlsItem>,
    /// Optional certificate authority bundle
    pub ca: Option<TlsItem>,
}

/// Resolved TLS material, ready to hand to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsBundle {
    /// Private key PEM bytes
    pub key: Vec<u8>,
    /// Certificate PEM bytes
    pub cert: Vec<u8>,
    /// CA bundle PEM bytes, when supplied
    pub ca: Option<Vec<u8>>,
}

/// The transport the listener will bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Plaintext HTTP
    Plain,
    /// HTTPS with the given material
    Secure(TlsBundle),
}

impl Transport {
    /// Decide the transport for an optional TLS configuration.
    ///
    /// No configuration selects [`Transport::Plain`]. A configuration must
    /// carry both a private key and a certificate (a CA bundle is
    /// optional); empty values count as missing. File paths are read here,
    /// so an unreadable file surfaces as [`ServerError::CertificateLoad`]
    /// before any listener is bound.
    pub fn select(ssl: Option<&TlsConfig>) -> Result<Self> {
        let Some(ssl) = ssl else {
            return Ok(Self::Plain);
        };

        let key = present(&ssl.key)
            .ok_or_else(|| ServerError::IncompleteTlsConfig("missing private key".to_string()))?;
        let cert = present(&ssl.cert)
            .ok_or_else(|| ServerError::IncompleteTlsConfig("missing certificate".to_string()))?;

        Ok(Self::Secure(TlsBundle {
            key: key.load()?,
            cert: cert.load()?,
            ca: present(&ssl.ca).map(|item| item.load()).transpose()?,
        }))
    }

    /// Whether this transport serves HTTPS.
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure(_))
    }
}

fn present(item: &Option<TlsItem>) -> Option<&TlsItem> {
    item.as_ref().filter(|item| !item.is_empty())
}
