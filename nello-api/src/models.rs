//! Data shapes returned by the nello.io API.

use nello_ical::TimeWindowDescriptor;
use serde::{Deserialize, Deserializer, Serialize};

/// A nello location (one door/intercom installation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInfo {
    /// Unique identifier of the location
    pub location_id: String,
    /// Postal address of the location
    #[serde(default)]
    pub address: Option<Address>,
}

/// Postal address attached to a location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

/// A time window as returned by a listing, with its calendar enriched
/// into a [`TimeWindowDescriptor`].
#[derive(Debug, Clone)]
pub struct TimeWindowInfo {
    /// Identifier, unique within the location
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Whether the window is enabled
    pub enabled: Option<bool>,
    /// Current state reported by the service
    pub state: Option<bool>,
    /// Parsed calendar, original ICS text retained inside
    pub ical: TimeWindowDescriptor,
}

/// Wire form of a time window: the calendar is still a bare ICS string.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTimeWindow {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub state: Option<bool>,
    pub ical: String,
}

/// The API has served time-window IDs both as numbers and as strings;
/// accept either.
fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// The nello response envelope: business success under `result`, payload
/// under `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub result: EnvelopeResult,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
