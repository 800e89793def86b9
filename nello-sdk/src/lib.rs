//! # nello-sdk
//!
//! Client SDK for the nello.io smart intercom service.
//!
//! ```rust,no_run
//! use nello_sdk::{Auth, Nello, WebhookConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nello_sdk::SdkError> {
//!     let auth = Auth::new("client-id", "client-secret")?;
//!     let nello = Nello::connect(auth.retrieve_token().await?);
//!
//!     let location = nello.location("L1");
//!     location.open_door().await?;
//!
//!     // Listen for push events on this location.
//!     let mut denies = location.action_events("deny").await;
//!     let config = WebhookConfig::new("http://example.com:8080/hook").listen(true);
//!     location.listen(config).await?;
//!
//!     while let Some(payload) = denies.recv().await {
//!         println!("entry denied: {payload}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! nello-sdk        (Nello / Location handles, subscription manager)
//!     ↓
//! nello-api        (REST + OAuth against the nello service)
//! webhook-server   (local HTTP/HTTPS listener + event router)
//! nello-ical       (time-window calendar parsing)
//! ```

mod config;
mod error;
mod location;
mod nello;
mod subscription;

pub use config::WebhookConfig;
pub use error::SdkError;
pub use location::Location;
pub use nello::Nello;
pub use subscription::{RegistrationOutcome, SubscriptionManager, WebhookRegistration};

pub use nello_api::{AccessToken, ApiError, Auth, LocationInfo, NelloClient, TimeWindowInfo, WebhookApi};
pub use nello_ical::TimeWindowDescriptor;
pub use webhook_server::{EventRouter, InboundEvent, LocationId, Scope, TlsConfig, TlsItem};
