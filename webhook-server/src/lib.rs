//! # webhook-server
//!
//! Local HTTP/HTTPS listener for nello webhook push notifications.
//!
//! The nello service delivers door events by POSTing JSON bodies of the
//! shape `{"action": "...", "data": {...}}` to a URL registered for a
//! location. This crate owns everything on the receiving side of that
//! contract: transport selection (plain vs. TLS), the bound listener
//! itself, and the router that fans accepted events out to subscribers.

mod error;
mod router;
mod server;
mod tls;

pub use error::{Result, ServerError};
pub use router::{EventRouter, InboundEvent, LocationId, Scope};
pub use server::{ListenerHandle, ServerConfig, WebhookServer};
pub use tls::{TlsBundle, TlsConfig, TlsItem, Transport};
