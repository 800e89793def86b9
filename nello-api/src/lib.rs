//! # nello-api
//!
//! Typed client for the nello.io public API.
//!
//! Covers the OAuth client-credentials token exchange and the REST
//! resources the SDK consumes: locations, door opening, time windows and
//! webhook registration. Responses arrive in the nello envelope
//! (`result.success` plus a `data` payload); this crate unwraps that
//! envelope and maps business failures into [`ApiError`].

mod auth;
mod client;
mod error;
mod models;

pub use auth::{AccessToken, Auth, DEFAULT_TOKEN_URL};
pub use client::{NelloClient, WebhookApi, DEFAULT_BASE_URL};
pub use error::{ApiError, Result};
pub use models::{Address, LocationInfo, TimeWindowInfo};
