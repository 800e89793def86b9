//! HTTP server for receiving nello webhook notifications.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::Filter;

use crate::error::{Result, ServerError};
use crate::router::{EventRouter, InboundEvent, LocationId};
use crate::tls::Transport;

/// Upper bound on buffered request bodies. Webhook payloads are small
/// JSON objects; anything near this size is not a legitimate delivery.
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Configuration for one webhook listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path the webhook is served on; requests elsewhere are not handled
    pub bind_path: String,
    /// Port to bind
    pub port: u16,
    /// HTTP methods accepted on the webhook path
    pub allowed_methods: Vec<String>,
    /// Plain or TLS transport, resolved ahead of time
    pub transport: Transport,
}

impl ServerConfig {
    /// Create a configuration with the default allowed methods.
    pub fn new(bind_path: impl Into<String>, port: u16, transport: Transport) -> Self {
        Self {
            bind_path: bind_path.into(),
            port,
            allowed_methods: Self::default_methods(),
            transport,
        }
    }

    /// The methods the nello service is documented to use.
    pub fn default_methods() -> Vec<String> {
        ["GET", "POST", "PUT", "DELETE"]
            .iter()
            .map(|m| m.to_string())
            .collect()
    }
}

/// Ownership of a bound webhook listener.
///
/// Holding the handle keeps the socket alive; [`ListenerHandle::stop`]
/// releases it gracefully, letting in-flight requests finish. Stopping an
/// already-stopped handle is a no-op.
pub struct ListenerHandle {
    port: u16,
    path: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ListenerHandle {
    /// The port the listener is bound on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The normalised path the webhook is served on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the listener has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.shutdown_tx.is_none()
    }

    /// Release the socket and wait for the server task to finish.
    ///
    /// In-flight requests are allowed to complete. Safe to call any
    /// number of times.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Per-request state shared with the warp filter chain.
struct Shared {
    path: String,
    methods: Vec<String>,
    location: LocationId,
    router: Arc<EventRouter>,
}

/// The webhook listener itself.
///
/// `start` binds exactly one socket and serves the configured path until
/// the returned [`ListenerHandle`] is stopped.
pub struct WebhookServer;

impl WebhookServer {
    /// Bind a listener and start serving webhook requests.
    ///
    /// Requests whose path does not match the configured one receive a
    /// 404 with no event emitted. Matching requests with a method outside
    /// `allowed_methods` receive a 403 and their body is never parsed.
    /// For allowed requests the body is buffered in full and parsed as
    /// JSON; parse failures are acknowledged with a 200 (the service has
    /// no retry semantics to signal into) and logged, with no event
    /// emitted. A request without a body is handled like any other (its
    /// empty body simply fails the JSON parse); a body over the size cap
    /// is answered 413. A parsed body emits exactly one [`InboundEvent`]
    /// through the router.
    ///
    /// # Errors
    ///
    /// [`ServerError::BindFailed`] when the port cannot be bound.
    pub async fn start(
        config: ServerConfig,
        location: LocationId,
        router: Arc<EventRouter>,
    ) -> Result<ListenerHandle> {
        let port = config.port;
        let path = normalize_path(&config.bind_path);

        // Claim the port eagerly so a conflict surfaces as an error here
        // instead of a panic inside the server task.
        Self::probe_port(port)?;

        let shared = Arc::new(Shared {
            path: path.clone(),
            methods: config
                .allowed_methods
                .iter()
                .map(|m| m.to_ascii_uppercase())
                .collect(),
            location,
            router,
        });

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (ready_tx, mut ready_rx) = mpsc::channel::<()>(1);
        let transport = config.transport;

        let task = tokio::spawn(async move {
            let with_shared = {
                let shared = shared.clone();
                warp::any().map(move || shared.clone())
            };

            let routes = warp::method()
                .and(warp::path::full())
                .and(warp::header::optional::<u64>("content-length"))
                .and(warp::body::bytes())
                .and(with_shared)
                .and_then(handle_request)
                .recover(handle_rejection);

            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port);
            let shutdown = async move {
                shutdown_rx.recv().await;
            };

            match transport {
                Transport::Plain => {
                    let (bound, server) =
                        warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown);
                    info!(address = %bound, "webhook listener bound");
                    let _ = ready_tx.send(()).await;
                    server.await;
                }
                Transport::Secure(bundle) => {
                    let mut tls = warp::serve(routes).tls().key(bundle.key).cert(bundle.cert);
                    if let Some(ca) = bundle.ca {
                        tls = tls.client_auth_optional(ca);
                    }
                    let (bound, server) = tls.bind_with_graceful_shutdown(addr, shutdown);
                    info!(address = %bound, "webhook listener bound (tls)");
                    let _ = ready_tx.send(()).await;
                    server.await;
                }
            }
        });

        if ready_rx.recv().await.is_none() {
            return Err(ServerError::BindFailed {
                port,
                reason: "listener task exited before binding".to_string(),
            });
        }

        Ok(ListenerHandle {
            port,
            path,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Check that the port can be bound at all.
    fn probe_port(port: u16) -> Result<()> {
        TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port))
            .map(drop)
            .map_err(|err| ServerError::BindFailed {
                port,
                reason: err.to_string(),
            })
    }
}

async fn handle_request(
    method: warp::http::Method,
    path: warp::path::FullPath,
    content_length: Option<u64>,
    body: Bytes,
    shared: Arc<Shared>,
) -> std::result::Result<warp::reply::WithStatus<&'static str>, warp::Rejection> {
    if normalize_path(path.as_str()) != shared.path {
        return Err(warp::reject::not_found());
    }

    if !shared.methods.iter().any(|m| m == method.as_str()) {
        warn!(method = %method, "rejected webhook request with disallowed method");
        return Ok(warp::reply::with_status("Forbidden", StatusCode::FORBIDDEN));
    }

    // A missing Content-Length is fine (bodiless requests are legitimate
    // deliveries); only an oversized body is turned away.
    if content_length.unwrap_or(0) > MAX_BODY_BYTES || body.len() as u64 > MAX_BODY_BYTES {
        warn!(bytes = body.len(), "rejected webhook request with oversized body");
        return Ok(warp::reply::with_status(
            "Payload Too Large",
            StatusCode::PAYLOAD_TOO_LARGE,
        ));
    }

    match serde_json::from_slice::<Value>(&body) {
        Err(err) => {
            // Acknowledge the delivery anyway: the service does not retry,
            // and a broken body must not take the listener down.
            warn!(location = %shared.location, error = %err, "discarding webhook body that is not valid JSON");
            Ok(warp::reply::with_status("", StatusCode::OK))
        }
        Ok(value) => {
            let action = value
                .get("action")
                .and_then(Value::as_str)
                .map(str::to_string);
            let data = value.get("data").cloned().unwrap_or(Value::Null);

            shared
                .router
                .publish(&shared.location, InboundEvent::new(action, data))
                .await;

            Ok(warp::reply::with_status("", StatusCode::OK))
        }
    }
}

/// Convert rejections into plain HTTP responses.
async fn handle_rejection(
    err: warp::Rejection,
) -> std::result::Result<impl warp::Reply, std::convert::Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    };

    Ok(warp::reply::with_status(message, code))
}

/// Normalise a request or configuration path for comparison: leading
/// slash required, trailing slashes ignored.
fn normalize_path(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}
