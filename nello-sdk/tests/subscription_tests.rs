//! End-to-end tests for the webhook registration lifecycle, using a
//! recording mock in place of the nello service.

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use nello_sdk::{
    EventRouter, LocationId, RegistrationOutcome, Scope, SdkError, SubscriptionManager, TlsConfig,
    TlsItem, WebhookConfig,
};
use webhook_server::ServerError;

/// Records webhook registrations and can be told to fail.
struct MockApi {
    calls: Mutex<Vec<String>>,
    fail_register: bool,
    fail_remove: bool,
}

impl MockApi {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_register: false,
            fail_remove: false,
        }
    }

    fn failing_remove() -> Self {
        Self {
            fail_remove: true,
            ..Self::new()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl nello_sdk::WebhookApi for MockApi {
    async fn register_webhook(
        &self,
        location_id: &str,
        url: &str,
        actions: &[String],
    ) -> nello_api::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("register {location_id} {url} {}", actions.join(",")));
        if self.fail_register {
            return Err(nello_api::ApiError::RemoteCallFailed {
                status: 400,
                message: "rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn remove_webhook(&self, location_id: &str) -> nello_api::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("remove {location_id}"));
        if self.fail_remove {
            return Err(nello_api::ApiError::RemoteCallFailed {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(())
    }
}

fn manager_with(api: MockApi) -> (SubscriptionManager, Arc<MockApi>) {
    let api = Arc::new(api);
    let manager = SubscriptionManager::new(api.clone(), Arc::new(EventRouter::new()));
    (manager, api)
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn registered_listener_delivers_on_both_scopes() {
    let (manager, api) = manager_with(MockApi::new());
    let location = LocationId::new("L1");
    let port = free_port();

    let mut loc_denies = manager
        .router()
        .subscribe_action(Scope::Location(location.clone()), "deny")
        .await;
    let mut conn_denies = manager
        .router()
        .subscribe_action(Scope::Connection, "deny")
        .await;

    let config = WebhookConfig::new(format!("http://127.0.0.1:{port}/hook")).listen(true);
    let outcome = manager.register(&location, config).await.unwrap();

    match outcome {
        RegistrationOutcome::Active { port: bound, .. } => assert_eq!(bound, port),
        other => panic!("expected Active, got {other:?}"),
    }
    assert_eq!(
        api.calls(),
        vec![format!(
            "register L1 http://127.0.0.1:{port}/hook swipe,geo,tw,deny"
        )]
    );

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/hook"))
        .json(&json!({"action": "deny", "data": {"location_id": "L1"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let payload = tokio::time::timeout(Duration::from_secs(2), loc_denies.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payload, json!({"location_id": "L1"}));
    assert_eq!(
        tokio::time::timeout(Duration::from_secs(2), conn_denies.recv())
            .await
            .unwrap()
            .unwrap(),
        json!({"location_id": "L1"})
    );

    // Exactly one delivery each.
    assert!(loc_denies.try_recv().is_err());
    assert!(conn_denies.try_recv().is_err());

    manager.shutdown_all().await;
}

#[tokio::test]
async fn incomplete_tls_fails_before_the_service_is_contacted() {
    let (manager, api) = manager_with(MockApi::new());
    let location = LocationId::new("L1");

    let ssl = TlsConfig {
        key: Some(TlsItem::Inline(String::new())),
        cert: Some(TlsItem::Inline(String::new())),
        ca: None,
    };
    let config = WebhookConfig::new("https://example.com:8443/hook")
        .ssl(ssl)
        .listen(true);

    let err = manager.register(&location, config).await.unwrap_err();
    assert!(matches!(
        err,
        SdkError::Server(ServerError::IncompleteTlsConfig(_))
    ));
    assert!(api.calls().is_empty());
    assert!(!manager.is_listening(&location).await);
}

#[tokio::test]
async fn occupied_port_yields_partially_active() {
    let (manager, api) = manager_with(MockApi::new());
    let location = LocationId::new("L1");

    // Hold the port from outside the manager.
    let holder = TcpListener::bind("0.0.0.0:0").unwrap();
    let port = holder.local_addr().unwrap().port();

    let config = WebhookConfig::new(format!("http://127.0.0.1:{port}/hook")).listen(true);
    match manager.register(&location, config).await.unwrap() {
        RegistrationOutcome::PartiallyActive { bind_error, .. } => {
            assert!(matches!(bind_error, ServerError::BindFailed { .. }));
        }
        other => panic!("expected PartiallyActive, got {other:?}"),
    }

    // The service was still told about the URL.
    assert_eq!(api.calls().len(), 1);
    assert!(!manager.is_listening(&location).await);
    drop(holder);
}

#[tokio::test]
async fn deregister_stops_the_listener_even_when_the_service_fails() {
    let (manager, _api) = manager_with(MockApi::failing_remove());
    let location = LocationId::new("L1");
    let port = free_port();

    let config = WebhookConfig::new(format!("http://127.0.0.1:{port}/hook")).listen(true);
    manager.register(&location, config).await.unwrap();
    assert!(manager.is_listening(&location).await);

    let err = manager.deregister(&location).await.unwrap_err();
    assert!(matches!(err, SdkError::Api(_)));

    // The socket was released regardless of the remote failure.
    assert!(!manager.is_listening(&location).await);
    let rebind = TcpListener::bind(("0.0.0.0", port));
    assert!(rebind.is_ok());
}

#[tokio::test]
async fn port_owned_by_another_location_is_a_conflict() {
    let (manager, api) = manager_with(MockApi::new());
    let port = free_port();

    let first = WebhookConfig::new(format!("http://127.0.0.1:{port}/hook")).listen(true);
    manager
        .register(&LocationId::new("L1"), first)
        .await
        .unwrap();

    let second = WebhookConfig::new(format!("http://127.0.0.1:{port}/other")).listen(true);
    let err = manager
        .register(&LocationId::new("L2"), second)
        .await
        .unwrap_err();

    match err {
        SdkError::ListenerConflict { port: p, location } => {
            assert_eq!(p, port);
            assert_eq!(location, "L1");
        }
        other => panic!("expected ListenerConflict, got {other:?}"),
    }
    // Only the first registration reached the service.
    assert_eq!(api.calls().len(), 1);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn reregistering_a_location_replaces_its_listener() {
    let (manager, api) = manager_with(MockApi::new());
    let location = LocationId::new("L1");
    let port = free_port();

    let first = WebhookConfig::new(format!("http://127.0.0.1:{port}/hook")).listen(true);
    manager.register(&location, first).await.unwrap();

    // Same port, new path: the old listener must be released first.
    let second = WebhookConfig::new(format!("http://127.0.0.1:{port}/hook-v2")).listen(true);
    match manager.register(&location, second).await.unwrap() {
        RegistrationOutcome::Active { url, .. } => {
            assert_eq!(url, format!("http://127.0.0.1:{port}/hook-v2"));
        }
        other => panic!("expected Active, got {other:?}"),
    }
    assert_eq!(api.calls().len(), 2);
    assert!(manager.is_listening(&location).await);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn registration_without_listen_is_remote_only() {
    let (manager, api) = manager_with(MockApi::new());
    let location = LocationId::new("L1");

    let config = WebhookConfig::new("https://relay.example.com/hook");
    match manager.register(&location, config).await.unwrap() {
        RegistrationOutcome::RemoteOnly { url } => {
            assert_eq!(url, "https://relay.example.com/hook");
        }
        other => panic!("expected RemoteOnly, got {other:?}"),
    }
    assert_eq!(api.calls().len(), 1);
    assert!(!manager.is_listening(&location).await);
}
