//! Client tests against a mocked nello API.

use mockito::Matcher;
use nello_api::{AccessToken, ApiError, NelloClient};
use serde_json::json;

fn client(server: &mockito::Server) -> NelloClient {
    NelloClient::with_base_url(AccessToken::new("Bearer", "tok-1"), server.url() + "/")
}

const CLEANERS_ICAL: &str = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:tw-1@nello.io\nSUMMARY:Cleaners\nRRULE:FREQ=WEEKLY;BYDAY=MO\nEND:VEVENT\nEND:VCALENDAR\n";

#[tokio::test]
async fn locations_unwraps_envelope_and_sends_bearer_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/locations/")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(
            json!({
                "result": {"success": true},
                "data": [
                    {"location_id": "L1", "address": {"city": "Munich"}},
                    {"location_id": "L2"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let locations = client(&server).locations().await.unwrap();
    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0].location_id, "L1");
    assert_eq!(
        locations[0].address.as_ref().unwrap().city.as_deref(),
        Some("Munich")
    );
    assert!(locations[1].address.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn open_door_puts_to_the_open_resource() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/locations/L1/open/")
        .with_status(200)
        .with_body(r#"{"result": {"success": true}}"#)
        .create_async()
        .await;

    client(&server).open_door("L1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn unsuccessful_envelope_is_a_remote_call_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/locations/L1/open/")
        .with_status(200)
        .with_body(r#"{"result": {"success": false, "message": "door offline"}}"#)
        .create_async()
        .await;

    match client(&server).open_door("L1").await.unwrap_err() {
        ApiError::RemoteCallFailed { status, message } => {
            assert_eq!(status, 200);
            assert_eq!(message, "door offline");
        }
        other => panic!("expected RemoteCallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_status_is_a_remote_call_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/locations/")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    match client(&server).locations().await.unwrap_err() {
        ApiError::RemoteCallFailed { status, .. } => assert_eq!(status, 500),
        other => panic!("expected RemoteCallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn non_envelope_body_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/locations/")
        .with_status(200)
        .with_body("[1, 2, 3]")
        .create_async()
        .await;

    assert!(matches!(
        client(&server).locations().await.unwrap_err(),
        ApiError::MalformedEnvelope(_)
    ));
}

#[tokio::test]
async fn time_windows_are_enriched_with_parsed_calendars() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/locations/L1/tw/")
        .with_status(200)
        .with_body(
            json!({
                "result": {"success": true},
                "data": [{"id": 7, "name": "Cleaners", "enabled": true, "ical": CLEANERS_ICAL}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let windows = client(&server).time_windows("L1").await.unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].id, "7");
    assert_eq!(windows[0].ical.uid.as_deref(), Some("tw-1@nello.io"));
    assert_eq!(windows[0].ical.raw_calendar, CLEANERS_ICAL);
    assert!(windows[0].ical.recurrence_rule.is_some());
}

#[tokio::test]
async fn broken_calendar_fails_the_listing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/locations/L1/tw/")
        .with_status(200)
        .with_body(
            json!({
                "result": {"success": true},
                "data": [{"id": 1, "ical": "not a calendar"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    assert!(matches!(
        client(&server).time_windows("L1").await.unwrap_err(),
        ApiError::Calendar(_)
    ));
}

#[tokio::test]
async fn missing_time_window_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/locations/L1/tw/")
        .with_status(200)
        .with_body(
            json!({
                "result": {"success": true},
                "data": [{"id": "tw-1", "ical": CLEANERS_ICAL}]
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let api = client(&server);
    assert!(api.time_window("L1", "tw-1").await.is_ok());
    assert!(matches!(
        api.time_window("L1", "tw-9").await.unwrap_err(),
        ApiError::NotFound(_)
    ));
}

#[tokio::test]
async fn create_time_window_validates_calendar_locally() {
    let server = mockito::Server::new_async().await;
    // No mock registered: a malformed calendar must fail before any request.
    let err = client(&server)
        .create_time_window("L1", "Broken", "BEGIN:VEVENT only")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Calendar(_)));
}

#[tokio::test]
async fn register_webhook_puts_url_and_actions() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/locations/L1/webhook/")
        .match_body(Matcher::Json(json!({
            "url": "https://example.com:8080/hook",
            "actions": ["swipe", "deny"]
        })))
        .with_status(200)
        .with_body(r#"{"result": {"success": true}}"#)
        .create_async()
        .await;

    use nello_api::WebhookApi;
    client(&server)
        .register_webhook(
            "L1",
            "https://example.com:8080/hook",
            &["swipe".to_string(), "deny".to_string()],
        )
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn remove_webhook_deletes_the_resource() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/locations/L1/webhook/")
        .with_status(200)
        .with_body(r#"{"result": {"success": true}}"#)
        .create_async()
        .await;

    use nello_api::WebhookApi;
    client(&server).remove_webhook("L1").await.unwrap();
    mock.assert_async().await;
}
