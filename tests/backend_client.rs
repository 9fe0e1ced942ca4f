use std::time::Duration;

use approvals_console::application::backend::{ApprovalsApi, BackendError};
use approvals_console::domain::GrantStatus;
use approvals_console::infra::backend::BackendClient;
use httpmock::prelude::*;
use url::Url;

fn client(server: &MockServer, token: Option<&str>) -> BackendClient {
    let base = Url::parse(&format!("{}/", server.base_url())).expect("mock url");
    BackendClient::with_parts(base, token.map(str::to_string), Duration::from_secs(2))
        .expect("client")
}

#[tokio::test]
async fn list_request_events_keeps_recorded_field_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/requests/req_1/events")
                .header("authorization", "Bearer secret");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"events":[
                        {"id":"evt_1","requestId":"req_1","createdAt":"2024-03-01T10:00:00Z",
                         "actor":"usr_1","fromGrantStatus":"PENDING","toGrantStatus":"ACTIVE"},
                        {"id":"evt_2","requestId":"req_1","createdAt":"2024-03-01T10:05:00Z",
                         "actor":"usr_2","recordedEvent":{"reason":"rotation","code":"7"}}
                    ]}"#,
                );
        })
        .await;

    let response = client(&server, Some("secret"))
        .list_request_events("req_1")
        .await
        .expect("events");

    assert_eq!(response.events.len(), 2);
    assert_eq!(response.events[0].to_grant_status, Some(GrantStatus::Active));
    let recorded = response.events[1]
        .recorded_event
        .as_ref()
        .expect("recorded event");
    let keys: Vec<&str> = recorded.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, ["reason", "code"]);
    assert!(response.next.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn list_groups_forwards_next_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/admin/groups")
                .query_param("nextToken", "tok_2");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"groups":[{"id":"grp_3","name":"ops"}],"next":"tok_3"}"#);
        })
        .await;

    let page = client(&server, None)
        .list_groups(Some("tok_2"))
        .await
        .expect("groups");

    assert_eq!(page.groups.len(), 1);
    assert_eq!(page.groups[0].name, "ops");
    assert!(page.groups[0].description.is_none());
    assert_eq!(page.next.as_deref(), Some("tok_3"));
    mock.assert_async().await;
}

#[tokio::test]
async fn user_and_identity_endpoints_decode() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/usr_1");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"usr_1","email":"alice@example.com","firstName":"Alice"}"#);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/admin/identity");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"identityProvider":"cognito"}"#);
        })
        .await;

    let backend = client(&server, None);
    let user = backend.get_user("usr_1").await.expect("user");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.first_name.as_deref(), Some("Alice"));
    assert!(user.last_name.is_none());

    let identity = backend.identity_configuration().await.expect("identity");
    assert_eq!(identity.identity_provider, "cognito");
}

#[tokio::test]
async fn not_found_maps_to_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/requests/missing");
            then.status(404).body("no such request");
        })
        .await;

    let err = client(&server, None)
        .get_request("missing")
        .await
        .expect_err("missing request");
    assert!(matches!(err, BackendError::NotFound), "got {err:?}");
}

#[tokio::test]
async fn server_errors_keep_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/admin/groups");
            then.status(500).body("boom");
        })
        .await;

    let err = client(&server, None)
        .list_groups(None)
        .await
        .expect_err("server error");
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_events_do_not_sink_the_page() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/requests/req_1/events");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"events":[
                        {"id":"evt_1","createdAt":"2024-03-01T10:00:00Z","grantCreated":true},
                        {"id":"evt_2","createdAt":"2024-03-01T10:01:00Z",
                         "recordedEvent":{"code":500}},
                        {"id":"evt_3","createdAt":"2024-03-01T10:02:00Z",
                         "fromGrantStatus":"PENDING","toGrantStatus":"UNKNOWN_NEW"}
                    ]}"#,
                );
        })
        .await;

    let response = client(&server, None)
        .list_request_events("req_1")
        .await
        .expect("valid events survive");

    let ids: Vec<&str> = response.events.iter().map(|event| event.id.as_str()).collect();
    assert_eq!(ids, ["evt_1", "evt_2"]);
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/requests/req_1/events");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"events": "nope"}"#);
        })
        .await;

    let err = client(&server, None)
        .list_request_events("req_1")
        .await
        .expect_err("decode failure");
    assert!(matches!(err, BackendError::Decode(_)), "got {err:?}");
}
