use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;

#[test]
fn timeline_prints_resolved_narrative() {
    let server = MockServer::start();
    let events = server.mock(|when, then| {
        when.method("GET")
            .path("/api/v1/requests/req_1/events")
            .header("authorization", "Bearer cli-token");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"{"events":[
                    {"id":"evt_1","requestId":"req_1","createdAt":"2024-03-01T10:00:00Z",
                     "actor":"usr_1","requestCreated":true},
                    {"id":"evt_2","requestId":"req_1","createdAt":"2024-03-01T10:05:00Z",
                     "actor":"usr_1","fromStatus":"PENDING","toStatus":"APPROVED"}
                ]}"#,
            );
    });
    let user = server.mock(|when, then| {
        when.method("GET").path("/api/v1/users/usr_1");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"id":"usr_1","email":"alice@example.com"}"#);
    });

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("approvals-console"));
    let assert = cmd
        .env_remove("APPROVALS__BACKEND__BASE_URL")
        .arg("timeline")
        .arg("req_1")
        .arg("--backend-url")
        .arg(server.base_url())
        .arg("--backend-token")
        .arg("cli-token")
        .arg("--display-timezone")
        .arg("UTC")
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.starts_with("Audit Log\n"));
    assert!(output.contains("2024/03/01 10:00:00  Request created by alice@example.com"));
    assert!(output.contains("2024/03/01 10:05:00  alice@example.com approved the request"));
    events.assert();
    // Both rows share one actor; the lookup is made once.
    user.assert_hits(1);
}

#[test]
fn timeline_backend_failure_exits_non_zero() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/v1/requests/req_1/events");
        then.status(500).body("backend down");
    });

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("approvals-console"));
    cmd.env_remove("APPROVALS__BACKEND__BASE_URL")
        .arg("timeline")
        .arg("req_1")
        .arg("--backend-url")
        .arg(server.base_url())
        .assert()
        .failure()
        .stderr(contains("500"));
}

#[test]
fn missing_backend_url_fails_fast() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("approvals-console"));
    cmd.env_remove("APPROVALS__BACKEND__BASE_URL")
        .env_remove("APPROVALS_CONFIG_FILE")
        .arg("timeline")
        .arg("req_1")
        .assert()
        .failure()
        .stderr(contains("backend.base_url"));
}
