//! Audit log and admin endpoint integration tests.
//!
//! Run with: `cargo test -p filegate-api --test audit_test`

mod helpers;

use axum::http::StatusCode;
use helpers::TestApp;

#[tokio::test]
async fn test_actions_are_audited_newest_first() {
    let app = TestApp::spawn().await;

    let id = app.upload_as("employee1", "report.xlsx", None).await;
    app.state.audit.flush().await;
    app.server
        .get(&format!("/api/v0/files/{}/download", id))
        .add_header("Authorization", app.bearer("client1"))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .get(&format!("/api/v0/files/{}/download", id))
        .add_header("Authorization", app.bearer("admin"))
        .await
        .assert_status_ok();
    app.state.audit.flush().await;
    app.server
        .delete(&format!("/api/v0/files/{}", id))
        .add_header("Authorization", app.bearer("employee1"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.state.audit.flush().await;

    let response = app
        .server
        .get("/api/v0/audit")
        .add_header("Authorization", app.bearer("admin"))
        .await;

    response.assert_status_ok();
    let entries = response.json::<Vec<serde_json::Value>>();
    let summary: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e["user"].as_str().unwrap(), e["action"].as_str().unwrap()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("employee1", "delete"),
            ("admin", "download"),
            ("employee1", "upload"),
        ]
    );
    assert!(entries.iter().all(|e| e["file_id"] == id));
    assert!(entries.iter().all(|e| e["timestamp"].is_string()));
}

#[tokio::test]
async fn test_audit_limit() {
    let app = TestApp::spawn().await;
    for name in ["a.xlsx", "b.xlsx", "c.xlsx"] {
        app.upload_as("employee1", name, None).await;
        app.state.audit.flush().await;
    }

    let limited = app
        .server
        .get("/api/v0/audit")
        .add_query_param("limit", 2)
        .add_header("Authorization", app.bearer("admin"))
        .await;
    limited.assert_status_ok();
    assert_eq!(limited.json::<Vec<serde_json::Value>>().len(), 2);

    let huge = app
        .server
        .get("/api/v0/audit")
        .add_query_param("limit", 1_000_000)
        .add_header("Authorization", app.bearer("admin"))
        .await;
    huge.assert_status_ok();
    assert_eq!(huge.json::<Vec<serde_json::Value>>().len(), 3);

    let zero = app
        .server
        .get("/api/v0/audit")
        .add_query_param("limit", 0)
        .add_header("Authorization", app.bearer("admin"))
        .await;
    zero.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_log_is_admin_only() {
    let app = TestApp::spawn().await;

    for username in ["employee1", "client1"] {
        let response = app
            .server
            .get("/api/v0/audit")
            .add_header("Authorization", app.bearer(username))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_admin_tenant_views() {
    let app = TestApp::spawn().await;
    let id = app.upload_as("employee2", "b.xlsx", None).await;

    let tenants = app
        .server
        .get("/api/v0/admin/tenants")
        .add_header("Authorization", app.bearer("admin"))
        .await;
    tenants.assert_status_ok();
    let names: Vec<String> = tenants
        .json::<Vec<serde_json::Value>>()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Acme Ltd", "Globex Corp"]);

    let files = app
        .server
        .get(&format!("/api/v0/admin/tenants/{}/files", app.tenant_b))
        .add_header("Authorization", app.bearer("admin"))
        .await;
    files.assert_status_ok();
    let files = files.json::<Vec<serde_json::Value>>();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], id);

    app.server
        .get("/api/v0/admin/tenants/4242/files")
        .add_header("Authorization", app.bearer("admin"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get("/api/v0/admin/tenants")
        .add_header("Authorization", app.bearer("employee1"))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "alive");
    assert_eq!(body["storage_backend"], "local");
}
