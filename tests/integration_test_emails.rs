mod common;

use axum::http::StatusCode;
use common::{json_request, parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_send_invitations_to_all_guests() {
    let app = TestApp::new().await;
    let admin = app.login_default().await;

    let asha = app.create_guest(&admin, json!({ "name": "Asha", "email": "asha@example.com", "access_preset": "all" })).await;
    app.create_guest(&admin, json!({ "name": "Bounce", "email": "bounce@example.com", "access_preset": "all" })).await;
    app.create_guest(&admin, json!({ "name": "Phone Only", "phone": "9876543210", "access_preset": "wedding_reception" })).await;

    let response = app.send(json_request("POST", "/api/v1/admin/emails/invitations", Some(&admin), &json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = parse_body(response).await;
    assert_eq!(report["total"], 3);
    assert_eq!(report["sent"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["failures"][0]["reason"].as_str().map(|r| !r.is_empty()), Some(true));

    let sent = app.email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "asha@example.com");
    assert!(sent[0].subject.contains("Asha"));
    let link = format!("https://wedding.test/invite/{}", asha["token"].as_str().unwrap());
    assert!(sent[0].html_body.contains(&link));
}

#[tokio::test]
async fn test_send_invitations_to_selected_ids() {
    let app = TestApp::new().await;
    let admin = app.login_default().await;

    let a = app.create_guest(&admin, json!({ "name": "A", "email": "a@example.com", "access_preset": "all" })).await;
    app.create_guest(&admin, json!({ "name": "B", "email": "b@example.com", "access_preset": "all" })).await;

    let report = parse_body(app.send(json_request("POST", "/api/v1/admin/emails/invitations", Some(&admin), &json!({
        "guest_ids": [a["id"], "missing-guest"]
    }))).await).await;

    assert_eq!(report["total"], 2);
    assert_eq!(report["sent"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(app.email.sent.lock().unwrap()[0].recipient, "a@example.com");
}

#[tokio::test]
async fn test_custom_email() {
    let app = TestApp::new().await;
    let admin = app.login_default().await;

    let a = app.create_guest(&admin, json!({ "name": "A", "email": "a@example.com", "access_preset": "all" })).await;

    let invalid = app.send(json_request("POST", "/api/v1/admin/emails/custom", Some(&admin), &json!({
        "guest_ids": [],
        "subject": "",
        "message": "hi"
    }))).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let response = app.send(json_request("POST", "/api/v1/admin/emails/custom", Some(&admin), &json!({
        "guest_ids": [a["id"]],
        "subject": " Shuttle update ",
        "message": "<script>x</script>\nBus leaves at 5"
    }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = parse_body(response).await;
    assert_eq!(report["sent"], 1);

    let sent = app.email.sent.lock().unwrap();
    assert_eq!(sent[0].subject, "Shuttle update");
    assert!(!sent[0].html_body.contains("<script>"));
    assert!(sent[0].html_body.contains("Bus leaves at 5"));
}

#[tokio::test]
async fn test_email_routes_require_admin() {
    let app = TestApp::new().await;
    let response = app.send(json_request("POST", "/api/v1/admin/emails/invitations", None, &json!({}))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
