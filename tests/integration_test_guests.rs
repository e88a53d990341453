mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{get_request, guest_request, json_request, parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_create_guest_defaults_and_invite_link() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    let guest = app.create_guest(&token, json!({
        "name": "  Asha Verma ",
        "phone": "+91 98765 43210",
        "email": "Asha@Example.com",
        "access_preset": "wedding_reception"
    })).await;

    assert_eq!(guest["name"], "Asha Verma");
    assert_eq!(guest["phone"], "919876543210");
    assert_eq!(guest["email"], "asha@example.com");
    assert_eq!(guest["event_access"], json!(["wedding", "reception"]));
    assert_eq!(guest["max_devices_allowed"], 2);
    assert_eq!(guest["allowed_devices"], json!([]));

    let invite_token = guest["token"].as_str().unwrap();
    assert_eq!(invite_token.len(), 32);
    assert!(invite_token.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(guest["invite_link"], format!("https://wedding.test/invite/{}", invite_token));

    let all = app.create_guest(&token, json!({ "name": "Dev", "access_preset": "all" })).await;
    assert_eq!(all["event_access"], json!(["mehndi", "wedding", "reception"]));
    assert_ne!(all["token"], guest["token"]);
}

#[tokio::test]
async fn test_create_guest_validation() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    let response = app.send(json_request("POST", "/api/v1/admin/guests", Some(&token), &json!({
        "name": "",
        "phone": "12",
        "access_preset": "all",
        "max_devices_allowed": 50
    }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_body(response).await;
    let fields: Vec<&str> = body["details"].as_array().unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "phone", "max_devices_allowed"]);

    let bad_preset = app.send(json_request("POST", "/api/v1/admin/guests", Some(&token), &json!({
        "name": "X",
        "access_preset": "mehndi_only"
    }))).await;
    assert_eq!(bad_preset.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_search_get_and_delete() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    let asha = app.create_guest(&token, json!({ "name": "Asha", "email": "asha@example.com", "access_preset": "all" })).await;
    app.create_guest(&token, json!({ "name": "Ravi", "phone": "9876500000", "access_preset": "all" })).await;

    let all = parse_body(app.send(get_request("/api/v1/admin/guests", Some(&token))).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let found = parse_body(app.send(get_request("/api/v1/admin/guests?search=ravi", Some(&token))).await).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Ravi");

    let by_phone = parse_body(app.send(get_request("/api/v1/admin/guests?search=98765", Some(&token))).await).await;
    assert_eq!(by_phone.as_array().unwrap().len(), 1);

    let id = asha["id"].as_str().unwrap();
    let fetched = app.send(get_request(&format!("/api/v1/admin/guests/{}", id), Some(&token))).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(parse_body(fetched).await["email"], "asha@example.com");

    let deleted = app.send(json_request("DELETE", &format!("/api/v1/admin/guests/{}", id), Some(&token), &json!({}))).await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let again = app.send(json_request("DELETE", &format!("/api/v1/admin/guests/{}", id), Some(&token), &json!({}))).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let gone = app.send(get_request(&format!("/api/v1/admin/guests/{}", id), Some(&token))).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_guest_fields() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    let guest = app.create_guest(&token, json!({
        "name": "Asha",
        "phone": "9876543210",
        "access_preset": "all",
        "max_devices_allowed": 3
    })).await;
    let id = guest["id"].as_str().unwrap();
    let invite = guest["token"].as_str().unwrap();

    for fp in ["fp-a", "fp-b", "fp-c"] {
        let saved = app.send(guest_request(
            "POST", &format!("/api/v1/invite/{}/device", invite), None,
            Some(&json!({ "contact": "9876543210", "fingerprint": fp })),
        )).await;
        assert_eq!(saved.status(), StatusCode::OK);
    }

    let expires = Utc::now() + Duration::days(30);
    let updated = app.send(json_request("PUT", &format!("/api/v1/admin/guests/{}", id), Some(&token), &json!({
        "name": "Asha V",
        "phone": "",
        "email": "asha@example.com",
        "access_preset": "wedding_reception",
        "max_devices_allowed": 1,
        "token_expires_at": expires.to_rfc3339()
    }))).await;
    assert_eq!(updated.status(), StatusCode::OK);

    let body = parse_body(updated).await;
    assert_eq!(body["name"], "Asha V");
    assert!(body["phone"].is_null());
    assert_eq!(body["email"], "asha@example.com");
    assert_eq!(body["event_access"], json!(["wedding", "reception"]));
    assert_eq!(body["max_devices_allowed"], 1);
    assert_eq!(body["allowed_devices"], json!(["fp-a"]));
    assert!(body["token_expires_at"].is_string());
    assert_eq!(body["token"], invite);

    let cleared = parse_body(app.send(json_request("PUT", &format!("/api/v1/admin/guests/{}", id), Some(&token), &json!({
        "clear_token_expiry": true
    }))).await).await;
    assert!(cleared["token_expires_at"].is_null());
    assert_eq!(cleared["name"], "Asha V");

    let missing = app.send(json_request("PUT", "/api/v1/admin/guests/nope", Some(&token), &json!({ "name": "X" }))).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_regenerate_token_resets_access() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    let guest = app.create_guest(&token, json!({ "name": "Asha", "access_preset": "all" })).await;
    let id = guest["id"].as_str().unwrap();
    let old_token = guest["token"].as_str().unwrap().to_string();

    let saved = app.send(guest_request(
        "POST", &format!("/api/v1/invite/{}/device", old_token), None,
        Some(&json!({ "contact": "asha@example.com", "fingerprint": "fp-1" })),
    )).await;
    assert_eq!(saved.status(), StatusCode::OK);

    let regenerated = app.send(json_request(
        "POST", &format!("/api/v1/admin/guests/{}/regenerate-token", id), Some(&token), &json!({}),
    )).await;
    assert_eq!(regenerated.status(), StatusCode::OK);

    let body = parse_body(regenerated).await;
    let new_token = body["token"].as_str().unwrap();
    assert_ne!(new_token, old_token);
    assert_eq!(body["allowed_devices"], json!([]));
    assert!(body["token_used_first_time"].is_null());
    assert_eq!(body["email"], "asha@example.com");

    let old_link = app.send(guest_request("GET", &format!("/api/v1/invite/{}", old_token), None, None)).await;
    assert_eq!(old_link.status(), StatusCode::NOT_FOUND);

    let new_link = app.send(guest_request("GET", &format!("/api/v1/invite/{}", new_token), None, None)).await;
    assert_eq!(new_link.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bulk_delete() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    let a = app.create_guest(&token, json!({ "name": "A", "access_preset": "all" })).await;
    let b = app.create_guest(&token, json!({ "name": "B", "access_preset": "all" })).await;
    app.create_guest(&token, json!({ "name": "C", "access_preset": "all" })).await;

    let response = app.send(json_request("POST", "/api/v1/admin/guests/bulk-delete", Some(&token), &json!({
        "ids": [a["id"], b["id"], "unknown-id"]
    }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_body(response).await["deleted"], 2);

    let remaining = parse_body(app.send(get_request("/api/v1/admin/guests", Some(&token))).await).await;
    assert_eq!(remaining.as_array().unwrap().len(), 1);
    assert_eq!(remaining[0]["name"], "C");

    let empty = app.send(json_request("POST", "/api/v1/admin/guests/bulk-delete", Some(&token), &json!({ "ids": [] }))).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guest_stats() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    let a = app.create_guest(&token, json!({ "name": "A", "phone": "9000000001", "access_preset": "all" })).await;
    app.create_guest(&token, json!({ "name": "B", "access_preset": "wedding_reception" })).await;

    let invite = a["token"].as_str().unwrap();
    app.send(guest_request(
        "POST", &format!("/api/v1/invite/{}/device", invite), None,
        Some(&json!({ "contact": "9000000001", "fingerprint": "fp" })),
    )).await;
    let rsvp = app.send(guest_request(
        "POST", &format!("/api/v1/invite/{}/rsvp", invite), Some("fp"),
        Some(&json!({ "responses": {
            "wedding": { "status": "attending", "attendees": 3 },
            "mehndi": { "status": "declined" }
        }})),
    )).await;
    assert_eq!(rsvp.status(), StatusCode::OK);

    let stats = parse_body(app.send(get_request("/api/v1/admin/guests/stats", Some(&token))).await).await;
    assert_eq!(stats["total_guests"], 2);
    assert_eq!(stats["verified_guests"], 1);
    assert_eq!(stats["rsvp_submitted"], 1);
    assert_eq!(stats["preferences_submitted"], 0);
    assert_eq!(stats["events"]["mehndi"]["invited"], 1);
    assert_eq!(stats["events"]["mehndi"]["declined"], 1);
    assert_eq!(stats["events"]["wedding"]["invited"], 2);
    assert_eq!(stats["events"]["wedding"]["attending"], 1);
    assert_eq!(stats["events"]["wedding"]["headcount"], 3);
    assert_eq!(stats["events"]["reception"]["attending"], 0);
}

#[tokio::test]
async fn test_event_upsert_and_delete() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    let created = app.send(json_request("PUT", "/api/v1/admin/events/wedding", Some(&token), &json!({
        "title": "The Wedding",
        "description": "Pheras at sunset",
        "date": "2026-12-12",
        "time": "17:00",
        "venue": "Lake Palace",
        "dress_code": "  "
    }))).await;
    assert_eq!(created.status(), StatusCode::OK);
    let first = parse_body(created).await;
    assert_eq!(first["slug"], "wedding");
    assert_eq!(first["date"], "2026-12-12");
    assert!(first["dress_code"].is_null());

    let updated = parse_body(app.send(json_request("PUT", "/api/v1/admin/events/wedding", Some(&token), &json!({
        "title": "The Wedding Ceremony"
    }))).await).await;
    assert_eq!(updated["id"], first["id"]);
    assert_eq!(updated["title"], "The Wedding Ceremony");

    let list = parse_body(app.send(get_request("/api/v1/admin/events", Some(&token))).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let unknown = app.send(json_request("PUT", "/api/v1/admin/events/sangeet", Some(&token), &json!({ "title": "X" }))).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let bad_map = app.send(json_request("PUT", "/api/v1/admin/events/mehndi", Some(&token), &json!({
        "title": "Mehndi",
        "map_embed_url": "javascript:alert(1)"
    }))).await;
    assert_eq!(bad_map.status(), StatusCode::BAD_REQUEST);

    let deleted = app.send(json_request("DELETE", "/api/v1/admin/events/wedding", Some(&token), &json!({}))).await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = app.send(get_request("/api/v1/admin/events/wedding", Some(&token))).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let app = TestApp::new().await;
    let token = app.login_default().await;

    for name in ["100% Sure", "100 Sure", "a_b", "axb"] {
        app.create_guest(&token, json!({ "name": name, "access_preset": "all" })).await;
    }

    let percent = parse_body(app.send(get_request("/api/v1/admin/guests?search=100%25", Some(&token))).await).await;
    assert_eq!(percent.as_array().unwrap().len(), 1);
    assert_eq!(percent[0]["name"], "100% Sure");

    let underscore = parse_body(app.send(get_request("/api/v1/admin/guests?search=a_b", Some(&token))).await).await;
    assert_eq!(underscore.as_array().unwrap().len(), 1);
    assert_eq!(underscore[0]["name"], "a_b");
}
