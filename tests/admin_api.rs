mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use common::TestApp;
use townloop_server::models::EventStatus;
use townloop_server::store::{AccountRepository, Mutation};

#[tokio::test]
async fn members_are_turned_away() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("member@example.com").await;

    let check = app.get("/api/admin/is-admin", Some(&token)).await;
    assert_eq!(check.status, StatusCode::OK);
    assert_eq!(check.data()["is_admin"], false);

    let stats = app.get("/api/admin/stats", Some(&token)).await;
    assert_eq!(stats.status, StatusCode::FORBIDDEN);
    assert_eq!(stats.error_message(), "Admin access required");

    assert_eq!(
        app.get("/api/admin/stats", None).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn submissions_show_up_as_pending_and_can_be_approved() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    let pending = app.seed("Quilting Bee", "timmins", EventStatus::Draft, 5);

    let queue = app.get("/api/admin/events/pending", Some(&admin)).await;
    let queue = queue.data().as_array().unwrap().clone();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["title"], "Quilting Bee");

    let approved = app
        .post(
            &format!("/api/admin/events/{}/approve", pending.id),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(approved.status, StatusCode::OK);
    assert_eq!(approved.body["message"], "Event approved");
    assert_eq!(app.get("/api/events", None).await.data()["total"], 1);

    let stats = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(stats.data()["active_events"], 1);
    assert_eq!(stats.data()["pending_events"], 0);
}

#[tokio::test]
async fn bulk_without_a_selection_is_rejected() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    app.store.clear_journal();

    let reply = app
        .post(
            "/api/admin/events/bulk",
            Some(&admin),
            json!({ "event_ids": [], "action": "approve" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_message(), "Please select events first");
    assert!(app.store.journal().is_empty());
}

#[tokio::test]
async fn bulk_approval_is_a_single_store_call() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    let ids: Vec<_> = (0..3)
        .map(|n| app.seed(&format!("Draft {}", n), "cochrane", EventStatus::Draft, 2).id)
        .collect();
    app.store.clear_journal();

    let reply = app
        .post(
            "/api/admin/events/bulk",
            Some(&admin),
            json!({ "event_ids": ids, "action": "approve" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.data()["updated"], 3);

    let bulk: Vec<_> = app
        .store
        .journal()
        .into_iter()
        .filter(|m| {
            matches!(
                m,
                Mutation::BulkUpdateEvents { .. } | Mutation::SetEventStatus { .. }
            )
        })
        .collect();
    assert_eq!(
        bulk,
        vec![Mutation::BulkUpdateEvents {
            ids,
            status: EventStatus::Active
        }]
    );
}

#[tokio::test]
async fn banned_users_cannot_sign_in() {
    let app = TestApp::new();
    let (admin_id, admin) = app.admin().await;
    let (user_id, user_token) = app.sign_up("troll@example.com").await;

    let banned = app
        .post(
            &format!("/api/admin/users/{}/ban", user_id),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(banned.status, StatusCode::OK);
    assert_eq!(banned.data()["is_banned"], true);

    assert_eq!(
        app.get("/api/auth/session", Some(&user_token)).await.status,
        StatusCode::UNAUTHORIZED
    );
    let sign_in = app
        .post(
            "/api/auth/sign-in",
            None,
            json!({ "email": "troll@example.com", "password": "password123" }),
        )
        .await;
    assert_eq!(sign_in.status, StatusCode::FORBIDDEN);

    let alerts = app.get("/api/admin/alerts?unread_only=true", Some(&admin)).await;
    let titles: Vec<_> = alerts
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap().to_string())
        .collect();
    assert!(titles.contains(&"User banned".to_string()));

    let self_ban = app
        .post(
            &format!("/api/admin/users/{}/ban", admin_id),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(self_ban.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_ban_body_is_rejected() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    let (user_id, _) = app.sign_up("member@example.com").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/admin/users/{}/ban", user_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = app.send_raw(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let account = app.store.get_account(user_id).await.unwrap().unwrap();
    assert!(!account.is_banned);

    let explicit = app
        .post(
            &format!("/api/admin/users/{}/ban", user_id),
            Some(&admin),
            json!({ "banned": false }),
        )
        .await;
    assert_eq!(explicit.status, StatusCode::OK);
    assert_eq!(explicit.data()["is_banned"], false);
}

#[tokio::test]
async fn admins_cannot_demote_themselves() {
    let app = TestApp::new();
    let (admin_id, admin) = app.admin().await;
    let reply = app
        .call(
            Method::PUT,
            &format!("/api/admin/users/{}/role", admin_id),
            Some(&admin),
            Some(json!({ "role": "user" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_export_is_csv_with_header() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    app.sign_up("member@example.com").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/admin/export/users")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_raw(request).await;
    assert_eq!(status, StatusCode::OK);

    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some("Email,Username,Role,Town,Created At,Event Count")
    );
    assert_eq!(lines.count(), 2);
}

#[tokio::test]
async fn analytics_has_one_point_per_day() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;

    let reply = app.get("/api/admin/analytics?days_back=14", Some(&admin)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data().as_array().unwrap().len(), 14);

    let default = app.get("/api/admin/analytics", Some(&admin)).await;
    assert_eq!(default.data().as_array().unwrap().len(), 30);
}

#[tokio::test]
async fn system_health_records_a_snapshot() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;

    let reply = app.get("/api/admin/system-health", Some(&admin)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let names: Vec<_> = reply
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["metric_name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"total_users".to_string()));
    assert!(names.contains(&"active_events".to_string()));
}

#[tokio::test]
async fn sign_ups_land_in_the_activity_log() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    app.sign_up("member@example.com").await;

    let logs = app.get("/api/admin/activity", Some(&admin)).await;
    assert_eq!(logs.status, StatusCode::OK);
    let sign_ups = logs
        .data()
        .as_array()
        .unwrap()
        .iter()
        .filter(|log| log["action_type"] == "sign_up")
        .count();
    assert_eq!(sign_ups, 2);
}
