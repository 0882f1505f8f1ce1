mod common;

use axum::http::StatusCode;

use common::{multipart_body, TestApp};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

#[tokio::test]
async fn flyer_without_a_file_is_rejected() {
    let app = TestApp::new();
    let body = multipart_body(&[("note", "no file here")], &[]);

    let reply = app.multipart("/api/flyers", None, body).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_message(), "No file uploaded.");
}

#[tokio::test]
async fn flyer_upload_returns_the_extracted_event() {
    let app = TestApp::new();
    let body = multipart_body(&[], &[("flyer", "poster.png", "image/png", PNG)]);

    let reply = app.multipart("/api/flyers", None, body).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["title"], "AI Extracted Event: Local Art Fair");
    assert_eq!(reply.data()["date"], "2025-08-15");
    assert_eq!(reply.data()["time"], "18:00");
    assert_eq!(reply.data()["tags"][2], "Free");
}

#[tokio::test]
async fn image_upload_writes_to_the_media_dir() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("photographer@example.com").await;
    let body = multipart_body(&[], &[("image", "cover.png", "image/png", PNG)]);

    let reply = app.multipart("/api/uploads/images", Some(&token), body).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    let url = reply.data()["url"].as_str().unwrap();
    assert!(url.starts_with("/media/") && url.ends_with(".png"));

    let name = url.trim_start_matches("/media/");
    assert_eq!(std::fs::read(app.uploads.path().join(name)).unwrap(), PNG);

    let served = app.get(url, None).await;
    assert_eq!(served.status, StatusCode::OK);
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("photographer@example.com").await;
    let body = multipart_body(&[], &[("image", "notes.txt", "text/plain", b"hello")]);

    let reply = app.multipart("/api/uploads/images", Some(&token), body).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn multipart_submission_attaches_the_image() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("organizer@example.com").await;
    let body = multipart_body(
        &[
            ("title", "Snowshoe Hike"),
            ("date", "2030-01-20"),
            ("time", "10:00"),
            ("location", "Kettle Lakes"),
            ("description", "A guided morning hike"),
            ("tags", "outdoors, free"),
            ("category", "Sports"),
            ("town", "Timmins"),
            ("is_featured", "on"),
        ],
        &[("image", "trail.png", "image/png", PNG)],
    );

    let reply = app.multipart("/api/events/submit", Some(&token), body).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.data()["status"], "draft");
    assert_eq!(reply.data()["category"], "sports");
    assert_eq!(reply.data()["is_featured"], false);
    assert!(reply.data()["image_url"]
        .as_str()
        .unwrap()
        .starts_with("/media/"));
}

#[tokio::test]
async fn invalid_submission_stores_no_image() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("organizer@example.com").await;
    let body = multipart_body(
        &[("title", "Snowshoe Hike")],
        &[("image", "trail.png", "image/png", PNG)],
    );

    let reply = app.multipart("/api/events/submit", Some(&token), body).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_event_endpoints_answer() {
    let app = TestApp::new();
    app.seed("Curling Bonspiel", "iroquois-falls", townloop_server::models::EventStatus::Active, 3);

    let recent = app.get("/api/test-events", None).await;
    assert_eq!(recent.status, StatusCode::OK);
    assert_eq!(recent.data()[0]["title"], "Curling Bonspiel");

    let mock = app.post("/api/test-events", None, serde_json::json!({})).await;
    assert_eq!(mock.status, StatusCode::OK);
    assert_eq!(mock.data()["title"], "Downtown Farmers Market");

    let schema = app.get("/api/debug-db-schema", None).await;
    assert_eq!(schema.status, StatusCode::OK);
    assert_eq!(schema.body["message"], "Successfully queried events table");
    assert_eq!(schema.data()["columns_ok"], true);
}
