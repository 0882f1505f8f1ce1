#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use townloop_server::config::Config;
use townloop_server::models::{Event, EventStatus, UserRole};
use townloop_server::routes::create_routes;
use townloop_server::store::{AdminRepository, MemoryStore};
use townloop_server::AppState;

pub const BOUNDARY: &str = "townloop-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub uploads: TempDir,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error_message(&self) -> &str {
        self.body["error"]["message"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), Config::for_uploads(uploads.path()));
        Self {
            router: create_routes(state),
            store,
            uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, body }
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn multipart(&self, uri: &str, token: Option<&str>, body: Vec<u8>) -> Reply {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Signs up a fresh account and returns its id and bearer token.
    pub async fn sign_up(&self, email: &str) -> (Uuid, String) {
        let reply = self
            .post(
                "/api/auth/sign-up",
                None,
                json!({ "email": email, "password": "password123" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        let id = reply.data()["user"]["id"].as_str().unwrap().parse().unwrap();
        let token = reply.data()["token"].as_str().unwrap().to_string();
        (id, token)
    }

    pub async fn admin(&self) -> (Uuid, String) {
        let (id, token) = self.sign_up("admin@townloop.ca").await;
        self.store.update_user_role(id, UserRole::Admin).await.unwrap();
        (id, token)
    }

    pub fn seed(&self, title: &str, town: &str, status: EventStatus, days_ahead: i64) -> Event {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: Some(format!("All about {}", title)),
            date_time: now + Duration::days(days_ahead),
            end_time: None,
            location: Some("Hollinger Park".to_string()),
            coordinates: None,
            town: Some(town.to_string()),
            category: Some("community".to_string()),
            tags: vec!["free".to_string()],
            image_url: None,
            creator_id: None,
            is_featured: false,
            view_count: 0,
            status,
            created_at: now,
            updated_at: None,
        };
        self.store.seed_event(event.clone());
        event
    }
}

/// A multipart body from text fields and optional files `(name, filename, content_type, bytes)`.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, filename, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn event_form() -> Value {
    json!({
        "title": "Winter Carnival",
        "date": "2030-02-14",
        "time": "18:30",
        "location": "Hollinger Park",
        "description": "Skating, bonfires and hot chocolate",
        "tags": "family-friendly, free",
        "category": "community",
        "town": "Timmins"
    })
}
