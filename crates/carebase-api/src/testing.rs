//! Test fixtures shared by the handler and middleware tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use carebase_advisor::{Advisor, SymptomTable};
use carebase_contracts::user::User;
use carebase_policy::TomlPolicyEngine;
use carebase_store::{InMemoryStore, LocalObjectStore};

use crate::config::Settings;
use crate::context::ApiContext;
use crate::router::api_router;

const BOUNDARY: &str = "carebase-test-boundary";

/// Context over an in-memory store with uploads under a fresh temp dir.
/// Keep the `TempDir` alive for the duration of the test.
pub fn test_context() -> (ApiContext, TempDir) {
    test_context_with(|_| {})
}

pub fn test_context_with(configure: impl FnOnce(&mut Settings)) -> (ApiContext, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings {
        password_iterations: 1_000,
        upload_dir: dir.path().join("uploads"),
        public_base_url: "http://test/files".to_string(),
        ..Settings::default()
    };
    configure(&mut settings);

    let table = SymptomTable::from_json_str(include_str!("../../../data/symptoms.json")).unwrap();
    let objects = LocalObjectStore::new(
        settings.upload_dir.clone(),
        settings.public_base_url.clone(),
    );
    let ctx = ApiContext::assemble(
        settings,
        Box::new(TomlPolicyEngine::embedded().unwrap()),
        Arc::new(InMemoryStore::new()),
        Arc::new(objects),
        Advisor::new(table),
    )
    .unwrap();
    (ctx, dir)
}

pub fn seed_user(ctx: &ApiContext, email: &str, password: &str, is_admin: bool) -> User {
    let now = Utc::now();
    let user = User {
        id: carebase_contracts::new_record_id(),
        email: email.to_string(),
        full_name: "Test User".to_string(),
        is_active: true,
        is_admin,
        avatar_url: None,
        hashed_password: ctx.hasher.hash(password),
        created_at: now,
        updated_at: now,
    };
    ctx.users().create(&user).unwrap()
}

/// A live access token for `user`.
pub fn login_token(ctx: &ApiContext, user: &User) -> String {
    ctx.tokens.issue_pair(&user.id).unwrap().access_token
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

/// `multipart/form-data` POST with a single file part.
pub fn multipart_request(uri: &str, token: &str, field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(ctx: &ApiContext, req: Request<Body>) -> Response {
    api_router(ctx.clone()).oneshot(req).await.unwrap()
}

pub async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
