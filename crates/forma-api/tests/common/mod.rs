#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use forma_api::credentials::TokenIssuer;
use forma_api::{AppState, AppStateInner, TaskSchema, router};
use forma_db::Database;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_schema(TaskSchema::Extended)
    }

    pub fn with_schema(task_schema: TaskSchema) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("forma.db"), 2).unwrap();

        let state: AppState = Arc::new(AppStateInner {
            db,
            tokens: TokenIssuer::new(TEST_SECRET, chrono::Duration::hours(1)),
            task_schema,
        });

        Self {
            app: router(state.clone()),
            state,
            _dir: dir,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        send(self.app.clone(), method, uri, body, token).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> (StatusCode, Value) {
        let body = json!({ "username": username, "email": email, "password": password });
        self.request(Method::POST, "/register", Some(body), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        let body = json!({ "email": email, "password": password });
        self.request(Method::POST, "/login", Some(body), None).await
    }

    /// Register a fresh operator account and return its bearer token.
    pub async fn token(&self) -> String {
        let (status, _) = self.register("operator", "operator@example.com", "operator-pass").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login("operator@example.com", "operator-pass").await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, value)
}
