/// Common test utilities for integration tests
///
/// Every test gets its own router backed by a fresh in-memory store, so
/// tests never share state and need no external services.
///
/// - `TestContext`: router plus helpers for registering and logging in
/// - `send`: one request in, status and parsed JSON body out

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::store::{EntityStore, MemoryStore};
use tower::Service as _;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Email that registers with the admin role
pub const ADMIN_EMAIL: &str = "admin@test.com";

pub const PASSWORD: &str = "secret1";

/// A registered user and a live token
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Test context containing the app and its store
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let mut config = Config::in_memory(JWT_SECRET);
        config.admin_emails = vec![ADMIN_EMAIL.to_string()];

        let store = MemoryStore::new_shared();
        let shared: Arc<dyn EntityStore> = store.clone();
        let app = build_router(AppState::new(shared, config));

        Self { app, store }
    }

    /// Sends a request and returns status and JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .call(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user and asserts success
    pub async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "phone": "5551234",
                    "password": PASSWORD
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        body["user"]["id"].as_str().unwrap().to_string()
    }

    /// Logs in and returns the raw response
    pub async fn login_raw(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Registers and logs in
    pub async fn session(&self, name: &str, email: &str) -> Session {
        let id = self.register(name, email).await;

        let (status, body) = self.login_raw(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        Session {
            id,
            email: email.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Registers and logs in the bootstrap admin
    pub async fn admin(&self) -> Session {
        self.session("Admin", ADMIN_EMAIL).await
    }

    /// Creates a project and returns its JSON
    pub async fn create_project(&self, owner: &Session, name: &str, description: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/projects",
                &owner.token,
                json!({ "name": name, "description": description }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body
    }

    /// Creates a task in `project_id` and returns its JSON
    pub async fn create_task(&self, actor: &Session, project_id: &str, title: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/tasks",
                &actor.token,
                json!({ "title": title, "project": project_id, "priority": "high" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body
    }
}

/// Extracts `id` from a JSON entity
pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}
