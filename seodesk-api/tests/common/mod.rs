//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - A router backed by a fresh in-memory store
//! - JSON request helpers
//! - Account and entity creation through the public API

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use seodesk_api::app::{build_router, AppState};
use seodesk_api::config::{ApiConfig, Config, SessionConfig, StoreBackend, StoreConfig};
use seodesk_shared::store::{memory::MemoryStore, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service as _;

pub const PASSWORD: &str = "correct-horse-battery";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<dyn Store>,
    pub app: axum::Router,
    pub config: Config,
}

/// A registered user and their bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Status and decoded body of a response (`Value::Null` when empty)
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
        },
        session: SessionConfig {
            secret: "integration-test-secret-at-least-32-chars".to_string(),
            ttl_hours: 1,
        },
    }
}

impl TestContext {
    /// Creates a new test context with an empty in-memory store
    pub fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let config = test_config();
        let app = build_router(AppState::new(store.clone(), config.clone()));

        TestContext { store, app, config }
    }

    /// Sends a request, optionally authenticated and with a JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> TestResponse {
        self.send("GET", uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> TestResponse {
        self.send("POST", uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> TestResponse {
        self.send("PUT", uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> TestResponse {
        self.send("DELETE", uri, Some(&user.token), None).await
    }

    /// Registers `username` and returns the session
    pub async fn register(&self, username: &str) -> TestUser {
        let response = self
            .send(
                "POST",
                "/api/register",
                None,
                Some(json!({
                    "username": username,
                    "password": PASSWORD,
                    "email": format!("{}@agency.test", username),
                    "fullName": format!("{} Tester", username),
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        TestUser {
            id: response.body["id"].as_i64().unwrap(),
            username: username.to_string(),
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_client(&self, user: &TestUser, name: &str) -> i64 {
        let response = self
            .post(
                "/api/clients",
                user,
                json!({
                    "name": name,
                    "contactPerson": "Jane Roe",
                    "email": "jane@client.test",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    pub async fn create_project(&self, user: &TestUser, client_id: i64, name: &str) -> i64 {
        let response = self
            .post("/api/projects", user, project_body(client_id, name))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    pub async fn create_task(
        &self,
        user: &TestUser,
        project_id: i64,
        title: &str,
        due_date: Option<DateTime<Utc>>,
        status: &str,
    ) -> i64 {
        let response = self
            .post(
                "/api/tasks",
                user,
                json!({
                    "title": title,
                    "projectId": project_id,
                    "dueDate": due_date.map(|d| d.to_rfc3339()),
                    "status": status,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    /// Number of activity rows across all users
    pub async fn activity_count(&self) -> usize {
        self.store.recent_activity(usize::MAX).await.unwrap().len()
    }
}

pub fn project_body(client_id: i64, name: &str) -> Value {
    json!({
        "name": name,
        "website": "https://client.test",
        "clientId": client_id,
        "startDate": "2025-01-01T00:00:00Z",
    })
}

pub fn days_from_now(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

/// IDs in a JSON array of entities, in order
pub fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
