#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use mockhub::config::Config;
use mockhub::execute::store::MockStore;
use mockhub::models::{Endpoint, EndpointRoute, Mock};

// ── In-memory store ─────────────────────────────────────────────

/// A `MockStore` held in memory, for exercising execution without Postgres.
#[derive(Default)]
pub struct MemoryStore {
    mocks: Vec<Mock>,
    endpoints: Vec<Endpoint>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mock(&mut self, is_active: bool) -> Uuid {
        let id = Uuid::now_v7();
        self.mocks.push(Mock {
            id,
            user_id: Uuid::now_v7(),
            name: format!("mock-{id}"),
            description: None,
            base_url: None,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        id
    }

    pub fn add_endpoint(
        &mut self,
        mock_id: Uuid,
        method: &str,
        path: &str,
        status_code: i32,
        response: Value,
        headers: Option<Value>,
        delay: i32,
    ) {
        self.endpoints.push(Endpoint {
            id: Uuid::now_v7(),
            mock_id,
            path: path.to_string(),
            method: method.to_string(),
            status_code,
            response,
            headers,
            delay,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    /// Makes every later lookup fail as if the database were gone.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.failing.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MockStore for MemoryStore {
    async fn find_active_mock(&self, id: Uuid) -> Result<Option<Mock>, sqlx::Error> {
        self.check()?;
        Ok(self
            .mocks
            .iter()
            .find(|m| m.id == id && m.is_active)
            .cloned())
    }

    async fn find_endpoint(
        &self,
        mock_id: Uuid,
        path: &str,
        method: &str,
    ) -> Result<Option<Endpoint>, sqlx::Error> {
        self.check()?;
        Ok(self
            .endpoints
            .iter()
            .find(|e| e.mock_id == mock_id && e.path == path && e.method == method)
            .cloned())
    }

    async fn list_endpoint_routes(&self, mock_id: Uuid) -> Result<Vec<EndpointRoute>, sqlx::Error> {
        self.check()?;
        Ok(self
            .endpoints
            .iter()
            .filter(|e| e.mock_id == mock_id)
            .map(|e| EndpointRoute {
                method: e.method.clone(),
                path: e.path.clone(),
            })
            .collect())
    }
}

/// A running execution router backed by a [`MemoryStore`].
pub struct MockServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
}

impl MockServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Send `method` to `path`, return (body, status, headers).
    pub async fn call(
        &self,
        method: &str,
        path: &str,
    ) -> (Value, StatusCode, reqwest::header::HeaderMap) {
        let method = reqwest::Method::from_bytes(method.as_bytes()).expect("valid method");
        let resp = self
            .client
            .request(method, self.url(path))
            .send()
            .await
            .expect("mock request failed");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status, headers)
    }
}

pub async fn spawn_mock_server(store: MemoryStore) -> MockServer {
    let store = Arc::new(store);
    let app = mockhub::execute::router(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    MockServer {
        addr,
        client: Client::new(),
        store,
    }
}

// ── Full application ────────────────────────────────────────────

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, username: &str, password: &str) -> (Value, StatusCode) {
        self.send(
            self.client
                .post(self.url("/api/auth/register"))
                .json(&json!({ "email": email, "username": username, "password": password })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.send(
            self.client
                .post(self.url("/api/auth/login"))
                .json(&json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register a user, return its token.
    pub async fn signup(&self, username: &str) -> String {
        let email = format!("{username}@test.com");
        let (body, status) = self.register(&email, username, "password123").await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a mock, return the mock JSON.
    pub async fn create_mock(&self, token: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth("/api/mocks", token, &json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create mock failed: {body}");
        body["mock"].clone()
    }

    /// Create an endpoint under a mock, return the endpoint JSON.
    pub async fn create_endpoint(&self, token: &str, mock_id: &str, endpoint: &Value) -> Value {
        let (body, status) = self
            .post_auth(&format!("/api/endpoints/mock/{mock_id}"), token, endpoint)
            .await;
        assert_eq!(status, StatusCode::CREATED, "create endpoint failed: {body}");
        body["endpoint"].clone()
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        self.send(self.client.get(self.url(path)).bearer_auth(token))
            .await
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        self.send(self.client.post(self.url(path)).bearer_auth(token).json(body))
            .await
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        self.send(self.client.put(self.url(path)).bearer_auth(token).json(body))
            .await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        self.send(self.client.delete(self.url(path)).bearer_auth(token))
            .await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> (Value, StatusCode) {
        let resp = request.send().await.expect("request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("mockhub_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        jwt_ttl_hours: 1,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://mocks.test".to_string(),
        max_body_size: 1_048_576,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        log_level: "warn".to_string(),
    };

    let app = mockhub::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
