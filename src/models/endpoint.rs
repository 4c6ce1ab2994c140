use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Uuid,
    pub mock_id: Uuid,
    pub path: String,
    pub method: String,
    pub status_code: i32,
    pub response: serde_json::Value,
    pub headers: Option<serde_json::Value>,
    /// Milliseconds to wait before answering.
    pub delay: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `(method, path)` pair an endpoint answers, listed when a request misses.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct EndpointRoute {
    pub method: String,
    pub path: String,
}

/// An endpoint joined with the user owning its mock.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedEndpoint {
    #[sqlx(flatten)]
    pub endpoint: Endpoint,
    pub owner_id: Uuid,
}

/// Validated values written on create and update.
#[derive(Debug, Clone)]
pub struct EndpointInput {
    pub path: String,
    pub method: String,
    pub status_code: i32,
    pub response: serde_json::Value,
    pub headers: Option<serde_json::Value>,
    pub delay: i32,
}
