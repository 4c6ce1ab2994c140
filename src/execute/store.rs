use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::{Endpoint, EndpointRoute, Mock};

/// Read-only view of mocks and endpoints needed to execute a mock.
#[async_trait]
pub trait MockStore: Send + Sync {
    /// The mock with this id, if it exists and is active.
    async fn find_active_mock(&self, id: Uuid) -> Result<Option<Mock>, sqlx::Error>;

    async fn find_endpoint(
        &self,
        mock_id: Uuid,
        path: &str,
        method: &str,
    ) -> Result<Option<Endpoint>, sqlx::Error>;

    /// Every `(method, path)` registered under the mock.
    async fn list_endpoint_routes(&self, mock_id: Uuid) -> Result<Vec<EndpointRoute>, sqlx::Error>;
}

pub struct PgMockStore {
    pool: PgPool,
}

impl PgMockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MockStore for PgMockStore {
    async fn find_active_mock(&self, id: Uuid) -> Result<Option<Mock>, sqlx::Error> {
        db::mocks::find_active_by_id(&self.pool, id).await
    }

    async fn find_endpoint(
        &self,
        mock_id: Uuid,
        path: &str,
        method: &str,
    ) -> Result<Option<Endpoint>, sqlx::Error> {
        db::endpoints::find_by_route(&self.pool, mock_id, path, method).await
    }

    async fn list_endpoint_routes(&self, mock_id: Uuid) -> Result<Vec<EndpointRoute>, sqlx::Error> {
        db::endpoints::list_routes(&self.pool, mock_id).await
    }
}
