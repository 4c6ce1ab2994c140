use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Endpoint, EndpointInput, EndpointRoute, OwnedEndpoint};

pub async fn list_by_mock(pool: &PgPool, mock_id: Uuid) -> Result<Vec<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "SELECT * FROM endpoints WHERE mock_id = $1 ORDER BY created_at DESC",
    )
    .bind(mock_id)
    .fetch_all(pool)
    .await
}

pub async fn list_routes(
    pool: &PgPool,
    mock_id: Uuid,
) -> Result<Vec<EndpointRoute>, sqlx::Error> {
    sqlx::query_as::<_, EndpointRoute>(
        "SELECT method, path FROM endpoints WHERE mock_id = $1 ORDER BY created_at, id",
    )
    .bind(mock_id)
    .fetch_all(pool)
    .await
}

/// Exact lookup used by mock execution. Path and method compare byte for byte.
pub async fn find_by_route(
    pool: &PgPool,
    mock_id: Uuid,
    path: &str,
    method: &str,
) -> Result<Option<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "SELECT * FROM endpoints WHERE mock_id = $1 AND path = $2 AND method = $3",
    )
    .bind(mock_id)
    .bind(path)
    .bind(method)
    .fetch_optional(pool)
    .await
}

pub async fn find_with_owner(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<OwnedEndpoint>, sqlx::Error> {
    sqlx::query_as::<_, OwnedEndpoint>(
        "SELECT e.*, m.user_id AS owner_id FROM endpoints e
         JOIN mocks m ON e.mock_id = m.id
         WHERE e.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    mock_id: Uuid,
    input: &EndpointInput,
) -> Result<Endpoint, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "INSERT INTO endpoints (id, mock_id, path, method, status_code, response, headers, delay)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(mock_id)
    .bind(&input.path)
    .bind(&input.method)
    .bind(input.status_code)
    .bind(&input.response)
    .bind(input.headers.as_ref())
    .bind(input.delay)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &EndpointInput,
) -> Result<Endpoint, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "UPDATE endpoints SET path = $2, method = $3, status_code = $4, response = $5,
                headers = $6, delay = $7, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&input.path)
    .bind(&input.method)
    .bind(input.status_code)
    .bind(&input.response)
    .bind(input.headers.as_ref())
    .bind(input.delay)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM endpoints WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
