use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Mock, MockWithCount};

pub async fn list_with_counts(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<MockWithCount>, sqlx::Error> {
    sqlx::query_as::<_, MockWithCount>(
        "SELECT m.*, (SELECT COUNT(*) FROM endpoints e WHERE e.mock_id = m.id) AS endpoint_count
         FROM mocks m WHERE m.user_id = $1 ORDER BY m.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
    base_url: Option<&str>,
) -> Result<Mock, sqlx::Error> {
    sqlx::query_as::<_, Mock>(
        "INSERT INTO mocks (id, user_id, name, description, base_url)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(base_url)
    .fetch_one(pool)
    .await
}

/// Owner-scoped lookup for the management API.
pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Mock>, sqlx::Error> {
    sqlx::query_as::<_, Mock>("SELECT * FROM mocks WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Public lookup used by mock execution; no owner check.
pub async fn find_active_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Mock>, sqlx::Error> {
    sqlx::query_as::<_, Mock>("SELECT * FROM mocks WHERE id = $1 AND is_active = true")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
    base_url: Option<&str>,
    is_active: bool,
) -> Result<Mock, sqlx::Error> {
    sqlx::query_as::<_, Mock>(
        "UPDATE mocks SET name = $3, description = $4, base_url = $5, is_active = $6, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(base_url)
    .bind(is_active)
    .fetch_one(pool)
    .await
}

/// Deletes the mock and, through the foreign key, its endpoints.
pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM mocks WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
