use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::{AppError, FieldError, unique_violation};
use crate::models::{Endpoint, Mock};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateMock {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_url: Option<String>,
}

/// Absent fields are left unchanged; an empty description or base URL clears it.
#[derive(Deserialize)]
pub struct UpdateMock {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub struct MockView {
    #[serde(flatten)]
    pub mock: Mock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<Endpoint>>,
    pub mock_url: String,
}

#[derive(Serialize)]
pub struct MockList {
    pub mocks: Vec<MockView>,
}

#[derive(Serialize)]
pub struct MockDetail {
    pub mock: MockView,
}

#[derive(Serialize)]
pub struct MockResponse {
    pub message: String,
    pub mock: MockView,
}

fn view(state: &SharedState, mock: Mock) -> MockView {
    MockView {
        mock_url: state.config.mock_url(mock.id),
        mock,
        endpoint_count: None,
        endpoints: None,
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Mock not found or access denied".to_string())
}

fn map_write_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e) {
        Some(_) => AppError::Conflict("A mock with this name already exists".to_string()),
        None => match e {
            sqlx::Error::RowNotFound => not_found(),
            _ => AppError::Database(e),
        },
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<MockList>, AppError> {
    let mocks = db::mocks::list_with_counts(&state.pool, auth.user_id).await?;
    let views = mocks
        .into_iter()
        .map(|m| MockView {
            endpoint_count: Some(m.endpoint_count),
            ..view(&state, m.mock)
        })
        .collect();
    Ok(Json(MockList { mocks: views }))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateMock>,
) -> Result<(StatusCode, Json<MockResponse>), AppError> {
    let name = req.name.as_deref().unwrap_or_default();
    validate_mock(Some(name), req.description.as_deref())?;

    let mock = db::mocks::create(
        &state.pool,
        auth.user_id,
        name.trim(),
        non_empty(req.description.as_deref()),
        non_empty(req.base_url.as_deref()),
    )
    .await
    .map_err(map_write_error)?;

    tracing::info!(mock_id = %mock.id, user_id = %auth.user_id, "Mock created");

    Ok((
        StatusCode::CREATED,
        Json(MockResponse {
            message: "Mock created successfully".to_string(),
            mock: view(&state, mock),
        }),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MockDetail>, AppError> {
    let mock = db::mocks::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(not_found)?;
    let endpoints = db::endpoints::list_by_mock(&state.pool, mock.id).await?;

    Ok(Json(MockDetail {
        mock: MockView {
            endpoints: Some(endpoints),
            ..view(&state, mock)
        },
    }))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMock>,
) -> Result<Json<MockResponse>, AppError> {
    validate_mock(req.name.as_deref(), req.description.as_deref())?;

    let existing = db::mocks::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(not_found)?;

    let name = req.name.as_deref().map(str::trim).unwrap_or(&existing.name);
    let description = match req.description.as_deref() {
        Some(d) => non_empty(Some(d)),
        None => existing.description.as_deref(),
    };
    let base_url = match req.base_url.as_deref() {
        Some(u) => non_empty(Some(u)),
        None => existing.base_url.as_deref(),
    };
    let is_active = req.is_active.unwrap_or(existing.is_active);

    let mock = db::mocks::update(
        &state.pool,
        id,
        auth.user_id,
        name,
        description,
        base_url,
        is_active,
    )
    .await
    .map_err(map_write_error)?;

    if mock.is_active != existing.is_active {
        tracing::info!(mock_id = %mock.id, is_active = mock.is_active, "Mock toggled");
    }

    Ok(Json(MockResponse {
        message: "Mock updated successfully".to_string(),
        mock: view(&state, mock),
    }))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !db::mocks::delete(&state.pool, id, auth.user_id).await? {
        return Err(not_found());
    }

    tracing::info!(mock_id = %id, user_id = %auth.user_id, "Mock deleted");

    Ok(Json(serde_json::json!({ "message": "Mock deleted successfully" })))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn validate_mock(name: Option<&str>, description: Option<&str>) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if let Some(name) = name.map(str::trim) {
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        } else if name.chars().count() < 3 {
            errors.push(FieldError::new(
                "name",
                "Name must be at least 3 characters long",
            ));
        }
    }
    if description.is_some_and(|d| d.chars().count() > 500) {
        errors.push(FieldError::new(
            "description",
            "Description must be less than 500 characters",
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_is_rejected() {
        assert!(matches!(
            validate_mock(Some("ab"), None),
            Err(AppError::Validation(_))
        ));
        assert!(validate_mock(Some("abc"), None).is_ok());
    }

    #[test]
    fn blank_name_is_required() {
        let Err(AppError::Validation(errors)) = validate_mock(Some("  "), None) else {
            panic!("expected validation error");
        };
        assert_eq!(errors[0].message, "Name is required");
    }

    #[test]
    fn missing_name_is_fine_on_update() {
        assert!(validate_mock(None, Some("short")).is_ok());
    }

    #[test]
    fn long_description_is_rejected() {
        let long = "x".repeat(501);
        assert!(validate_mock(Some("valid"), Some(&long)).is_err());
    }

    #[test]
    fn blank_values_become_none() {
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(Some(" api ")), Some("api"));
        assert_eq!(non_empty(None), None);
    }
}
