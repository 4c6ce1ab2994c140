use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::{AppError, FieldError, unique_violation};
use crate::execute::response::header_text;
use crate::models::{Endpoint, EndpointInput, OwnedEndpoint};
use crate::state::SharedState;

const METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

#[derive(Deserialize)]
pub struct CreateEndpoint {
    pub path: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<i64>,
    pub response: Option<serde_json::Value>,
    pub headers: Option<serde_json::Value>,
    pub delay: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateEndpoint {
    pub path: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<i64>,
    pub response: Option<serde_json::Value>,
    /// `null` clears the headers, absence keeps them.
    #[serde(default, deserialize_with = "present")]
    pub headers: Option<Option<serde_json::Value>>,
    pub delay: Option<i64>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Serialize)]
pub struct EndpointList {
    pub endpoints: Vec<Endpoint>,
}

#[derive(Serialize)]
pub struct EndpointDetail {
    pub endpoint: Endpoint,
}

#[derive(Serialize)]
pub struct EndpointResponse {
    pub message: String,
    pub endpoint: Endpoint,
}

/// Unvalidated field values, merged from a request and any stored endpoint.
struct Draft {
    path: Option<String>,
    method: Option<String>,
    status_code: i64,
    response: Option<serde_json::Value>,
    headers: Option<serde_json::Value>,
    delay: i64,
}

pub async fn list_by_mock(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(mock_id): Path<Uuid>,
) -> Result<Json<EndpointList>, AppError> {
    // Verify mock belongs to caller
    db::mocks::find_by_id(&state.pool, mock_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Mock not found or access denied".to_string()))?;

    let endpoints = db::endpoints::list_by_mock(&state.pool, mock_id).await?;
    Ok(Json(EndpointList { endpoints }))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(mock_id): Path<Uuid>,
    Json(req): Json<CreateEndpoint>,
) -> Result<(StatusCode, Json<EndpointResponse>), AppError> {
    let input = validate(Draft {
        path: req.path,
        method: req.method,
        status_code: req.status_code.unwrap_or(200),
        response: req.response,
        headers: req.headers,
        delay: req.delay.unwrap_or(0),
    })?;

    db::mocks::find_by_id(&state.pool, mock_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Mock not found or access denied".to_string()))?;

    let endpoint = db::endpoints::create(&state.pool, mock_id, &input)
        .await
        .map_err(map_write_error)?;

    tracing::info!(
        endpoint_id = %endpoint.id,
        mock_id = %mock_id,
        method = %endpoint.method,
        path = %endpoint.path,
        "Endpoint created"
    );

    Ok((
        StatusCode::CREATED,
        Json(EndpointResponse {
            message: "Endpoint created successfully".to_string(),
            endpoint,
        }),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EndpointDetail>, AppError> {
    let owned = find_owned(&state, id, &auth, "access").await?;
    Ok(Json(EndpointDetail {
        endpoint: owned.endpoint,
    }))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEndpoint>,
) -> Result<Json<EndpointResponse>, AppError> {
    let existing = find_owned(&state, id, &auth, "update").await?.endpoint;

    let input = validate(Draft {
        path: Some(req.path.unwrap_or(existing.path)),
        method: Some(req.method.unwrap_or(existing.method)),
        status_code: req.status_code.unwrap_or(i64::from(existing.status_code)),
        response: Some(req.response.unwrap_or(existing.response)),
        headers: req.headers.unwrap_or(existing.headers),
        delay: req.delay.unwrap_or(i64::from(existing.delay)),
    })?;

    let endpoint = db::endpoints::update(&state.pool, id, &input)
        .await
        .map_err(map_write_error)?;

    Ok(Json(EndpointResponse {
        message: "Endpoint updated successfully".to_string(),
        endpoint,
    }))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    find_owned(&state, id, &auth, "delete").await?;
    db::endpoints::delete(&state.pool, id).await?;

    tracing::info!(endpoint_id = %id, "Endpoint deleted");

    Ok(Json(serde_json::json!({ "message": "Endpoint deleted successfully" })))
}

/// Loads an endpoint, telling "missing" (404) apart from "someone else's" (403).
async fn find_owned(
    state: &SharedState,
    id: Uuid,
    auth: &AuthUser,
    verb: &str,
) -> Result<OwnedEndpoint, AppError> {
    let owned = db::endpoints::find_with_owner(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Endpoint not found".to_string()))?;

    if owned.owner_id != auth.user_id {
        return Err(AppError::Forbidden(format!(
            "You do not have permission to {verb} this endpoint"
        )));
    }
    Ok(owned)
}

fn map_write_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e) {
        Some(_) => AppError::Conflict(
            "An endpoint with this path and method already exists".to_string(),
        ),
        None => match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Endpoint not found".to_string()),
            _ => AppError::Database(e),
        },
    }
}

fn validate(draft: Draft) -> Result<EndpointInput, AppError> {
    let mut errors = Vec::new();

    let path = draft.path.unwrap_or_default();
    if path.is_empty() {
        errors.push(FieldError::new("path", "Path is required"));
    } else if !path.starts_with('/') {
        errors.push(FieldError::new("path", "Path must start with /"));
    }

    let method = draft.method.unwrap_or_default().to_ascii_uppercase();
    if !METHODS.contains(&method.as_str()) {
        errors.push(FieldError::new(
            "method",
            "Method must be GET, POST, PUT, DELETE, or PATCH",
        ));
    }

    if !(100..=599).contains(&draft.status_code) {
        errors.push(FieldError::new(
            "status_code",
            "Status code must be between 100 and 599",
        ));
    }

    let response = draft.response.filter(|r| !r.is_null());
    if response.is_none() {
        errors.push(FieldError::new("response", "Response is required"));
    }

    let headers = draft.headers.filter(|h| !h.is_null());
    if let Some(headers) = &headers {
        validate_headers(headers, &mut errors);
    }

    let delay = i32::try_from(draft.delay).ok().filter(|d| *d >= 0);
    if delay.is_none() {
        errors.push(FieldError::new("delay", "Delay must be a positive integer"));
    }

    match (errors.is_empty(), response, delay) {
        (true, Some(response), Some(delay)) => Ok(EndpointInput {
            path,
            method,
            // range checked above
            status_code: draft.status_code as i32,
            response,
            headers,
            delay,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

fn validate_headers(headers: &serde_json::Value, errors: &mut Vec<FieldError>) {
    let Some(map) = headers.as_object() else {
        errors.push(FieldError::new("headers", "Headers must be an object"));
        return;
    };
    for (name, value) in map {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(FieldError::new(
                "headers",
                format!("'{name}' is not a valid header name"),
            ));
            continue;
        }
        let valid_value = header_text(value).is_some_and(|text| HeaderValue::from_str(&text).is_ok());
        if !valid_value {
            errors.push(FieldError::new(
                "headers",
                format!("Header '{name}' must have a string, number or boolean value"),
            ));
        }
    }
}
