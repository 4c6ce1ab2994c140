//! Public execution of stored mocks.
//!
//! Requests under `/mock/{id}` are answered from the endpoint definitions of
//! that mock instead of from compiled handlers. Dispatch has two explicit
//! branches, root and sub-path, each building its own match key.

pub mod resolver;
pub mod response;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::any;

use resolver::{RequestTarget, Resolution, Resolver};
use response::SynthesisError;
use store::MockStore;

/// Failure while executing a mock. Everything but a bad path is a generic 500.
#[derive(Debug)]
pub enum ExecutionError {
    /// Id or sub-path did not decode to UTF-8. Answered with a 400.
    Path(PathRejection),
    Store(sqlx::Error),
    Synthesis(SynthesisError),
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionError::Path(err) => write!(f, "Path error: {err}"),
            ExecutionError::Store(err) => write!(f, "Store error: {err}"),
            ExecutionError::Synthesis(err) => write!(f, "Synthesis error: {err}"),
        }
    }
}

impl From<PathRejection> for ExecutionError {
    fn from(err: PathRejection) -> Self {
        ExecutionError::Path(err)
    }
}

impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        ExecutionError::Store(err)
    }
}

impl From<SynthesisError> for ExecutionError {
    fn from(err: SynthesisError) -> Self {
        ExecutionError::Synthesis(err)
    }
}

impl IntoResponse for ExecutionError {
    fn into_response(self) -> Response {
        if let ExecutionError::Path(err) = &self {
            tracing::debug!("Rejected mock path: {err}");
            return response::malformed_path();
        }
        tracing::error!("Execute mock error: {self}");
        response::internal_failure()
    }
}

/// Routes for `ANY /mock/{id}` and `ANY /mock/{id}/{*path}`.
pub fn router(store: Arc<dyn MockStore>) -> Router {
    let resolver = Arc::new(Resolver::new(store));

    Router::new()
        .route("/mock/{mock_id}", any(execute_root))
        // The catch-all below needs at least one character.
        .route("/mock/{mock_id}/", any(execute_empty_sub_path))
        .route("/mock/{mock_id}/{*path}", any(execute_sub_path))
        .with_state(resolver)
}

async fn execute_root(
    State(resolver): State<Arc<Resolver>>,
    mock_id: Result<Path<String>, PathRejection>,
    method: Method,
) -> Result<Response, ExecutionError> {
    let Path(mock_id) = mock_id?;
    execute(&resolver, &mock_id, RequestTarget::Root, &method).await
}

async fn execute_empty_sub_path(
    State(resolver): State<Arc<Resolver>>,
    mock_id: Result<Path<String>, PathRejection>,
    method: Method,
) -> Result<Response, ExecutionError> {
    let Path(mock_id) = mock_id?;
    execute(&resolver, &mock_id, RequestTarget::SubPath(""), &method).await
}

async fn execute_sub_path(
    State(resolver): State<Arc<Resolver>>,
    params: Result<Path<(String, String)>, PathRejection>,
    method: Method,
) -> Result<Response, ExecutionError> {
    let Path((mock_id, path)) = params?;
    execute(&resolver, &mock_id, RequestTarget::SubPath(&path), &method).await
}

async fn execute(
    resolver: &Resolver,
    mock_id: &str,
    target: RequestTarget<'_>,
    method: &Method,
) -> Result<Response, ExecutionError> {
    let resolution = resolver.resolve(mock_id, target, method).await?;

    match &resolution {
        Resolution::MockUnavailable => {
            tracing::debug!(mock_id, "Mock not found or inactive");
        }
        Resolution::NoMatch { method, path, .. } => {
            tracing::debug!(mock_id, %method, %path, "No endpoint matched");
        }
        Resolution::Matched(endpoint) => {
            tracing::debug!(
                mock_id,
                method = %endpoint.method,
                path = %endpoint.path,
                status = endpoint.status_code,
                delay_ms = endpoint.delay,
                "Endpoint matched"
            );
        }
    }

    Ok(response::synthesize(resolution).await?)
}
