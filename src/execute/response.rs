use std::time::Duration;

use axum::Json;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::models::Endpoint;

use super::resolver::Resolution;

/// A stored endpoint that cannot be turned into an HTTP response.
#[derive(Debug)]
pub enum SynthesisError {
    InvalidStatus(i32),
    InvalidHeader { name: String, reason: String },
}

impl std::fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisError::InvalidStatus(code) => write!(f, "Invalid status code: {code}"),
            SynthesisError::InvalidHeader { name, reason } => {
                write!(f, "Invalid header '{name}': {reason}")
            }
        }
    }
}

/// Renders a resolution. Matched endpoints wait out their delay first.
pub async fn synthesize(resolution: Resolution) -> Result<Response, SynthesisError> {
    match resolution {
        Resolution::MockUnavailable => Ok(mock_unavailable()),
        Resolution::NoMatch {
            method,
            path,
            available,
        } => Ok(no_match(&method, &path, available.as_deref())),
        Resolution::Matched(endpoint) => {
            if endpoint.delay > 0 {
                tokio::time::sleep(Duration::from_millis(endpoint.delay as u64)).await;
            }
            render_endpoint(endpoint)
        }
    }
}

pub fn mock_unavailable() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Mock not found",
            "message": "Mock not found or inactive",
        })),
    )
        .into_response()
}

pub fn no_match(
    method: &str,
    path: &str,
    available: Option<&[crate::models::EndpointRoute]>,
) -> Response {
    let mut body = json!({
        "error": "Endpoint not found",
        "message": format!("Endpoint {method} {path} not found in mock"),
    });
    if let Some(routes) = available {
        body["available"] = json!(routes);
    }
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

pub fn malformed_path() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Bad request",
            "message": "Request path is not valid UTF-8",
        })),
    )
        .into_response()
}

pub fn internal_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "message": "An error occurred while executing the mock",
        })),
    )
        .into_response()
}

fn render_endpoint(endpoint: Endpoint) -> Result<Response, SynthesisError> {
    let status = u16::try_from(endpoint.status_code)
        .ok()
        .filter(|code| (100..=599).contains(code))
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or(SynthesisError::InvalidStatus(endpoint.status_code))?;

    let headers = custom_headers(endpoint.headers.as_ref())?;

    let mut response = (status, Json(endpoint.response)).into_response();
    for (name, value) in headers {
        // insert replaces defaults such as content-type
        response.headers_mut().insert(name, value);
    }
    Ok(response)
}

/// Converts the stored header object into typed header pairs.
fn custom_headers(headers: Option<&Value>) -> Result<Vec<(HeaderName, HeaderValue)>, SynthesisError> {
    let Some(headers) = headers else {
        return Ok(Vec::new());
    };
    let map = match headers {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(SynthesisError::InvalidHeader {
                name: String::new(),
                reason: "headers must be an object".to_string(),
            });
        }
    };

    map.iter()
        .map(|(name, value)| {
            let invalid = |reason: String| SynthesisError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let text = header_text(value)
                .ok_or_else(|| invalid("value must be a string, number or boolean".to_string()))?;
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(&text).map_err(|e| invalid(e.to_string()))?;
            Ok((header_name, header_value))
        })
        .collect()
}

/// Text sent for a stored header value.
pub fn header_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn endpoint(status_code: i32, headers: Option<Value>) -> Endpoint {
        Endpoint {
            id: Uuid::now_v7(),
            mock_id: Uuid::now_v7(),
            path: "/users".to_string(),
            method: "GET".to_string(),
            status_code,
            response: json!({ "message": "ok" }),
            headers,
            delay: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn custom_headers_override_content_type() {
        let response = render_endpoint(endpoint(
            201,
            Some(json!({ "Content-Type": "application/vnd.api+json", "X-Count": 3 })),
        ))
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()["content-type"],
            "application/vnd.api+json"
        );
        assert_eq!(response.headers()["x-count"], "3");
    }

    #[test]
    fn out_of_range_status_is_rejected() {
        let err = render_endpoint(endpoint(42, None)).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidStatus(42)));
    }

    #[test]
    fn nested_header_value_is_rejected() {
        let err = render_endpoint(endpoint(200, Some(json!({ "X-Obj": { "a": 1 } })))).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidHeader { .. }));
    }

    #[test]
    fn header_name_with_space_is_rejected() {
        let err = render_endpoint(endpoint(200, Some(json!({ "Bad Name": "x" })))).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidHeader { .. }));
    }

    #[tokio::test]
    async fn root_miss_has_no_available_list() {
        let response = synthesize(Resolution::NoMatch {
            method: "GET".to_string(),
            path: "/".to_string(),
            available: None,
        })
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Endpoint GET / not found in mock");
        assert!(body.get("available").is_none());
    }
}
