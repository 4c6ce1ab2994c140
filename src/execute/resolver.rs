use std::sync::Arc;

use axum::http::Method;
use uuid::Uuid;

use crate::models::{Endpoint, EndpointRoute};

use super::store::MockStore;

/// Which part of a mock an inbound request addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTarget<'a> {
    /// `/mock/{id}` with nothing after the id.
    Root,
    /// Everything after `/mock/{id}/`, possibly empty.
    SubPath(&'a str),
}

impl RequestTarget<'_> {
    /// The key compared against stored endpoint paths.
    pub fn normalized_path(&self) -> String {
        match self {
            RequestTarget::Root => "/".to_string(),
            RequestTarget::SubPath(rest) => format!("/{rest}"),
        }
    }

    /// Misses on the root never list the mock's routes; sub-path misses do.
    fn lists_routes_on_miss(&self) -> bool {
        matches!(self, RequestTarget::SubPath(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No mock with that id, or the mock is switched off.
    MockUnavailable,
    NoMatch {
        method: String,
        path: String,
        available: Option<Vec<EndpointRoute>>,
    },
    Matched(Endpoint),
}

/// Maps `(mock id, path, method)` to a stored endpoint. Performs reads only.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn MockStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn MockStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        mock_id: &str,
        target: RequestTarget<'_>,
        method: &Method,
    ) -> Result<Resolution, sqlx::Error> {
        // Ids are UUIDs; anything else cannot name a mock.
        let Ok(mock_id) = Uuid::parse_str(mock_id) else {
            return Ok(Resolution::MockUnavailable);
        };

        let Some(mock) = self.store.find_active_mock(mock_id).await? else {
            return Ok(Resolution::MockUnavailable);
        };

        let path = target.normalized_path();
        let method = canonical_method(method);

        if let Some(endpoint) = self.store.find_endpoint(mock.id, &path, &method).await? {
            return Ok(Resolution::Matched(endpoint));
        }

        let available = if target.lists_routes_on_miss() {
            Some(self.store.list_endpoint_routes(mock.id).await?)
        } else {
            None
        };

        Ok(Resolution::NoMatch {
            method,
            path,
            available,
        })
    }
}

pub fn canonical_method(method: &Method) -> String {
    method.as_str().to_ascii_uppercase()
}
