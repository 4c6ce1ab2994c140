pub mod auth;
pub mod endpoints;
pub mod mocks;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        // Mocks
        .route("/api/mocks", get(mocks::list).post(mocks::create))
        .route(
            "/api/mocks/{id}",
            get(mocks::get).put(mocks::update).delete(mocks::delete),
        )
        // Endpoints
        .route(
            "/api/endpoints/mock/{mock_id}",
            get(endpoints::list_by_mock).post(endpoints::create),
        )
        .route(
            "/api/endpoints/{id}",
            get(endpoints::get)
                .put(endpoints::update)
                .delete(endpoints::delete),
        )
}
