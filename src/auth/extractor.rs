use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use uuid::Uuid;

use crate::auth::jwt::{self, TokenError};
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

/// The caller of a management route, resolved from its bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::Unauthorized("Please provide a valid access token".to_string())
                })?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret).map_err(
            |e| match e {
                TokenError::Expired => {
                    AppError::Unauthorized("The provided token has expired".to_string())
                }
                TokenError::Invalid => {
                    AppError::Unauthorized("The provided token is invalid".to_string())
                }
            },
        )?;

        // Tokens outlive deleted accounts
        let user = db::users::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "The user associated with this token no longer exists".to_string(),
                )
            })?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            username: user.username,
        })
    }
}
