use std::sync::LazyLock;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::db;
use crate::error::{AppError, FieldError, unique_violation};
use crate::models::User;
use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("valid username regex"));

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Registration fields that passed validation. The email is lowercased.
struct NewUser {
    email: String,
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserView,
    pub token: String,
}

fn validate_registration(req: RegisterRequest) -> Result<NewUser, AppError> {
    let email = req.email.unwrap_or_default().trim().to_lowercase();
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let mut errors = Vec::new();
    if !EMAIL_RE.is_match(&email) {
        errors.push(FieldError::new("email", "Please provide a valid email"));
    }
    if !USERNAME_RE.is_match(&username) {
        errors.push(FieldError::new(
            "username",
            "Username must be 3-30 characters of letters, numbers and underscores",
        ));
    }
    if password.len() < 6 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters long",
        ));
    }
    if errors.is_empty() {
        Ok(NewUser {
            email,
            username,
            password,
        })
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Returns the lowercased email and the password.
fn validate_login(req: LoginRequest) -> Result<(String, String), AppError> {
    let email = req.email.unwrap_or_default().trim().to_lowercase();
    let password = req.password.unwrap_or_default();

    let mut errors = Vec::new();
    if !EMAIL_RE.is_match(&email) {
        errors.push(FieldError::new("email", "Please provide a valid email"));
    }
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }
    if errors.is_empty() {
        Ok((email, password))
    } else {
        Err(AppError::Validation(errors))
    }
}

fn issue_token(state: &SharedState, user_id: Uuid) -> Result<String, AppError> {
    let claims = Claims::new(user_id, state.config.jwt_ttl_hours);
    encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let new_user = validate_registration(req)?;
    let pw_hash = password::hash_blocking(new_user.password).await?;

    let user = db::users::create(&state.pool, &new_user.email, &new_user.username, &pw_hash)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some("users_email_key") => AppError::Conflict("Email already registered".to_string()),
            Some(_) => AppError::Conflict("Username already taken".to_string()),
            None => AppError::Database(e),
        })?;

    let token = issue_token(&state, user.id)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            user: UserView::from(&user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (email, pw) = validate_login(req)?;
    let invalid = || AppError::Unauthorized("Email or password is incorrect".to_string());

    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(invalid)?;

    let valid = password::verify_blocking(pw, user.password_hash.clone()).await?;
    if !valid {
        return Err(invalid());
    }

    let token = issue_token(&state, user.id)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: UserView::from(&user),
        token,
    }))
}

pub async fn me(auth: AuthUser) -> Json<UserView> {
    Json(UserView {
        id: auth.user_id,
        email: auth.email,
        username: auth.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn fields(err: AppError) -> Vec<&'static str> {
        match err {
            AppError::Validation(errors) => errors.iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn accepts_well_formed_registration() {
        let user = validate_registration(request(" Ana@Example.com", "ana_01", "secret1")).unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.username, "ana_01");
    }

    #[test]
    fn reports_every_bad_field() {
        let Err(err) = validate_registration(request("not-an-email", "a!", "123")) else {
            panic!("expected validation error");
        };
        assert_eq!(fields(err), vec!["email", "username", "password"]);
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let empty = RegisterRequest {
            email: None,
            username: None,
            password: None,
        };
        let Err(err) = validate_registration(empty) else {
            panic!("expected validation error");
        };
        assert_eq!(fields(err), vec!["email", "username", "password"]);

        let Err(err) = validate_login(LoginRequest {
            email: None,
            password: None,
        }) else {
            panic!("expected validation error");
        };
        assert_eq!(fields(err), vec!["email", "password"]);
    }
}
