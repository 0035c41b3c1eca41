/// User endpoints
///
/// This module provides user registration and authentication:
///
/// - `POST /v1/users` - Register a new user
/// - `POST /v1/users/authenticate` - Verify credentials and issue a JWT
///
/// Both endpoints are public; everything under `/v1/subscriptions` requires
/// the token issued here.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use subtrack_shared::auth::jwt::{self, Claims};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username, unique across all users
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Assigned user ID
    pub user_id: i32,

    /// Username as stored
    pub username: String,

    /// Email as stored
    pub email: String,
}

/// Authenticate request
#[derive(Debug, Deserialize, Validate)]
pub struct AuthenticateRequest {
    /// Username
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Authenticate response
#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    /// Signed JWT for the `/v1/subscriptions` endpoints
    pub token: String,

    /// ID of the authenticated user
    pub user_id: i32,

    /// Token lifetime in minutes
    pub expires_in_minutes: i64,
}

/// Register a new user
///
/// Hashes the password with Argon2id and stores the account. The raw
/// password never leaves this request's scope.
///
/// # Endpoint
///
/// ```text
/// POST /v1/users
/// Content-Type: application/json
///
/// {
///   "username": "jdoe",
///   "email": "jdoe@example.com",
///   "password": "MyP@ssw0rd!"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Weak password
/// - `409 Conflict`: Username already exists
/// - `422 Unprocessable Entity`: Field validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = state
        .service
        .register_user(req.username, req.email, &req.password)
        .await?;

    Ok(Json(RegisterResponse {
        user_id: user.user_id,
        username: user.username,
        email: user.email,
    }))
}

/// Authenticate and issue a JWT
///
/// Unknown usernames and wrong passwords produce the same response so the
/// endpoint cannot be used to enumerate accounts.
///
/// # Endpoint
///
/// ```text
/// POST /v1/users/authenticate
/// Content-Type: application/json
///
/// {
///   "username": "jdoe",
///   "password": "MyP@ssw0rd!"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid credentials
/// - `422 Unprocessable Entity`: Field validation failed
pub async fn authenticate(
    State(state): State<AppState>,
    Json(req): Json<AuthenticateRequest>,
) -> ApiResult<Json<AuthenticateResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = state
        .service
        .authenticate(&req.username, &req.password)
        .await?;

    let claims = Claims::new(user.user_id, user.username, state.config.token_ttl());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(AuthenticateResponse {
        token,
        user_id: user.user_id,
        expires_in_minutes: state.config.jwt.expiration_minutes,
    }))
}
