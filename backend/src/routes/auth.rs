//! Authentication routes
//!
//! Registration, login, refresh token rotation and logout. Handlers validate
//! input and delegate to [`crate::services::AuthService`]; every auth failure
//! leaves here as a uniform 401.

use super::extract::ValidatedJson;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tasktrack_shared::types::{
    AuthTokens, LoginRequest, MessageResponse, RefreshTokenRequest, RegisterRequest, UserProfile,
};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(get_me))
}

/// Register a new user
///
/// POST /api/v1/auth/register
///
/// Does not log the user in; the client follows up with a login.
async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state.auth().register(&req.login, &req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Login with login name and password
///
/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthTokens>> {
    let tokens = state.auth().login(&req.login, &req.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a fresh token pair
///
/// POST /api/v1/auth/refresh
async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<Json<AuthTokens>> {
    let tokens = state.auth().refresh(&req.refresh_token).await?;
    Ok(Json(tokens))
}

/// Revoke a refresh token
///
/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<StatusCode> {
    state.auth().logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the current user's profile
///
/// GET /api/v1/auth/me
///
/// # Authentication
/// Requires valid Bearer token in Authorization header.
async fn get_me(State(state): State<AppState>, auth_user: AuthUser) -> ApiResult<Json<UserProfile>> {
    let profile = state.auth().profile(auth_user.user_id).await?;
    Ok(Json(profile))
}
