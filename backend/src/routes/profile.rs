//! User profile routes
//!
//! Mounted behind [`crate::auth::auth_middleware`], so handlers read the
//! caller from the request extensions.

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use tasktrack_shared::types::UserProfile;

/// Create profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/", get(get_profile))
}

/// GET /api/v1/profile - Get user profile
async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.auth().profile(user.user_id).await?;
    Ok(Json(profile))
}
