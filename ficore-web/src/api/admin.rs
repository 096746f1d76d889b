//! Admin-only cleanup endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use ficore_common::cleanup::{self, CleanupStats, CleanupStatus};
use ficore_common::sanitize::sanitize_input;
use serde::Serialize;
use tracing::info;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use crate::AppState;

/// Longest user id accepted by the per-user clean
const MAX_USER_ID_LENGTH: usize = 50;

#[derive(Debug, Serialize)]
pub struct UserCleanupResponse {
    pub user_id: String,
    pub stats: CleanupStats,
}

/// POST /admin/cleanup/user/:user_id
pub async fn clean_user(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserCleanupResponse>> {
    let user_id = sanitize_input(&user_id, Some(MAX_USER_ID_LENGTH), false);
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("Invalid user ID".to_string()));
    }

    info!("Admin {} requested cleanup of user {}", admin.id, user_id);
    let stats = cleanup::emergency_clean_user_data(&state.db, &user_id).await?;

    Ok(Json(UserCleanupResponse { user_id, stats }))
}

/// POST /admin/bulk-cleanup
pub async fn bulk_cleanup(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
) -> ApiResult<Json<CleanupStats>> {
    info!("Admin {} started bulk cleanup", admin.id);
    Ok(Json(cleanup::bulk_clean_cashflows(&state.db, None).await?))
}

/// GET /admin/cleanup/status
pub async fn cleanup_status(State(state): State<AppState>) -> ApiResult<Json<CleanupStatus>> {
    Ok(Json(cleanup::cleanup_status(&state.db).await?))
}
