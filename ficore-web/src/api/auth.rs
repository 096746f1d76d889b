//! Bearer-token authentication middleware
//!
//! `auth_middleware` resolves the token to a user and stores it as a
//! [`CurrentUser`] request extension. `require_admin` runs after it on the
//! `/admin` routes.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use ficore_common::api::{find_user_by_token, parse_bearer};
use ficore_common::models::{Role, User};
use tracing::{debug, warn};

use super::error::ApiError;
use crate::AppState;

/// The authenticated caller, available to handlers via `Extension`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let user = find_user_by_token(&state.db, token)
        .await?
        .ok_or_else(|| {
            warn!("Rejected request with unknown token to {}", request.uri().path());
            ApiError::Unauthorized("Invalid token".to_string())
        })?;

    debug!("Authenticated {} ({})", user.display_name, user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Reject callers without the admin role
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .map_or(false, |CurrentUser(user)| user.role == Role::Admin);

    if !is_admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
