//! Inventory items and their stock history

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use ficore_common::db::inventory;
use ficore_common::models::{InventoryForm, InventoryMovement, Record};

use super::auth::CurrentUser;
use super::error::ApiResult;
use crate::AppState;

/// GET /inventory/
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(inventory::list_inventory(&state.db, &user.id).await?))
}

/// POST /inventory/add
pub async fn add(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(form): Json<InventoryForm>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let item = inventory::add_inventory_item(&state.db, &user.id, &form).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// POST /inventory/edit/:id
pub async fn edit(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(form): Json<InventoryForm>,
) -> ApiResult<Json<Record>> {
    let item = inventory::update_inventory_item(&state.db, &user.id, &id, &form).await?;
    Ok(Json(item))
}

/// GET /inventory/:id/history
pub async fn history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<InventoryMovement>>> {
    Ok(Json(inventory::item_history(&state.db, &user.id, &id).await?))
}
