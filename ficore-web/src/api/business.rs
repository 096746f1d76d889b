//! Dashboard summaries and creditor/debtor entry

use axum::{extract::State, http::StatusCode, Extension, Json};
use ficore_common::api::{CashflowSummary, DebtSummary, HomeSummary, ViewData};
use ficore_common::db::{cashflows, records};
use ficore_common::education::random_education_tip;
use ficore_common::models::{Cashflow, NewDebtRecord, Record};
use ficore_common::time;

use super::auth::CurrentUser;
use super::error::ApiResult;
use crate::AppState;

/// Rows of each kind returned by `/business/view_data`
const VIEW_DATA_LIMIT: i64 = 50;

/// Cashflows returned by `/business/recent_activity`
const RECENT_ACTIVITY_LIMIT: i64 = 10;

/// GET /business/home
pub async fn home(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<HomeSummary>> {
    let debt = records::debt_summary(&state.db, &user.id).await?;
    let cashflow = cashflows::month_to_date_summary(&state.db, &user.id, time::now()).await?;

    Ok(Json(HomeSummary {
        debt,
        cashflow,
        tip: Some(random_education_tip()),
    }))
}

/// GET /business/view_data
pub async fn view_data(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ViewData>> {
    let records = records::list_recent_records(&state.db, &user.id, VIEW_DATA_LIMIT).await?;
    let cashflows = cashflows::safe_find_cashflows(&state.db, &user.id, VIEW_DATA_LIMIT).await?;

    Ok(Json(ViewData { records, cashflows }))
}

/// GET /business/debt/summary
pub async fn debt_summary(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<DebtSummary>> {
    Ok(Json(records::debt_summary(&state.db, &user.id).await?))
}

/// GET /business/cashflow/summary
pub async fn cashflow_summary(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<CashflowSummary>> {
    let summary = cashflows::month_to_date_summary(&state.db, &user.id, time::now()).await?;
    Ok(Json(summary))
}

/// GET /business/recent_activity
pub async fn recent_activity(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Cashflow>>> {
    let recent = cashflows::recent_cashflows(&state.db, &user.id, RECENT_ACTIVITY_LIMIT).await?;
    Ok(Json(recent))
}

/// POST /business/debt/add
pub async fn add_debt(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(new): Json<NewDebtRecord>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let record = records::insert_debt_record(&state.db, &user.id, &new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
