//! Receipt and payment entry

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use ficore_common::api::CashflowCreated;
use ficore_common::db::cashflows;
use ficore_common::education::PromptContext;
use ficore_common::models::{Cashflow, CashflowType, NewCashflow};
use ficore_common::time;

use super::auth::CurrentUser;
use super::error::ApiResult;
use crate::AppState;

async fn add(
    state: &AppState,
    user_id: &str,
    kind: CashflowType,
    new: &NewCashflow,
) -> ApiResult<(StatusCode, Json<CashflowCreated>)> {
    let today = time::now().date_naive();
    let cashflow = cashflows::validate_and_insert_cashflow(&state.db, user_id, kind, new, today).await?;

    let context = match kind {
        CashflowType::Payment => PromptContext::ExpenseLogged,
        CashflowType::Receipt => PromptContext::ReceiptAdded,
    };
    let education_prompt = state.prompts.prompt_for(user_id, context);

    Ok((
        StatusCode::CREATED,
        Json(CashflowCreated {
            cashflow,
            education_prompt,
        }),
    ))
}

/// POST /receipts/add
pub async fn add_receipt(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(new): Json<NewCashflow>,
) -> ApiResult<(StatusCode, Json<CashflowCreated>)> {
    add(&state, &user.id, CashflowType::Receipt, &new).await
}

/// POST /payments/add
pub async fn add_payment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(new): Json<NewCashflow>,
) -> ApiResult<(StatusCode, Json<CashflowCreated>)> {
    add(&state, &user.id, CashflowType::Payment, &new).await
}

async fn edit(
    state: &AppState,
    user_id: &str,
    kind: CashflowType,
    id: &str,
    new: &NewCashflow,
) -> ApiResult<Json<Cashflow>> {
    let today = time::now().date_naive();
    let cashflow =
        cashflows::update_cashflow_entry(&state.db, user_id, kind, id, new, today).await?;
    Ok(Json(cashflow))
}

/// GET /receipts/view/:id
pub async fn view_receipt(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Cashflow>> {
    let cashflow =
        cashflows::get_user_cashflow(&state.db, &user.id, CashflowType::Receipt, &id).await?;
    Ok(Json(cashflow))
}

/// GET /payments/view/:id
pub async fn view_payment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Cashflow>> {
    let cashflow =
        cashflows::get_user_cashflow(&state.db, &user.id, CashflowType::Payment, &id).await?;
    Ok(Json(cashflow))
}

/// POST /receipts/edit/:id
pub async fn edit_receipt(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(new): Json<NewCashflow>,
) -> ApiResult<Json<Cashflow>> {
    edit(&state, &user.id, CashflowType::Receipt, &id, &new).await
}

/// POST /payments/edit/:id
pub async fn edit_payment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(new): Json<NewCashflow>,
) -> ApiResult<Json<Cashflow>> {
    edit(&state, &user.id, CashflowType::Payment, &id, &new).await
}

/// POST /receipts/delete/:id
pub async fn delete_receipt(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    cashflows::delete_cashflow(&state.db, &user.id, CashflowType::Receipt, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /payments/delete/:id
pub async fn delete_payment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    cashflows::delete_cashflow(&state.db, &user.id, CashflowType::Payment, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
