//! ficore-web library - bookkeeping HTTP service
//!
//! JSON routes for the dashboard, debt records, inventory, receipts and
//! payments, plus reference content and admin cleanup endpoints.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;

pub mod api;
pub mod prompts;

use prompts::PromptTracker;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Education prompts already shown, per user and context
    pub prompts: Arc<PromptTracker>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            prompts: Arc::new(PromptTracker::new()),
        }
    }
}

/// Build application router
///
/// `/health` and the static UI are public; everything else needs a bearer
/// token, and `/admin` additionally needs the admin role.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let admin = Router::new()
        .route("/admin/cleanup/user/:user_id", post(api::admin::clean_user))
        .route("/admin/bulk-cleanup", post(api::admin::bulk_cleanup))
        .route("/admin/cleanup/status", get(api::admin::cleanup_status))
        .layer(middleware::from_fn(api::require_admin));

    let protected = Router::new()
        .route("/business/home", get(api::business::home))
        .route("/business/view_data", get(api::business::view_data))
        .route("/business/debt/summary", get(api::business::debt_summary))
        .route("/business/cashflow/summary", get(api::business::cashflow_summary))
        .route("/business/recent_activity", get(api::business::recent_activity))
        .route("/business/debt/add", post(api::business::add_debt))
        .route("/inventory/", get(api::inventory::list))
        .route("/inventory/add", post(api::inventory::add))
        .route("/inventory/edit/:id", post(api::inventory::edit))
        .route("/inventory/:id/history", get(api::inventory::history))
        .route("/receipts/add", post(api::cashflows::add_receipt))
        .route("/receipts/view/:id", get(api::cashflows::view_receipt))
        .route("/receipts/edit/:id", post(api::cashflows::edit_receipt))
        .route("/receipts/delete/:id", post(api::cashflows::delete_receipt))
        .route("/payments/add", post(api::cashflows::add_payment))
        .route("/payments/view/:id", get(api::cashflows::view_payment))
        .route("/payments/edit/:id", post(api::cashflows::edit_payment))
        .route("/payments/delete/:id", post(api::cashflows::delete_payment))
        .route("/api/expense_categories", get(api::reference::expense_categories))
        .route("/education/prompt/:context", get(api::reference::education_prompt))
        .route("/education/tip", get(api::reference::education_tip))
        .route("/education/next/:module_id", get(api::reference::next_module))
        .route("/education/user_type", post(api::reference::user_type))
        .route("/tax/bands", get(api::reference::tax_bands))
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
}
