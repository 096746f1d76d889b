//! HTTP API handlers for ficore-web

pub mod admin;
pub mod auth;
pub mod business;
pub mod cashflows;
pub mod error;
pub mod health;
pub mod inventory;
pub mod reference;
pub mod ui;

pub use auth::{auth_middleware, require_admin, CurrentUser};
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use ui::{serve_app_js, serve_index};
