//! API module for shared HTTP API functionality
//!
//! Token authentication and response types used by the web service and the
//! maintenance CLI.
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Database operations (via sqlx)
//! - Shared types

pub mod auth;
pub mod types;

pub use auth::{create_user, find_user_by_token, generate_token, hash_token, parse_bearer};
pub use types::{
    CashflowCreated, CashflowSummary, DebtSummary, ErrorResponse, HomeSummary, ViewData,
};
