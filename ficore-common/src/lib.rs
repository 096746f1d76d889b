//! # FiCore Common Library
//!
//! Shared code for the FiCore bookkeeping services including:
//! - Record, cashflow and inventory models
//! - Input sanitization and form validation
//! - Database initialization, queries and cleanup passes
//! - Expense categories, education prompts and tax bands
//! - Configuration loading

pub mod api;
pub mod categories;
pub mod cleanup;
pub mod config;
pub mod db;
pub mod education;
pub mod error;
pub mod models;
pub mod sanitize;
pub mod tax;
pub mod time;
pub mod validation;

pub use error::{Error, Result};
pub use validation::ValidationErrors;
