//! Database initialization and queries

pub mod cashflows;
pub mod init;
pub mod inventory;
pub mod migrations;
pub mod records;
pub mod system_config;

pub use init::*;
pub use migrations::{get_schema_version, run_migrations, CURRENT_SCHEMA_VERSION};
