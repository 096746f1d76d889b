//! ficore-maint - data maintenance for the FiCore database
//!
//! Checks, cleans and migrates stored cashflows, and issues API tokens.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ficore_common::config::{load_config, resolve_database_path};
use ficore_common::db::init_database;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{Confirm, Outcome};

#[derive(Debug, Parser)]
#[command(name = "ficore-maint", version, about = "FiCore data maintenance")]
struct Cli {
    /// Path to config.toml
    #[arg(long, env = "FICORE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "FICORE_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long = "yes", global = true)]
    assume_yes: bool,

    /// Non-interactive run: no prompts, and completed migrations are skipped
    #[arg(long, env = "AUTOMATED_MIGRATION", global = true)]
    automated: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count stored values containing problematic characters
    Check,

    /// Sanitize cashflow text fields and normalize timestamps
    Clean {
        /// Run even if no problematic characters are found
        #[arg(long)]
        force: bool,
    },

    /// Full migration: timestamps, categories, cleanup, validation
    Migrate {
        /// Run again even though a previous run completed
        #[arg(long)]
        force: bool,
    },

    /// Report data-integrity issues without changing anything
    Validate,

    /// List rows holding backslashes and per-user cashflow counts
    Diagnose,

    /// Clean one user's cashflows
    CleanUser {
        user_id: String,
    },

    /// Create an API user and print its token
    AddUser {
        /// Display name
        #[arg(long)]
        name: String,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (config, origin) = load_config(cli.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();
    origin.log();

    let db_path = resolve_database_path(cli.database.as_deref(), &config);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let confirm = Confirm::new(cli.assume_yes, cli.automated);

    let outcome = match cli.command {
        Command::Check => commands::check(&pool).await?,
        Command::Clean { force } => commands::clean(&pool, &confirm, force).await?,
        Command::Migrate { force } => commands::migrate(&pool, &confirm, force).await?,
        Command::Validate => commands::validate(&pool).await?,
        Command::Diagnose => commands::diagnose(&pool).await?,
        Command::CleanUser { user_id } => commands::clean_user(&pool, &confirm, &user_id).await?,
        Command::AddUser { name, admin } => commands::add_user(&pool, &name, admin).await?,
    };

    pool.close().await;
    Ok(outcome.exit_code())
}
