//! Maintenance subcommands
//!
//! Each command prints a human-readable report and returns an [`Outcome`]
//! that decides the process exit code.

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::Result;
use ficore_common::api::create_user;
use ficore_common::cleanup::{self, ProblemReport};
use ficore_common::db::system_config::{self, CASHFLOW_CLEANUP_FLAG, COMPREHENSIVE_CLEANUP_FLAG};
use ficore_common::models::Role;
use sqlx::SqlitePool;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Nothing needed doing, or a completed run was not repeated
    NothingToDo,
    Cancelled,
    /// Finished, but problems remain in the data
    Issues,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Issues => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        }
    }
}

/// Confirmation policy for destructive commands
#[derive(Debug, Clone, Copy)]
pub struct Confirm {
    assume_yes: bool,
    automated: bool,
}

impl Confirm {
    pub fn new(assume_yes: bool, automated: bool) -> Self {
        Self {
            assume_yes,
            automated,
        }
    }

    pub fn is_automated(&self) -> bool {
        self.automated
    }

    /// Ask a yes/no question; anything but `y` is a no
    ///
    /// Without a terminal and without `--yes` the answer is no.
    pub fn ask(&self, question: &str) -> Result<bool> {
        if self.assume_yes || self.automated {
            return Ok(true);
        }

        if !io::stdin().is_terminal() {
            println!("{} (non-interactive, pass --yes to proceed)", question);
            return Ok(false);
        }

        print!("{} (y/N): ", question);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    }
}

fn print_problems(report: &ProblemReport) {
    for (field, count) in &report.fields {
        if *count > 0 {
            println!("  {:<12} {}", field, count);
        }
    }
    println!("Records with problematic characters: {}", report.total);
}

/// `check`
pub async fn check(pool: &SqlitePool) -> Result<Outcome> {
    let report = cleanup::check_for_problematic_characters(pool).await?;
    print_problems(&report);

    Ok(if report.total == 0 {
        Outcome::Success
    } else {
        Outcome::Issues
    })
}

/// `clean`
pub async fn clean(pool: &SqlitePool, confirm: &Confirm, force: bool) -> Result<Outcome> {
    if let Some(flag) = system_config::get_flag(pool, CASHFLOW_CLEANUP_FLAG).await? {
        if flag.value {
            println!(
                "Cleanup already completed at: {}",
                flag.completed_at.as_deref().unwrap_or("unknown time")
            );
        }
    }

    println!("Checking for problematic characters...");
    let report = cleanup::check_for_problematic_characters(pool).await?;
    if report.total == 0 && !force {
        println!("No problematic characters found. Cleanup not needed.");
        return Ok(Outcome::NothingToDo);
    }
    print_problems(&report);

    if !confirm.ask("Do you want to proceed with the cleanup?")? {
        println!("Cleanup cancelled.");
        return Ok(Outcome::Cancelled);
    }

    let stats = cleanup::clean_cashflow_data(pool).await?;
    println!(
        "Cleanup completed: processed {}, cleaned {}, errors {}",
        stats.processed, stats.cleaned, stats.errors
    );

    let remaining = cleanup::check_for_problematic_characters(pool).await?;
    if remaining.total > 0 {
        warn!(
            "{} records still contain problematic characters",
            remaining.total
        );
        print_problems(&remaining);
        return Ok(Outcome::Issues);
    }

    Ok(Outcome::Success)
}

/// `migrate`
pub async fn migrate(pool: &SqlitePool, confirm: &Confirm, force: bool) -> Result<Outcome> {
    if let Some(flag) = system_config::get_flag(pool, COMPREHENSIVE_CLEANUP_FLAG).await? {
        if flag.value {
            println!(
                "Comprehensive cleanup already completed at: {}",
                flag.completed_at.as_deref().unwrap_or("unknown time")
            );
            if let Some(stats) = &flag.stats {
                println!("Previous run stats: {}", stats);
            }

            if confirm.is_automated() {
                println!("Automated run detected. Skipping migration.");
                return Ok(Outcome::NothingToDo);
            }
            if !force {
                println!("Pass --force to run the migration again.");
                return Ok(Outcome::NothingToDo);
            }
        }
    }

    if !confirm.ask("This will run a comprehensive migration and cleanup. Continue?")? {
        println!("Migration cancelled.");
        return Ok(Outcome::Cancelled);
    }

    let report = cleanup::comprehensive_cashflow_migration(pool).await?;
    println!("Timestamps normalized: {}", report.datetimes_normalized);
    println!("Payment categories assigned: {}", report.categories_migrated);
    println!(
        "Cleanup: processed {}, cleaned {}, errors {}, skipped {}",
        report.cleanup.processed, report.cleanup.cleaned, report.cleanup.errors, report.cleanup.skipped
    );
    for issue in &report.issues {
        println!("  ! {}", issue);
    }

    if report.is_clean() {
        println!("✓ Comprehensive migration completed successfully");
        Ok(Outcome::Success)
    } else {
        println!("⚠ Migration completed with some issues. Check the logs for details.");
        Ok(Outcome::Issues)
    }
}

/// `validate`
pub async fn validate(pool: &SqlitePool) -> Result<Outcome> {
    let issues = cleanup::validate_cashflow_data(pool).await?;
    if issues.is_empty() {
        println!("Data validation passed - no issues found");
        return Ok(Outcome::Success);
    }

    for issue in &issues {
        println!("  ! {}", issue);
    }
    Ok(Outcome::Issues)
}

/// `diagnose`
pub async fn diagnose(pool: &SqlitePool) -> Result<Outcome> {
    let diagnosis = cleanup::diagnose(pool).await?;

    println!("Rows with backslashes: {}", diagnosis.backslash_rows.len());
    for row in &diagnosis.backslash_rows {
        println!(
            "  {} user={} type={} {}={:?}",
            row.record_id,
            row.user_id.as_deref().unwrap_or("-"),
            row.cashflow_type.as_deref().unwrap_or("-"),
            row.field,
            row.value
        );
    }

    println!("Cashflows per user:");
    for user in &diagnosis.users {
        println!(
            "  {}: {} total ({} payments, {} receipts, {} undecodable payments)",
            user.user_id.as_deref().unwrap_or("<none>"),
            user.total,
            user.payments,
            user.receipts,
            user.undecodable_payments
        );
    }

    let undecodable: i64 = diagnosis.users.iter().map(|u| u.undecodable_payments).sum();
    Ok(if diagnosis.backslash_rows.is_empty() && undecodable == 0 {
        Outcome::Success
    } else {
        Outcome::Issues
    })
}

/// `clean-user`
pub async fn clean_user(pool: &SqlitePool, confirm: &Confirm, user_id: &str) -> Result<Outcome> {
    if !confirm.ask(&format!("Clean all cashflows of user {}?", user_id))? {
        println!("Cleanup cancelled.");
        return Ok(Outcome::Cancelled);
    }

    let stats = cleanup::emergency_clean_user_data(pool, user_id).await?;
    println!(
        "User {}: processed {}, cleaned {}, errors {}",
        user_id, stats.processed, stats.cleaned, stats.errors
    );

    Ok(if stats.errors > 0 {
        Outcome::Issues
    } else {
        Outcome::Success
    })
}

/// `add-user`
pub async fn add_user(pool: &SqlitePool, name: &str, admin: bool) -> Result<Outcome> {
    let role = if admin { Role::Admin } else { Role::Trader };
    let (user, token) = create_user(pool, name, role).await?;

    println!("Created {} user {} ({})", role.as_str(), user.display_name, user.id);
    println!("API token (shown once): {}", token);

    Ok(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ficore_common::api::find_user_by_token;
    use ficore_common::db::connect_in_memory;

    const YES: Confirm = Confirm {
        assume_yes: true,
        automated: false,
    };

    async fn seed_dirty(pool: &SqlitePool) {
        sqlx::query(
            r"INSERT INTO cashflows (id, user_id, type, amount, party_name, expense_category, created_at)
              VALUES ('a', 'u1', 'payment', 10.0, 'Ade\wale', 'cogs', '2026-10-01T00:00:00.000000Z')",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_clean_skips_when_nothing_to_do() {
        let pool = connect_in_memory().await.unwrap();
        assert_eq!(clean(&pool, &YES, false).await.unwrap(), Outcome::NothingToDo);
        assert!(!system_config::is_flag_set(&pool, CASHFLOW_CLEANUP_FLAG).await.unwrap());
    }

    #[tokio::test]
    async fn test_clean_fixes_dirty_rows() {
        let pool = connect_in_memory().await.unwrap();
        seed_dirty(&pool).await;

        assert_eq!(check(&pool).await.unwrap(), Outcome::Issues);
        assert_eq!(clean(&pool, &YES, false).await.unwrap(), Outcome::Success);
        assert_eq!(check(&pool).await.unwrap(), Outcome::Success);
        assert!(system_config::is_flag_set(&pool, CASHFLOW_CLEANUP_FLAG).await.unwrap());
    }

    #[tokio::test]
    async fn test_migrate_refuses_rerun_without_force() {
        let pool = connect_in_memory().await.unwrap();
        seed_dirty(&pool).await;

        assert_eq!(migrate(&pool, &YES, false).await.unwrap(), Outcome::Success);
        assert_eq!(migrate(&pool, &YES, false).await.unwrap(), Outcome::NothingToDo);
        assert_eq!(migrate(&pool, &YES, true).await.unwrap(), Outcome::Success);

        // automated runs never repeat, even when forced
        let automated = Confirm::new(false, true);
        assert_eq!(
            migrate(&pool, &automated, true).await.unwrap(),
            Outcome::NothingToDo
        );
    }

    #[tokio::test]
    async fn test_add_user_issues_working_token() {
        let pool = connect_in_memory().await.unwrap();
        assert_eq!(add_user(&pool, "Ops", true).await.unwrap(), Outcome::Success);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(find_user_by_token(&pool, "wrong").await.unwrap().is_none());
    }
}
