//! API token authentication
//!
//! Clients send `Authorization: Bearer <token>`. Only the SHA-256 of a token
//! is stored, in `users.token_hash`.
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions and database operations.
//! The axum middleware lives in `ficore-web`.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{Role, User};
use crate::{Error, Result};

/// Length of generated API tokens
pub const TOKEN_LENGTH: usize = 40;

/// Hex SHA-256 of a token
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Random alphanumeric API token
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Extract the token from an `Authorization` header value
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Look up the user owning a token
pub async fn find_user_by_token(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT id, display_name, role FROM users WHERE token_hash = ?")
            .bind(hash_token(token))
            .fetch_optional(pool)
            .await?;

    match row {
        Some((id, display_name, role)) => {
            let role = Role::parse(&role)
                .ok_or_else(|| Error::Internal(format!("Unknown role '{}' for user {}", role, id)))?;
            Ok(Some(User {
                id,
                display_name,
                role,
            }))
        }
        None => Ok(None),
    }
}

/// Create a user and return it with its plaintext token
///
/// The token is only available here; it cannot be recovered later.
pub async fn create_user(pool: &SqlitePool, display_name: &str, role: Role) -> Result<(User, String)> {
    let display_name = crate::sanitize::sanitize_input(display_name, Some(100), false);
    if display_name.is_empty() {
        return Err(Error::InvalidInput("Display name is required".to_string()));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        display_name,
        role,
    };
    let token = generate_token();

    sqlx::query(
        "INSERT INTO users (id, display_name, role, token_hash, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.display_name)
    .bind(user.role.as_str())
    .bind(hash_token(&token))
    .bind(crate::time::now_string())
    .execute(pool)
    .await?;

    info!("Created {} user {} ({})", user.role.as_str(), user.display_name, user.id);

    Ok((user, token))
}
