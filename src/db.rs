use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, warn};

use crate::{auth::password::hash_password, config::Config, model::role::Role};

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid DATABASE_URL {database_url}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
/// Every connection to `:memory:` is its own database, hence the cap of one.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Seeds the first admin account when the store has none.
pub async fn ensure_bootstrap_admin(pool: &SqlitePool, config: &Config) -> Result<bool> {
    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(Role::Admin.as_ref())
        .fetch_one(pool)
        .await?;

    if admins > 0 {
        return Ok(false);
    }

    let password = match &config.bootstrap_admin_password {
        Some(p) => p.clone(),
        None => {
            warn!("BOOTSTRAP_ADMIN_PASSWORD not set, seeding admin with the default password; change it");
            "admin123".to_string()
        }
    };
    let hash = hash_password(&password)?;

    sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, first_name, last_name, is_active, created_at)
        VALUES (?, ?, ?, ?, 'Admin', 'User', 1, ?)
        "#,
    )
    .bind(&config.bootstrap_admin_username)
    .bind(&config.bootstrap_admin_email)
    .bind(hash)
    .bind(Role::Admin.as_ref())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    info!(username = %config.bootstrap_admin_username, "Bootstrap admin created");
    Ok(true)
}
