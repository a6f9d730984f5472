use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{
    auth::{
        password::{generate_temp_password, hash_password, verify_password},
        session::revoke_user_sessions,
    },
    error::AppError,
    model::{role::Role, user::User},
    models::{CreateUserReq, UpdateUserReq},
    utils::{
        db_utils::{SqlUpdate, SqlValue},
        username_index::UsernameIndex,
    },
};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, first_name, last_name, \
                            assigned_client, is_active, created_at, last_login";

/// Fields for an account about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub assigned_client: Option<String>,
}

fn required(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?)
}

async fn email_taken(pool: &SqlitePool, email: &str, except_id: Option<i64>) -> Result<bool, AppError> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER(?) AND id != ?)",
    )
    .bind(email.trim())
    .bind(except_id.unwrap_or(-1))
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Checks a username/password pair. Unknown user, wrong password and
/// inactive account all come back as the same `InvalidCredentials`.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    let Some(mut user) = find_by_username(pool, username).await? else {
        debug!("Invalid credentials: user not found");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash) {
        debug!(user_id = user.id, "Invalid credentials: password mismatch");
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        debug!(user_id = user.id, "Invalid credentials: account inactive");
        return Err(AppError::InvalidCredentials);
    }

    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(now)
        .bind(user.id)
        .execute(pool)
        .await?;
    user.last_login = Some(now);

    Ok(user)
}

/// Inserts a user after uniqueness checks and records the username in the index.
pub async fn insert_user(
    pool: &SqlitePool,
    index: &UsernameIndex,
    new_user: NewUser,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    required(&new_user.username, "username")?;
    required(&new_user.email, "email")?;
    required(&new_user.password, "password")?;
    required(&new_user.first_name, "first_name")?;
    required(&new_user.last_name, "last_name")?;

    let username = new_user.username.trim().to_string();

    if !index.is_available(pool, &username).await? {
        return Err(AppError::Conflict("Username already exists".into()));
    }
    if email_taken(pool, &new_user.email, None).await? {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let hashed = hash_password(&new_user.password)?;

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (username, email, password_hash, role, first_name, last_name, assigned_client, is_active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(&username)
    .bind(new_user.email.trim())
    .bind(hashed)
    .bind(new_user.role.as_ref())
    .bind(new_user.first_name.trim())
    .bind(new_user.last_name.trim())
    .bind(non_blank(new_user.assigned_client))
    .bind(now)
    .execute(pool)
    .await;

    let id = match result {
        Ok(res) => res.last_insert_rowid(),
        // lost a race with a concurrent insert
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict("Username or email already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    index.mark_taken(&username).await;
    info!(user_id = id, username = %username, "User created");

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Internal("inserted user vanished".into()))
}

/// Local part of an email, reduced to characters safe for a username.
pub fn username_base(email: &str) -> String {
    let local = email.trim().split('@').next().unwrap_or_default();
    let base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .to_lowercase();
    if base.is_empty() { "user".to_string() } else { base }
}

/// First free name among `base`, `base1`, `base2`, ...
pub async fn next_free_username(
    pool: &SqlitePool,
    index: &UsernameIndex,
    base: &str,
) -> Result<String, AppError> {
    if index.is_available(pool, base).await? {
        return Ok(base.to_string());
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{base}{counter}");
        if index.is_available(pool, &candidate).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Creates an account with a derived username and a temporary password.
/// Returns the user together with the plaintext temporary password.
pub async fn create_with_generated_credentials(
    pool: &SqlitePool,
    index: &UsernameIndex,
    req: CreateUserReq,
    now: DateTime<Utc>,
) -> Result<(User, String), AppError> {
    required(&req.first_name, "first_name")?;
    required(&req.last_name, "last_name")?;
    required(&req.email, "email")?;

    if email_taken(pool, &req.email, None).await? {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let username = next_free_username(pool, index, &username_base(&req.email)).await?;
    let temp_password = generate_temp_password();

    let user = insert_user(
        pool,
        index,
        NewUser {
            username,
            email: req.email,
            password: temp_password.clone(),
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role,
            assigned_client: req.assigned_client,
        },
        now,
    )
    .await?;

    Ok((user, temp_password))
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");
    Ok(sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?)
}

/// Applies the admin-editable fields. Deactivation and password changes end
/// the user's open sessions in the same transaction.
pub async fn update(
    pool: &SqlitePool,
    actor_id: i64,
    id: i64,
    req: UpdateUserReq,
) -> Result<User, AppError> {
    if actor_id == id && req.is_active == Some(false) {
        return Err(AppError::Validation("Cannot deactivate your own account".into()));
    }
    if find_by_id(pool, id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let mut update = SqlUpdate::new("users");
    let mut revoke = false;

    if let Some(first_name) = req.first_name {
        required(&first_name, "first_name")?;
        update.set("first_name", SqlValue::String(first_name.trim().to_string()));
    }
    if let Some(last_name) = req.last_name {
        required(&last_name, "last_name")?;
        update.set("last_name", SqlValue::String(last_name.trim().to_string()));
    }
    if let Some(email) = req.email {
        required(&email, "email")?;
        if email_taken(pool, &email, Some(id)).await? {
            return Err(AppError::Conflict("Email already exists".into()));
        }
        update.set("email", SqlValue::String(email.trim().to_string()));
    }
    if let Some(role) = req.role {
        update.set("role", SqlValue::String(role.as_ref().to_string()));
    }
    if let Some(client) = req.assigned_client {
        let value = match non_blank(Some(client)) {
            Some(c) => SqlValue::String(c),
            None => SqlValue::Null,
        };
        update.set("assigned_client", value);
    }
    if let Some(active) = req.is_active {
        update.set("is_active", SqlValue::Bool(active));
        revoke |= !active;
    }
    if let Some(password) = req.password.filter(|p| !p.is_empty()) {
        update.set("password_hash", SqlValue::String(hash_password(&password)?));
        revoke = true;
    }

    let mut tx = pool.begin().await?;
    update.execute(&mut *tx, "id", id).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email already exists".into())
        } else {
            AppError::Database(e)
        }
    })?;
    if revoke {
        revoke_user_sessions(&mut *tx, id).await?;
    }
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Soft delete: the row and its history stay, the account can no longer log in.
pub async fn deactivate(pool: &SqlitePool, actor_id: i64, id: i64) -> Result<(), AppError> {
    if actor_id == id {
        return Err(AppError::Validation("Cannot deactivate your own account".into()));
    }

    let mut tx = pool.begin().await?;
    let res = sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    let revoked = revoke_user_sessions(&mut *tx, id).await?;
    tx.commit().await?;

    info!(user_id = id, actor_id, revoked, "User deactivated");
    Ok(())
}

/// Replaces the password with a fresh temporary one and returns it.
pub async fn reset_password(pool: &SqlitePool, id: i64) -> Result<String, AppError> {
    let temp_password = generate_temp_password();
    let hashed = hash_password(&temp_password)?;

    let mut tx = pool.begin().await?;
    let res = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(hashed)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    revoke_user_sessions(&mut *tx, id).await?;
    tx.commit().await?;

    info!(user_id = id, "Password reset");
    Ok(temp_password)
}
