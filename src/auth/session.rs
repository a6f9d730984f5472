use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use chrono::{DateTime, Duration, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{auth::auth::AuthUser, config::Config, model::user::User};

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: String,
    user_id: i64,
    username: String,
    #[sqlx(try_from = "String")]
    role: crate::model::role::Role,
}

/// Opens a server-side session for `user` and returns its opaque id.
pub async fn create_session<'e, E>(
    exec: E,
    user: &User,
    ttl_secs: i64,
    now: DateTime<Utc>,
) -> Result<String, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4().to_string();
    let expires_at = now + Duration::seconds(ttl_secs);

    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, role, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user.id)
    .bind(user.role.as_ref())
    .bind(now)
    .bind(expires_at)
    .execute(exec)
    .await?;

    Ok(id)
}

/// Resolves a session id to its caller. The role comes from the user row,
/// not the session, so role changes apply on the next request.
pub async fn resolve_session(
    pool: &SqlitePool,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<AuthUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT s.id AS session_id, u.id AS user_id, u.username, u.role
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.id = ?
          AND s.expires_at > ?
          AND u.is_active = 1
        "#,
    )
    .bind(session_id)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| AuthUser {
        user_id: r.user_id,
        username: r.username,
        role: r.role,
        session_id: r.session_id,
    }))
}

pub async fn revoke_session(pool: &SqlitePool, session_id: &str) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn revoke_user_sessions<'e, E>(exec: E, user_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(exec)
        .await?;
    Ok(res.rows_affected())
}

pub fn session_cookie(config: &Config, session_id: String) -> Cookie<'static> {
    Cookie::build(config.session_cookie_name.clone(), session_id)
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(config.session_ttl))
        .finish()
}

pub fn removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build(config.session_cookie_name.clone(), "")
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .finish()
}
