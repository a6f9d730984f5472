//! Attendance ledger: the per-user, per-day clock-in/clock-out state machine,
//! scoped listing, the daily summary and CSV export.
//!
//! Day states are `NotStarted` (no row), `Open` (clock-in set, clock-out
//! null) and `Closed` (both set, hours computed). Clocking in on a closed day
//! reopens the same row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::{AppError, ClockError},
    model::time_log::{DailySummary, OwnedTimeLog, TimeLog, TimeLogView},
    utils::{
        query_filter::{ListFilter, Scope, WhereClause},
        tabular::{Column, hours_cell, render_csv, time_cell},
    },
};

const TIME_LOG_COLUMNS: &str = "t.id AS id, t.user_id AS user_id, t.date AS date, \
                                t.clock_in AS clock_in, t.clock_out AS clock_out, \
                                t.total_hours AS total_hours, t.created_at AS created_at";

pub const EXPORT_FILENAME: &str = "time_logs.csv";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ClockOut {
    #[schema(value_type = String, format = "date-time")]
    pub clock_out: DateTime<Utc>,
    #[schema(example = 8.5)]
    pub total_hours: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Hours between two instants, rounded to two decimals.
pub fn elapsed_hours(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>) -> f64 {
    let seconds = (clock_out - clock_in).num_milliseconds() as f64 / 1000.0;
    round2(seconds / 3600.0)
}

/// Opens today's entry. Creates the row on the first clock-in of the day,
/// reopens a closed row, and refuses an already open one.
pub async fn clock_in(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, AppError> {
    let today = now.date_naive();

    // UNIQUE(user_id, date) + conditional update: the open-day check and the
    // write are one statement, so concurrent clock-ins cannot both succeed.
    let result = sqlx::query(
        r#"
        INSERT INTO time_logs (user_id, date, clock_in, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, date) DO UPDATE
            SET clock_in = excluded.clock_in,
                clock_out = NULL,
                total_hours = NULL
            WHERE time_logs.clock_in IS NULL
               OR time_logs.clock_out IS NOT NULL
        "#,
    )
    .bind(user_id)
    .bind(today)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ClockError::AlreadyOpen.into());
    }

    info!(user_id, %today, "Clocked in");
    Ok(now)
}

/// Closes today's open entry and stores the elapsed hours.
pub async fn clock_out(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<ClockOut, AppError> {
    let today = now.date_naive();
    let mut tx = pool.begin().await?;

    let sql = format!("SELECT {TIME_LOG_COLUMNS} FROM time_logs t WHERE t.user_id = ? AND t.date = ?");
    let entry = sqlx::query_as::<_, TimeLog>(&sql)
        .bind(user_id)
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

    let (id, clock_in) = match entry {
        Some(TimeLog {
            clock_out: Some(_), ..
        }) => return Err(ClockError::AlreadyClosed.into()),
        Some(TimeLog {
            id,
            clock_in: Some(clock_in),
            ..
        }) => (id, clock_in),
        _ => return Err(ClockError::NotOpen.into()),
    };

    let total_hours = elapsed_hours(clock_in, now);

    let result = sqlx::query(
        r#"
        UPDATE time_logs
        SET clock_out = ?, total_hours = ?
        WHERE id = ? AND clock_out IS NULL
        "#,
    )
    .bind(now)
    .bind(total_hours)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ClockError::AlreadyClosed.into());
    }

    tx.commit().await?;

    info!(user_id, %today, total_hours, "Clocked out");
    Ok(ClockOut {
        clock_out: now,
        total_hours,
    })
}

/// The caller's entry for `day`, or `None` when the day has not started.
pub async fn entry_for_day(
    pool: &SqlitePool,
    user_id: i64,
    day: NaiveDate,
) -> Result<Option<TimeLog>, AppError> {
    let sql = format!("SELECT {TIME_LOG_COLUMNS} FROM time_logs t WHERE t.user_id = ? AND t.date = ?");
    Ok(sqlx::query_as::<_, TimeLog>(&sql)
        .bind(user_id)
        .bind(day)
        .fetch_optional(pool)
        .await?)
}

async fn fetch_owned(
    pool: &SqlitePool,
    scope: Scope,
    filter: &ListFilter,
) -> Result<Vec<OwnedTimeLog>, AppError> {
    let clause = WhereClause::scoped(scope, filter, "t.user_id", "t.date");
    let sql = format!(
        r#"
        SELECT {TIME_LOG_COLUMNS},
               u.username AS owner_username,
               u.first_name AS owner_first_name,
               u.last_name AS owner_last_name
        FROM time_logs t
        JOIN users u ON u.id = t.user_id
        {}
        ORDER BY t.date DESC, t.id DESC
        "#,
        clause.sql()
    );

    let rows = clause
        .bind(sqlx::query_as::<_, OwnedTimeLog>(&sql))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Role-scoped listing; admins get the owner attached to each row.
pub async fn list(
    pool: &SqlitePool,
    caller: &AuthUser,
    filter: &ListFilter,
) -> Result<Vec<TimeLogView>, AppError> {
    let with_owner = caller.is_admin();
    let rows = fetch_owned(pool, Scope::for_caller(caller), filter).await?;
    Ok(rows.into_iter().map(|r| r.into_view(with_owner)).collect())
}

pub async fn daily_summary(pool: &SqlitePool, today: NaiveDate) -> Result<DailySummary, AppError> {
    let (total_hours, active, clocked_in): (f64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            CAST(COALESCE(SUM(total_hours), 0) AS REAL),
            COUNT(clock_in),
            COALESCE(SUM(CASE WHEN clock_in IS NOT NULL AND clock_out IS NULL THEN 1 ELSE 0 END), 0)
        FROM time_logs
        WHERE date = ?
        "#,
    )
    .bind(today)
    .fetch_one(pool)
    .await?;

    Ok(DailySummary {
        total_hours_today: round2(total_hours),
        active_users_today: active,
        clocked_in_now: clocked_in,
    })
}

fn export_columns() -> Vec<Column<OwnedTimeLog>> {
    vec![
        Column::new("Date", |r: &OwnedTimeLog| r.log.date.format("%Y-%m-%d").to_string()),
        Column::new("Employee", |r: &OwnedTimeLog| r.employee_name()),
        Column::new("Clock In", |r: &OwnedTimeLog| time_cell(r.log.clock_in)),
        Column::new("Clock Out", |r: &OwnedTimeLog| time_cell(r.log.clock_out)),
        Column::new("Total Hours", |r: &OwnedTimeLog| hours_cell(r.log.total_hours)),
    ]
}

/// CSV of every matching entry, newest day first.
pub async fn export_csv(pool: &SqlitePool, filter: &ListFilter) -> Result<Vec<u8>, AppError> {
    let rows = fetch_owned(pool, Scope::All, filter).await?;
    render_csv(&export_columns(), &rows)
}
