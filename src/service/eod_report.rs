use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::eod_report::{EodReport, EodReportView, OwnedEodReport},
    models::EodReportReq,
    utils::{
        query_filter::{ListFilter, Scope, WhereClause},
        tabular::{Column, render_csv, text_cell},
    },
};

const EOD_COLUMNS: &str = "r.id AS id, r.user_id AS user_id, r.date AS date, \
                           r.tasks_completed AS tasks_completed, r.blockers AS blockers, \
                           r.issues AS issues, r.support_needed AS support_needed, \
                           r.created_at AS created_at";

pub const EXPORT_FILENAME: &str = "eod_reports.csv";

/// Stores today's report, replacing an earlier submission for the same day.
pub async fn submit(
    pool: &SqlitePool,
    user_id: i64,
    req: EodReportReq,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if req.tasks_completed.trim().is_empty() {
        return Err(AppError::Validation("tasks_completed is required".into()));
    }
    let today = now.date_naive();

    sqlx::query(
        r#"
        INSERT INTO eod_reports (user_id, date, tasks_completed, blockers, issues, support_needed, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, date) DO UPDATE
            SET tasks_completed = excluded.tasks_completed,
                blockers = excluded.blockers,
                issues = excluded.issues,
                support_needed = excluded.support_needed,
                created_at = excluded.created_at
        "#,
    )
    .bind(user_id)
    .bind(today)
    .bind(req.tasks_completed)
    .bind(req.blockers.unwrap_or_default())
    .bind(req.issues.unwrap_or_default())
    .bind(req.support_needed.unwrap_or_default())
    .bind(now)
    .execute(pool)
    .await?;

    info!(user_id, %today, "EOD report submitted");
    Ok(())
}

pub async fn report_for_day(
    pool: &SqlitePool,
    user_id: i64,
    day: NaiveDate,
) -> Result<Option<EodReport>, AppError> {
    let sql = format!("SELECT {EOD_COLUMNS} FROM eod_reports r WHERE r.user_id = ? AND r.date = ?");
    Ok(sqlx::query_as::<_, EodReport>(&sql)
        .bind(user_id)
        .bind(day)
        .fetch_optional(pool)
        .await?)
}

fn owned_select(where_sql: &str) -> String {
    format!(
        r#"
        SELECT {EOD_COLUMNS},
               u.username AS owner_username,
               u.first_name AS owner_first_name,
               u.last_name AS owner_last_name
        FROM eod_reports r
        JOIN users u ON u.id = r.user_id
        {where_sql}
        ORDER BY r.date DESC, r.id DESC
        "#
    )
}

async fn fetch_owned(
    pool: &SqlitePool,
    scope: Scope,
    filter: &ListFilter,
) -> Result<Vec<OwnedEodReport>, AppError> {
    let clause = WhereClause::scoped(scope, filter, "r.user_id", "r.date");
    let sql = owned_select(&clause.sql());
    Ok(clause
        .bind(sqlx::query_as::<_, OwnedEodReport>(&sql))
        .fetch_all(pool)
        .await?)
}

pub async fn list(
    pool: &SqlitePool,
    caller: &AuthUser,
    filter: &ListFilter,
) -> Result<Vec<EodReportView>, AppError> {
    let with_owner = caller.is_admin();
    let rows = fetch_owned(pool, Scope::for_caller(caller), filter).await?;
    Ok(rows.into_iter().map(|r| r.into_view(with_owner)).collect())
}

/// Single report with its author, for admins.
pub async fn get(pool: &SqlitePool, id: i64) -> Result<EodReportView, AppError> {
    let sql = owned_select("WHERE r.id = ?");
    sqlx::query_as::<_, OwnedEodReport>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|r| r.into_view(true))
        .ok_or_else(|| AppError::NotFound("EOD report not found".into()))
}

fn export_columns() -> Vec<Column<OwnedEodReport>> {
    vec![
        Column::new("Date", |r: &OwnedEodReport| r.report.date.format("%Y-%m-%d").to_string()),
        Column::new("Employee", |r: &OwnedEodReport| r.employee_name()),
        Column::new("Tasks Completed", |r: &OwnedEodReport| r.report.tasks_completed.clone()),
        Column::new("Blockers", |r: &OwnedEodReport| text_cell(r.report.blockers.as_deref())),
        Column::new("Issues", |r: &OwnedEodReport| text_cell(r.report.issues.as_deref())),
        Column::new("Support Needed", |r: &OwnedEodReport| {
            text_cell(r.report.support_needed.as_deref())
        }),
    ]
}

pub async fn export_csv(pool: &SqlitePool, filter: &ListFilter) -> Result<Vec<u8>, AppError> {
    let rows = fetch_owned(pool, Scope::All, filter).await?;
    render_csv(&export_columns(), &rows)
}
