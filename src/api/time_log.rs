use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::time_log::{DailySummary, TimeLog, TimeLogView},
    service::time_log,
    utils::{query_filter::ListQuery, tabular::csv_attachment},
};

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "message": "Clocked in successfully",
    "clock_in": "2024-01-15T09:00:00Z"
}))]
pub struct ClockInResponse {
    pub message: String,
    #[schema(value_type = String, format = "date-time")]
    pub clock_in: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "message": "Clocked out successfully",
    "clock_out": "2024-01-15T17:30:00Z",
    "total_hours": 8.5
}))]
pub struct ClockOutResponse {
    pub message: String,
    #[schema(value_type = String, format = "date-time")]
    pub clock_out: DateTime<Utc>,
    pub total_hours: f64,
}

#[derive(Serialize, ToSchema)]
pub struct TodayResponse {
    pub time_log: Option<TimeLog>,
}

#[derive(Serialize, ToSchema)]
pub struct TimeLogListResponse {
    pub time_logs: Vec<TimeLogView>,
}

/// Start today's work session
#[utoipa::path(
    post,
    path = "/api/time-logs/clock-in",
    responses(
        (status = 200, description = "Clocked in", body = ClockInResponse),
        (status = 400, description = "Already clocked in today", body = Object, example = json!({
            "error": "Already clocked in today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_cookie" = [])),
    tag = "Time Logs"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, AppError> {
    let clock_in = time_log::clock_in(pool.get_ref(), auth.user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(ClockInResponse {
        message: "Clocked in successfully".into(),
        clock_in,
    }))
}

/// Close today's open work session
#[utoipa::path(
    post,
    path = "/api/time-logs/clock-out",
    responses(
        (status = 200, description = "Clocked out", body = ClockOutResponse),
        (status = 400, description = "Not clocked in, or already clocked out", body = Object, example = json!({
            "error": "Must clock in first"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_cookie" = [])),
    tag = "Time Logs"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, AppError> {
    let out = time_log::clock_out(pool.get_ref(), auth.user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(ClockOutResponse {
        message: "Clocked out successfully".into(),
        clock_out: out.clock_out,
        total_hours: out.total_hours,
    }))
}

/// Caller's entry for today, `null` before the first clock-in
#[utoipa::path(
    get,
    path = "/api/time-logs/today",
    responses(
        (status = 200, description = "Today's entry", body = TodayResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_cookie" = [])),
    tag = "Time Logs"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, AppError> {
    let entry = time_log::entry_for_day(pool.get_ref(), auth.user_id, Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(TodayResponse { time_log: entry }))
}

/// List time logs. Non-admins only ever see their own entries.
#[utoipa::path(
    get,
    path = "/api/time-logs",
    params(ListQuery),
    responses(
        (status = 200, description = "Time logs, newest first", body = TimeLogListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Invalid date format", body = Object, example = json!({
            "error": "Invalid date format, expected YYYY-MM-DD"
        }))
    ),
    security(("session_cookie" = [])),
    tag = "Time Logs"
)]
pub async fn list_time_logs(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, AppError> {
    let filter = query.parse()?;
    let time_logs = time_log::list(pool.get_ref(), &auth, &filter).await?;
    Ok(HttpResponse::Ok().json(TimeLogListResponse { time_logs }))
}

/// Export time logs as CSV (admin)
#[utoipa::path(
    get,
    path = "/api/time-logs/export",
    params(ListQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Time Logs"
)]
pub async fn export_time_logs(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let filter = query.parse()?;
    let body = time_log::export_csv(pool.get_ref(), &filter).await?;
    Ok(csv_attachment(time_log::EXPORT_FILENAME, body))
}

/// Today's totals across all users (admin)
#[utoipa::path(
    get,
    path = "/api/time-logs/summary",
    responses(
        (status = 200, description = "Daily summary", body = DailySummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Time Logs"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let summary = time_log::daily_summary(pool.get_ref(), Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
