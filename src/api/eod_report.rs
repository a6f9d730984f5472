use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::eod_report::{EodReport, EodReportView},
    models::{EodReportReq, MessageResponse},
    service::eod_report,
    utils::{query_filter::ListQuery, tabular::csv_attachment},
};

#[derive(Serialize, ToSchema)]
pub struct EodTodayResponse {
    pub eod_report: Option<EodReport>,
}

#[derive(Serialize, ToSchema)]
pub struct EodReportListResponse {
    pub eod_reports: Vec<EodReportView>,
}

#[derive(Serialize, ToSchema)]
pub struct EodReportResponse {
    pub eod_report: EodReportView,
}

/// Submit (or replace) today's end-of-day report
#[utoipa::path(
    post,
    path = "/api/eod-reports",
    request_body(content = EodReportReq, content_type = "application/json"),
    responses(
        (status = 201, description = "Report stored", body = MessageResponse, example = json!({
            "message": "EOD report submitted successfully"
        })),
        (status = 400, description = "tasks_completed missing"),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_cookie" = [])),
    tag = "EOD Reports"
)]
pub async fn submit_report(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<EodReportReq>,
) -> Result<impl Responder, AppError> {
    eod_report::submit(pool.get_ref(), auth.user_id, payload.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(MessageResponse::new("EOD report submitted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/eod-reports/today",
    responses(
        (status = 200, description = "Today's report or null", body = EodTodayResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_cookie" = [])),
    tag = "EOD Reports"
)]
pub async fn today_report(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, AppError> {
    let report =
        eod_report::report_for_day(pool.get_ref(), auth.user_id, Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(EodTodayResponse { eod_report: report }))
}

#[utoipa::path(
    get,
    path = "/api/eod-reports",
    params(ListQuery),
    responses(
        (status = 200, description = "Reports, newest first", body = EodReportListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Invalid date format")
    ),
    security(("session_cookie" = [])),
    tag = "EOD Reports"
)]
pub async fn list_reports(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, AppError> {
    let filter = query.parse()?;
    let eod_reports = eod_report::list(pool.get_ref(), &auth, &filter).await?;
    Ok(HttpResponse::Ok().json(EodReportListResponse { eod_reports }))
}

/// Export EOD reports as CSV (admin)
#[utoipa::path(
    get,
    path = "/api/eod-reports/export",
    params(ListQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "EOD Reports"
)]
pub async fn export_reports(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let filter = query.parse()?;
    let body = eod_report::export_csv(pool.get_ref(), &filter).await?;
    Ok(csv_attachment(eod_report::EXPORT_FILENAME, body))
}

#[utoipa::path(
    get,
    path = "/api/eod-reports/{id}",
    params(("id" = i64, Path, description = "EOD report id")),
    responses(
        (status = 200, description = "Report with its author", body = EodReportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found", body = Object, example = json!({
            "error": "EOD report not found"
        }))
    ),
    security(("session_cookie" = [])),
    tag = "EOD Reports"
)]
pub async fn get_report(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let report = eod_report::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(EodReportResponse { eod_report: report }))
}
