use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::leave_request::{LeaveRequestView, LeaveStatus},
    models::{CreateLeaveReq, ReviewLeaveReq},
    service::leave_request,
    utils::query_filter::ListQuery,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    /// Filter by requester (admin only)
    #[param(value_type = Option<i64>)]
    pub user_id: Option<String>,
    /// Earliest start date, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Latest start date, `YYYY-MM-DD`
    pub end_date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub leave_requests: Vec<LeaveRequestView>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveMessageResponse {
    pub message: String,
    pub request: LeaveRequestView,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body(
        content = CreateLeaveReq,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveMessageResponse),
        (status = 400, description = "Bad dates or missing reason", body = Object, example = json!({
            "error": "Start date cannot be after end date"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_cookie" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateLeaveReq>,
) -> Result<impl Responder, AppError> {
    let request =
        leave_request::submit(pool.get_ref(), auth.user_id, payload.into_inner(), Utc::now()).await?;

    Ok(HttpResponse::Created().json(LeaveMessageResponse {
        message: "Leave request submitted".into(),
        request,
    }))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-requests",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests by start date, newest first", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Invalid date format")
    ),
    security(("session_cookie" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, AppError> {
    let LeaveFilter {
        status,
        user_id,
        start_date,
        end_date,
    } = query.into_inner();

    let filter = ListQuery {
        user_id,
        start_date,
        end_date,
    }
    .parse()?;

    let leave_requests = leave_request::list(pool.get_ref(), &auth, &filter, status).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse { leave_requests }))
}

/* =========================
Review leave (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave-requests/{id}",
    params(("id" = i64, Path, description = "ID of the leave request to review")),
    request_body(content = ReviewLeaveReq, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave request updated", body = LeaveMessageResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "error": "Leave request not found"
        }))
    ),
    security(("session_cookie" = [])),
    tag = "Leave"
)]
pub async fn review_leave(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<ReviewLeaveReq>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let request = leave_request::review(
        pool.get_ref(),
        auth.user_id,
        path.into_inner(),
        payload.into_inner(),
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(LeaveMessageResponse {
        message: "Leave request updated".into(),
        request,
    }))
}
