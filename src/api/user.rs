use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::user::PublicUser,
    models::{CreateUserReq, MessageResponse, UpdateUserReq, UserMessageResponse},
    service::user,
    utils::username_index::UsernameIndex,
};

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<PublicUser>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "message": "User created successfully",
    "user": {"id": 2, "username": "jane", "email": "jane@example.com", "role": "va",
             "first_name": "Jane", "last_name": "Doe", "assigned_client": null,
             "is_active": true, "created_at": "2024-01-01T08:00:00Z", "last_login": null},
    "username": "jane",
    "temp_password": "a1B2c3D4e5F6"
}))]
pub struct CreatedUserResponse {
    pub message: String,
    pub user: PublicUser,
    pub username: String,
    pub temp_password: String,
}

#[derive(Serialize, ToSchema)]
pub struct PasswordResetResponse {
    pub message: String,
    pub temp_password: String,
}

/// List all users (admin)
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users, inactive included", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let users = user::list_all(pool.get_ref())
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    Ok(HttpResponse::Ok().json(UserListResponse { users }))
}

/// Create a user with a generated username and temporary password (admin)
#[utoipa::path(
    post,
    path = "/api/users",
    request_body(content = CreateUserReq, content_type = "application/json"),
    responses(
        (status = 201, description = "User created", body = CreatedUserResponse),
        (status = 400, description = "Missing field or email already exists", body = Object, example = json!({
            "error": "Email already exists"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    index: web::Data<UsernameIndex>,
    payload: web::Json<CreateUserReq>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let (created, temp_password) = user::create_with_generated_credentials(
        pool.get_ref(),
        index.get_ref(),
        payload.into_inner(),
        Utc::now(),
    )
    .await?;

    let username = created.username.clone();
    Ok(HttpResponse::Created().json(CreatedUserResponse {
        message: "User created successfully".into(),
        user: created.into(),
        username,
        temp_password,
    }))
}

/// Update a user (admin)
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body(content = UpdateUserReq, content_type = "application/json"),
    responses(
        (status = 200, description = "User updated", body = UserMessageResponse),
        (status = 400, description = "Email already exists or self-deactivation"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateUserReq>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let updated = user::update(
        pool.get_ref(),
        auth.user_id,
        path.into_inner(),
        payload.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(UserMessageResponse {
        message: "User updated successfully".into(),
        user: updated.into(),
    }))
}

/// Deactivate a user (admin). The account and its history are kept.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated", body = MessageResponse),
        (status = 400, description = "Cannot deactivate your own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn deactivate_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    user::deactivate(pool.get_ref(), auth.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deactivated successfully")))
}

/// Issue a new temporary password (admin)
#[utoipa::path(
    post,
    path = "/api/users/{id}/reset-password",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Password reset", body = PasswordResetResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn reset_password(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let temp_password = user::reset_password(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PasswordResetResponse {
        message: "Password reset successfully".into(),
        temp_password,
    }))
}
