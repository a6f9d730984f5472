use crate::{
    auth::{
        auth::AuthUser,
        session::{create_session, removal_cookie, revoke_session, session_cookie},
    },
    config::Config,
    error::AppError,
    models::{LoginReqDto, MessageResponse, RegisterUserReq, UserEnvelope, UserMessageResponse},
    service::user::{self, NewUser},
    utils::username_index::UsernameIndex,
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error, info, instrument};

/// Log in with username and password; sets the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body(content = LoginReqDto, content_type = "application/json"),
    responses(
        (status = 200, description = "Logged in, session cookie set", body = UserMessageResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid credentials"
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, creds),
    fields(username = %creds.username)
)]
pub async fn login(
    creds: web::Json<LoginReqDto>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<impl Responder, AppError> {
    info!("Login request received");

    if creds.username.trim().is_empty() || creds.password.is_empty() {
        debug!("Validation failed: empty username or password");
        return Err(AppError::Validation("Username and password are required".into()));
    }

    let now = Utc::now();
    let user = user::authenticate(pool.get_ref(), &creds.username, &creds.password, now).await?;

    debug!(user_id = user.id, "Creating session");
    let session_id = create_session(pool.get_ref(), &user, config.session_ttl, now).await?;

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&config, session_id))
        .json(UserMessageResponse {
            message: "Login successful".into(),
            user: user.into(),
        }))
}

/// End the current session. Succeeds with or without a live session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out, cookie cleared", body = MessageResponse)
    ),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> impl Responder {
    if let Some(cookie) = req.cookie(&config.session_cookie_name) {
        // revoke is idempotent; a failure here still clears the client cookie
        match revoke_session(pool.get_ref(), cookie.value()).await {
            Ok(revoked) => debug!(revoked, "Session revoked"),
            Err(e) => error!(error = %e, "Failed to revoke session"),
        }
    }

    HttpResponse::Ok()
        .cookie(removal_cookie(&config))
        .json(MessageResponse::new("Logout successful"))
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The logged-in user", body = UserEnvelope),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, pool: web::Data<SqlitePool>) -> Result<impl Responder, AppError> {
    let user = user::find_by_id(pool.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(UserEnvelope { user: user.into() }))
}

/// Register a user with explicit credentials (admin)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body(content = RegisterUserReq, content_type = "application/json"),
    responses(
        (status = 201, description = "User created", body = UserMessageResponse),
        (status = 400, description = "Missing field, or username/email already exists", body = Object, example = json!({
            "error": "Username already exists"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip_all, fields(username = %payload.username))]
pub async fn register(
    auth: AuthUser,
    payload: web::Json<RegisterUserReq>,
    pool: web::Data<SqlitePool>,
    index: web::Data<UsernameIndex>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let req = payload.into_inner();
    let created = user::insert_user(
        pool.get_ref(),
        index.get_ref(),
        NewUser {
            username: req.username,
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role,
            assigned_client: req.assigned_client,
        },
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Created().json(UserMessageResponse {
        message: "User created successfully".into(),
        user: created.into(),
    }))
}
