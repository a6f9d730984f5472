use crate::auth::session::resolve_session;
use crate::config::Config;
use crate::error::AppError;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error};

/// Resolves the session cookie into an `AuthUser` request extension, or
/// answers 401 without reaching the handler.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("App config missing".into()))?;
    let pool = req
        .app_data::<Data<SqlitePool>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("Database pool missing".into()))?;

    let session_id = match req.cookie(&config.session_cookie_name) {
        Some(c) if !c.value().is_empty() => c.value().to_string(),
        _ => {
            debug!(path = %req.path(), "Request without session cookie");
            return Ok(reject(req, AppError::Unauthenticated));
        }
    };

    let auth_user = match resolve_session(pool.get_ref(), &session_id, Utc::now()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!(path = %req.path(), "Unknown, expired or deactivated session");
            return Ok(reject(req, AppError::Unauthenticated));
        }
        Err(e) => {
            error!(error = %e, "Session lookup failed");
            return Ok(reject(req, AppError::Database(e)));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

fn reject(req: ServiceRequest, err: AppError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response())
}
