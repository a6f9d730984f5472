use crate::{
    api::{eod_report, leave_request, time_log, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    login: Limiter,
    protected: Limiter,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min}/min"))?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: Limiters) {
    // Malformed bodies and query strings answer 400 in the usual error shape
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    );

    let Limiters { login, protected } = limiters;

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/auth")
                    // public
                    .service(
                        web::resource("/login")
                            .wrap(login)
                            .route(web::post().to(handlers::login)),
                    )
                    .service(web::resource("/logout").route(web::post().to(handlers::logout)))
                    // session required
                    .service(
                        web::resource("/me")
                            .wrap(from_fn(auth_middleware))
                            .wrap(protected.clone())
                            .route(web::get().to(handlers::me)),
                    )
                    .service(
                        web::resource("/register")
                            .wrap(from_fn(auth_middleware))
                            .wrap(protected.clone())
                            .route(web::post().to(handlers::register)),
                    ),
            )
            .service(
                web::scope("/time-logs")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected.clone())
                    .service(web::resource("/clock-in").route(web::post().to(time_log::clock_in)))
                    .service(web::resource("/clock-out").route(web::post().to(time_log::clock_out)))
                    .service(web::resource("/today").route(web::get().to(time_log::today)))
                    .service(
                        web::resource("/export").route(web::get().to(time_log::export_time_logs)),
                    )
                    .service(web::resource("/summary").route(web::get().to(time_log::summary)))
                    .service(web::resource("").route(web::get().to(time_log::list_time_logs))),
            )
            .service(
                web::scope("/eod-reports")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected.clone())
                    // /eod-reports
                    .service(
                        web::resource("")
                            .route(web::post().to(eod_report::submit_report))
                            .route(web::get().to(eod_report::list_reports)),
                    )
                    .service(web::resource("/today").route(web::get().to(eod_report::today_report)))
                    .service(
                        web::resource("/export").route(web::get().to(eod_report::export_reports)),
                    )
                    // /eod-reports/{id}
                    .service(web::resource("/{id}").route(web::get().to(eod_report::get_report))),
            )
            .service(
                web::scope("/leave-requests")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected.clone())
                    // /leave-requests
                    .service(
                        web::resource("")
                            .route(web::post().to(leave_request::create_leave))
                            .route(web::get().to(leave_request::leave_list)),
                    )
                    // /leave-requests/{id}
                    .service(
                        web::resource("/{id}").route(web::put().to(leave_request::review_leave)),
                    ),
            )
            .service(
                web::scope("/users")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected)
                    // /users
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::deactivate_user)),
                    )
                    // /users/{id}/reset-password
                    .service(
                        web::resource("/{id}/reset-password")
                            .route(web::post().to(user::reset_password)),
                    ),
            ),
    );
}
