#![allow(dead_code)]

use actix_web::{cookie::Cookie, dev::ServiceResponse, test::TestRequest, web::Data};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use std::net::SocketAddr;

use staffdesk::{
    config::Config,
    db::{connect_in_memory, ensure_bootstrap_admin},
    model::role::Role,
    service::user::{NewUser, find_by_username, insert_user},
    utils::username_index::UsernameIndex,
};

pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const VA_PASSWORD: &str = "va-pass-123";
pub const COOKIE_NAME: &str = "staffdesk_session";

pub struct TestCtx {
    pub pool: SqlitePool,
    pub config: Config,
    pub index: Data<UsernameIndex>,
    pub admin_id: i64,
    pub va_id: i64,
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        server_addr: "127.0.0.1:0".into(),
        db_max_connections: 1,
        session_ttl: 3600,
        session_cookie_name: COOKIE_NAME.into(),
        cookie_secure: false,
        rate_login_per_min: 10_000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".into(),
        bootstrap_admin_username: "admin".into(),
        bootstrap_admin_email: "admin@example.com".into(),
        bootstrap_admin_password: Some(ADMIN_PASSWORD.into()),
    }
}

/// Fresh in-memory store with one admin (`admin`) and one VA (`vera`).
pub async fn setup() -> TestCtx {
    let pool = connect_in_memory().await.unwrap();
    let config = test_config();
    let index = Data::new(UsernameIndex::new());

    ensure_bootstrap_admin(&pool, &config).await.unwrap();
    index.warmup(&pool, 10).await.unwrap();
    let admin_id = find_by_username(&pool, "admin").await.unwrap().unwrap().id;

    let va = insert_user(
        &pool,
        &index,
        NewUser {
            username: "vera".into(),
            email: "vera@example.com".into(),
            password: VA_PASSWORD.into(),
            first_name: "Vera".into(),
            last_name: "Assistant".into(),
            role: Role::Va,
            assigned_client: Some("Acme".into()),
        },
        Utc::now(),
    )
    .await
    .unwrap();

    TestCtx {
        pool,
        config,
        index,
        admin_id,
        va_id: va.id,
    }
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

// The rate limiter keys on the peer address, so every request carries one.
pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri).peer_addr(peer())
}

pub fn post(uri: &str) -> TestRequest {
    TestRequest::post().uri(uri).peer_addr(peer())
}

pub fn put(uri: &str) -> TestRequest {
    TestRequest::put().uri(uri).peer_addr(peer())
}

pub fn delete(uri: &str) -> TestRequest {
    TestRequest::delete().uri(uri).peer_addr(peer())
}

pub fn login_request(username: &str, password: &str) -> TestRequest {
    post("/api/auth/login").set_json(json!({ "username": username, "password": password }))
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == COOKIE_NAME)
        .map(|c| c.into_owned())
}

macro_rules! spawn_app {
    ($ctx:expr) => {{
        let ctx = &$ctx;
        let config = ctx.config.clone();
        let limiters = staffdesk::routes::Limiters::from_config(&config).unwrap();
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::NormalizePath::trim())
                .app_data(actix_web::web::Data::new(ctx.pool.clone()))
                .app_data(actix_web::web::Data::new(config.clone()))
                .app_data(ctx.index.clone())
                .configure(move |cfg| staffdesk::routes::configure(cfg, &config, limiters)),
        )
        .await
    }};
}

/// Logs in and yields the session cookie.
macro_rules! login {
    ($app:expr, $user:expr, $password:expr) => {{
        let resp = actix_web::test::call_service(
            &$app,
            common::login_request($user, $password).to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK, "login failed");
        common::session_cookie(&resp).expect("session cookie")
    }};
}
