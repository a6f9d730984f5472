#[macro_use]
mod common;

use actix_web::{
    cookie::time::Duration as CookieDuration,
    http::{StatusCode, header},
    test,
};
use serde_json::{Value, json};

use common::{ADMIN_PASSWORD, VA_PASSWORD, delete, get, post, put};

#[actix_web::test]
async fn login_sets_http_only_session_cookie() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);

    let resp = test::call_service(&app, common::login_request("vera", VA_PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = common::session_cookie(&resp).expect("cookie set");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["username"], "vera");
    assert_eq!(body["user"]["role"], "va");
    assert!(body["user"].get("password_hash").is_none());
}

#[actix_web::test]
async fn login_failures() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);

    let resp = test::call_service(&app, common::login_request("vera", "wrong").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Invalid credentials" }));

    let resp = test::call_service(&app, common::login_request("", "").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        post("/api/auth/login")
            .set_json(json!({ "username": "vera", "password": VA_PASSWORD, "remember": true }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "unknown fields are refused");
}

#[actix_web::test]
async fn requests_without_session_are_rejected() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);

    let resp = test::call_service(&app, get("/api/time-logs").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Authentication required" }));

    let resp = test::call_service(
        &app,
        get("/api/auth/me")
            .cookie(actix_web::cookie::Cookie::new(common::COOKIE_NAME, "not-a-session"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn logout_ends_the_session_and_is_idempotent() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let cookie = login!(app, "vera", VA_PASSWORD);

    let resp = test::call_service(&app, get("/api/auth/me").cookie(cookie.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["id"], ctx.va_id);

    let resp = test::call_service(&app, post("/api/auth/logout").cookie(cookie.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let removal = common::session_cookie(&resp).expect("removal cookie");
    assert_eq!(removal.max_age(), Some(CookieDuration::ZERO));

    let resp = test::call_service(&app, get("/api/auth/me").cookie(cookie.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, post("/api/auth/logout").cookie(cookie).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, post("/api/auth/logout").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn clock_in_out_cycle() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let cookie = login!(app, "vera", VA_PASSWORD);

    let resp = test::call_service(&app, get("/api/time-logs/today").cookie(cookie.clone()).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "time_log": null }));

    let resp = test::call_service(
        &app,
        post("/api/time-logs/clock-out").cookie(cookie.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Must clock in first");

    let resp = test::call_service(&app, post("/api/time-logs/clock-in").cookie(cookie.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Clocked in successfully");
    assert!(body["clock_in"].is_string());

    let resp = test::call_service(&app, post("/api/time-logs/clock-in").cookie(cookie.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Already clocked in today");

    let resp = test::call_service(&app, post("/api/time-logs/clock-out").cookie(cookie.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Clocked out successfully");
    assert!(body["total_hours"].as_f64().unwrap() >= 0.0);

    let resp = test::call_service(&app, post("/api/time-logs/clock-out").cookie(cookie.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Already clocked out today");

    let resp = test::call_service(&app, get("/api/time-logs/today").cookie(cookie).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["time_log"]["user_id"], ctx.va_id);
    assert!(body["time_log"]["clock_out"].is_string());
}

#[actix_web::test]
async fn listing_is_scoped_by_role() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let admin = login!(app, "admin", ADMIN_PASSWORD);
    let va = login!(app, "vera", VA_PASSWORD);

    for cookie in [&admin, &va] {
        let resp = test::call_service(
            &app,
            post("/api/time-logs/clock-in").cookie(cookie.clone()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let uri = format!("/api/time-logs?user_id={}", ctx.admin_id);
    let resp = test::call_service(&app, get(&uri).cookie(va.clone()).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let logs = body["time_logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["user_id"], ctx.va_id);
    assert!(logs[0].get("user").is_none());

    let resp = test::call_service(&app, get("/api/time-logs").cookie(admin.clone()).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let logs = body["time_logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l["user"]["username"].is_string()));

    let resp = test::call_service(&app, get(&uri).cookie(admin).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["time_logs"].as_array().unwrap().len(), 1);
    assert_eq!(body["time_logs"][0]["user"]["username"], "admin");
}

#[actix_web::test]
async fn malformed_date_filter_is_a_server_error() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let va = login!(app, "vera", VA_PASSWORD);

    let resp = test::call_service(
        &app,
        get("/api/time-logs?start_date=15-01-2024").cookie(va).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid date format, expected YYYY-MM-DD");
}

#[actix_web::test]
async fn blank_filters_are_ignored() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let admin = login!(app, "admin", ADMIN_PASSWORD);
    let va = login!(app, "vera", VA_PASSWORD);

    let resp = test::call_service(&app, post("/api/time-logs/clock-in").cookie(va).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    for uri in [
        "/api/time-logs?user_id=&start_date=&end_date=",
        "/api/eod-reports?user_id=&start_date=&end_date=",
        "/api/leave-requests?user_id=&start_date=&end_date=",
        "/api/time-logs/export?user_id=",
    ] {
        let resp = test::call_service(&app, get(uri).cookie(admin.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }

    let resp = test::call_service(
        &app,
        get("/api/time-logs?user_id=").cookie(admin.clone()).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["time_logs"].as_array().unwrap().len(), 1);

    let resp = test::call_service(
        &app,
        get("/api/time-logs?user_id=abc").cookie(admin).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "user_id must be an integer");
}

#[actix_web::test]
async fn summary_and_export_are_admin_only() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let admin = login!(app, "admin", ADMIN_PASSWORD);
    let va = login!(app, "vera", VA_PASSWORD);

    for uri in ["/api/time-logs/summary", "/api/time-logs/export", "/api/eod-reports/export"] {
        let resp = test::call_service(&app, get(uri).cookie(va.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Admin access required");
    }

    test::call_service(&app, post("/api/time-logs/clock-in").cookie(va.clone()).to_request()).await;

    let resp = test::call_service(&app, get("/api/time-logs/summary").cookie(admin.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["active_users_today"], 1);
    assert_eq!(body["clocked_in_now"], 1);
    assert_eq!(body["total_hours_today"], 0.0);

    let resp = test::call_service(&app, get("/api/time-logs/export").cookie(admin).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/csv"));
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("time_logs.csv"));

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Date,Employee,Clock In,Clock Out,Total Hours"));
    let row = lines.next().unwrap();
    assert!(row.contains("Vera Assistant"));
    assert!(row.ends_with(",,"), "open entry has no clock-out or hours: {row}");
}

#[actix_web::test]
async fn eod_report_flow() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let admin = login!(app, "admin", ADMIN_PASSWORD);
    let va = login!(app, "vera", VA_PASSWORD);

    let resp = test::call_service(
        &app,
        post("/api/eod-reports")
            .cookie(va.clone())
            .set_json(json!({ "tasks_completed": "" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    for tasks in ["Inbox zero", "Inbox zero, 3 calls"] {
        let resp = test::call_service(
            &app,
            post("/api/eod-reports")
                .cookie(va.clone())
                .set_json(json!({ "tasks_completed": tasks, "blockers": "None" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = test::call_service(&app, get("/api/eod-reports/today").cookie(va.clone()).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["eod_report"]["tasks_completed"], "Inbox zero, 3 calls");
    let id = body["eod_report"]["id"].as_i64().unwrap();

    let resp = test::call_service(&app, get("/api/eod-reports").cookie(admin.clone()).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["eod_reports"].as_array().unwrap().len(), 1);

    let resp = test::call_service(
        &app,
        get(&format!("/api/eod-reports/{id}")).cookie(va).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        get(&format!("/api/eod-reports/{id}")).cookie(admin.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["eod_report"]["user"]["username"], "vera");

    let resp = test::call_service(&app, get("/api/eod-reports/9999").cookie(admin).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn leave_request_review_flow() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let admin = login!(app, "admin", ADMIN_PASSWORD);
    let va = login!(app, "vera", VA_PASSWORD);

    let resp = test::call_service(
        &app,
        post("/api/leave-requests")
            .cookie(va.clone())
            .set_json(json!({ "start_date": "2024-06-10", "end_date": "2024-06-01", "reason": "Trip" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        post("/api/leave-requests")
            .cookie(va.clone())
            .set_json(json!({ "start_date": "2024-06-01", "end_date": "2024-06-10", "reason": "Trip" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["request"]["status"], "pending");
    let id = body["request"]["id"].as_i64().unwrap();

    let uri = format!("/api/leave-requests/{id}");
    let resp = test::call_service(
        &app,
        put(&uri).cookie(va.clone()).set_json(json!({ "status": "approved" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        put(&uri)
            .cookie(admin.clone())
            .set_json(json!({ "status": "approved", "admin_notes": "Have fun" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["request"]["status"], "approved");
    assert_eq!(body["request"]["reviewed_by"], ctx.admin_id);
    assert_eq!(body["request"]["reviewer"]["username"], "admin");

    let resp = test::call_service(
        &app,
        get("/api/leave-requests?status=approved").cookie(va.clone()).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["leave_requests"].as_array().unwrap().len(), 1);

    let resp = test::call_service(
        &app,
        get("/api/leave-requests?status=pending").cookie(va).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert!(body["leave_requests"].as_array().unwrap().is_empty());

    let resp = test::call_service(
        &app,
        put("/api/leave-requests/9999")
            .cookie(admin)
            .set_json(json!({ "status": "denied" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn user_administration() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let admin = login!(app, "admin", ADMIN_PASSWORD);

    let resp = test::call_service(
        &app,
        post("/api/users")
            .cookie(admin.clone())
            .set_json(json!({
                "first_name": "Vera",
                "last_name": "Second",
                "email": "vera@another.com",
                "role": "va"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "vera1");
    let temp_password = body["temp_password"].as_str().unwrap().to_string();
    assert_eq!(temp_password.len(), 12);
    let new_id = body["user"]["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        post("/api/users")
            .cookie(admin.clone())
            .set_json(json!({
                "first_name": "Dup",
                "last_name": "Email",
                "email": "vera@another.com",
                "role": "va"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let newcomer = login!(app, "vera1", &temp_password);

    let resp = test::call_service(&app, get("/api/users").cookie(newcomer.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        delete(&format!("/api/users/{new_id}")).cookie(admin.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, get("/api/auth/me").cookie(newcomer).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "deactivation ends live sessions");

    let resp = test::call_service(&app, common::login_request("vera1", &temp_password).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        delete(&format!("/api/users/{}", ctx.admin_id)).cookie(admin.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Cannot deactivate your own account");

    let resp = test::call_service(
        &app,
        put(&format!("/api/users/{}", ctx.admin_id))
            .cookie(admin.clone())
            .set_json(json!({ "is_active": false }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Cannot deactivate your own account");

    let resp = test::call_service(&app, get("/api/auth/me").cookie(admin.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK, "own session survives");
    let resp = test::call_service(&app, common::login_request("admin", ADMIN_PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, get("/api/users").cookie(admin).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().any(|u| u["username"] == "vera1" && u["is_active"] == false));
}

#[actix_web::test]
async fn reset_password_and_register() {
    let ctx = common::setup().await;
    let app = spawn_app!(ctx);
    let admin = login!(app, "admin", ADMIN_PASSWORD);
    let va = login!(app, "vera", VA_PASSWORD);

    let resp = test::call_service(
        &app,
        post("/api/auth/register")
            .cookie(va.clone())
            .set_json(json!({
                "username": "sam", "email": "sam@example.com", "password": "pw-sam-123",
                "first_name": "Sam", "last_name": "Lee", "role": "va"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        post("/api/auth/register")
            .cookie(admin.clone())
            .set_json(json!({
                "username": "Vera", "email": "other@example.com", "password": "pw-123456",
                "first_name": "V", "last_name": "Dup", "role": "va"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Username already exists");

    let resp = test::call_service(
        &app,
        post(&format!("/api/users/{}/reset-password", ctx.va_id))
            .cookie(admin)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let temp = body["temp_password"].as_str().unwrap().to_string();

    let resp = test::call_service(&app, get("/api/auth/me").cookie(va).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    login!(app, "vera", &temp);
}
