use crate::api::eod_report::{EodReportListResponse, EodReportResponse, EodTodayResponse};
use crate::api::leave_request::{LeaveListResponse, LeaveMessageResponse};
use crate::api::time_log::{
    ClockInResponse, ClockOutResponse, TimeLogListResponse, TodayResponse,
};
use crate::api::user::{CreatedUserResponse, PasswordResetResponse, UserListResponse};
use crate::model::eod_report::{EodReport, EodReportView};
use crate::model::leave_request::{LeaveRequest, LeaveRequestView, LeaveStatus};
use crate::model::role::Role;
use crate::model::time_log::{DailySummary, TimeLog, TimeLogView};
use crate::model::user::{PublicUser, UserSummary};
use crate::config::{Config, DEFAULT_SESSION_COOKIE};
use crate::models::{
    CreateLeaveReq, CreateUserReq, EodReportReq, LoginReqDto, MessageResponse, RegisterUserReq,
    ReviewLeaveReq, UpdateUserReq, UserEnvelope, UserMessageResponse,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

/// Registers the session cookie as the security scheme the paths refer to.
pub struct SessionCookieAddon<'a> {
    pub cookie_name: &'a str,
}

impl Modify for SessionCookieAddon<'_> {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(self.cookie_name))),
        );
    }
}

/// The addon applied at derive time; `modifiers(...)` only accepts an identifier.
const DEFAULT_COOKIE_ADDON: SessionCookieAddon<'static> = SessionCookieAddon {
    cookie_name: DEFAULT_SESSION_COOKIE,
};

/// The document as served: the scheme names the configured cookie.
pub fn openapi_for(config: &Config) -> openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    SessionCookieAddon {
        cookie_name: &config.session_cookie_name,
    }
    .modify(&mut doc);
    doc
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staffdesk API",
        version = "1.0.0",
        description = r#"
## Staff management backend

Internal API for a small remote team of admins and virtual assistants (VAs).

### Features
- **Auth**: session-cookie login, logout, current user, admin registration
- **Time logs**: daily clock-in/clock-out, listing, CSV export, daily summary
- **EOD reports**: one end-of-day report per user per day, listing, CSV export
- **Leave**: leave requests and admin review
- **Users**: admin user management with generated credentials

### Security
Log in through `/api/auth/login`; the response sets an HttpOnly session cookie that
authenticates every other call. VAs only ever see their own records.

### Errors
Every error body is `{"error": "<message>"}`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        crate::auth::handlers::register,

        crate::api::time_log::clock_in,
        crate::api::time_log::clock_out,
        crate::api::time_log::today,
        crate::api::time_log::list_time_logs,
        crate::api::time_log::export_time_logs,
        crate::api::time_log::summary,

        crate::api::eod_report::submit_report,
        crate::api::eod_report::today_report,
        crate::api::eod_report::list_reports,
        crate::api::eod_report::export_reports,
        crate::api::eod_report::get_report,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::review_leave,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::deactivate_user,
        crate::api::user::reset_password
    ),
    components(
        schemas(
            Role,
            PublicUser,
            UserSummary,
            LoginReqDto,
            RegisterUserReq,
            CreateUserReq,
            UpdateUserReq,
            MessageResponse,
            UserEnvelope,
            UserMessageResponse,
            TimeLog,
            TimeLogView,
            DailySummary,
            ClockInResponse,
            ClockOutResponse,
            TodayResponse,
            TimeLogListResponse,
            EodReport,
            EodReportView,
            EodReportReq,
            EodTodayResponse,
            EodReportListResponse,
            EodReportResponse,
            LeaveStatus,
            LeaveRequest,
            LeaveRequestView,
            CreateLeaveReq,
            ReviewLeaveReq,
            LeaveListResponse,
            LeaveMessageResponse,
            UserListResponse,
            CreatedUserResponse,
            PasswordResetResponse
        )
    ),
    modifiers(&DEFAULT_COOKIE_ADDON),
    tags(
        (name = "Auth", description = "Session login and account APIs"),
        (name = "Time Logs", description = "Attendance tracking APIs"),
        (name = "EOD Reports", description = "End-of-day reporting APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Users", description = "User administration APIs"),
    )
)]
pub struct ApiDoc;
