use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{leave_request::LeaveStatus, role::Role, user::PublicUser};

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginReqDto {
    #[schema(example = "jane")]
    pub username: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
}

/// Explicit registration with admin-chosen credentials.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserReq {
    pub username: String,
    #[schema(format = "email")]
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub assigned_client: Option<String>,
}

/// User creation with a generated username and temporary password.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateUserReq {
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "jane@example.com", format = "email")]
    pub email: String,
    pub role: Role,
    #[schema(example = "Acme")]
    pub assigned_client: Option<String>,
}

#[derive(Deserialize, Default, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserReq {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub assigned_client: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct EodReportReq {
    #[schema(example = "Closed 14 support tickets")]
    pub tasks_completed: String,
    pub blockers: Option<String>,
    pub issues: Option<String>,
    pub support_needed: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateLeaveReq {
    #[schema(example = "2026-01-01", format = "date")]
    pub start_date: String,
    #[schema(example = "2026-01-03", format = "date")]
    pub end_date: String,
    #[schema(example = "Family event")]
    pub reason: String,
}

#[derive(Deserialize, Default, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReviewLeaveReq {
    pub status: Option<LeaveStatus>,
    pub admin_notes: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserEnvelope {
    pub user: PublicUser,
}

#[derive(Serialize, ToSchema)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: PublicUser,
}
