use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::user::UserSummary;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, AsRefStr, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Denied,
}

impl TryFrom<String> for LeaveStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LeaveStatus::from_str(&value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: i64,
    pub user_id: i64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    pub admin_notes: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<i64>,
}

/// Leave request joined with requester and (optional) reviewer names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedLeaveRequest {
    #[sqlx(flatten)]
    pub request: LeaveRequest,
    pub owner_username: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub reviewer_username: Option<String>,
    pub reviewer_first_name: Option<String>,
    pub reviewer_last_name: Option<String>,
}

impl OwnedLeaveRequest {
    pub fn into_view(self) -> LeaveRequestView {
        let user = UserSummary {
            id: self.request.user_id,
            username: self.owner_username,
            first_name: self.owner_first_name,
            last_name: self.owner_last_name,
        };
        let reviewer = match (
            self.request.reviewed_by,
            self.reviewer_username,
            self.reviewer_first_name,
            self.reviewer_last_name,
        ) {
            (Some(id), Some(username), Some(first_name), Some(last_name)) => Some(UserSummary {
                id,
                username,
                first_name,
                last_name,
            }),
            _ => None,
        };

        LeaveRequestView {
            request: self.request,
            user,
            reviewer,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveRequestView {
    #[serde(flatten)]
    pub request: LeaveRequest,
    pub user: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<UserSummary>,
}
