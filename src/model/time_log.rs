use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::UserSummary;

/// One attendance ledger entry: a user's clock-in/out for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TimeLog {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 2)]
    pub user_id: i64,
    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2024-01-15T09:00:00Z", value_type = Option<String>, format = "date-time")]
    pub clock_in: Option<DateTime<Utc>>,
    #[schema(example = "2024-01-15T17:30:00Z", value_type = Option<String>, format = "date-time")]
    pub clock_out: Option<DateTime<Utc>>,
    #[schema(example = 8.5)]
    pub total_hours: Option<f64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Ledger entry joined with its owner's name columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedTimeLog {
    #[sqlx(flatten)]
    pub log: TimeLog,
    pub owner_username: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
}

impl OwnedTimeLog {
    pub fn owner(&self) -> UserSummary {
        UserSummary {
            id: self.log.user_id,
            username: self.owner_username.clone(),
            first_name: self.owner_first_name.clone(),
            last_name: self.owner_last_name.clone(),
        }
    }

    pub fn employee_name(&self) -> String {
        format!("{} {}", self.owner_first_name, self.owner_last_name)
    }

    pub fn into_view(self, with_owner: bool) -> TimeLogView {
        let user = with_owner.then(|| self.owner());
        TimeLogView { log: self.log, user }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeLogView {
    #[serde(flatten)]
    pub log: TimeLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Point-in-time figures for the current day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailySummary {
    #[schema(example = 17.25)]
    pub total_hours_today: f64,
    #[schema(example = 3)]
    pub active_users_today: i64,
    #[schema(example = 1)]
    pub clocked_in_now: i64,
}
