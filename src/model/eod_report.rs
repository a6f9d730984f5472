use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EodReport {
    pub id: i64,
    pub user_id: i64,
    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "Closed 14 support tickets")]
    pub tasks_completed: String,
    pub blockers: Option<String>,
    pub issues: Option<String>,
    pub support_needed: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedEodReport {
    #[sqlx(flatten)]
    pub report: EodReport,
    pub owner_username: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
}

impl OwnedEodReport {
    pub fn owner(&self) -> UserSummary {
        UserSummary {
            id: self.report.user_id,
            username: self.owner_username.clone(),
            first_name: self.owner_first_name.clone(),
            last_name: self.owner_last_name.clone(),
        }
    }

    pub fn employee_name(&self) -> String {
        format!("{} {}", self.owner_first_name, self.owner_last_name)
    }

    pub fn into_view(self, with_owner: bool) -> EodReportView {
        let user = with_owner.then(|| self.owner());
        EodReportView {
            report: self.report,
            user,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EodReportView {
    #[serde(flatten)]
    pub report: EodReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}
