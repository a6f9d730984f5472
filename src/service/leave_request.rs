use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::leave_request::{LeaveRequestView, LeaveStatus, OwnedLeaveRequest},
    models::{CreateLeaveReq, ReviewLeaveReq},
    utils::query_filter::{DATE_FORMAT, FilterValue, ListFilter, Scope, WhereClause},
};

const LEAVE_COLUMNS: &str = "l.id AS id, l.user_id AS user_id, l.start_date AS start_date, \
                             l.end_date AS end_date, l.reason AS reason, l.status AS status, \
                             l.admin_notes AS admin_notes, l.created_at AS created_at, \
                             l.reviewed_at AS reviewed_at, l.reviewed_by AS reviewed_by";

fn owned_select(where_sql: &str) -> String {
    format!(
        r#"
        SELECT {LEAVE_COLUMNS},
               u.username AS owner_username,
               u.first_name AS owner_first_name,
               u.last_name AS owner_last_name,
               rv.username AS reviewer_username,
               rv.first_name AS reviewer_first_name,
               rv.last_name AS reviewer_last_name
        FROM leave_requests l
        JOIN users u ON u.id = l.user_id
        LEFT JOIN users rv ON rv.id = l.reviewed_by
        {where_sql}
        ORDER BY l.start_date DESC, l.id DESC
        "#
    )
}

async fn fetch_one(pool: &SqlitePool, id: i64) -> Result<Option<LeaveRequestView>, AppError> {
    let sql = owned_select("WHERE l.id = ?");
    Ok(sqlx::query_as::<_, OwnedLeaveRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(OwnedLeaveRequest::into_view))
}

/// Files a pending request for the caller.
pub async fn submit(
    pool: &SqlitePool,
    user_id: i64,
    req: CreateLeaveReq,
    now: DateTime<Utc>,
) -> Result<LeaveRequestView, AppError> {
    let parse = |raw: &str, field: &str| {
        chrono::NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map_err(|_| AppError::Validation(format!("{field} must be a YYYY-MM-DD date")))
    };
    let start = parse(&req.start_date, "start_date")?;
    let end = parse(&req.end_date, "end_date")?;

    if start > end {
        return Err(AppError::Validation("Start date cannot be after end date".into()));
    }
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("reason is required".into()));
    }

    let id = sqlx::query(
        r#"
        INSERT INTO leave_requests (user_id, start_date, end_date, reason, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .bind(reason)
    .bind(LeaveStatus::Pending.as_ref())
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(user_id, leave_id = id, %start, %end, "Leave request submitted");

    fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::Internal("inserted leave request vanished".into()))
}

/// Scoped listing keyed on `start_date`, optionally narrowed by status.
pub async fn list(
    pool: &SqlitePool,
    caller: &AuthUser,
    filter: &ListFilter,
    status: Option<LeaveStatus>,
) -> Result<Vec<LeaveRequestView>, AppError> {
    let mut clause = WhereClause::scoped(Scope::for_caller(caller), filter, "l.user_id", "l.start_date");
    if let Some(status) = status {
        clause.and("l.status = ?", FilterValue::Str(status.as_ref().to_string()));
    }

    let sql = owned_select(&clause.sql());
    let rows = clause
        .bind(sqlx::query_as::<_, OwnedLeaveRequest>(&sql))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(OwnedLeaveRequest::into_view).collect())
}

/// Admin decision on a request. A status change records who reviewed it and when;
/// notes alone leave the review stamp untouched.
pub async fn review(
    pool: &SqlitePool,
    reviewer_id: i64,
    id: i64,
    req: ReviewLeaveReq,
    now: DateTime<Utc>,
) -> Result<LeaveRequestView, AppError> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM leave_requests WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Err(AppError::NotFound("Leave request not found".into()));
    }

    if let Some(status) = req.status {
        sqlx::query(
            "UPDATE leave_requests SET status = ?, reviewed_at = ?, reviewed_by = ? WHERE id = ?",
        )
        .bind(status.as_ref())
        .bind(now)
        .bind(reviewer_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        info!(leave_id = id, reviewer_id, status = %status, "Leave request reviewed");
    }
    if let Some(notes) = req.admin_notes {
        sqlx::query("UPDATE leave_requests SET admin_notes = ? WHERE id = ?")
            .bind(notes)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::connect_in_memory,
        model::role::Role,
        service::user::{NewUser, insert_user},
        utils::{query_filter::parse_date, username_index::UsernameIndex},
    };

    async fn seed(pool: &SqlitePool, index: &UsernameIndex, name: &str, role: Role) -> AuthUser {
        let user = insert_user(
            pool,
            index,
            NewUser {
                username: name.into(),
                email: format!("{name}@example.com"),
                password: "pw-123456".into(),
                first_name: name.to_uppercase(),
                last_name: "Tester".into(),
                role,
                assigned_client: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();
        AuthUser {
            user_id: user.id,
            username: user.username,
            role,
            session_id: "test".into(),
        }
    }

    fn leave(start: &str, end: &str) -> CreateLeaveReq {
        CreateLeaveReq {
            start_date: start.into(),
            end_date: end.into(),
            reason: "Family event".into(),
        }
    }

    #[actix_web::test]
    async fn submit_validates_dates_and_reason() {
        let pool = connect_in_memory().await.unwrap();
        let va = seed(&pool, &UsernameIndex::new(), "va", Role::Va).await;

        let backwards = submit(&pool, va.user_id, leave("2024-03-05", "2024-03-01"), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(backwards.to_string(), "Start date cannot be after end date");

        let malformed = submit(&pool, va.user_id, leave("03/01/2024", "2024-03-05"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(malformed, AppError::Validation(_)));

        let mut blank = leave("2024-03-01", "2024-03-01");
        blank.reason = "  ".into();
        assert!(submit(&pool, va.user_id, blank, Utc::now()).await.is_err());

        let ok = submit(&pool, va.user_id, leave("2024-03-01", "2024-03-01"), Utc::now())
            .await
            .unwrap();
        assert_eq!(ok.request.status, LeaveStatus::Pending);
        assert_eq!(ok.user.username, "va");
        assert!(ok.reviewer.is_none());
    }

    #[actix_web::test]
    async fn review_stamps_reviewer_and_filters_by_status() {
        let pool = connect_in_memory().await.unwrap();
        let index = UsernameIndex::new();
        let admin = seed(&pool, &index, "boss", Role::Admin).await;
        let va = seed(&pool, &index, "va", Role::Va).await;

        let first = submit(&pool, va.user_id, leave("2024-03-01", "2024-03-02"), Utc::now())
            .await
            .unwrap();
        submit(&pool, va.user_id, leave("2024-04-01", "2024-04-02"), Utc::now())
            .await
            .unwrap();

        let reviewed = review(
            &pool,
            admin.user_id,
            first.request.id,
            ReviewLeaveReq {
                status: Some(LeaveStatus::Approved),
                admin_notes: Some("Enjoy".into()),
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(reviewed.request.status, LeaveStatus::Approved);
        assert_eq!(reviewed.request.reviewed_by, Some(admin.user_id));
        assert!(reviewed.request.reviewed_at.is_some());
        assert_eq!(reviewed.reviewer.map(|r| r.username), Some("boss".to_string()));

        let pending = list(&pool, &admin, &ListFilter::default(), Some(LeaveStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request.start_date, parse_date("2024-04-01").unwrap());

        let all = list(&pool, &va, &ListFilter::default(), None).await.unwrap();
        let starts: Vec<_> = all.iter().map(|l| l.request.start_date.to_string()).collect();
        assert_eq!(starts, vec!["2024-04-01", "2024-03-01"]);

        let other_user = ListFilter {
            user_id: Some(admin.user_id),
            ..Default::default()
        };
        let narrowed = list(&pool, &va, &other_user, None).await.unwrap();
        assert_eq!(narrowed.len(), 2, "va callers only ever see their own rows");

        let missing = review(&pool, admin.user_id, 9999, ReviewLeaveReq::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn notes_only_review_keeps_status_pending() {
        let pool = connect_in_memory().await.unwrap();
        let index = UsernameIndex::new();
        let admin = seed(&pool, &index, "boss", Role::Admin).await;
        let va = seed(&pool, &index, "va", Role::Va).await;
        let filed = submit(&pool, va.user_id, leave("2024-05-01", "2024-05-03"), Utc::now())
            .await
            .unwrap();

        let noted = review(
            &pool,
            admin.user_id,
            filed.request.id,
            ReviewLeaveReq {
                status: None,
                admin_notes: Some("Check coverage".into()),
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(noted.request.status, LeaveStatus::Pending);
        assert_eq!(noted.request.admin_notes.as_deref(), Some("Check coverage"));
        assert!(noted.reviewer.is_none());
    }
}
