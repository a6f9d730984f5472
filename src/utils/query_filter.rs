use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{Sqlite, query::QueryAs, sqlite::SqliteArguments};
use utoipa::IntoParams;

use crate::{auth::auth::AuthUser, error::AppError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query string shared by every list and export endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Only honoured for admin callers. Blank means no filter.
    #[param(value_type = Option<i64>)]
    pub user_id: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListFilter {
    pub user_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppError::InvalidDateFormat(raw.to_string()))
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

fn parse_optional_id(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation("user_id must be an integer".into())),
    }
}

impl ListQuery {
    pub fn parse(&self) -> Result<ListFilter, AppError> {
        Ok(ListFilter {
            user_id: parse_optional_id(self.user_id.as_deref())?,
            start_date: parse_optional_date(self.start_date.as_deref())?,
            end_date: parse_optional_date(self.end_date.as_deref())?,
        })
    }
}

/// Which owners' rows a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Owner(i64),
}

impl Scope {
    pub fn for_caller(caller: &AuthUser) -> Self {
        if caller.is_admin() {
            Scope::All
        } else {
            Scope::Owner(caller.user_id)
        }
    }
}

// Helper enum for typed SQLx binding
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    I64(i64),
    Date(NaiveDate),
    Str(String),
}

/// WHERE clause assembled from role scope and list filters, with its binds
/// kept in placeholder order.
#[derive(Debug, Default)]
pub struct WhereClause {
    conditions: Vec<String>,
    args: Vec<FilterValue>,
}

impl WhereClause {
    pub fn scoped(scope: Scope, filter: &ListFilter, owner_col: &str, date_col: &str) -> Self {
        let mut clause = WhereClause::default();

        // A non-admin's own id always wins over a supplied user_id.
        let owner = match scope {
            Scope::Owner(id) => Some(id),
            Scope::All => filter.user_id,
        };
        if let Some(id) = owner {
            clause.and(format!("{owner_col} = ?"), FilterValue::I64(id));
        }
        if let Some(start) = filter.start_date {
            clause.and(format!("{date_col} >= ?"), FilterValue::Date(start));
        }
        if let Some(end) = filter.end_date {
            clause.and(format!("{date_col} <= ?"), FilterValue::Date(end));
        }

        clause
    }

    pub fn and(&mut self, condition: impl Into<String>, value: FilterValue) -> &mut Self {
        self.conditions.push(condition.into());
        self.args.push(value);
        self
    }

    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn args(&self) -> &[FilterValue] {
        &self.args
    }

    pub fn bind<'q, O>(
        &'q self,
        mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        for arg in &self.args {
            query = match arg {
                FilterValue::I64(v) => query.bind(*v),
                FilterValue::Date(d) => query.bind(*d),
                FilterValue::Str(s) => query.bind(s.as_str()),
            };
        }
        query
    }
}
