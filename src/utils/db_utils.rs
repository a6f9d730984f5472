use sqlx::{Executor, Sqlite};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Bool(bool),
    Null,
}

/// ===============================
/// Partial UPDATE builder
/// ===============================
/// Columns come from code, never from request payloads; only values are bound.
#[derive(Debug)]
pub struct SqlUpdate {
    table: &'static str,
    sets: Vec<(&'static str, SqlValue)>,
}

impl SqlUpdate {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            sets: Vec::new(),
        }
    }

    pub fn set(&mut self, column: &'static str, value: SqlValue) -> &mut Self {
        self.sets.push((column, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn sql(&self, id_column: &str) -> String {
        let set_clause = self
            .sets
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table, set_clause, id_column
        )
    }

    /// ===============================
    /// Execute the update
    /// ===============================
    pub async fn execute<'e, E>(self, exec: E, id_column: &str, id: i64) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if self.sets.is_empty() {
            return Ok(0);
        }

        let sql = self.sql(id_column);
        let mut query = sqlx::query(&sql);

        for (_, value) in self.sets {
            query = match value {
                SqlValue::String(v) => query.bind(v),
                SqlValue::Bool(v) => query.bind(v),
                SqlValue::Null => query.bind(None::<String>),
            };
        }

        let result = query.bind(id).execute(exec).await?;
        Ok(result.rows_affected())
    }
}
