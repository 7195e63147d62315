use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;

use crate::error::ApiError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(v: NaiveTime) -> Self {
        SqlValue::Time(v)
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Typed partial UPDATE builder
/// ===============================
///
/// Table and column names are `&'static str` so only identifiers written in
/// the source can reach the statement; caller data is always bound.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<(&'static str, SqlValue)>,
    derived: Vec<&'static str>,
    filters: Vec<(&'static str, SqlValue)>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            derived: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Adds `column = ?` when a value was supplied.
    pub fn set<V: Into<SqlValue>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.assignments.push((column, value.into()));
        }
        self
    }

    /// Adds a computed assignment evaluated after every `set` column,
    /// only emitted when at least one column is set.
    pub fn derive(mut self, assignment: &'static str) -> Self {
        self.derived.push(assignment);
        self
    }

    pub fn filter<V: Into<SqlValue>>(mut self, column: &'static str, value: V) -> Self {
        self.filters.push((column, value.into()));
        self
    }

    pub fn build(self) -> Result<SqlUpdate, ApiError> {
        if self.assignments.is_empty() {
            return Err(ApiError::BadRequest("No fields to update provided".into()));
        }
        if self.filters.is_empty() {
            return Err(ApiError::BadRequest("Update requires a filter".into()));
        }

        let set_clause = self
            .assignments
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .chain(self.derived.iter().map(|d| d.to_string()))
            .collect::<Vec<_>>()
            .join(", ");

        let where_clause = self
            .filters
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(" AND ");

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table, set_clause, where_clause
        );

        let values = self
            .assignments
            .into_iter()
            .chain(self.filters)
            .map(|(_, v)| v)
            .collect();

        Ok(SqlUpdate { sql, values })
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Time(v) => query.bind(v),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
