use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;

use crate::model::attendance::Attendance;

/// Check-in row to insert for `(employee_id, date)`.
#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub employee_id: u64,
    pub display_name: String,
    pub date: NaiveDate,
    pub day: String,
    pub in_time: NaiveTime,
    pub image_url: String,
}

impl NewCheckIn {
    pub fn into_record(self, id: u64) -> Attendance {
        Attendance {
            id,
            employee_id: self.employee_id,
            display_name: self.display_name,
            date: self.date,
            day: self.day,
            in_time: self.in_time,
            out_time: None,
            working_hours: None,
            image_url: self.image_url,
            checkout_image_url: None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(u64),
    /// A record for `(employee_id, date)` already exists.
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct CloseOut {
    pub id: u64,
    pub out_time: NaiveTime,
    pub working_hours: NaiveTime,
    pub checkout_image_url: String,
}

/// Storage operations the reconciliation needs. Implementations must enforce
/// uniqueness of `(employee_id, date)` atomically in `insert_check_in`, and
/// `close_out` must only touch a record whose `out_time` is still empty.
#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    async fn insert_check_in(&self, new: &NewCheckIn) -> Result<InsertOutcome, sqlx::Error>;

    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, sqlx::Error>;

    /// Returns `false` when the record was already closed (or is gone).
    async fn close_out(&self, close: &CloseOut) -> Result<bool, sqlx::Error>;
}

pub struct MySqlAttendanceStore<'a> {
    pool: &'a MySqlPool,
}

impl<'a> MySqlAttendanceStore<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }
}

impl AttendanceStore for MySqlAttendanceStore<'_> {
    async fn insert_check_in(&self, new: &NewCheckIn) -> Result<InsertOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, display_name, date, day, in_time, image_url)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(&new.display_name)
        .bind(new.date)
        .bind(&new.day)
        .bind(new.in_time)
        .bind(&new.image_url)
        .execute(self.pool)
        .await;

        match result {
            Ok(done) => Ok(InsertOutcome::Inserted(done.last_insert_id())),
            // Same employee, same day
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e),
        }
    }

    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, sqlx::Error> {
        sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, employee_id, display_name, date, day, in_time, out_time,
                   working_hours, image_url, checkout_image_url
            FROM attendance
            WHERE employee_id = ? AND date = ?
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(self.pool)
        .await
    }

    async fn close_out(&self, close: &CloseOut) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET out_time = ?, working_hours = ?, checkout_image_url = ?
            WHERE id = ?
            AND out_time IS NULL
            "#,
        )
        .bind(close.out_time)
        .bind(close.working_hours)
        .bind(&close.checkout_image_url)
        .bind(close.id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
