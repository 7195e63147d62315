use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Unpaid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Asha Rao")]
    pub employee_name: String,
    /// stored as text, see [`LeaveType`]
    #[schema(example = "sick")]
    pub leave_type: String,
    #[schema(example = "full_day")]
    pub duration: String,
    #[schema(example = "2026-01-01", value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-02", value_type = String, format = Date)]
    pub end_date: NaiveDate,
    pub reason: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime<Utc>>,
}
