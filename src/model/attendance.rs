use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": 42,
        "display_name": "Asha Rao",
        "date": "2024-03-01",
        "day": "Friday",
        "in_time": "09:00:00",
        "out_time": "13:00:00",
        "working_hours": "04:00:00",
        "image_url": "http://127.0.0.1:8000/uploads/5f0c_in.jpg",
        "checkout_image_url": "http://127.0.0.1:8000/uploads/77ab_out.jpg"
    })
)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub display_name: String,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    /// Weekday name of `date`
    pub day: String,
    #[schema(value_type = String, example = "09:00:00")]
    pub in_time: NaiveTime,
    #[schema(value_type = Option<String>, example = "17:30:00")]
    pub out_time: Option<NaiveTime>,
    /// `out_time - in_time`, present once checked out
    #[schema(value_type = Option<String>, example = "08:30:00")]
    pub working_hours: Option<NaiveTime>,
    pub image_url: String,
    pub checkout_image_url: Option<String>,
}

impl Attendance {
    pub fn is_checked_out(&self) -> bool {
        self.out_time.is_some()
    }
}
