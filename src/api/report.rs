use crate::{
    attendance::clock::Clock,
    error::ApiError,
    models::MessageResponse,
    utils::{
        spreadsheet::{AttendanceCount, attendance_count_workbook},
        time::month_range,
    },
};
use actix_web::{HttpResponse, http::header::ContentDisposition, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// 1-12
    pub month: u32,
    pub year: i32,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PresenceQuery {
    /// Defaults to today
    #[param(value_type = Option<String>, example = "2024-03-01")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct PresenceSummary {
    #[schema(value_type = String, example = "2024-03-01")]
    pub date: NaiveDate,
    pub total_employees: i64,
    pub present_employees: i64,
    pub absent_employees: i64,
}

pub fn presence_summary(date: NaiveDate, total: i64, present: i64) -> PresenceSummary {
    PresenceSummary {
        date,
        total_employees: total,
        present_employees: present,
        absent_employees: total.saturating_sub(present).max(0),
    }
}

/// Per-employee attendance count of a month as a spreadsheet
#[utoipa::path(
    get,
    path = "/api/reports/attendance-count",
    params(MonthQuery),
    responses(
        (status = 200, description = "attendance_count.xlsx, or [] when the month has no records",
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Invalid month", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn attendance_count_export(
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let (start, end) = month_range(query.year, query.month)?;

    let rows = sqlx::query_as::<_, AttendanceCount>(
        r#"
        SELECT employee_id,
               MAX(display_name) AS display_name,
               COUNT(*) AS attendance_count
        FROM attendance
        WHERE date >= ? AND date < ?
        GROUP BY employee_id
        ORDER BY display_name
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool.get_ref())
    .await?;

    if rows.is_empty() {
        return Ok(HttpResponse::Ok().json(Vec::<AttendanceCount>::new()));
    }

    let workbook = attendance_count_workbook(&rows).map_err(|e| ApiError::Internal(e.into()))?;

    tracing::info!(
        year = query.year,
        month = query.month,
        employees = rows.len(),
        "Attendance count exported"
    );

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(ContentDisposition::attachment("attendance_count.xlsx"))
        .body(workbook))
}

/// Present and absent headcount of a day
#[utoipa::path(
    get,
    path = "/api/reports/presence",
    params(PresenceQuery),
    responses(
        (status = 200, description = "Headcount", body = PresenceSummary),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn presence(
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    query: web::Query<PresenceQuery>,
) -> Result<HttpResponse, ApiError> {
    let date = query.date.unwrap_or_else(|| clock.now().date());

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employee")
        .fetch_one(pool.get_ref())
        .await?;

    let present = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT employee_id) FROM attendance WHERE date = ?",
    )
    .bind(date)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(presence_summary(date, total, present)))
}
