use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_application::{LeaveApplication, LeaveStatus, LeaveType};
use crate::models::MessageResponse;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyLeave {
    #[schema(example = "Asha Rao")]
    pub employee_name: String,
    pub leave_type: LeaveType,
    #[schema(example = "full_day")]
    pub duration: String,
    #[schema(example = "2026-01-01", format = Date, value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-02", format = Date, value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family function")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveOnDate {
    /// Leaves covering this day
    #[param(value_type = String, example = "2026-01-01")]
    pub date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveStatusUpdate {
    pub status: LeaveStatus,
}

fn validate_application(payload: &ApplyLeave) -> Result<(), ApiError> {
    if payload.start_date > payload.end_date {
        return Err(ApiError::BadRequest(
            "start_date cannot be after end_date".into(),
        ));
    }
    if payload.employee_name.trim().is_empty() || payload.duration.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "employee_name and duration must not be empty".into(),
        ));
    }
    Ok(())
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = ApplyLeave,
        description = "Leave application",
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 201, description = "Leave application submitted", body = MessageResponse),
        (status = 400, description = "Bad request", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    pool: web::Data<MySqlPool>,
    form: web::Form<ApplyLeave>,
) -> Result<HttpResponse, ApiError> {
    validate_application(&form)?;

    sqlx::query(
        r#"
        INSERT INTO leave_applications
            (employee_name, leave_type, duration, start_date, end_date, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(form.employee_name.trim())
    .bind(form.leave_type.as_ref())
    .bind(form.duration.trim())
    .bind(form.start_date)
    .bind(form.end_date)
    .bind(&form.reason)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(MessageResponse::new(
        "Leave application submitted successfully",
    )))
}

/* =========================
Leaves covering a date
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveOnDate),
    responses(
        (status = 200, description = "Leave applications", body = [LeaveApplication]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leaves_on_date(
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveOnDate>,
) -> Result<HttpResponse, ApiError> {
    let leaves = sqlx::query_as::<_, LeaveApplication>(
        r#"
        SELECT id, employee_name, leave_type, duration, start_date, end_date,
               reason, status, created_at
        FROM leave_applications
        WHERE start_date <= ? AND end_date >= ?
        ORDER BY start_date, id
        "#,
    )
    .bind(query.date)
    .bind(query.date)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Approve / reject
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/status",
    params(("leave_id" = u64, Path, description = "ID of the leave application")),
    request_body = LeaveStatusUpdate,
    responses(
        (status = 200, description = "Leave status updated", body = MessageResponse),
        (status = 404, description = "Leave application not found", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<LeaveStatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let result = sqlx::query("UPDATE leave_applications SET status = ? WHERE id = ?")
        .bind(body.status.as_ref())
        .bind(leave_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Leave application not found".into()));
    }

    tracing::info!(leave_id, status = %body.status, reviewer = %auth.email, "Leave status updated");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Leave status updated successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application(start: (i32, u32, u32), end: (i32, u32, u32)) -> ApplyLeave {
        ApplyLeave {
            employee_name: "Asha Rao".into(),
            leave_type: LeaveType::Sick,
            duration: "full_day".into(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            reason: "flu".into(),
        }
    }

    #[test]
    fn single_day_leave_is_valid() {
        assert!(validate_application(&application((2026, 1, 5), (2026, 1, 5))).is_ok());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = validate_application(&application((2026, 1, 5), (2026, 1, 4))).unwrap_err();
        assert_eq!(err.to_string(), "start_date cannot be after end_date");
    }

    #[test]
    fn form_body_decodes_into_typed_fields() {
        let form = web::Query::<ApplyLeave>::from_query(
            "employee_name=Asha+Rao&leave_type=annual&duration=half_day\
             &start_date=2026-02-02&end_date=2026-02-03&reason=trip",
        )
        .unwrap()
        .into_inner();

        assert_eq!(form.leave_type, LeaveType::Annual);
        assert_eq!(form.start_date, NaiveDate::from_ymd_opt(2026, 2, 2).unwrap());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut payload = application((2026, 1, 5), (2026, 1, 6));
        payload.employee_name = "   ".into();
        assert!(matches!(
            validate_application(&payload),
            Err(ApiError::BadRequest(_))
        ));
    }
}
