use crate::{
    attendance::{
        clock::Clock,
        photo::PhotoStore,
        reconcile::{AttendanceAction, AttendanceEvent, Reconciled, record_event},
        store::{AttendanceStore, MySqlAttendanceStore},
    },
    auth::auth::AuthUser,
    error::ApiError,
    model::attendance::Attendance,
    models::MessageResponse,
    utils::{
        db_utils::{SqlUpdate, UpdateBuilder, execute_update},
        time::{month_range, parse_event_time},
    },
};
use actix_multipart::form::{MultipartForm, MultipartFormConfig, bytes::Bytes, text::Text};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const SELECT_ATTENDANCE: &str = r#"
    SELECT id, employee_id, display_name, date, day, in_time, out_time,
           working_hours, image_url, checkout_image_url
    FROM attendance
"#;

/// Recomputed after a correction; evaluated against the updated times.
const RECOMPUTE_WORKING_HOURS: &str = "working_hours = IF(out_time IS NULL OR out_time < in_time, NULL, TIMEDIFF(out_time, in_time))";

#[derive(Debug, MultipartForm)]
pub struct AttendanceForm {
    pub name: Text<String>,
    /// `HH:MM:SS`
    pub time: Text<String>,
    pub employee_id: Text<u64>,
    pub image: Bytes,
}

/// OpenAPI shape of [`AttendanceForm`].
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct AttendanceUpload {
    #[schema(example = "Asha Rao")]
    name: String,
    #[schema(example = "09:00:00")]
    time: String,
    #[schema(example = 42)]
    employee_id: u64,
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    pub action: AttendanceAction,
    pub record: Attendance,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub attendance: Vec<Attendance>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthlyQuery {
    /// 1-12
    pub month: u32,
    pub year: i32,
    /// Filter by display name
    pub name: Option<String>,
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyQuery {
    #[param(value_type = String, example = "2024-03-01")]
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendancePatch {
    #[schema(example = "Asha Rao")]
    pub name: Option<String>,
    #[schema(value_type = Option<String>, example = "09:05:00")]
    pub in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:30:00")]
    pub out_time: Option<NaiveTime>,
}

// Typed binding for the optional monthly filters
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Check in or check out with photo evidence
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body(content = AttendanceUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Checked in or out", body = AttendanceResponse),
        (status = 400, description = "Malformed time or check-out before check-in", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already checked out today", body = MessageResponse),
        (status = 500, description = "Database or photo storage error", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn record_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    photos: web::Data<PhotoStore>,
    MultipartForm(form): MultipartForm<AttendanceForm>,
) -> Result<HttpResponse, ApiError> {
    let submission = Submission::from_form(form)?;
    let employee_id = submission.employee_id;

    let store = MySqlAttendanceStore::new(pool.get_ref());
    let reconciled = accept_submission(&store, clock.get_ref(), &photos, submission)
        .await
        .inspect_err(|e| {
            tracing::info!(error = %e, employee_id, submitted_by = %auth.email, "Attendance rejected")
        })?;

    let message = match reconciled.action {
        AttendanceAction::CheckIn => "Checked in successfully",
        AttendanceAction::CheckOut => "Checked out successfully",
    };

    Ok(HttpResponse::Ok().json(AttendanceResponse {
        message: message.into(),
        action: reconciled.action,
        record: reconciled.record,
    }))
}

/// Upload limits for the attendance form. Extraction failures answer with
/// the usual `{ "message": .. }` body.
pub fn multipart_config(max_photo_bytes: usize) -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(max_photo_bytes)
        .memory_limit(max_photo_bytes)
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// A validated attendance form; nothing has been written yet.
struct Submission {
    employee_id: u64,
    display_name: String,
    event_time: NaiveTime,
    file_name: Option<String>,
    image: Vec<u8>,
}

impl Submission {
    fn from_form(form: AttendanceForm) -> Result<Self, ApiError> {
        let event_time = parse_event_time(&form.time)?;
        let display_name = form.name.trim().to_string();
        if display_name.is_empty() {
            return Err(ApiError::BadRequest("name must not be empty".into()));
        }

        Ok(Self {
            employee_id: form.employee_id.into_inner(),
            display_name,
            event_time,
            file_name: form.image.file_name,
            image: form.image.data.to_vec(),
        })
    }
}

/// Stores the photo, then reconciles. The photo is removed again when the
/// event is rejected.
async fn accept_submission<S: AttendanceStore>(
    store: &S,
    clock: &dyn Clock,
    photos: &PhotoStore,
    submission: Submission,
) -> Result<Reconciled, ApiError> {
    let photo = photos
        .save(submission.file_name.as_deref(), submission.image)
        .await
        .map_err(ApiError::Photo)?;

    let event = AttendanceEvent {
        employee_id: submission.employee_id,
        display_name: submission.display_name,
        event_time: submission.event_time,
        photo_url: photo.url.clone(),
    };

    match record_event(store, clock, event).await {
        Ok(reconciled) => Ok(reconciled),
        Err(e) => {
            photos.discard(&photo).await;
            Err(e)
        }
    }
}

/// Attendance of a month, optionally for one employee
#[utoipa::path(
    get,
    path = "/api/attendance/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Attendance records", body = AttendanceListResponse),
        (status = 400, description = "Invalid month", body = MessageResponse),
        (status = 404, description = "No attendance records found", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn monthly_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthlyQuery>,
) -> Result<HttpResponse, ApiError> {
    let (start, end) = month_range(query.year, query.month)?;

    let mut where_sql = String::from(" WHERE date >= ? AND date < ?");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(name) = query.name.as_deref() {
        where_sql.push_str(" AND display_name = ?");
        args.push(FilterValue::Str(name));
    }

    if let Some(employee_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }

    let sql = format!("{SELECT_ATTENDANCE}{where_sql} ORDER BY date, employee_id");

    let mut data_q = sqlx::query_as::<_, Attendance>(&sql).bind(start).bind(end);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let attendance = data_q.fetch_all(pool.get_ref()).await?;
    found_or_404(attendance)
}

/// Attendance of one day
#[utoipa::path(
    get,
    path = "/api/attendance/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Attendance records", body = AttendanceListResponse),
        (status = 404, description = "No attendance records found", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn daily_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<DailyQuery>,
) -> Result<HttpResponse, ApiError> {
    let sql = format!("{SELECT_ATTENDANCE} WHERE date = ? ORDER BY in_time");

    let attendance = sqlx::query_as::<_, Attendance>(&sql)
        .bind(query.date)
        .fetch_all(pool.get_ref())
        .await?;

    found_or_404(attendance)
}

fn found_or_404(attendance: Vec<Attendance>) -> Result<HttpResponse, ApiError> {
    if attendance.is_empty() {
        return Err(ApiError::NotFound("No attendance records found".into()));
    }
    Ok(HttpResponse::Ok().json(AttendanceListResponse { attendance }))
}

/// Turns a correction into one parameterized UPDATE of the `(date, id)` row.
pub fn correction_update(
    date: NaiveDate,
    id: u64,
    patch: AttendancePatch,
) -> Result<SqlUpdate, ApiError> {
    if let (Some(in_time), Some(out_time)) = (patch.in_time, patch.out_time) {
        if out_time < in_time {
            return Err(ApiError::OutOfOrder { in_time, out_time });
        }
    }

    let name = patch
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    UpdateBuilder::new("attendance")
        .set("display_name", name)
        .set("in_time", patch.in_time)
        .set("out_time", patch.out_time)
        .derive(RECOMPUTE_WORKING_HOURS)
        .filter("date", date)
        .filter("id", id)
        .build()
}

/// Correct name, check-in or check-out time of a record
#[utoipa::path(
    put,
    path = "/api/attendance/{date}/{id}",
    params(
        ("date" = String, Path, description = "Attendance date, YYYY-MM-DD"),
        ("id" = u64, Path, description = "Attendance record ID")
    ),
    request_body = AttendancePatch,
    responses(
        (status = 200, description = "Attendance updated", body = MessageResponse),
        (status = 400, description = "No fields to update provided", body = MessageResponse),
        (status = 404, description = "Attendance record not found", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(NaiveDate, u64)>,
    body: web::Json<AttendancePatch>,
) -> Result<HttpResponse, ApiError> {
    let (date, id) = path.into_inner();

    let update = correction_update(date, id, body.into_inner())?;
    let affected = execute_update(pool.get_ref(), update).await?;

    if affected == 0 {
        return Err(ApiError::NotFound("Attendance record not found".into()));
    }

    tracing::info!(id, %date, corrected_by = %auth.email, "Attendance corrected");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Attendance updated successfully")))
}

/// Delete an attendance record
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Attendance record not found", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Attendance record not found".into()));
    }

    tracing::info!(id, deleted_by = %auth.email, "Attendance deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Attendance record deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::db_utils::SqlValue;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn correction_sets_only_supplied_fields_and_recomputes_hours() {
        let update = correction_update(
            date(),
            9,
            AttendancePatch {
                name: None,
                in_time: None,
                out_time: Some(t(17, 30, 0)),
            },
        )
        .unwrap();

        assert!(update.sql.starts_with("UPDATE attendance SET out_time = ?, working_hours = IF("));
        assert!(update.sql.ends_with("WHERE date = ? AND id = ?"));
        assert_eq!(
            update.values,
            vec![SqlValue::Time(t(17, 30, 0)), SqlValue::Date(date()), SqlValue::U64(9)]
        );
    }

    #[test]
    fn empty_correction_is_rejected() {
        let err = correction_update(
            date(),
            9,
            AttendancePatch {
                name: Some("   ".into()),
                in_time: None,
                out_time: None,
            },
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "No fields to update provided");
    }

    #[test]
    fn correction_with_reversed_times_is_rejected() {
        let err = correction_update(
            date(),
            9,
            AttendancePatch {
                name: None,
                in_time: Some(t(18, 0, 0)),
                out_time: Some(t(9, 0, 0)),
            },
        )
        .unwrap_err();

        assert!(matches!(err, ApiError::OutOfOrder { .. }));
    }

    #[test]
    fn empty_listing_is_not_found() {
        let err = found_or_404(Vec::new()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    mod upload {
        use super::*;
        use crate::attendance::clock::FixedClock;
        use crate::attendance::store::memory::InMemoryStore;
        use actix_web::dev::Service as _;
        use actix_web::{App, HttpMessage, http::StatusCode, http::header, test};
        use sqlx::mysql::MySqlPoolOptions;
        use std::path::Path;
        use std::sync::Arc;
        use std::time::Duration;
        use uuid::Uuid;

        const BOUNDARY: &str = "attendance-form-boundary";
        const JPEG: &[u8] = b"jpeg-bytes";

        fn temp_photos() -> PhotoStore {
            let dir = std::env::temp_dir().join(format!("attendance-upload-{}", Uuid::new_v4()));
            PhotoStore::open(dir, "http://127.0.0.1:8000").unwrap()
        }

        fn stored_files(dir: &Path) -> usize {
            std::fs::read_dir(dir).unwrap().count()
        }

        fn clock() -> FixedClock {
            FixedClock(date().and_hms_opt(12, 0, 0).unwrap())
        }

        fn form_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
            let mut body = Vec::new();
            for (name, value) in fields {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\
                         Content-Type: text/plain\r\n\r\n{value}\r\n"
                    )
                    .as_bytes(),
                );
            }
            if let Some(bytes) = image {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                         filename=\"face.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
            body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
            body
        }

        /// Posts a form to `record_attendance` with an authenticated caller and
        /// a pool that never connects.
        async fn post_form(
            photos: &PhotoStore,
            body: Vec<u8>,
        ) -> (StatusCode, serde_json::Value) {
            let pool = MySqlPoolOptions::new()
                .acquire_timeout(Duration::from_millis(200))
                .connect_lazy("mysql://nobody@127.0.0.1:1/unused")
                .unwrap();
            let clock: Arc<dyn Clock> = Arc::new(clock());

            let app = test::init_service(
                App::new()
                    .app_data(multipart_config(1024 * 1024))
                    .app_data(web::Data::new(pool))
                    .app_data(web::Data::new(photos.clone()))
                    .app_data(web::Data::from(clock))
                    .wrap_fn(|req, srv| {
                        req.extensions_mut().insert(AuthUser {
                            email: "hr@company.com".into(),
                            employee_id: 1,
                        });
                        srv.call(req)
                    })
                    .route("/api/attendance", web::post().to(record_attendance)),
            )
            .await;

            let req = test::TestRequest::post()
                .uri("/api/attendance")
                .insert_header((
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                ))
                .set_payload(body)
                .to_request();

            let resp = test::call_service(&app, req).await;
            let status = resp.status();
            (status, test::read_body_json(resp).await)
        }

        #[actix_web::test]
        async fn malformed_time_is_rejected_before_any_photo_is_written() {
            let photos = temp_photos();
            let body = form_body(
                &[("name", "Asha Rao"), ("time", "9am"), ("employee_id", "42")],
                Some(JPEG),
            );

            let (status, json) = post_form(&photos, body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["message"], "Invalid time '9am', expected HH:MM:SS");
            assert_eq!(stored_files(photos.dir()), 0);
            std::fs::remove_dir_all(photos.dir()).unwrap();
        }

        #[actix_web::test]
        async fn blank_name_is_rejected_before_any_photo_is_written() {
            let photos = temp_photos();
            let body = form_body(
                &[("name", "   "), ("time", "09:00:00"), ("employee_id", "42")],
                Some(JPEG),
            );

            let (status, json) = post_form(&photos, body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["message"], "name must not be empty");
            assert_eq!(stored_files(photos.dir()), 0);
            std::fs::remove_dir_all(photos.dir()).unwrap();
        }

        #[actix_web::test]
        async fn unreadable_form_answers_with_json_message() {
            let photos = temp_photos();
            let non_numeric_id = form_body(
                &[("name", "Asha Rao"), ("time", "09:00:00"), ("employee_id", "abc")],
                Some(JPEG),
            );
            let missing_image = form_body(
                &[("name", "Asha Rao"), ("time", "09:00:00"), ("employee_id", "42")],
                None,
            );

            for body in [non_numeric_id, missing_image] {
                let (status, json) = post_form(&photos, body).await;

                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
            }
            assert_eq!(stored_files(photos.dir()), 0);
            std::fs::remove_dir_all(photos.dir()).unwrap();
        }

        fn submission(time: NaiveTime) -> Submission {
            Submission {
                employee_id: 42,
                display_name: "Asha Rao".into(),
                event_time: time,
                file_name: Some("face.jpg".into()),
                image: JPEG.to_vec(),
            }
        }

        #[actix_web::test]
        async fn rejected_check_out_discards_its_photo() {
            let photos = temp_photos();
            let store = InMemoryStore::default();
            let clock = clock();

            let first = accept_submission(&store, &clock, &photos, submission(t(22, 0, 0)))
                .await
                .unwrap();
            let early = accept_submission(&store, &clock, &photos, submission(t(6, 0, 0))).await;

            assert!(matches!(early, Err(ApiError::OutOfOrder { .. })));
            assert_eq!(stored_files(photos.dir()), 1);
            assert!(first.record.image_url.ends_with("_face.jpg"));
            std::fs::remove_dir_all(photos.dir()).unwrap();
        }

        #[actix_web::test]
        async fn accepted_events_keep_both_photos() {
            let photos = temp_photos();
            let store = InMemoryStore::default();
            let clock = clock();

            accept_submission(&store, &clock, &photos, submission(t(9, 0, 0)))
                .await
                .unwrap();
            let out = accept_submission(&store, &clock, &photos, submission(t(17, 30, 0)))
                .await
                .unwrap();

            assert_eq!(out.action, AttendanceAction::CheckOut);
            assert_ne!(out.record.checkout_image_url.as_deref(), Some(out.record.image_url.as_str()));
            assert_eq!(stored_files(photos.dir()), 2);
            std::fs::remove_dir_all(photos.dir()).unwrap();
        }
    }
}
