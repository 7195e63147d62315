use crate::api::attendance::{
    AttendanceListResponse, AttendancePatch, AttendanceResponse, AttendanceUpload,
};
use crate::api::leave::{ApplyLeave, LeaveStatusUpdate};
use crate::api::report::PresenceSummary;
use crate::attendance::reconcile::AttendanceAction;
use crate::model::attendance::Attendance;
use crate::model::leave_application::{LeaveApplication, LeaveStatus, LeaveType};
use crate::models::{LoginReqDto, LoginResponse, MessageResponse, RegisterReq};
use crate::utils::spreadsheet::AttendanceCount;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Attendance API",
        version = "1.0.0",
        description = r#"
## HR Attendance

Employees check in and out by submitting a time and a photo. The first
event of a day opens the attendance record, the second closes it and
records the working hours.

### Security
Everything under `/api` requires a **JWT Bearer** token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::attendance::record_attendance,
        crate::api::attendance::monthly_attendance,
        crate::api::attendance::daily_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::leave::apply_leave,
        crate::api::leave::leaves_on_date,
        crate::api::leave::update_leave_status,

        crate::api::report::attendance_count_export,
        crate::api::report::presence
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            MessageResponse,
            Attendance,
            AttendanceAction,
            AttendanceUpload,
            AttendanceResponse,
            AttendanceListResponse,
            AttendancePatch,
            ApplyLeave,
            LeaveType,
            LeaveStatus,
            LeaveStatusUpdate,
            LeaveApplication,
            AttendanceCount,
            PresenceSummary
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Attendance", description = "Check-in, check-out and attendance records"),
        (name = "Leave", description = "Leave applications"),
        (name = "Reports", description = "Attendance exports and headcount"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
