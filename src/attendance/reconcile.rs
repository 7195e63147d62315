use chrono::NaiveTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::attendance::clock::Clock;
use crate::attendance::store::{AttendanceStore, CloseOut, InsertOutcome, NewCheckIn};
use crate::error::ApiError;
use crate::model::attendance::Attendance;
use crate::utils::time::{day_of_week, elapsed_as_time};

/// One submitted attendance event, photo already stored.
#[derive(Debug, Clone)]
pub struct AttendanceEvent {
    pub employee_id: u64,
    pub display_name: String,
    pub event_time: NaiveTime,
    pub photo_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
}

#[derive(Debug)]
pub struct Reconciled {
    pub action: AttendanceAction,
    pub record: Attendance,
}

/// Working hours for closing `existing` at `out_time`.
pub fn plan_check_out(existing: &Attendance, out_time: NaiveTime) -> Result<NaiveTime, ApiError> {
    if existing.is_checked_out() {
        return Err(ApiError::AlreadyCheckedOut);
    }

    elapsed_as_time(existing.in_time, out_time).ok_or(ApiError::OutOfOrder {
        in_time: existing.in_time,
        out_time,
    })
}

/// First event of the day opens the record, the second closes it, anything
/// after that is rejected.
///
/// The insert is attempted first and the store's `(employee_id, date)`
/// uniqueness decides the branch, so concurrent submissions cannot create a
/// second record for the same day.
pub async fn record_event<S: AttendanceStore>(
    store: &S,
    clock: &dyn Clock,
    event: AttendanceEvent,
) -> Result<Reconciled, ApiError> {
    let today = clock.now().date();

    let check_in = NewCheckIn {
        employee_id: event.employee_id,
        display_name: event.display_name,
        date: today,
        day: day_of_week(today),
        in_time: event.event_time,
        image_url: event.photo_url.clone(),
    };

    match store.insert_check_in(&check_in).await? {
        InsertOutcome::Inserted(id) => {
            tracing::info!(employee_id = event.employee_id, %today, "Checked in");
            Ok(Reconciled {
                action: AttendanceAction::CheckIn,
                record: check_in.into_record(id),
            })
        }
        InsertOutcome::Duplicate => {
            let existing = store
                .find_for_day(event.employee_id, today)
                .await?
                .ok_or_else(|| {
                    ApiError::Conflict("Attendance record changed concurrently, retry".into())
                })?;

            let working_hours = plan_check_out(&existing, event.event_time)?;

            let close = CloseOut {
                id: existing.id,
                out_time: event.event_time,
                working_hours,
                checkout_image_url: event.photo_url,
            };

            // Lost a race against another check-out
            if !store.close_out(&close).await? {
                return Err(ApiError::AlreadyCheckedOut);
            }

            tracing::info!(
                employee_id = event.employee_id,
                %today,
                working_hours = %working_hours,
                "Checked out"
            );

            Ok(Reconciled {
                action: AttendanceAction::CheckOut,
                record: Attendance {
                    out_time: Some(close.out_time),
                    working_hours: Some(close.working_hours),
                    checkout_image_url: Some(close.checkout_image_url),
                    ..existing
                },
            })
        }
    }
}
