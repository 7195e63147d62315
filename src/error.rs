use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveTime;
use derive_more::Display;
use serde_json::json;

/// Every failure a handler can surface to the caller.
///
/// The `Display` text is what ends up in the `message` field of the
/// JSON error body.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "Invalid time '{}', expected HH:MM:SS", _0)]
    InvalidTime(String),

    #[display(
        fmt = "Check-out time {} is earlier than check-in time {}",
        out_time,
        in_time
    )]
    OutOfOrder {
        in_time: NaiveTime,
        out_time: NaiveTime,
    },

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut,

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "Database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "Photo storage error: {}", _0)]
    Photo(std::io::Error),

    #[display(fmt = "Internal error: {}", _0)]
    Internal(anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Database(e)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidTime(_) | ApiError::OutOfOrder { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyCheckedOut | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Photo(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(status).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn maps_error_kinds_to_status_codes() {
        assert_eq!(
            ApiError::InvalidTime("9am".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::AlreadyCheckedOut.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::NotFound("Attendance record not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn error_body_carries_the_reason() {
        let err = ApiError::OutOfOrder {
            in_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            out_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        };

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(
            value["message"],
            "Check-out time 08:00:00 is earlier than check-in time 09:00:00"
        );
    }
}
