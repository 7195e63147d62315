use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha@company.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    #[schema(example = "female")]
    pub gender: String,
    /// organization-assigned employee number
    #[schema(example = 42)]
    pub employee_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "asha@company.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub access_token: String,
}

/// Generic acknowledgement body.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Attendance record deleted successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// employee email
    pub sub: String,
    pub employee_id: u64,
    pub exp: usize,
    pub jti: String,
}
