use crate::{
    auth::{
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::ApiError,
    models::{LoginReqDto, LoginResponse, MessageResponse, RegisterReq},
    utils::email_registry,
};
use actix_web::{HttpResponse, web};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error, info, instrument};

#[derive(FromRow)]
struct Credentials {
    employee_id: u64,
    email: String,
    hashed_password: String,
}

/// Register an employee
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Employee added", body = MessageResponse),
        (status = 400, description = "Missing name, email or password", body = MessageResponse),
        (status = 409, description = "Email or employee id already registered", body = MessageResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let name = payload.name.trim();
    let email = email_registry::normalize(&payload.email);

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, email and password must not be empty".into(),
        ));
    }

    if !email_registry::is_available(&email, pool.get_ref()).await? {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hashed = hash_password(&payload.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;

    let result = sqlx::query(
        r#"
        INSERT INTO employee (employee_id, name, email, hashed_password, gender)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(name)
    .bind(&email)
    .bind(hashed)
    .bind(payload.gender.trim())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            email_registry::remember(&email).await;
            info!(employee_id = payload.employee_id, "Employee registered");
            Ok(HttpResponse::Created().json(MessageResponse::new("Employee added successfully")))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            ApiError::Conflict("Email or employee id already registered".into()),
        ),
        Err(e) => Err(ApiError::Database(e)),
    }
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = MessageResponse)
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let invalid = || ApiError::Unauthorized("Invalid email or password".into());

    if user.email.trim().is_empty() || user.password.is_empty() {
        return Err(invalid());
    }

    debug!("Fetching employee from database");

    let creds = sqlx::query_as::<_, Credentials>(
        r#"
        SELECT employee_id, email, hashed_password
        FROM employee
        WHERE email = ?
        "#,
    )
    .bind(email_registry::normalize(&user.email))
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        info!("Invalid credentials: employee not found");
        invalid()
    })?;

    if let Err(e) = verify_password(&user.password, &creds.hashed_password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid());
    }

    let access_token = generate_access_token(
        &creds.email,
        creds.employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token signing failed: {e}")))?;

    // Non-fatal
    if let Err(e) = sqlx::query("UPDATE employee SET last_login_at = NOW() WHERE email = ?")
        .bind(&creds.email)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(employee_id = creds.employee_id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".into(),
        access_token,
    }))
}
