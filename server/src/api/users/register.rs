use crate::api::ErrorResponse;
use crate::auth::hash_password;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 150;
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Usernames that would shadow fixed routes under /api/users.
const RESERVED_USERNAMES: &[&str] = &["me", "subscriptions", "set_password"];

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

pub fn validate_email(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Enter a valid email address".to_string());
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(' ') {
        return Err("Enter a valid email address".to_string());
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(format!("Email must be at most {MAX_EMAIL_LENGTH} characters"));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "Username must be at most {MAX_NAME_LENGTH} characters"
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(
            "Username may contain only letters, digits and the characters . @ + - _".to_string(),
        );
    }
    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(format!("Username '{username}' is reserved"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password cannot be entirely numeric".to_string());
    }
    Ok(())
}

fn validate_person_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("{field} must be at most {MAX_NAME_LENGTH} characters"));
    }
    Ok(())
}

fn validate(req: &RegisterRequest) -> Result<(), String> {
    validate_email(req.email.trim())?;
    validate_username(&req.username)?;
    validate_person_name("First name", &req.first_name)?;
    validate_person_name("Last name", &req.last_name)?;
    validate_password(&req.password)
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email or username already taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    validate(&req).map_err(ApiError::Validation)?;

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?;

    let mut conn = pool.get()?;

    let new_user = NewUser {
        email: req.email.trim(),
        username: &req.username,
        first_name: req.first_name.trim(),
        last_name: req.last_name.trim(),
        password_hash: &password_hash,
    };

    let user = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
    {
        Ok(user) => user,
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
            let message = match info.constraint_name() {
                Some("users_email_key") => "A user with that email already exists",
                _ => "A user with that username already exists",
            };
            return Err(ApiError::Conflict(message.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("cook.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("cook@localhost").is_err());
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("chef.anna+test@home-1_x").is_ok());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_reserved_usernames() {
        assert!(validate_username("me").is_err());
        assert!(validate_username("ME").is_err());
        assert!(validate_username("meal").is_ok());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("tasty-soup-42").is_ok());
    }
}
