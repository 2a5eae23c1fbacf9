use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetAvatarRequest {
    /// Opaque image reference, e.g. a URL or data URI.
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar",
    tag = "users",
    request_body = SetAvatarRequest,
    responses(
        (status = 200, description = "Avatar set", body = AvatarResponse),
        (status = 400, description = "Empty avatar", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<SetAvatarRequest>,
) -> ApiResult<Json<AvatarResponse>> {
    let avatar = req.avatar.trim();
    if avatar.is_empty() {
        return Err(ApiError::validation("Avatar cannot be empty"));
    }

    let mut conn = pool.get()?;
    diesel::update(users::table.find(user.id))
        .set((users::avatar.eq(avatar), users::updated_at.eq(Utc::now())))
        .execute(&mut conn)?;

    Ok(Json(AvatarResponse {
        avatar: avatar.to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar",
    tag = "users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;
    diesel::update(users::table.find(user.id))
        .set((
            users::avatar.eq(None::<String>),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    Ok(StatusCode::NO_CONTENT)
}
