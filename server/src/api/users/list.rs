use crate::api::pagination::{PaginationMetadata, PaginationParams};
use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::db::DbPool;
use crate::error::ApiResult;
use crate::models::User;
use crate::schema::users;
use axum::{
    extract::{Query, State},
    Json,
};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::view::{user_responses, UserResponse};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Registered users", body = ListUsersResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn list_users(
    viewer: MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ListUsersResponse>> {
    let (limit, offset) = params.resolve();
    let mut conn = pool.get()?;

    let rows: Vec<(User, i64)> = users::table
        .order(users::username.asc())
        .select((User::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    let total = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let users = rows.into_iter().map(|(user, _)| user).collect();
    let users = user_responses(&mut conn, viewer.id(), users)?;

    Ok(Json(ListUsersResponse {
        users,
        pagination: PaginationMetadata {
            total,
            limit,
            offset,
        },
    }))
}
