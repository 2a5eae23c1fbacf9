use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewSubscription, User};
use crate::schema::{subscriptions, users};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use super::subscriptions::{subscription_responses, SubscriptionResponse};

#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams)]
pub struct SubscribeParams {
    /// Maximum number of the author's recipes in the response
    pub recipes_limit: Option<i64>,
}

fn find_author(conn: &mut PgConnection, id: Uuid) -> ApiResult<User> {
    users::table
        .find(id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("User"))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author to follow"),
        SubscribeParams
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self-subscription or already subscribed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(author_id): Path<Uuid>,
    Query(params): Query<SubscribeParams>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let mut conn = pool.get()?;
    let author = find_author(&mut conn, author_id)?;

    if author.id == user.id {
        return Err(ApiError::validation("You cannot subscribe to yourself"));
    }

    let inserted = diesel::insert_into(subscriptions::table)
        .values(&NewSubscription {
            user_id: user.id,
            author_id: author.id,
        })
        .on_conflict_do_nothing()
        .execute(&mut conn)?;

    if inserted == 0 {
        return Err(ApiError::validation("You are already subscribed to this user"));
    }

    let response = subscription_responses(&mut conn, vec![author], params.recipes_limit)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("subscription response missing".to_string()))?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author to unfollow")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(author_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;
    let author = find_author(&mut conn, author_id)?;

    let deleted = diesel::delete(
        subscriptions::table
            .filter(subscriptions::user_id.eq(user.id))
            .filter(subscriptions::author_id.eq(author.id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::validation("You are not subscribed to this user"));
    }

    Ok(StatusCode::NO_CONTENT)
}
