use crate::api::pagination::{PaginationMetadata, PaginationParams};
use crate::api::recipes::view::RecipeMinified;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiResult;
use crate::models::{Recipe, User};
use crate::schema::{recipes, subscriptions, users};
use axum::{
    extract::{Query, State},
    Json,
};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::view::UserResponse;

#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams)]
pub struct SubscriptionsParams {
    /// Number of authors to return (default: 20, max: 1000)
    pub limit: Option<i64>,
    /// Number of authors to skip (default: 0)
    pub offset: Option<i64>,
    /// Maximum number of recipes shown per author (default: all)
    pub recipes_limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Newest first, capped by `recipes_limit`
    pub recipes: Vec<RecipeMinified>,
    /// Total number of recipes by this author
    pub recipes_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListSubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
    pub pagination: PaginationMetadata,
}

/// Attach each author's recipes. Every author here is followed by the viewer.
pub fn subscription_responses(
    conn: &mut PgConnection,
    authors: Vec<User>,
    recipes_limit: Option<i64>,
) -> QueryResult<Vec<SubscriptionResponse>> {
    let ids: Vec<Uuid> = authors.iter().map(|a| a.id).collect();

    let rows: Vec<Recipe> = if ids.is_empty() {
        Vec::new()
    } else {
        recipes::table
            .filter(recipes::author_id.eq_any(&ids))
            .order((recipes::created_at.desc(), recipes::id.asc()))
            .select(Recipe::as_select())
            .load(conn)?
    };

    let mut by_author: HashMap<Uuid, Vec<Recipe>> = HashMap::new();
    for recipe in rows {
        by_author.entry(recipe.author_id).or_default().push(recipe);
    }

    let cap = recipes_limit.map(|n| n.max(0) as usize);

    Ok(authors
        .into_iter()
        .map(|author| {
            let recipes = by_author.remove(&author.id).unwrap_or_default();
            let recipes_count = recipes.len() as i64;
            let shown = cap.unwrap_or(recipes.len());
            SubscriptionResponse {
                user: UserResponse::new(author, true),
                recipes: recipes
                    .into_iter()
                    .take(shown)
                    .map(RecipeMinified::from)
                    .collect(),
                recipes_count,
            }
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(SubscriptionsParams),
    responses(
        (status = 200, description = "Authors the user follows", body = ListSubscriptionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<SubscriptionsParams>,
) -> ApiResult<Json<ListSubscriptionsResponse>> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();
    let mut conn = pool.get()?;

    let rows: Vec<(User, i64)> = users::table
        .inner_join(subscriptions::table.on(subscriptions::author_id.eq(users::id)))
        .filter(subscriptions::user_id.eq(user.id))
        .order(users::username.asc())
        .select((User::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    let total = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let authors = rows.into_iter().map(|(author, _)| author).collect();
    let subscriptions = subscription_responses(&mut conn, authors, params.recipes_limit)?;

    Ok(Json(ListSubscriptionsResponse {
        subscriptions,
        pagination: PaginationMetadata {
            total,
            limit,
            offset,
        },
    }))
}
