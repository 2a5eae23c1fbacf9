use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::NewFavorite;
use crate::schema::favorites;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::find_recipe;
use super::view::RecipeMinified;

/// Add a favorite. Returns false if it was already there.
pub fn add_favorite(conn: &mut PgConnection, user_id: Uuid, recipe_id: Uuid) -> QueryResult<bool> {
    let inserted = diesel::insert_into(favorites::table)
        .values(&NewFavorite { user_id, recipe_id })
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(inserted > 0)
}

/// Remove a favorite. Returns false if there was none.
pub fn remove_favorite(
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_id: Uuid,
) -> QueryResult<bool> {
    let deleted = diesel::delete(
        favorites::table
            .filter(favorites::user_id.eq(user_id))
            .filter(favorites::recipe_id.eq(recipe_id)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeMinified),
        (status = 400, description = "Already in favorites", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn favorite(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<RecipeMinified>)> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    if !add_favorite(&mut conn, user.id, recipe.id)? {
        return Err(ApiError::validation("Recipe is already in favorites"));
    }

    Ok((StatusCode::CREATED, Json(recipe.into())))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Not in favorites", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unfavorite(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    if !remove_favorite(&mut conn, user.id, recipe.id)? {
        return Err(ApiError::validation("Recipe is not in favorites"));
    }

    Ok(StatusCode::NO_CONTENT)
}
