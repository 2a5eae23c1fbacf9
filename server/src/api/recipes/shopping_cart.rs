use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::NewCartEntry;
use crate::schema::shopping_cart_entries;
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

/// Put a recipe in the cart. Returns false if it was already there.
pub fn add_to_cart(conn: &mut PgConnection, user_id: Uuid, recipe_id: Uuid) -> QueryResult<bool> {
    let inserted = diesel::insert_into(shopping_cart_entries::table)
        .values(&NewCartEntry { user_id, recipe_id })
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(inserted > 0)
}

/// Take a recipe out of the cart. Returns false if it was not there.
pub fn remove_from_cart(
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_id: Uuid,
) -> QueryResult<bool> {
    let deleted = diesel::delete(
        shopping_cart_entries::table
            .filter(shopping_cart_entries::user_id.eq(user_id))
            .filter(shopping_cart_entries::recipe_id.eq(recipe_id)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to the shopping cart", body = RecipeMinified),
        (status = 400, description = "Already in the shopping cart", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_to_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<RecipeMinified>)> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    if !add_to_cart(&mut conn, user.id, recipe.id)? {
        return Err(ApiError::validation("Recipe is already in the shopping cart"));
    }

    Ok((StatusCode::CREATED, Json(recipe.into())))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 400, description = "Not in the shopping cart", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_from_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    if !remove_from_cart(&mut conn, user.id, recipe.id)? {
        return Err(ApiError::validation("Recipe is not in the shopping cart"));
    }

    Ok(StatusCode::NO_CONTENT)
}
