use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiResult;
use crate::schema::recipes;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::find_owned_recipe;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;
    let recipe = find_owned_recipe(&mut conn, id, user.id)?;

    // Join rows, favorites and cart entries go with it (ON DELETE CASCADE)
    diesel::delete(recipes::table.find(recipe.id)).execute(&mut conn)?;
    tracing::info!(recipe_id = %recipe.id, "recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}
