use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::find_recipe;
use super::view::{recipe_response, RecipeResponse};

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    viewer: MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RecipeResponse>> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;
    let response = recipe_response(&mut conn, viewer.id(), &config.host_name, recipe)?;
    Ok(Json(response))
}
