use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, http::StatusCode, Json};
use potluck_core::RandomTokenSource;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::view::{recipe_response, RecipeResponse};
use super::write::{check_references, insert_recipe, validate_draft, IngredientAmount, RecipeDraft};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub text: String,
    /// Minutes, at least 1
    pub cooking_time: i32,
    /// Opaque image reference
    pub image: Option<String>,
    /// Tag IDs
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

impl CreateRecipeRequest {
    pub fn draft(&self) -> RecipeDraft<'_> {
        RecipeDraft {
            name: &self.name,
            text: &self.text,
            cooking_time: self.cooking_time,
            image: self.image.as_deref().filter(|i| !i.trim().is_empty()),
            tags: &self.tags,
            ingredients: &self.ingredients,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Json(request): Json<CreateRecipeRequest>,
) -> ApiResult<(StatusCode, Json<RecipeResponse>)> {
    let draft = request.draft();
    validate_draft(&draft).map_err(ApiError::Validation)?;

    let mut conn = pool.get()?;
    check_references(&mut conn, draft.tags, draft.ingredients)?.map_err(ApiError::Validation)?;

    let recipe = insert_recipe(&mut conn, user.id, &draft, &mut RandomTokenSource)?;
    tracing::info!(
        recipe_id = %recipe.id,
        token = recipe.short_link_token.as_deref().unwrap_or_default(),
        "recipe created"
    );

    let response = recipe_response(&mut conn, Some(user.id), &config.host_name, recipe)?;
    Ok((StatusCode::CREATED, Json(response)))
}
