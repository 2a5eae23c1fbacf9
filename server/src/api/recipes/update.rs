use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::RecipeChanges;
use axum::{
    extract::{Path, State},
    Json,
};
use potluck_core::RandomTokenSource;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::find_owned_recipe;
use super::view::{recipe_response, RecipeResponse};
use super::write::{
    check_references, update_recipe as write_update, validate_cooking_time, validate_ingredients,
    validate_name, validate_tags, validate_text, IngredientAmount,
};

/// Partial update. `tags` and `ingredients` are required and replace the
/// existing sets wholesale.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

impl UpdateRecipeRequest {
    /// Validate and split into column changes plus the required join sets.
    pub fn validate(&self) -> Result<(RecipeChanges<'_>, &[i32], &[IngredientAmount]), String> {
        let tags = self
            .tags
            .as_deref()
            .ok_or_else(|| "tags is required".to_string())?;
        let ingredients = self
            .ingredients
            .as_deref()
            .ok_or_else(|| "ingredients is required".to_string())?;

        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(text) = &self.text {
            validate_text(text)?;
        }
        if let Some(minutes) = self.cooking_time {
            validate_cooking_time(minutes)?;
        }
        validate_tags(tags)?;
        validate_ingredients(ingredients)?;

        let changes = RecipeChanges {
            name: self.name.as_deref().map(str::trim),
            text: self.text.as_deref(),
            cooking_time: self.cooking_time,
            image: self.image.as_deref().filter(|i| !i.trim().is_empty()),
        };
        Ok((changes, tags, ingredients))
    }
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    let mut conn = pool.get()?;
    let recipe = find_owned_recipe(&mut conn, id, user.id)?;

    let (changes, tags, ingredients) = request.validate().map_err(ApiError::Validation)?;
    check_references(&mut conn, tags, ingredients)?.map_err(ApiError::Validation)?;

    let updated = write_update(
        &mut conn,
        &recipe,
        &changes,
        tags,
        ingredients,
        &mut RandomTokenSource,
    )?;
    tracing::info!(recipe_id = %updated.id, "recipe updated");

    let response = recipe_response(&mut conn, Some(user.id), &config.host_name, updated)?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_and_ingredients_required() {
        let request = UpdateRecipeRequest {
            name: Some("Soup".to_string()),
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 2 }]),
            ..Default::default()
        };
        assert_eq!(request.validate().unwrap_err(), "tags is required");

        let request = UpdateRecipeRequest {
            tags: Some(vec![1]),
            ..Default::default()
        };
        assert_eq!(request.validate().unwrap_err(), "ingredients is required");
    }

    #[test]
    fn test_only_given_fields_change() {
        let request = UpdateRecipeRequest {
            cooking_time: Some(15),
            tags: Some(vec![1]),
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 2 }]),
            ..Default::default()
        };
        let (changes, tags, ingredients) = request.validate().unwrap();
        assert_eq!(changes.cooking_time, Some(15));
        assert!(changes.name.is_none());
        assert!(changes.text.is_none());
        assert_eq!(tags, &[1]);
        assert_eq!(ingredients.len(), 1);
    }

    #[test]
    fn test_rejects_invalid_optional_fields() {
        let request = UpdateRecipeRequest {
            cooking_time: Some(0),
            tags: Some(vec![1]),
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 2 }]),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
