use crate::api::pagination::{PaginationMetadata, PaginationParams};
use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::Recipe;
use crate::schema::{favorites, recipe_tags, recipes, shopping_cart_entries, tags};
use axum::{
    extract::{Query, State},
    Json,
};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::view::{recipe_responses, RecipeResponse};

/// Query parameters for the recipe list.
///
/// Read from raw key/value pairs because `tags` may repeat.
#[derive(Debug, Default, Clone, PartialEq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRecipesParams {
    /// Number of items to return (default: 20, max: 1000)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
    /// Tag slugs; a recipe matches if it has any of them. Repeat the
    /// parameter or separate slugs with commas.
    pub tags: Vec<String>,
    /// Only recipes by this author
    pub author: Option<Uuid>,
    /// 1 for only the viewer's favorites, 0 to exclude them
    pub is_favorited: Option<bool>,
    /// 1 for only recipes in the viewer's cart, 0 to exclude them
    pub is_in_shopping_cart: Option<bool>,
}

fn parse_flag(key: &str, value: &str) -> Result<bool, String> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(format!("{key} must be 0 or 1")),
    }
}

fn parse_number(key: &str, value: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("{key} must be an integer"))
}

impl ListRecipesParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, String> {
        let mut params = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "limit" => params.limit = Some(parse_number(&key, &value)?),
                "offset" => params.offset = Some(parse_number(&key, &value)?),
                "tags" => params.tags.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                ),
                "author" => {
                    let id = value
                        .parse()
                        .map_err(|_| "author must be a user ID".to_string())?;
                    params.author = Some(id);
                }
                "is_favorited" => params.is_favorited = Some(parse_flag(&key, &value)?),
                "is_in_shopping_cart" => {
                    params.is_in_shopping_cart = Some(parse_flag(&key, &value)?)
                }
                // Unknown parameters are ignored
                _ => {}
            }
        }

        params.tags.sort();
        params.tags.dedup();
        Ok(params)
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Recipes, newest first", body = ListRecipesResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    viewer: MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ListRecipesResponse>> {
    let params = ListRecipesParams::from_pairs(pairs).map_err(ApiError::Validation)?;
    let (limit, offset) = params.pagination().resolve();
    let viewer_id = viewer.id();

    let mut conn = pool.get()?;

    let mut query = recipes::table.into_boxed();

    if let Some(author) = params.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    if !params.tags.is_empty() {
        query = query.filter(
            recipes::id.eq_any(
                recipe_tags::table
                    .inner_join(tags::table)
                    .filter(tags::slug.eq_any(params.tags.clone()))
                    .select(recipe_tags::recipe_id),
            ),
        );
    }

    // Membership filters only make sense for a known viewer
    if let Some(viewer_id) = viewer_id {
        let favorited = favorites::table
            .filter(favorites::user_id.eq(viewer_id))
            .select(favorites::recipe_id);
        match params.is_favorited {
            Some(true) => query = query.filter(recipes::id.eq_any(favorited)),
            Some(false) => query = query.filter(recipes::id.ne_all(favorited)),
            None => {}
        }

        let in_cart = shopping_cart_entries::table
            .filter(shopping_cart_entries::user_id.eq(viewer_id))
            .select(shopping_cart_entries::recipe_id);
        match params.is_in_shopping_cart {
            Some(true) => query = query.filter(recipes::id.eq_any(in_cart)),
            Some(false) => query = query.filter(recipes::id.ne_all(in_cart)),
            None => {}
        }
    }

    // COUNT(*) OVER() computes the total count across all matching rows
    let rows: Vec<(Recipe, i64)> = query
        .order((recipes::created_at.desc(), recipes::id.asc()))
        .select((Recipe::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    let total = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let page = rows.into_iter().map(|(recipe, _)| recipe).collect();
    let recipes = recipe_responses(&mut conn, viewer_id, &config.host_name, page)?;

    Ok(Json(ListRecipesResponse {
        recipes,
        pagination: PaginationMetadata {
            total,
            limit,
            offset,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_query() {
        let params = ListRecipesParams::from_pairs(Vec::new()).unwrap();
        assert_eq!(params, ListRecipesParams::default());
    }

    #[test]
    fn test_repeated_and_comma_separated_tags() {
        let params = ListRecipesParams::from_pairs(pairs(&[
            ("tags", "lunch"),
            ("tags", "breakfast,dinner"),
            ("tags", "lunch"),
        ]))
        .unwrap();
        assert_eq!(params.tags, vec!["breakfast", "dinner", "lunch"]);
    }

    #[test]
    fn test_flags() {
        let params = ListRecipesParams::from_pairs(pairs(&[
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "0"),
        ]))
        .unwrap();
        assert_eq!(params.is_favorited, Some(true));
        assert_eq!(params.is_in_shopping_cart, Some(false));

        assert!(ListRecipesParams::from_pairs(pairs(&[("is_favorited", "yes")])).is_err());
    }

    #[test]
    fn test_author_and_pagination() {
        let id = Uuid::new_v4();
        let params = ListRecipesParams::from_pairs(pairs(&[
            ("author", &id.to_string()),
            ("limit", "5"),
            ("offset", "10"),
        ]))
        .unwrap();
        assert_eq!(params.author, Some(id));
        assert_eq!(params.pagination().resolve(), (5, 10));

        assert!(ListRecipesParams::from_pairs(pairs(&[("author", "bob")])).is_err());
        assert!(ListRecipesParams::from_pairs(pairs(&[("limit", "many")])).is_err());
    }
}
