use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::error::ApiResult;
use crate::models::Ingredient;
use crate::schema::ingredients;
use axum::{
    extract::{Query, State},
    Json,
};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::IngredientResponse;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientsResponse {
    pub ingredients: Vec<IngredientResponse>,
}

/// `LIKE` pattern matching names that start with `prefix`.
pub fn prefix_pattern(prefix: &str) -> String {
    let escaped = prefix
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{escaped}%")
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "Ingredients ordered by name", body = IngredientsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListIngredientsParams>,
) -> ApiResult<Json<IngredientsResponse>> {
    let mut conn = pool.get()?;

    let mut query = ingredients::table.into_boxed();

    // Matches the LOWER(name) index
    if let Some(name) = params.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        query = query.filter(
            sql::<Bool>("LOWER(name) LIKE ")
                .bind::<Text, _>(prefix_pattern(name)),
        );
    }

    let rows: Vec<Ingredient> = query
        .order((ingredients::name.asc(), ingredients::id.asc()))
        .select(Ingredient::as_select())
        .load(&mut conn)?;

    Ok(Json(IngredientsResponse {
        ingredients: rows.into_iter().map(IngredientResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern_lowercases() {
        assert_eq!(prefix_pattern("Flo"), "flo%");
    }

    #[test]
    fn test_prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("50%_off"), "50\\%\\_off%");
    }
}
