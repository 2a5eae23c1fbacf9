use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiResult;
use crate::schema::{ingredients, recipe_ingredients, recipes, shopping_cart_entries};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use potluck_core::{aggregate, render_shopping_list, CartRecipe, IngredientLine, ShoppingList};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const FILENAME: &str = "shopping_list.pdf";

/// Recipes are listed in creation order, ties broken by id.
type RecipeKey = (DateTime<Utc>, Uuid);

/// Gather the user's cart and aggregate it.
pub fn load_shopping_list(conn: &mut PgConnection, user_id: Uuid) -> ApiResult<ShoppingList> {
    let cart: Vec<(Uuid, String, DateTime<Utc>)> = shopping_cart_entries::table
        .inner_join(recipes::table)
        .filter(shopping_cart_entries::user_id.eq(user_id))
        .select((recipes::id, recipes::name, recipes::created_at))
        .load(conn)?;

    let keys: HashMap<Uuid, RecipeKey> = cart
        .iter()
        .map(|(id, _, created_at)| (*id, (*created_at, *id)))
        .collect();
    let recipe_ids: Vec<Uuid> = keys.keys().copied().collect();

    let lines: Vec<(Uuid, String, String, i32)> = if recipe_ids.is_empty() {
        Vec::new()
    } else {
        recipe_ingredients::table
            .inner_join(ingredients::table)
            .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
            .select((
                recipe_ingredients::recipe_id,
                ingredients::name,
                ingredients::measurement_unit,
                recipe_ingredients::amount,
            ))
            .load(conn)?
    };

    let cart_recipes = cart
        .into_iter()
        .map(|(id, name, created_at)| CartRecipe {
            id: (created_at, id),
            name,
        })
        .collect();
    let ingredient_lines = lines
        .into_iter()
        .filter_map(|(recipe_id, name, unit, amount)| {
            keys.get(&recipe_id).map(|key| IngredientLine {
                recipe_id: *key,
                name,
                unit,
                amount: i64::from(amount),
            })
        });

    Ok(aggregate(cart_recipes, ingredient_lines)?)
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 200, description = "Aggregated shopping list", content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Shopping cart is empty", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
) -> ApiResult<Response> {
    let mut conn = pool.get()?;
    let list = load_shopping_list(&mut conn, user.id)?;
    drop(conn);

    let pdf = render_shopping_list(&list, Some(config.font_path.as_path()))?;
    tracing::info!(
        user_id = %user.id,
        recipes = list.recipes.len(),
        items = list.item_count(),
        bytes = pdf.len(),
        "shopping list rendered"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{FILENAME}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}
