use crate::api::tags::TagResponse;
use crate::api::users::view::{subscribed_to, UserResponse};
use crate::models::{Ingredient, Recipe, Tag, User};
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, shopping_cart_entries, tags, users,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use potluck_core::short_link_url;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub name: String,
    pub author: UserResponse,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub image: Option<String>,
    pub text: String,
    /// Minutes
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub short_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Compact recipe card used by favorites, cart and subscription listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeMinified {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeMinified {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

fn viewer_marks(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    recipe_ids: &[Uuid],
) -> QueryResult<(HashSet<Uuid>, HashSet<Uuid>)> {
    let Some(viewer) = viewer else {
        return Ok((HashSet::new(), HashSet::new()));
    };

    let favorited: Vec<Uuid> = favorites::table
        .filter(favorites::user_id.eq(viewer))
        .filter(favorites::recipe_id.eq_any(recipe_ids))
        .select(favorites::recipe_id)
        .load(conn)?;

    let in_cart: Vec<Uuid> = shopping_cart_entries::table
        .filter(shopping_cart_entries::user_id.eq(viewer))
        .filter(shopping_cart_entries::recipe_id.eq_any(recipe_ids))
        .select(shopping_cart_entries::recipe_id)
        .load(conn)?;

    Ok((
        favorited.into_iter().collect(),
        in_cart.into_iter().collect(),
    ))
}

/// Full representations for `recipes`, in the given order, as seen by `viewer`.
///
/// Authors, tags, ingredients and viewer flags are each fetched with one
/// query for the whole batch.
pub fn recipe_responses(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    host: &str,
    recipes: Vec<Recipe>,
) -> QueryResult<Vec<RecipeResponse>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<Uuid, User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let subscribed = subscribed_to(conn, viewer, &author_ids)?;

    let tag_rows: Vec<(Uuid, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .order(tags::name.asc())
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)?;
    let mut tags_by_recipe: HashMap<Uuid, Vec<TagResponse>> = HashMap::new();
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag.into());
    }

    let ingredient_rows: Vec<(Uuid, Ingredient, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .order((ingredients::name.asc(), ingredients::id.asc()))
        .select((
            recipe_ingredients::recipe_id,
            Ingredient::as_select(),
            recipe_ingredients::amount,
        ))
        .load(conn)?;
    let mut ingredients_by_recipe: HashMap<Uuid, Vec<RecipeIngredientResponse>> = HashMap::new();
    for (recipe_id, ingredient, amount) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount,
            });
    }

    let (favorited, in_cart) = viewer_marks(conn, viewer, &recipe_ids)?;

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors
                .get(&recipe.author_id)
                .cloned()
                .ok_or(diesel::result::Error::NotFound)?;
            let is_subscribed = subscribed.contains(&author.id);

            Ok(RecipeResponse {
                id: recipe.id,
                author: UserResponse::new(author, is_subscribed),
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                short_link: recipe
                    .short_link_token
                    .as_deref()
                    .map(|token| short_link_url(host, token)),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
                created_at: recipe.created_at,
            })
        })
        .collect()
}

/// Single-recipe convenience over [`recipe_responses`].
pub fn recipe_response(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    host: &str,
    recipe: Recipe,
) -> QueryResult<RecipeResponse> {
    recipe_responses(conn, viewer, host, vec![recipe])?
        .pop()
        .ok_or(diesel::result::Error::NotFound)
}
