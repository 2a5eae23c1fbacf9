pub mod create;
pub mod delete;
pub mod download;
pub mod favorite;
pub mod get;
pub mod get_link;
pub mod list;
pub mod shopping_cart;
pub mod update;
pub mod view;
pub mod write;

use crate::error::{ApiError, ApiResult};
use crate::models::Recipe;
use crate::schema::recipes;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use diesel::prelude::*;
use utoipa::OpenApi;
use uuid::Uuid;

pub fn find_recipe(conn: &mut PgConnection, id: Uuid) -> ApiResult<Recipe> {
    recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Recipe"))
}

/// Like [`find_recipe`], but only the author may proceed.
pub fn find_owned_recipe(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> ApiResult<Recipe> {
    let recipe = find_recipe(conn, id)?;
    if recipe.author_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the author can change this recipe".to_string(),
        ));
    }
    Ok(recipe)
}

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/download_shopping_cart",
            get(download::download_shopping_cart),
        )
        .route(
            "/{id}",
            get(get::get_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route("/{id}/get-link", get(get_link::get_link))
        .route(
            "/{id}/favorite",
            post(favorite::favorite).delete(favorite::unfavorite),
        )
        .route(
            "/{id}/shopping_cart",
            post(shopping_cart::add_to_shopping_cart)
                .delete(shopping_cart::remove_from_shopping_cart),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        list::list_recipes,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
        get_link::get_link,
        favorite::favorite,
        favorite::unfavorite,
        shopping_cart::add_to_shopping_cart,
        shopping_cart::remove_from_shopping_cart,
        download::download_shopping_cart,
    ),
    components(schemas(
        create::CreateRecipeRequest,
        update::UpdateRecipeRequest,
        write::IngredientAmount,
        list::ListRecipesResponse,
        view::RecipeResponse,
        view::RecipeMinified,
        view::RecipeIngredientResponse,
        get_link::ShortLinkResponse,
    ))
)]
pub struct ApiDoc;
