use crate::api::ErrorResponse;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::schema::recipes;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use diesel::prelude::*;
use potluck_core::recipe_url;
use potluck_core::short_link::is_valid_token;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

/// Returns the router for short links (mounted at the root)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/s/{token}/", get(redirect))
        .route("/s/{token}", get(redirect))
}

#[utoipa::path(
    get,
    path = "/s/{token}/",
    tag = "short_links",
    params(
        ("token" = String, Path, description = "Short-link token")
    ),
    responses(
        (status = 302, description = "Redirect to the recipe page"),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    )
)]
pub async fn redirect(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(token): Path<String>,
) -> ApiResult<Response> {
    // Anything the allocator could not have produced cannot be in the table
    if !is_valid_token(&token) {
        return Err(ApiError::not_found("Short link"));
    }

    let mut conn = pool.get()?;
    let recipe_id: Uuid = recipes::table
        .filter(recipes::short_link_token.eq(&token))
        .select(recipes::id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Short link"))?;

    let location = recipe_url(&config.host_name, recipe_id);
    tracing::debug!(%token, %location, "short link resolved");

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

#[derive(OpenApi)]
#[openapi(paths(redirect))]
pub struct ApiDoc;
