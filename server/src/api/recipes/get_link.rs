use crate::api::ErrorResponse;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use potluck_core::short_link_url;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::find_recipe;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Public short link", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_link(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ShortLinkResponse>> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    let token = recipe
        .short_link_token
        .ok_or_else(|| ApiError::NotFound("Recipe has no short link".to_string()))?;

    Ok(Json(ShortLinkResponse {
        short_link: short_link_url(&config.host_name, &token),
    }))
}
