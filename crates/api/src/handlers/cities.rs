//! City contact CRUD. A city spans three maps in the config document.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use invite_core::city::{City, CityListing};

use crate::error::AppResult;
use crate::middleware::auth::ApiKey;
use crate::response::{ItemsResponse, OkResponse};
use crate::state::AppState;

/// GET /api/config/cities
///
/// Union of the names in all three maps, sorted. Missing values are `null`.
pub async fn list_cities(
    _key: ApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<ItemsResponse<CityListing>>> {
    let snapshot = state.store.snapshot().await?;
    Ok(Json(ItemsResponse {
        items: snapshot.cities(),
    }))
}

/// POST /api/config/cities
pub async fn create_city(
    _key: ApiKey,
    State(state): State<AppState>,
    Json(city): Json<City>,
) -> AppResult<(StatusCode, Json<OkResponse>)> {
    let name = city.name.clone();
    state.store.edit(|cfg| cfg.add_city(city)).await?;
    tracing::info!(city = %name, "City created");
    Ok((StatusCode::CREATED, Json(OkResponse::ok())))
}

/// PUT /api/config/cities/{name}
pub async fn update_city(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(city): Json<City>,
) -> AppResult<Json<OkResponse>> {
    state.store.edit(|cfg| cfg.update_city(&name, city)).await?;
    tracing::info!(city = %name, "City updated");
    Ok(Json(OkResponse::ok()))
}

/// DELETE /api/config/cities/{name}
pub async fn delete_city(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<OkResponse>> {
    state.store.edit(|cfg| cfg.delete_city(&name)).await?;
    tracing::info!(city = %name, "City deleted");
    Ok(Json(OkResponse::ok()))
}
