//! Preset CRUD over the config document.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use invite_core::preset::Preset;

use crate::error::AppResult;
use crate::middleware::auth::ApiKey;
use crate::response::{ItemsResponse, OkResponse};
use crate::state::AppState;

/// GET /api/config/presets
pub async fn list_presets(
    _key: ApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<ItemsResponse<Preset>>> {
    let snapshot = state.store.snapshot().await?;
    Ok(Json(ItemsResponse {
        items: snapshot.presets,
    }))
}

/// POST /api/config/presets
pub async fn create_preset(
    _key: ApiKey,
    State(state): State<AppState>,
    Json(preset): Json<Preset>,
) -> AppResult<(StatusCode, Json<OkResponse>)> {
    let name = preset.name.clone();
    state.store.edit(|cfg| cfg.add_preset(preset)).await?;
    tracing::info!(preset = %name, "Preset created");
    Ok((StatusCode::CREATED, Json(OkResponse::ok())))
}

/// PUT /api/config/presets/{name}
pub async fn update_preset(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(preset): Json<Preset>,
) -> AppResult<Json<OkResponse>> {
    state
        .store
        .edit(|cfg| cfg.update_preset(&name, preset))
        .await?;
    tracing::info!(preset = %name, "Preset updated");
    Ok(Json(OkResponse::ok()))
}

/// DELETE /api/config/presets/{name}
pub async fn delete_preset(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<OkResponse>> {
    state.store.edit(|cfg| cfg.delete_preset(&name)).await?;
    tracing::info!(preset = %name, "Preset deleted");
    Ok(Json(OkResponse::ok()))
}
