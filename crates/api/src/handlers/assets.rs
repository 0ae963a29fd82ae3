//! Font and template file management.
//!
//! Both stores are flat folders addressed by filename; the handlers differ
//! only in which [`AssetStore`] they touch.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use invite_core::assets::{safe_filename, AssetStore};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKey;
use crate::response::{ItemsResponse, OkResponse};
use crate::state::AppState;

/// Multipart field holding the uploaded file.
const FILE_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

/// GET /api/config/fonts
pub async fn list_fonts(
    _key: ApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<ItemsResponse<String>>> {
    list(&state.fonts).await
}

/// POST /api/config/fonts
pub async fn upload_font(
    _key: ApiKey,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<OkResponse>)> {
    upload(&state.fonts, multipart).await
}

/// DELETE /api/config/fonts/{filename}
pub async fn delete_font(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Json<OkResponse>> {
    remove(&state.fonts, &filename).await
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// GET /api/config/templates
pub async fn list_templates(
    _key: ApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<ItemsResponse<String>>> {
    list(&state.templates).await
}

/// POST /api/config/templates
pub async fn upload_template(
    _key: ApiKey,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<OkResponse>)> {
    upload(&state.templates, multipart).await
}

/// DELETE /api/config/templates/{filename}
pub async fn delete_template(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Json<OkResponse>> {
    remove(&state.templates, &filename).await
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

async fn list(store: &AssetStore) -> AppResult<Json<ItemsResponse<String>>> {
    Ok(Json(ItemsResponse {
        items: store.list().await?,
    }))
}

/// Store the `file` field under its client-supplied name. Other fields are
/// ignored.
async fn upload(
    store: &AssetStore,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<OkResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = safe_filename(field.file_name().unwrap_or_default())?.to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        store.put(&filename, &data).await?;
        return Ok((StatusCode::CREATED, Json(OkResponse::stored(filename))));
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}

async fn remove(store: &AssetStore, filename: &str) -> AppResult<Json<OkResponse>> {
    store.remove(filename).await?;
    Ok(Json(OkResponse::ok()))
}
