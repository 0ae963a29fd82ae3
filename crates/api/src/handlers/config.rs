//! Whole-document config access and the editor page.

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use invite_core::error::CoreError;

use crate::error::AppResult;
use crate::middleware::auth::ApiKey;
use crate::state::AppState;

/// GET /api/config/config
///
/// The raw document, unknown keys included.
pub async fn get_config(
    _key: ApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    Ok(Json(state.store.raw().await?))
}

/// GET /api/config
///
/// Serves the static editor page. Public: the page itself asks for the key.
pub async fn config_page(State(state): State<AppState>) -> AppResult<Html<String>> {
    let path = &state.config.config_ui_path;
    match tokio::fs::read_to_string(path).await {
        Ok(page) => Ok(Html(page)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CoreError::not_found(
            "Config UI",
            path.display().to_string(),
        )
        .into()),
        Err(e) => Err(CoreError::Io(format!("Failed to read config UI: {e}")).into()),
    }
}
