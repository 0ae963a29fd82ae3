pub mod config;
pub mod health;
pub mod invitation;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /invitation                      submit (POST)
///
/// /config                          editor page (GET, public)
/// /config/config                   raw document (GET)
/// /config/presets                  list, create
/// /config/presets/{name}           update, delete
/// /config/cities                   list, create
/// /config/cities/{name}            update, delete
/// /config/fonts                    list, upload
/// /config/fonts/{filename}         delete
/// /config/templates                list, upload
/// /config/templates/{filename}     delete
/// ```
///
/// Everything except the editor page requires the `api-key` header.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/invitation", invitation::router())
        .nest("/config", config::router())
}
