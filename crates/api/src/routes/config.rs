use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::{assets, cities, config, presets};
use crate::state::AppState;

/// Mount config editor routes.
///
/// ```text
/// GET    /                      config_page
/// GET    /config                get_config
/// GET    /presets               list_presets
/// POST   /presets               create_preset
/// PUT    /presets/{name}        update_preset
/// DELETE /presets/{name}        delete_preset
/// GET    /cities                list_cities
/// POST   /cities                create_city
/// PUT    /cities/{name}         update_city
/// DELETE /cities/{name}         delete_city
/// GET    /fonts                 list_fonts
/// POST   /fonts                 upload_font
/// DELETE /fonts/{filename}      delete_font
/// GET    /templates             list_templates
/// POST   /templates             upload_template
/// DELETE /templates/{filename}  delete_template
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(config::config_page))
        .route("/config", get(config::get_config))
        .route(
            "/presets",
            get(presets::list_presets).post(presets::create_preset),
        )
        .route(
            "/presets/{name}",
            put(presets::update_preset).delete(presets::delete_preset),
        )
        .route(
            "/cities",
            get(cities::list_cities).post(cities::create_city),
        )
        .route(
            "/cities/{name}",
            put(cities::update_city).delete(cities::delete_city),
        )
        .route("/fonts", get(assets::list_fonts).post(assets::upload_font))
        .route("/fonts/{filename}", delete(assets::delete_font))
        .route(
            "/templates",
            get(assets::list_templates).post(assets::upload_template),
        )
        .route("/templates/{filename}", delete(assets::delete_template))
}
