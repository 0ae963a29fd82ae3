use std::sync::Arc;

use invite_core::assets::AssetStore;
use invite_core::config_store::ConfigStore;
use invite_worker::Dispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or is a small path wrapper.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// The JSON config document (presets and city contacts).
    pub store: Arc<ConfigStore>,
    pub fonts: AssetStore,
    pub templates: AssetStore,
    /// Accepts invitation requests onto the job queue.
    pub dispatcher: Arc<Dispatcher>,
}
