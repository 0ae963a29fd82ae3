use axum::routing::post;
use axum::Router;

use crate::handlers::invitation;
use crate::state::AppState;

/// Mount invitation routes.
///
/// ```text
/// POST   /    create_invitation
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(invitation::create_invitation))
}
