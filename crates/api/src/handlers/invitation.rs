//! Handler for the invitation acceptance endpoint.

use axum::extract::State;
use axum::Json;
use invite_core::form::InvitationForm;
use invite_worker::Accepted;

use crate::error::AppResult;
use crate::middleware::auth::ApiKey;
use crate::state::AppState;

/// POST /api/invitation
///
/// Validate the request and queue it. The response only reports acceptance;
/// rendering and mailing happen later on a worker.
pub async fn create_invitation(
    _key: ApiKey,
    State(state): State<AppState>,
    Json(form): Json<InvitationForm>,
) -> AppResult<Json<Accepted>> {
    let accepted = state.dispatcher.submit(form).await?;
    Ok(Json(accepted))
}
