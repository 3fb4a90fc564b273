use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::{
    auth::AuthenticatedUser,
    error::AppResult,
    services::invites::{self, InviteOutcome, InviteResponse},
    state::AppState,
};

#[derive(Deserialize)]
pub struct InviteRequest {
    pub email: String,
}

pub async fn list_invites(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<InviteResponse>>> {
    Ok(Json(invites::list_invites(&state)?))
}

pub async fn invite_user(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Json(payload): Json<InviteRequest>,
) -> AppResult<(StatusCode, Json<InviteOutcome>)> {
    let outcome = invites::invite_user(&state, user.as_ref(), &payload.email).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
