use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    services::accounts::{self, AccountResponse, UpdateAccountRequest},
    state::AppState,
};

#[derive(Deserialize)]
pub struct AddAccountRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ToggleAccountRequest {
    pub current_status: bool,
}

#[derive(Deserialize)]
pub struct UpdateAccountPayload {
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

pub async fn list_accounts(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AccountResponse>>> {
    Ok(Json(accounts::list_accounts(&state)?))
}

pub async fn add_account(
    State(state): State<AppState>,
    Json(payload): Json<AddAccountRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let account = accounts::add_account(&state, &payload.email)?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn toggle_account_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<ToggleAccountRequest>,
) -> AppResult<Json<AccountResponse>> {
    let account = accounts::toggle_account_status(&state, &email, payload.current_status)?;
    Ok(Json(account))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<UpdateAccountPayload>,
) -> AppResult<Json<AccountResponse>> {
    let account = accounts::update_account(
        &state,
        &email,
        UpdateAccountRequest {
            name: payload.name,
            avatar_url: payload.avatar_url,
        },
    )?;
    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<StatusCode> {
    accounts::delete_account(&state, &email)?;
    Ok(StatusCode::NO_CONTENT)
}
