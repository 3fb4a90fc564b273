use axum::extract::{Json, Multipart, Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::read_upload_form;
use crate::auth::AuthenticatedUser;
use crate::checklist::{self, ChecklistEntry, IDENTITY_DOCS_TAG};
use crate::error::{AppError, AppResult, ErrorKind};
use crate::services::accounts::normalize_email;
use crate::services::documents::{self, UploadDocumentRequest};
use crate::state::AppState;
use crate::view::DocumentResponse;

#[derive(Deserialize)]
pub struct ChecklistQuery {
    pub owner: Option<String>,
}

#[derive(Serialize)]
pub struct ChecklistResponse {
    pub owner: String,
    pub entries: Vec<ChecklistEntry>,
}

fn resolve_owner(user: &AuthenticatedUser, owner: Option<&str>) -> AppResult<String> {
    match owner.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => normalize_email(raw),
        None => Ok(user.email.clone()),
    }
}

pub async fn checklist(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ChecklistQuery>,
) -> AppResult<Json<ChecklistResponse>> {
    let owner = resolve_owner(&user, query.owner.as_deref())?;
    let documents = documents::get_documents(&state, Some(&user))?;
    let entries = checklist::build(&owner, &documents);
    Ok(Json(ChecklistResponse { owner, entries }))
}

pub async fn upload_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DocumentResponse>)> {
    let name = checklist::find_entry(&slug)
        .ok_or_else(|| AppError::new(ErrorKind::NotFound, "Unknown document type"))?;

    let form = read_upload_form(multipart, &["file"], documents::oversize_error).await?;
    let owner = form.text("owner");
    let file = form
        .file
        .ok_or_else(|| AppError::bad_request("No file provided"))?;

    let request = UploadDocumentRequest {
        bytes: file.bytes,
        original_name: file.file_name,
        content_type: file.content_type,
        custom_name: Some(name.to_string()),
        tags: vec![IDENTITY_DOCS_TAG.to_string()],
        owner,
    };

    let document = documents::upload_document(&state, &user, request).await?;
    Ok((StatusCode::CREATED, Json(document)))
}
