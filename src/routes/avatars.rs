use axum::extract::{Json, Multipart, State};

use super::{read_upload_form, UploadForm};
use crate::error::{AppError, AppResult};
use crate::services::avatars::{self, AvatarUpload, StoredAvatar};
use crate::state::AppState;

fn avatar_from_form(form: UploadForm) -> AppResult<AvatarUpload> {
    let file = form
        .file
        .ok_or_else(|| AppError::bad_request("No file provided"))?;
    Ok(AvatarUpload {
        bytes: file.bytes,
        original_name: file.file_name,
        content_type: file.content_type,
    })
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<StoredAvatar>> {
    let form = read_upload_form(multipart, &["avatar", "file"], avatars::oversize_error).await?;
    let upload = avatar_from_form(form)?;
    Ok(Json(avatars::upload_hosted(&state, upload).await?))
}

pub async fn upload_avatar_fallback(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<StoredAvatar>> {
    let form = read_upload_form(multipart, &["avatar", "file"], avatars::oversize_error).await?;
    let upload = avatar_from_form(form)?;
    Ok(Json(avatars::upload_local(&state, upload).await?))
}
