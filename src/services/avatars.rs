use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_AVATAR_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];
pub const LOCAL_AVATAR_DIR: &str = "uploads/avatars";

#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub bytes: Vec<u8>,
    pub original_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredAvatar {
    pub success: bool,
    pub url: String,
    pub filename: String,
}

impl AvatarUpload {
    fn validate(&self) -> AppResult<&str> {
        if self.bytes.is_empty() {
            return Err(AppError::bad_request("No file provided"));
        }
        let content_type = self
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|value| ALLOWED_AVATAR_TYPES.contains(value))
            .ok_or_else(|| {
                AppError::bad_request("Invalid file type. Only JPEG, JPG, and PNG are allowed.")
            })?;
        if self.bytes.len() > MAX_AVATAR_BYTES {
            return Err(oversize_error());
        }
        Ok(content_type)
    }
}

/// Size violations are validation errors, including ones caught by the body limit.
pub fn oversize_error() -> AppError {
    AppError::bad_request("File size must be less than 5MB")
}

/// `avatar-{unix_millis}.{ext}`, taking the extension from the upload name or its type.
pub fn avatar_filename(original_name: Option<&str>, content_type: &str) -> String {
    let from_name = original_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png"));
    let ext = from_name.unwrap_or_else(|| {
        if content_type == "image/png" {
            "png".to_string()
        } else {
            "jpg".to_string()
        }
    });
    format!("avatar-{}.{}", Utc::now().timestamp_millis(), ext)
}

/// Stores the avatar in the public avatar bucket.
pub async fn upload_hosted(state: &AppState, upload: AvatarUpload) -> AppResult<StoredAvatar> {
    let content_type = upload.validate()?.to_string();
    let hosted = state
        .avatars
        .as_ref()
        .ok_or_else(|| AppError::service_missing("File upload service not configured"))?;

    let filename = avatar_filename(upload.original_name.as_deref(), &content_type);
    let key = format!("avatars/{filename}");

    hosted
        .storage
        .put_object(&key, upload.bytes, Some(content_type), None)
        .await
        .map_err(|err| {
            error!(error = %err, key = %key, "avatar upload failed");
            AppError::upload_failed(err)
        })?;

    let url = format!("{}/{}", hosted.public_base_url.trim_end_matches('/'), key);
    info!(url = %url, "avatar uploaded");
    Ok(StoredAvatar {
        success: true,
        url,
        filename,
    })
}

/// Writes the avatar under the public directory, served at `/uploads/avatars/...`.
pub async fn upload_local(state: &AppState, upload: AvatarUpload) -> AppResult<StoredAvatar> {
    let content_type = upload.validate()?.to_string();
    let filename = avatar_filename(upload.original_name.as_deref(), &content_type);

    let dir = state.config.public_dir.join(LOCAL_AVATAR_DIR);
    tokio::fs::create_dir_all(&dir).await.map_err(|err| {
        error!(error = %err, dir = %dir.display(), "failed to prepare avatar directory");
        AppError::upload_failed(err)
    })?;
    let path = dir.join(&filename);
    tokio::fs::write(&path, &upload.bytes).await.map_err(|err| {
        error!(error = %err, path = %path.display(), "failed to write avatar");
        AppError::upload_failed(err)
    })?;

    let url = format!("/{LOCAL_AVATAR_DIR}/{filename}");
    info!(url = %url, "avatar stored locally");
    Ok(StoredAvatar {
        success: true,
        url,
        filename,
    })
}
