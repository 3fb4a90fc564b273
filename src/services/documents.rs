use std::collections::HashMap;
use std::path::Path as FsPath;
use std::time::Duration;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::accounts::normalize_email;
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::models::{Document, DocumentChanges, NewDocument};
use crate::policy::{tolerate, Step};
use crate::state::AppState;
use crate::tags;
use crate::view::DocumentResponse;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DOWNLOAD_URL_EXPIRY_SECONDS: u64 = 3600;
pub const MAX_FILE_NAME_LENGTH: usize = 255;
const STORAGE_SUFFIX_LEN: usize = 10;

/// Who may touch a document besides its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// Only the owning account. Mismatches are `AccessDenied`.
    OwnerOnly,
    /// The caller plus every registered account. Out of scope reads as `NotFound`.
    ManagedScope,
}

#[derive(Debug, Clone, Default)]
pub struct UploadDocumentRequest {
    pub bytes: Vec<u8>,
    pub original_name: Option<String>,
    pub content_type: Option<String>,
    pub custom_name: Option<String>,
    pub tags: Vec<String>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadUrl {
    pub url: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone)]
pub struct DownloadedDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentRequest {
    pub file_name: String,
    pub tags: Vec<String>,
    pub owner: Option<String>,
}

/// Also used when the request body limit cuts an upload short.
pub fn oversize_error() -> AppError {
    AppError::too_large("File size must be less than 10MB")
}

fn check_file_name_length(name: &str) -> AppResult<()> {
    if name.chars().count() > MAX_FILE_NAME_LENGTH {
        return Err(AppError::bad_request(format!(
            "File name must be at most {MAX_FILE_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn document_not_found() -> AppError {
    AppError::new(ErrorKind::NotFound, "Document not found")
}

pub async fn upload_document(
    state: &AppState,
    caller: &AuthenticatedUser,
    request: UploadDocumentRequest,
) -> AppResult<DocumentResponse> {
    let UploadDocumentRequest {
        bytes,
        original_name,
        content_type,
        custom_name,
        tags: requested_tags,
        owner,
    } = request;

    let original_name = original_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::bad_request("No file provided"))?;
    if bytes.is_empty() {
        return Err(AppError::bad_request("No file provided"));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(oversize_error());
    }

    let owner = match owner.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => {
            let email = normalize_email(raw)?;
            if state.store.find_account(&email)?.is_none() {
                return Err(AppError::bad_request("Selected owner is not a registered account"));
            }
            email
        }
        None => caller.email.clone(),
    };

    let display_name = match custom_name.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(custom) => filename_with_retained_extension(custom, &original_name),
        None => original_name.clone(),
    };
    check_file_name_length(&display_name)?;
    let storage_path = storage_key(&caller.email, &original_name);
    let content_type = content_type
        .filter(|value| !value.trim().is_empty())
        .or_else(|| {
            mime_guess::from_path(&original_name)
                .first_raw()
                .map(str::to_string)
        });
    let size = bytes.len() as i64;

    state
        .storage
        .put_object(
            &storage_path,
            bytes,
            content_type.clone(),
            attachment_content_disposition(&display_name),
        )
        .await
        .map_err(|err| {
            error!(error = %err, storage_path = %storage_path, "document upload failed");
            AppError::upload_failed(err)
        })?;

    let inserted = state.store.insert_document(NewDocument {
        id: Uuid::new_v4(),
        user_email_id: owner.clone(),
        file_name: display_name,
        storage_path: storage_path.clone(),
        file_size: Some(size),
        mime_type: content_type,
        category: tags::join(&requested_tags),
    });

    let document = match inserted {
        Ok(document) => document,
        Err(err) => {
            error!(error = %err, storage_path = %storage_path, "document metadata insert failed");
            let cleanup = tolerate(
                Step::UploadCompensation,
                state.storage.delete_object(&storage_path).await,
            );
            if let Err(cleanup_err) = cleanup {
                error!(
                    error = %cleanup_err,
                    storage_path = %storage_path,
                    "stored object left behind after failed insert"
                );
            }
            return Err(AppError::database(err));
        }
    };

    info!(
        document_id = %document.id,
        owner = %document.user_email_id,
        uploaded_by = %caller.email,
        size_bytes = size,
        "document uploaded"
    );

    let owner_name = owner_name(state, &document.user_email_id);
    Ok(DocumentResponse::from_document(document, owner_name))
}

/// Every document in the caller's managed set, newest first.
pub fn get_documents(
    state: &AppState,
    caller: Option<&AuthenticatedUser>,
) -> AppResult<Vec<DocumentResponse>> {
    let Some(caller) = caller else {
        return Ok(Vec::new());
    };

    let names = account_names(state)?;
    let mut owners: Vec<String> = names.keys().cloned().collect();
    if !names.contains_key(&caller.email) {
        owners.push(caller.email.clone());
    }

    let documents = state.store.list_documents(&owners)?;
    Ok(documents
        .into_iter()
        .map(|document| {
            let name = names.get(&document.user_email_id).cloned().flatten();
            DocumentResponse::from_document(document, name)
        })
        .collect())
}

pub async fn get_download_url(
    state: &AppState,
    caller: &AuthenticatedUser,
    document_id: Uuid,
) -> AppResult<DownloadUrl> {
    let document = load_accessible(state, caller, document_id, AccessRule::ManagedScope)?;

    let exists = state
        .storage
        .object_exists(&document.storage_path)
        .await
        .map_err(|err| AppError::internal(format!("failed to inspect stored file: {err}")))?;
    if !exists {
        return Err(AppError::new(ErrorKind::NotFound, "File not found in storage"));
    }

    let url = state
        .storage
        .presign_get_object(
            &document.storage_path,
            Duration::from_secs(DOWNLOAD_URL_EXPIRY_SECONDS),
        )
        .await
        .map_err(|err| AppError::internal(format!("failed to generate download URL: {err}")))?;

    Ok(DownloadUrl {
        url,
        expires_in: DOWNLOAD_URL_EXPIRY_SECONDS,
    })
}

pub async fn download_document(
    state: &AppState,
    caller: &AuthenticatedUser,
    document_id: Uuid,
    rule: AccessRule,
) -> AppResult<DownloadedDocument> {
    let document = load_accessible(state, caller, document_id, rule)?;

    let bytes = state
        .storage
        .get_object(&document.storage_path)
        .await
        .map_err(|err| {
            error!(error = %err, document_id = %document.id, "stored file unavailable");
            AppError::new(ErrorKind::NotFound, "File not found in storage")
        })?;

    let content_type = document
        .mime_type
        .clone()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(DownloadedDocument {
        file_name: document.file_name,
        content_type,
        bytes,
    })
}

/// Removes the metadata row; the stored object is cleaned up best-effort afterwards.
pub async fn delete_document(
    state: &AppState,
    caller: &AuthenticatedUser,
    document_id: Uuid,
    rule: AccessRule,
) -> AppResult<()> {
    let document = load_accessible(state, caller, document_id, rule)?;

    state.store.delete_document(document.id).map_err(|err| {
        error!(error = %err, document_id = %document.id, "document delete failed");
        AppError::from(err)
    })?;

    tolerate(
        Step::DeleteDocumentStorage,
        state.storage.delete_object(&document.storage_path).await,
    )
    .map_err(|err| AppError::internal(format!("failed to delete stored file: {err}")))?;

    info!(document_id = %document.id, deleted_by = %caller.email, "document deleted");
    Ok(())
}

pub fn update_document_category(
    state: &AppState,
    caller: &AuthenticatedUser,
    document_id: Uuid,
    new_tags: Vec<String>,
) -> AppResult<DocumentResponse> {
    let document = load_accessible(state, caller, document_id, AccessRule::ManagedScope)?;

    let updated = state.store.update_document(
        document.id,
        DocumentChanges {
            category: Some(tags::join(&new_tags)),
            updated_at: Some(Utc::now().naive_utc()),
            ..Default::default()
        },
    )?;

    let owner_name = owner_name(state, &updated.user_email_id);
    Ok(DocumentResponse::from_document(updated, owner_name))
}

pub fn update_document_details(
    state: &AppState,
    caller: &AuthenticatedUser,
    document_id: Uuid,
    request: UpdateDocumentRequest,
) -> AppResult<DocumentResponse> {
    let file_name = request.file_name.trim().to_string();
    if file_name.is_empty() {
        return Err(AppError::bad_request("File name is required"));
    }
    check_file_name_length(&file_name)?;

    let owner = match request.owner.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => {
            let email = normalize_email(raw)?;
            if state.store.find_account(&email)?.is_none() {
                return Err(AppError::bad_request("Selected owner is not a registered account"));
            }
            Some(email)
        }
        None => None,
    };

    let document = load_accessible(state, caller, document_id, AccessRule::ManagedScope)?;

    let updated = state.store.update_document(
        document.id,
        DocumentChanges {
            user_email_id: owner,
            file_name: Some(file_name),
            category: Some(tags::join(&request.tags)),
            updated_at: Some(Utc::now().naive_utc()),
        },
    )?;

    info!(document_id = %updated.id, owner = %updated.user_email_id, "document details updated");
    let owner_name = owner_name(state, &updated.user_email_id);
    Ok(DocumentResponse::from_document(updated, owner_name))
}

fn load_accessible(
    state: &AppState,
    caller: &AuthenticatedUser,
    document_id: Uuid,
    rule: AccessRule,
) -> AppResult<Document> {
    let document = state
        .store
        .find_document(document_id)?
        .ok_or_else(document_not_found)?;

    if document.user_email_id == caller.email {
        return Ok(document);
    }

    match rule {
        AccessRule::OwnerOnly => Err(AppError::forbidden()),
        AccessRule::ManagedScope => {
            if state.store.find_account(&document.user_email_id)?.is_some() {
                Ok(document)
            } else {
                Err(document_not_found())
            }
        }
    }
}

fn account_names(state: &AppState) -> AppResult<HashMap<String, Option<String>>> {
    Ok(state
        .store
        .list_accounts()?
        .into_iter()
        .map(|account| (account.email_id, account.name))
        .collect())
}

fn owner_name(state: &AppState, email: &str) -> Option<String> {
    state
        .store
        .find_account(email)
        .ok()
        .flatten()
        .and_then(|account| account.name)
}

/// `{uploader}/{unix_millis}-{random}.{ext}`; the uploader segment is made path-safe.
fn storage_key(uploader: &str, original_name: &str) -> String {
    let owner_segment: String = uploader
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '@' | '.' | '-' | '_' => ch,
            _ => '_',
        })
        .collect();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STORAGE_SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    let millis = Utc::now().timestamp_millis();

    match file_extension(original_name) {
        Some(ext) => format!("{owner_segment}/{millis}-{suffix}.{ext}"),
        None => format!("{owner_segment}/{millis}-{suffix}"),
    }
}

fn file_extension(name: &str) -> Option<String> {
    FsPath::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}

fn filename_with_retained_extension(title: &str, current_filename: &str) -> String {
    let extension = FsPath::new(current_filename)
        .extension()
        .and_then(|ext| ext.to_str());

    match extension {
        Some(ext)
            if !title
                .rsplit_once('.')
                .map(|(_, existing)| existing.eq_ignore_ascii_case(ext))
                .unwrap_or(false) =>
        {
            format!("{title}.{ext}")
        }
        _ => title.to_string(),
    }
}

pub fn attachment_content_disposition(filename: &str) -> Option<String> {
    if filename.is_empty() {
        return None;
    }

    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' | '\r' | '\n' => '_',
            _ => ch,
        })
        .collect();

    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    Some(format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    ))
}
