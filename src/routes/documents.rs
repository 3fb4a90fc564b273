use axum::extract::{Json, Multipart, Path, Query, State};
use axum::http::{
    header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    HeaderMap, HeaderValue, StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use super::read_upload_form;
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::services::documents::{
    self, attachment_content_disposition, AccessRule, DownloadUrl, UpdateDocumentRequest,
    UploadDocumentRequest,
};
use crate::state::AppState;
use crate::tags;
use crate::view::{self, DocumentResponse, Facets, ViewQuery};

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub facets: Facets,
}

#[derive(Deserialize)]
pub struct UpdateDocumentPayload {
    pub file_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCategoryPayload {
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct LegacyDeleteRequest {
    pub id: Option<String>,
}

#[derive(Deserialize)]
pub struct LegacyDownloadQuery {
    pub id: Option<String>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn list_documents(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Query(query): Query<ViewQuery>,
) -> AppResult<Json<DocumentListResponse>> {
    let documents = documents::get_documents(&state, user.as_ref())?;
    let facets = view::facets(&documents);
    Ok(Json(DocumentListResponse {
        documents: view::apply(documents, &query),
        facets,
    }))
}

pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DocumentResponse>)> {
    let form = read_upload_form(multipart, &["file"], documents::oversize_error).await?;
    let tag_input = form.text("category").or_else(|| form.text("tags"));
    let custom_name = form.text("customName");
    let owner = form.text("owner");
    let file = form.file.ok_or_else(|| {
        error!("upload rejected: missing file field");
        AppError::bad_request("No file provided")
    })?;

    let request = UploadDocumentRequest {
        bytes: file.bytes,
        original_name: file.file_name,
        content_type: file.content_type,
        custom_name,
        tags: tags::parse(tag_input.as_deref()),
        owner,
    };

    let document = documents::upload_document(&state, &user, request).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn update_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentPayload>,
) -> AppResult<Json<DocumentResponse>> {
    let document = documents::update_document_details(
        &state,
        &user,
        document_id,
        UpdateDocumentRequest {
            file_name: payload.file_name,
            tags: payload.tags,
            owner: payload.owner,
        },
    )?;
    Ok(Json(document))
}

pub async fn update_document_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> AppResult<Json<DocumentResponse>> {
    let document =
        documents::update_document_category(&state, &user, document_id, payload.tags)?;
    Ok(Json(document))
}

pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    documents::delete_document(&state, &user, document_id, AccessRule::ManagedScope).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_download_url(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DownloadUrl>> {
    Ok(Json(
        documents::get_download_url(&state, &user, document_id).await?,
    ))
}

fn parse_document_id(raw: Option<&str>) -> AppResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("Document ID is required"))?;
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request("Document ID is invalid"))
}

pub async fn delete_document_legacy(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    payload: Option<Json<LegacyDeleteRequest>>,
) -> AppResult<Json<SuccessResponse>> {
    let document_id =
        parse_document_id(payload.as_ref().and_then(|Json(body)| body.id.as_deref()))?;
    let user = user.ok_or_else(AppError::unauthorized)?;

    documents::delete_document(&state, &user, document_id, AccessRule::OwnerOnly).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn download_document_legacy(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Query(query): Query<LegacyDownloadQuery>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    let document_id = parse_document_id(query.id.as_deref())?;
    let user = user.ok_or_else(AppError::unauthorized)?;

    let download =
        documents::download_document(&state, &user, document_id, AccessRule::OwnerOnly).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&download.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    if let Some(disposition) = attachment_content_disposition(&download.file_name) {
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_bytes(disposition.as_bytes()).map_err(AppError::internal)?,
        );
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from(download.bytes.len()));

    info!(document_id = %document_id, size_bytes = download.bytes.len(), "document downloaded");
    Ok((headers, download.bytes))
}
