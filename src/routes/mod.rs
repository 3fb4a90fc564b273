use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::{HeaderValue, StatusCode};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    services::avatars::LOCAL_AVATAR_DIR,
    state::AppState,
};

pub mod accounts;
pub mod auth;
pub mod avatars;
pub mod documents;
pub mod health;
pub mod identity_docs;
pub mod invites;

/// Uploads are capped at 10 MiB by the service; the transport limit leaves room
/// for multipart framing so oversize files get a proper 413 body.
const REQUEST_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed
                    .parse::<HeaderValue>()
                    .map_err(|_| warn!(origin = %trimmed, "ignoring invalid CORS origin"))
                    .ok()
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let callback_routes = Router::new()
        .route("/auth/callback", get(auth::callback))
        .route("/auth/auth-code-error", get(auth::auth_code_error));

    // Document handlers resolve the caller themselves: listing answers an
    // anonymous caller with an empty list, and the legacy endpoints validate
    // their input before authenticating.
    let documents_routes = Router::new()
        .route(
            "/api/documents",
            get(documents::list_documents).post(documents::upload_document),
        )
        .route(
            "/api/documents/:id",
            patch(documents::update_document).delete(documents::delete_document),
        )
        .route(
            "/api/documents/:id/category",
            patch(documents::update_document_category),
        )
        .route(
            "/api/documents/:id/download-url",
            get(documents::get_download_url),
        )
        .route(
            "/api/delete-document",
            delete(documents::delete_document_legacy),
        )
        .route(
            "/api/download-document",
            get(documents::download_document_legacy),
        );

    let accounts_routes = Router::new()
        .route(
            "/",
            get(accounts::list_accounts).post(accounts::add_account),
        )
        .route(
            "/:email",
            patch(accounts::update_account).delete(accounts::delete_account),
        )
        .route("/:email/toggle", post(accounts::toggle_account_status));

    let invites_routes =
        Router::new().route("/", get(invites::list_invites).post(invites::invite_user));

    let identity_routes = Router::new()
        .route("/", get(identity_docs::checklist))
        .route("/:slug", post(identity_docs::upload_entry));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/accounts", accounts_routes)
        .nest("/api/invites", invites_routes)
        .nest("/api/identity-docs", identity_routes)
        .route("/api/upload-avatar", post(avatars::upload_avatar))
        .route(
            "/api/upload-avatar-fallback",
            post(avatars::upload_avatar_fallback),
        )
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    let uploads_dir = state.config.public_dir.join(LOCAL_AVATAR_DIR);

    Router::new()
        .merge(protected_routes)
        .merge(documents_routes)
        .merge(callback_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .nest_service("/uploads/avatars", ServeDir::new(uploads_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
}

pub(crate) struct FilePart {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// Multipart body split into one file field and the remaining text fields.
pub(crate) struct UploadForm {
    pub file: Option<FilePart>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

pub(crate) async fn read_upload_form(
    mut multipart: Multipart,
    file_fields: &[&str],
    oversize: fn() -> AppError,
) -> AppResult<UploadForm> {
    let mut form = UploadForm {
        file: None,
        fields: HashMap::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, "invalid multipart data", oversize))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if file_fields.contains(&name.as_str()) {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|err| multipart_error(err, "failed to read file bytes", oversize))?;
            form.file = Some(FilePart {
                bytes: data.to_vec(),
                file_name,
                content_type,
            });
        } else {
            let value = field.text().await.map_err(|err| {
                error!(error = %err, field = %name, "invalid form field");
                AppError::bad_request(format!("invalid form field {name}: {err}"))
            })?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Bodies cut off by the request limit report the caller's size error.
fn multipart_error(err: MultipartError, context: &str, oversize: fn() -> AppError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %err, "multipart body exceeded the request limit");
        return oversize();
    }
    error!(error = %err, context, "multipart read failed");
    AppError::bad_request(format!("{context}: {err}"))
}
