use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::Redirect,
    Json,
};
use axum_extra::{headers::Cookie, typed_header::TypedHeader};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    auth::{pkce::PkcePair, AuthenticatedUser, SESSION_COOKIE, VERIFIER_COOKIE},
    error::{AppError, AppResult, ErrorKind},
    policy::{tolerate, Step},
    services::{
        accounts::{self, AccountResponse},
        invites,
    },
    state::AppState,
};

const VERIFIER_MAX_AGE_SECONDS: i64 = 600;
const DEFAULT_NEXT: &str = "/dashboard";
const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let email = accounts::normalize_email(&payload.email)?;

    if !accounts::is_email_allowed(&state, &email) {
        warn!(email = %email, "login refused for address outside allow-list");
        return Err(AppError::new(
            ErrorKind::AccessDenied,
            "This email is not authorized to access this application.",
        ));
    }

    let pkce = PkcePair::generate();
    state
        .provider
        .send_magic_link(&email, &state.config.auth_callback_url(), &pkce.challenge)
        .await
        .map_err(|err| {
            error!(error = %err, email = %email, "magic link request failed");
            AppError::provider(err)
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        build_cookie(&state, VERIFIER_COOKIE, &pkce.verifier, VERIFIER_MAX_AGE_SECONDS)?,
    );

    info!(email = %email, "magic link sent");
    Ok((
        headers,
        Json(LoginResponse {
            success: true,
            message: "Check your email for the login link!".to_string(),
        }),
    ))
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after sign-in.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => DEFAULT_NEXT,
    }
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, Redirect)> {
    let base = state.config.app_base_url.clone();
    let error_redirect = || {
        (
            HeaderMap::new(),
            Redirect::temporary(&format!("{base}{AUTH_ERROR_PATH}")),
        )
    };

    let Some(code) = query.code.as_deref().filter(|code| !code.is_empty()) else {
        warn!("auth callback without code");
        return Ok(error_redirect());
    };

    let verifier = jar
        .as_ref()
        .and_then(|TypedHeader(cookies)| cookies.get(VERIFIER_COOKIE))
        .map(str::to_string);

    let session = match state.provider.exchange_code(code, verifier.as_deref()).await {
        Ok(session) => session,
        Err(err) => {
            warn!(error = %err, "auth code exchange failed");
            return Ok(error_redirect());
        }
    };

    let token = match state.sessions.issue(&session.email) {
        Ok(token) => token,
        Err(err) => {
            error!(error = %err, email = %session.email, "failed to issue session");
            return Ok(error_redirect());
        }
    };

    if let Err(err) = tolerate(
        Step::AcceptInvite,
        invites::accept_invite_for(&state, &session.email),
    ) {
        error!(error = %err, email = %session.email, "invite acceptance failed");
        return Ok(error_redirect());
    }

    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        build_cookie(
            &state,
            SESSION_COOKIE,
            &token,
            state.sessions.expiry().num_seconds(),
        )?,
    );
    headers.append(SET_COOKIE, build_cookie(&state, VERIFIER_COOKIE, "", 0)?);

    let next = safe_next(query.next.as_deref());
    info!(email = %session.email, next = %next, "signed in");
    Ok((headers, Redirect::temporary(&format!("{base}{next}"))))
}

pub async fn auth_code_error() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "The sign-in link is invalid or has expired. Please request a new one.",
            "kind": "unauthenticated",
        })),
    )
}

pub async fn logout(State(state): State<AppState>) -> AppResult<(HeaderMap, StatusCode)> {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, build_cookie(&state, SESSION_COOKIE, "", 0)?);
    Ok((headers, StatusCode::NO_CONTENT))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub email: String,
    pub account: Option<AccountResponse>,
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<MeResponse>> {
    let account = state
        .store
        .find_account(&user.email)?
        .map(AccountResponse::from);
    Ok(Json(MeResponse {
        email: user.email,
        account,
    }))
}

/// `Max-Age=0` with an empty value clears the cookie.
fn build_cookie(
    state: &AppState,
    name: &str,
    value: &str,
    max_age: i64,
) -> AppResult<HeaderValue> {
    let mut parts = vec![format!("{name}={value}")];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Lax".into());
    parts.push(format!("Max-Age={max_age}"));
    if max_age == 0 {
        parts.push("Expires=Thu, 01 Jan 1970 00:00:00 GMT".into());
    }
    if state.config.session_cookie_secure {
        parts.push("Secure".into());
    }

    HeaderValue::from_str(&parts.join("; ")).map_err(AppError::internal)
}
