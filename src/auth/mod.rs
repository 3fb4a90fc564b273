pub mod pkce;
pub mod session;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization, Cookie};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "session";
pub const VERIFIER_COOKIE: &str = "auth_verifier";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            Err(_) => {
                let TypedHeader(cookies) =
                    TypedHeader::<Cookie>::from_request_parts(parts, state)
                        .await
                        .map_err(|_| AppError::unauthorized())?;
                cookies
                    .get(SESSION_COOKIE)
                    .map(str::to_string)
                    .ok_or_else(AppError::unauthorized)?
            }
        };

        let claims = state
            .sessions
            .verify(&token)
            .map_err(|_| AppError::unauthorized())?;

        Ok(AuthenticatedUser { email: claims.sub })
    }
}
