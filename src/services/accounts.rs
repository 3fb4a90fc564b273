use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;
use validator::ValidateEmail;

use super::utc;
use crate::error::{AppError, AppResult};
use crate::models::{Account, AccountProfileChanges, NewAccount};
use crate::state::AppState;
use crate::store::StoreError;

pub const MAX_NAME_LENGTH: usize = 100;
pub const DUPLICATE_ACCOUNT_MESSAGE: &str = "This email address is already in the system.";

#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub email_id: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            email_id: account.email_id,
            name: account.name,
            avatar_url: account.avatar_url,
            is_active: account.is_active,
            created_at: utc(account.created_at),
            updated_at: utc(account.updated_at),
        }
    }
}

/// Trimmed, lowercased and shape-checked email.
pub fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::bad_request("Email is required"));
    }
    if !email.validate_email() {
        return Err(AppError::bad_request("Please enter a valid email address"));
    }
    Ok(email)
}

pub fn list_accounts(state: &AppState) -> AppResult<Vec<AccountResponse>> {
    let accounts = state.store.list_accounts()?;
    Ok(accounts.into_iter().map(AccountResponse::from).collect())
}

pub fn add_account(state: &AppState, raw_email: &str) -> AppResult<AccountResponse> {
    let email = normalize_email(raw_email)?;

    let account = state
        .store
        .insert_account(NewAccount {
            email_id: email.clone(),
            is_active: true,
        })
        .map_err(|err| match err {
            StoreError::UniqueViolation(_) => AppError::conflict(DUPLICATE_ACCOUNT_MESSAGE),
            other => AppError::from(other),
        })?;

    info!(email = %email, "account added");
    Ok(account.into())
}

pub fn toggle_account_status(
    state: &AppState,
    raw_email: &str,
    current_status: bool,
) -> AppResult<AccountResponse> {
    let email = normalize_email(raw_email)?;
    let account = state.store.set_account_active(&email, !current_status)?;
    info!(email = %email, is_active = account.is_active, "account status changed");
    Ok(account.into())
}

#[derive(Debug, Clone)]
pub struct UpdateAccountRequest {
    pub name: String,
    pub avatar_url: Option<String>,
}

impl UpdateAccountRequest {
    fn validate(self) -> AppResult<AccountProfileChanges> {
        let name = self.name.trim().to_string();
        let length = name.chars().count();
        if length == 0 {
            return Err(AppError::bad_request("Name is required"));
        }
        if length > MAX_NAME_LENGTH {
            return Err(AppError::bad_request(format!(
                "Name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        let avatar_url = self
            .avatar_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = avatar_url.as_deref() {
            if !is_avatar_location(url) {
                return Err(AppError::bad_request("Avatar URL must be a valid URL"));
            }
        }

        Ok(AccountProfileChanges {
            name: Some(name),
            avatar_url,
            updated_at: Utc::now().naive_utc(),
        })
    }
}

fn is_avatar_location(value: &str) -> bool {
    if value.starts_with('/') {
        return !value.starts_with("//");
    }
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub fn update_account(
    state: &AppState,
    raw_email: &str,
    request: UpdateAccountRequest,
) -> AppResult<AccountResponse> {
    let email = normalize_email(raw_email)?;
    let changes = request.validate()?;
    let account = state.store.update_account_profile(&email, changes)?;
    info!(email = %email, "account profile updated");
    Ok(account.into())
}

pub fn delete_account(state: &AppState, raw_email: &str) -> AppResult<()> {
    let email = normalize_email(raw_email)?;
    state.store.delete_account(&email).map_err(|err| match err {
        StoreError::ForeignKeyViolation(_) => AppError::conflict(
            "This account still owns documents. Reassign or delete them first.",
        ),
        other => AppError::from(other),
    })?;
    info!(email = %email, "account deleted");
    Ok(())
}

/// Login gate. Anything other than an existing active account is a refusal.
pub fn is_email_allowed(state: &AppState, raw_email: &str) -> bool {
    let Ok(email) = normalize_email(raw_email) else {
        return false;
    };

    match state.store.find_account(&email) {
        Ok(Some(account)) => account.is_active,
        Ok(None) => false,
        Err(err) => {
            warn!(email = %email, error = %err, "allow-list lookup failed");
            false
        }
    }
}
