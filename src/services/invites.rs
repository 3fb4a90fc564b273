use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{accounts::normalize_email, utc};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::mailer::invitation_email;
use crate::models::{Invite, InviteStatus, NewInvite};
use crate::policy::{tolerate, Step};
use crate::state::AppState;

pub const ALREADY_INVITED_MESSAGE: &str = "User has already been invited";

#[derive(Debug, Clone, Serialize)]
pub struct InviteResponse {
    pub id: Uuid,
    pub email: String,
    pub invited_at: DateTime<Utc>,
    pub invited_by: Option<String>,
    pub status: InviteStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteOutcome {
    pub email: String,
    pub recorded: bool,
    pub notification_sent: bool,
}

/// Pending invites older than the TTL read as expired.
pub fn effective_status(invite: &Invite, ttl_days: i64, now: NaiveDateTime) -> InviteStatus {
    match invite.stored_status() {
        InviteStatus::Pending if invite.invited_at + Duration::days(ttl_days) < now => {
            InviteStatus::Expired
        }
        status => status,
    }
}

pub fn list_invites(state: &AppState) -> AppResult<Vec<InviteResponse>> {
    let now = Utc::now().naive_utc();
    let ttl = state.config.invite_ttl_days;
    let invites = state.store.list_invites()?;
    Ok(invites
        .into_iter()
        .map(|invite| InviteResponse {
            status: effective_status(&invite, ttl, now),
            id: invite.id,
            invited_at: utc(invite.invited_at),
            email: invite.email,
            invited_by: invite.invited_by,
        })
        .collect())
}

pub async fn invite_user(
    state: &AppState,
    caller: Option<&AuthenticatedUser>,
    raw_email: &str,
) -> AppResult<InviteOutcome> {
    let caller = caller.ok_or_else(AppError::unauthorized)?;
    let email = normalize_email(raw_email)?;

    if let Some(existing) = state.store.find_invite_by_email(&email)? {
        let now = Utc::now().naive_utc();
        if effective_status(&existing, state.config.invite_ttl_days, now) != InviteStatus::Expired
        {
            return Err(AppError::conflict(ALREADY_INVITED_MESSAGE));
        }
        info!(email = %email, invite_id = %existing.id, "replacing expired invite");
        state.store.delete_invite(existing.id)?;
    }

    state
        .provider
        .invite_user_by_email(&email, &state.config.auth_callback_url(), &caller.email)
        .await
        .map_err(AppError::provider)?;

    let recorded = tolerate(
        Step::RecordInvite,
        state.store.insert_invite(NewInvite {
            id: Uuid::new_v4(),
            email: email.clone(),
            invited_by: Some(caller.email.clone()),
            status: InviteStatus::Pending.as_str().to_string(),
        }),
    )?
    .is_some();

    let notification_sent = match &state.mailer {
        Some(mailer) => {
            let message =
                invitation_email(&state.config.email_from, &email, &state.config.app_base_url);
            tolerate(Step::SendInviteNotification, mailer.send(message).await)?.is_some()
        }
        None => false,
    };

    info!(
        email = %email,
        invited_by = %caller.email,
        recorded,
        notification_sent,
        "invitation sent"
    );

    Ok(InviteOutcome {
        email,
        recorded,
        notification_sent,
    })
}

/// Settles the pending invite for a freshly signed-in email, if there is one.
pub fn accept_invite_for(state: &AppState, email: &str) -> AppResult<Option<InviteStatus>> {
    let email = email.trim().to_lowercase();
    let Some(invite) = state.store.find_pending_invite(&email)? else {
        return Ok(None);
    };

    let now = Utc::now().naive_utc();
    let status = match effective_status(&invite, state.config.invite_ttl_days, now) {
        InviteStatus::Expired => InviteStatus::Expired,
        _ => InviteStatus::Accepted,
    };

    state.store.set_invite_status(invite.id, status)?;
    info!(email = %email, invite_id = %invite.id, status = %status, "invite settled");
    Ok(Some(status))
}
