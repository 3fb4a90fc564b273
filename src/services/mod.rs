//! Operations behind the HTTP handlers.
//!
//! Each function validates its typed input before touching the store, object
//! storage or a remote provider, so handlers stay thin.

pub mod accounts;
pub mod avatars;
pub mod documents;
pub mod invites;

use chrono::{DateTime, NaiveDateTime, Utc};

pub(crate) fn utc(value: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(value, Utc)
}
