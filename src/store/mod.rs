//! Persistence boundary for the three tables.
//!
//! Handlers never talk to diesel directly; they go through [`Store`] so the
//! Postgres implementation can be swapped for an in-memory one in tests.

mod postgres;

pub use postgres::PgStore;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Account, AccountProfileChanges, Document, DocumentChanges, Invite, InviteStatus, NewAccount,
    NewDocument, NewInvite,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    UniqueViolation(String),
    #[error("{0}")]
    ForeignKeyViolation(String),
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<diesel::result::Error> for StoreError {
    fn from(value: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match value {
            Error::NotFound => StoreError::NotFound,
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::UniqueViolation(info.message().to_string())
            }
            Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::ForeignKeyViolation(info.message().to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub trait Store: Send + Sync + 'static {
    /// Newest first.
    fn list_accounts(&self) -> StoreResult<Vec<Account>>;
    fn find_account(&self, email: &str) -> StoreResult<Option<Account>>;
    fn insert_account(&self, account: NewAccount) -> StoreResult<Account>;
    fn set_account_active(&self, email: &str, is_active: bool) -> StoreResult<Account>;
    fn update_account_profile(
        &self,
        email: &str,
        changes: AccountProfileChanges,
    ) -> StoreResult<Account>;
    /// Fails with `ForeignKeyViolation` while documents still reference the account.
    fn delete_account(&self, email: &str) -> StoreResult<()>;

    /// Newest first.
    fn list_invites(&self) -> StoreResult<Vec<Invite>>;
    fn find_invite_by_email(&self, email: &str) -> StoreResult<Option<Invite>>;
    fn find_pending_invite(&self, email: &str) -> StoreResult<Option<Invite>>;
    fn insert_invite(&self, invite: NewInvite) -> StoreResult<Invite>;
    fn set_invite_status(&self, id: Uuid, status: InviteStatus) -> StoreResult<()>;
    fn delete_invite(&self, id: Uuid) -> StoreResult<()>;

    /// Documents owned by any of `owners`, newest upload first.
    fn list_documents(&self, owners: &[String]) -> StoreResult<Vec<Document>>;
    fn find_document(&self, id: Uuid) -> StoreResult<Option<Document>>;
    fn insert_document(&self, document: NewDocument) -> StoreResult<Document>;
    fn update_document(&self, id: Uuid, changes: DocumentChanges) -> StoreResult<Document>;
    fn delete_document(&self, id: Uuid) -> StoreResult<()>;
}
