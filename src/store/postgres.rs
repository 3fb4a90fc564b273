use chrono::Utc;
use diesel::{
    pg::PgConnection,
    prelude::*,
    r2d2::{ConnectionManager, PooledConnection},
};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::PgPool;
use crate::models::{
    Account, AccountProfileChanges, Document, DocumentChanges, Invite, InviteStatus, NewAccount,
    NewDocument, NewInvite,
};
use crate::schema::{accounts, documents, invites};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> StoreResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| StoreError::Backend(format!("database pool error: {err}")))
    }
}

impl Store for PgStore {
    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let mut conn = self.conn()?;
        Ok(accounts::table
            .order(accounts::created_at.desc())
            .load(&mut conn)?)
    }

    fn find_account(&self, email: &str) -> StoreResult<Option<Account>> {
        let mut conn = self.conn()?;
        Ok(accounts::table.find(email).first(&mut conn).optional()?)
    }

    fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(accounts::table)
            .values(&account)
            .get_result(&mut conn)?)
    }

    fn set_account_active(&self, email: &str, is_active: bool) -> StoreResult<Account> {
        let mut conn = self.conn()?;
        Ok(diesel::update(accounts::table.find(email))
            .set((
                accounts::is_active.eq(is_active),
                accounts::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result(&mut conn)?)
    }

    fn update_account_profile(
        &self,
        email: &str,
        changes: AccountProfileChanges,
    ) -> StoreResult<Account> {
        let mut conn = self.conn()?;
        Ok(diesel::update(accounts::table.find(email))
            .set(&changes)
            .get_result(&mut conn)?)
    }

    fn delete_account(&self, email: &str) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(accounts::table.find(email)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn list_invites(&self) -> StoreResult<Vec<Invite>> {
        let mut conn = self.conn()?;
        Ok(invites::table
            .order(invites::invited_at.desc())
            .load(&mut conn)?)
    }

    fn find_invite_by_email(&self, email: &str) -> StoreResult<Option<Invite>> {
        let mut conn = self.conn()?;
        Ok(invites::table
            .filter(invites::email.eq(email))
            .first(&mut conn)
            .optional()?)
    }

    fn find_pending_invite(&self, email: &str) -> StoreResult<Option<Invite>> {
        let mut conn = self.conn()?;
        Ok(invites::table
            .filter(invites::email.eq(email))
            .filter(invites::status.eq(InviteStatus::Pending.as_str()))
            .first(&mut conn)
            .optional()?)
    }

    fn insert_invite(&self, invite: NewInvite) -> StoreResult<Invite> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(invites::table)
            .values(&invite)
            .get_result(&mut conn)?)
    }

    fn set_invite_status(&self, id: Uuid, status: InviteStatus) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let updated = diesel::update(invites::table.find(id))
            .set(invites::status.eq(status.as_str()))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn delete_invite(&self, id: Uuid) -> StoreResult<()> {
        let mut conn = self.conn()?;
        diesel::delete(invites::table.find(id)).execute(&mut conn)?;
        Ok(())
    }

    fn list_documents(&self, owners: &[String]) -> StoreResult<Vec<Document>> {
        if owners.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn()?;
        Ok(documents::table
            .filter(documents::user_email_id.eq_any(owners))
            .order(documents::uploaded_at.desc())
            .load(&mut conn)?)
    }

    fn find_document(&self, id: Uuid) -> StoreResult<Option<Document>> {
        let mut conn = self.conn()?;
        Ok(documents::table.find(id).first(&mut conn).optional()?)
    }

    fn insert_document(&self, document: NewDocument) -> StoreResult<Document> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(documents::table)
            .values(&document)
            .get_result(&mut conn)?)
    }

    fn update_document(&self, id: Uuid, changes: DocumentChanges) -> StoreResult<Document> {
        let mut conn = self.conn()?;
        Ok(diesel::update(documents::table.find(id))
            .set(&changes)
            .get_result(&mut conn)?)
    }

    fn delete_document(&self, id: Uuid) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(documents::table.find(id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
