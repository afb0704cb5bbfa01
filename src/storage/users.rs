use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{SessionRecord, UserRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Store a new user, enforcing case-insensitive email uniqueness.
    /// Returns `None` when the email is already registered. The existence
    /// check and the insert share one write transaction, so two concurrent
    /// registrations cannot both claim the same address.
    pub fn create_user(&self, user: &UserRecord) -> Result<Option<UserRecord>, DatabaseError> {
        debug_assert!(!user.id.is_empty(), "user id must not be empty");

        let email_key = user.email.to_lowercase();
        let write_txn = self.begin_write()?;
        let created = {
            let mut email_table = write_txn.open_table(USER_EMAILS)?;
            let taken = email_table.get(email_key.as_str())?.is_some();

            if taken {
                false
            } else {
                email_table.insert(email_key.as_str(), user.id.as_str())?;
                let mut table = write_txn.open_table(USERS)?;
                let data = rmp_serde::to_vec_named(user)?;
                table.insert(user.id.as_str(), data.as_slice())?;
                true
            }
        };
        write_txn.commit()?;

        Ok(created.then(|| user.clone()))
    }

    /// Get a user by their UUID
    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(id)? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Get a user by email (resolves lowercased email -> uuid -> user)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let email_table = read_txn.open_table(USER_EMAILS)?;

        let id = match email_table.get(email.to_lowercase().as_str())? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let users_table = read_txn.open_table(USERS)?;
        match users_table.get(id.as_str())? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Store a session under the token's digest
    pub fn put_session(&self, key: &str, session: &SessionRecord) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let data = rmp_serde::to_vec_named(session)?;
            table.insert(key, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a session by token digest
    pub fn get_session(&self, key: &str) -> Result<Option<SessionRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        match table.get(key)? {
            Some(data) => {
                let session: SessionRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Delete a session (logout, or lazy expiry cleanup)
    pub fn delete_session(&self, key: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }
}
