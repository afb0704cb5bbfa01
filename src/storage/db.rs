use redb::{
    Database as RedbDatabase, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl From<redb::CommitError> for DatabaseError {
    fn from(e: redb::CommitError) -> Self {
        DatabaseError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for DatabaseError {
    fn from(e: redb::DatabaseError) -> Self {
        DatabaseError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for DatabaseError {
    fn from(e: redb::Error) -> Self {
        DatabaseError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(e: redb::StorageError) -> Self {
        DatabaseError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(e: redb::TableError) -> Self {
        DatabaseError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(e: redb::TransactionError) -> Self {
        DatabaseError::Transaction(Box::new(e))
    }
}

pub struct Database {
    db: Arc<RedbDatabase>,
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

/// Statistics from a purge operation
#[derive(Debug, Default)]
pub struct PurgeStats {
    pub users: u64,
    pub subjects: u64,
    pub resources: u64,
    pub comments: u64,
    pub votes: u64,
    pub sessions: u64,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("study-shelf.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        // Initialize application tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(SUBJECTS)?;
            let _ = write_txn.open_table(SUBJECT_NAMES)?;
            let _ = write_txn.open_table(RESOURCES)?;
            let _ = write_txn.open_table(COMMENTS)?;
            let _ = write_txn.open_table(RESOURCE_COMMENTS)?;
            let _ = write_txn.open_table(VOTES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Purge all data - for testing only
    pub fn purge_all(&self) -> Result<PurgeStats, DatabaseError> {
        let write_txn = self.begin_write()?;

        let stats = PurgeStats {
            users: clear_table(&write_txn, USERS)?,
            subjects: clear_table(&write_txn, SUBJECTS)?,
            resources: clear_table(&write_txn, RESOURCES)?,
            comments: clear_table(&write_txn, COMMENTS)?,
            votes: clear_table(&write_txn, VOTES)?,
            sessions: clear_table(&write_txn, SESSIONS)?,
        };
        clear_table(&write_txn, USER_EMAILS)?;
        clear_table(&write_txn, SUBJECT_NAMES)?;
        clear_table(&write_txn, RESOURCE_COMMENTS)?;

        write_txn.commit()?;
        Ok(stats)
    }
}

/// Remove every row from a string-keyed table, returning how many there were.
fn clear_table<V: redb::Value + 'static>(
    write_txn: &WriteTransaction,
    definition: TableDefinition<'static, &'static str, V>,
) -> Result<u64, DatabaseError> {
    let keys: Vec<String> = {
        let table = write_txn.open_table(definition)?;
        table
            .iter()?
            .map(|r| r.map(|(k, _)| k.value().to_string()))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut table = write_txn.open_table(definition)?;
    let mut removed = 0;
    for key in keys {
        table.remove(key.as_str())?;
        removed += 1;
    }

    Ok(removed)
}
