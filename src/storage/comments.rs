use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::CommentRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // Comment operations
    // ========================================================================

    /// Store a comment and add it to the per-resource index
    pub fn put_comment(&self, comment: &CommentRecord) -> Result<(), DatabaseError> {
        debug_assert!(!comment.id.is_empty(), "comment id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(COMMENTS)?;
            let data = rmp_serde::to_vec_named(comment)?;
            table.insert(comment.id.as_str(), data.as_slice())?;

            let mut index = write_txn.open_table(RESOURCE_COMMENTS)?;
            let mut comment_ids: Vec<String> = match index.get(comment.resource_id.as_str())? {
                Some(data) => rmp_serde::from_slice(data.value())?,
                None => Vec::new(),
            };

            if !comment_ids.contains(&comment.id) {
                comment_ids.push(comment.id.clone());
                let index_data = rmp_serde::to_vec_named(&comment_ids)?;
                index.insert(comment.resource_id.as_str(), index_data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a comment by its UUID
    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(COMMENTS)?;

        match table.get(id)? {
            Some(data) => {
                let comment: CommentRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(comment))
            }
            None => Ok(None),
        }
    }

    /// Delete a comment by its UUID and clean up the per-resource index
    pub fn delete_comment(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let resource_id: Option<String> = {
            let table = write_txn.open_table(COMMENTS)?;
            let found = match table.get(id)? {
                Some(data) => {
                    let comment: CommentRecord = rmp_serde::from_slice(data.value())?;
                    Some(comment.resource_id)
                }
                None => None,
            };
            found
        };

        let deleted = match resource_id {
            Some(resource_id) => {
                {
                    let mut table = write_txn.open_table(COMMENTS)?;
                    table.remove(id)?;
                }

                let comment_ids: Option<Vec<String>> = {
                    let index = write_txn.open_table(RESOURCE_COMMENTS)?;
                    let found = match index.get(resource_id.as_str())? {
                        Some(data) => Some(rmp_serde::from_slice(data.value())?),
                        None => None,
                    };
                    found
                };

                if let Some(mut ids) = comment_ids {
                    ids.retain(|cid| cid != id);
                    let mut index = write_txn.open_table(RESOURCE_COMMENTS)?;
                    if ids.is_empty() {
                        index.remove(resource_id.as_str())?;
                    } else {
                        let new_data = rmp_serde::to_vec_named(&ids)?;
                        index.insert(resource_id.as_str(), new_data.as_slice())?;
                    }
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// All comments on a resource, newest first
    pub fn comments_for_resource(
        &self,
        resource_id: &str,
    ) -> Result<Vec<CommentRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(RESOURCE_COMMENTS)?;
        let comments_table = read_txn.open_table(COMMENTS)?;

        let comment_ids: Vec<String> = match index.get(resource_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut comments = Vec::new();
        for comment_id in comment_ids {
            if let Some(data) = comments_table.get(comment_id.as_str())? {
                let comment: CommentRecord = rmp_serde::from_slice(data.value())?;
                comments.push(comment);
            }
        }
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(comments)
    }

    /// Live comment count for a resource
    pub fn comment_count(&self, resource_id: &str) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(RESOURCE_COMMENTS)?;

        match index.get(resource_id)? {
            Some(data) => {
                let ids: Vec<String> = rmp_serde::from_slice(data.value())?;
                Ok(ids.len() as u64)
            }
            None => Ok(0),
        }
    }
}
