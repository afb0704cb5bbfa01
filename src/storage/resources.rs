use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{
    Level, ResourceFilter, ResourceListing, ResourceRecord, SortKey, SubjectRecord, UserRecord,
};
use super::tables::*;
use super::votes::vote_range;

impl Database {
    // ========================================================================
    // Resource operations
    // ========================================================================

    /// Store a resource record
    pub fn put_resource(&self, resource: &ResourceRecord) -> Result<(), DatabaseError> {
        debug_assert!(!resource.id.is_empty(), "resource id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(RESOURCES)?;
            let data = rmp_serde::to_vec_named(resource)?;
            table.insert(resource.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a resource by its UUID
    pub fn get_resource(&self, id: &str) -> Result<Option<ResourceRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(RESOURCES)?;

        match table.get(id)? {
            Some(data) => {
                let resource: ResourceRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(resource))
            }
            None => Ok(None),
        }
    }

    /// Update a resource's author-editable fields (full replace)
    #[allow(clippy::too_many_arguments)]
    pub fn update_resource(
        &self,
        id: &str,
        title: &str,
        description: &str,
        url: &str,
        subject_id: &str,
        level: Level,
        tags: &str,
    ) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing: Option<ResourceRecord> = {
            let table = write_txn.open_table(RESOURCES)?;
            let found = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            found
        };

        let updated = match existing {
            Some(mut resource) => {
                resource.title = title.to_string();
                resource.description = description.to_string();
                resource.url = url.to_string();
                resource.subject_id = subject_id.to_string();
                resource.level = level;
                resource.tags = tags.to_string();

                let serialized = rmp_serde::to_vec_named(&resource)?;
                let mut table = write_txn.open_table(RESOURCES)?;
                table.insert(id, serialized.as_slice())?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a resource and cascade to its comments and votes.
    /// Everything is removed in one write transaction.
    pub fn delete_resource(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let exists = {
            let table = write_txn.open_table(RESOURCES)?;
            let found = table.get(id)?.is_some();
            found
        };

        let deleted = if exists {
            // Remove from resources table
            {
                let mut table = write_txn.open_table(RESOURCES)?;
                table.remove(id)?;
            }
            // Cascade: comments via the per-resource index
            {
                let comment_ids: Vec<String> = {
                    let index = write_txn.open_table(RESOURCE_COMMENTS)?;
                    let found = match index.get(id)? {
                        Some(data) => rmp_serde::from_slice(data.value())?,
                        None => Vec::new(),
                    };
                    found
                };

                let mut comments = write_txn.open_table(COMMENTS)?;
                for comment_id in &comment_ids {
                    comments.remove(comment_id.as_str())?;
                }
                drop(comments);

                let mut index = write_txn.open_table(RESOURCE_COMMENTS)?;
                index.remove(id)?;
            }
            // Cascade: votes via the composite-key prefix
            {
                let (start, end) = vote_range(id);
                let vote_keys: Vec<String> = {
                    let votes = write_txn.open_table(VOTES)?;
                    votes
                        .range(start.as_str()..end.as_str())?
                        .map(|r| r.map(|(k, _)| k.value().to_string()))
                        .collect::<Result<Vec<_>, _>>()?
                };

                let mut votes = write_txn.open_table(VOTES)?;
                for key in vote_keys {
                    votes.remove(key.as_str())?;
                }
            }
            true
        } else {
            false
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// Get a single resource enriched with subject name, author name, and
    /// live comment count
    pub fn get_resource_view(&self, id: &str) -> Result<Option<ResourceListing>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let resources = read_txn.open_table(RESOURCES)?;

        let resource: ResourceRecord = match resources.get(id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(None),
        };

        let subjects = read_txn.open_table(SUBJECTS)?;
        let users = read_txn.open_table(USERS)?;
        let comment_index = read_txn.open_table(RESOURCE_COMMENTS)?;

        let subject = match subjects.get(resource.subject_id.as_str())? {
            Some(data) => rmp_serde::from_slice::<SubjectRecord>(data.value())?.name,
            None => return Ok(None),
        };
        let author = match users.get(resource.author_id.as_str())? {
            Some(data) => rmp_serde::from_slice::<UserRecord>(data.value())?.name,
            None => return Ok(None),
        };
        let comments = match comment_index.get(id)? {
            Some(data) => rmp_serde::from_slice::<Vec<String>>(data.value())?.len() as u64,
            None => 0,
        };

        Ok(Some(listing(resource, subject, author, comments)))
    }

    /// Produce the filtered, sorted resource listing. All supplied filters
    /// are conjunctive; the search substring matches case-insensitively
    /// against any of title, description, or tags.
    pub fn list_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<Vec<ResourceListing>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let resources = read_txn.open_table(RESOURCES)?;
        let subjects = read_txn.open_table(SUBJECTS)?;
        let users = read_txn.open_table(USERS)?;
        let comment_index = read_txn.open_table(RESOURCE_COMMENTS)?;

        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut listings = Vec::new();
        for result in resources.iter()? {
            let (_, value) = result?;
            let resource: ResourceRecord = rmp_serde::from_slice(value.value())?;

            if let Some(level) = filter.level {
                if resource.level != level {
                    continue;
                }
            }

            if let Some(ref needle) = needle {
                let matches = resource.title.to_lowercase().contains(needle.as_str())
                    || resource.description.to_lowercase().contains(needle.as_str())
                    || resource.tags.to_lowercase().contains(needle.as_str());
                if !matches {
                    continue;
                }
            }

            // Skip rows with dangling references rather than failing the listing.
            let subject = match subjects.get(resource.subject_id.as_str())? {
                Some(data) => rmp_serde::from_slice::<SubjectRecord>(data.value())?.name,
                None => continue,
            };
            if let Some(ref want) = filter.subject {
                if subject != *want {
                    continue;
                }
            }

            let author = match users.get(resource.author_id.as_str())? {
                Some(data) => rmp_serde::from_slice::<UserRecord>(data.value())?.name,
                None => continue,
            };

            let comments = match comment_index.get(resource.id.as_str())? {
                Some(data) => rmp_serde::from_slice::<Vec<String>>(data.value())?.len() as u64,
                None => 0,
            };

            listings.push(listing(resource, subject, author, comments));
        }

        match filter.sort {
            SortKey::MostRecent => {
                listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            SortKey::MostVoted => {
                listings.sort_by(|a, b| b.score().cmp(&a.score()));
            }
            SortKey::MostCommented => {
                listings.sort_by(|a, b| b.comments.cmp(&a.comments));
            }
        }

        Ok(listings)
    }
}

fn listing(
    resource: ResourceRecord,
    subject: String,
    author: String,
    comments: u64,
) -> ResourceListing {
    ResourceListing {
        id: resource.id,
        title: resource.title,
        description: resource.description,
        url: resource.url,
        subject,
        level: resource.level,
        tags: resource.tags,
        upvotes: resource.upvotes,
        downvotes: resource.downvotes,
        author,
        author_id: resource.author_id,
        comments,
        created_at: resource.created_at,
    }
}
