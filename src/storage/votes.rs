use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{ResourceRecord, VoteAction, VoteDirection, VoteOutcome, VoteRecord};
use super::tables::*;

/// Composite vote key: resource first so one resource's votes are contiguous.
pub(super) fn vote_key(resource_id: &str, user_id: &str) -> String {
    format!("{resource_id}/{user_id}")
}

/// Key bounds covering every vote on a resource. '0' is the first byte
/// after '/' so the half-open range captures exactly the "{id}/" prefix.
pub(super) fn vote_range(resource_id: &str) -> (String, String) {
    (format!("{resource_id}/"), format!("{resource_id}0"))
}

impl Database {
    // ========================================================================
    // Vote operations
    // ========================================================================

    /// Apply a user's vote to a resource under toggle semantics:
    /// no prior vote creates one, a repeated direction removes it, and the
    /// opposite direction switches it. The vote row and the resource's
    /// counters move together in a single write transaction; any failure
    /// drops the transaction and rolls back both.
    ///
    /// Returns `None` when the resource does not exist.
    pub fn cast_vote(
        &self,
        user_id: &str,
        resource_id: &str,
        direction: VoteDirection,
    ) -> Result<Option<VoteOutcome>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let outcome = {
            let mut resources = write_txn.open_table(RESOURCES)?;
            let existing: Option<ResourceRecord> = match resources.get(resource_id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            match existing {
                None => None,
                Some(mut resource) => {
                    let mut votes = write_txn.open_table(VOTES)?;
                    let key = vote_key(resource_id, user_id);
                    let current: Option<VoteRecord> = match votes.get(key.as_str())? {
                        Some(data) => Some(rmp_serde::from_slice(data.value())?),
                        None => None,
                    };

                    let (action, recorded) = match current {
                        // No prior vote: create one.
                        None => {
                            let vote = VoteRecord {
                                user_id: user_id.to_string(),
                                resource_id: resource_id.to_string(),
                                direction,
                                created_at: Utc::now(),
                            };
                            let data = rmp_serde::to_vec_named(&vote)?;
                            votes.insert(key.as_str(), data.as_slice())?;

                            match direction {
                                VoteDirection::Up => resource.upvotes += 1,
                                VoteDirection::Down => resource.downvotes += 1,
                            }
                            (VoteAction::Created, Some(direction))
                        }
                        // Same direction again: toggle the vote off.
                        Some(vote) if vote.direction == direction => {
                            votes.remove(key.as_str())?;

                            match direction {
                                VoteDirection::Up => {
                                    resource.upvotes = resource.upvotes.saturating_sub(1);
                                }
                                VoteDirection::Down => {
                                    resource.downvotes = resource.downvotes.saturating_sub(1);
                                }
                            }
                            (VoteAction::Removed, None)
                        }
                        // Opposite direction: switch, moving both counters.
                        Some(mut vote) => {
                            vote.direction = direction;
                            let data = rmp_serde::to_vec_named(&vote)?;
                            votes.insert(key.as_str(), data.as_slice())?;

                            match direction {
                                VoteDirection::Up => {
                                    resource.downvotes = resource.downvotes.saturating_sub(1);
                                    resource.upvotes += 1;
                                }
                                VoteDirection::Down => {
                                    resource.upvotes = resource.upvotes.saturating_sub(1);
                                    resource.downvotes += 1;
                                }
                            }
                            (VoteAction::Updated, Some(direction))
                        }
                    };
                    drop(votes);

                    let serialized = rmp_serde::to_vec_named(&resource)?;
                    resources.insert(resource_id, serialized.as_slice())?;

                    Some(VoteOutcome {
                        action,
                        direction: recorded,
                        upvotes: resource.upvotes,
                        downvotes: resource.downvotes,
                    })
                }
            }
        };

        write_txn.commit()?;
        Ok(outcome)
    }

    /// A user's current vote on a resource, if any
    pub fn get_vote(
        &self,
        user_id: &str,
        resource_id: &str,
    ) -> Result<Option<VoteRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(VOTES)?;

        match table.get(vote_key(resource_id, user_id).as_str())? {
            Some(data) => {
                let vote: VoteRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(vote))
            }
            None => Ok(None),
        }
    }

    /// All vote rows for a resource (counter invariant checks, tooling)
    pub fn votes_for_resource(&self, resource_id: &str) -> Result<Vec<VoteRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(VOTES)?;

        let (start, end) = vote_range(resource_id);
        let mut votes = Vec::new();
        for result in table.range(start.as_str()..end.as_str())? {
            let (_, value) = result?;
            let vote: VoteRecord = rmp_serde::from_slice(value.value())?;
            votes.push(vote);
        }

        Ok(votes)
    }
}
