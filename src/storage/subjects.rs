use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::SubjectRecord;
use super::tables::*;

/// Category assigned to subjects created lazily from a resource submission.
const DEFAULT_CATEGORY: &str = "other";

impl Database {
    // ========================================================================
    // Subject operations
    // ========================================================================

    /// Look up a subject by name, creating it when unknown. Name matching is
    /// exact; the lookup and insert share one write transaction.
    pub fn find_or_create_subject(&self, name: &str) -> Result<SubjectRecord, DatabaseError> {
        let write_txn = self.begin_write()?;
        let subject = {
            let mut names_table = write_txn.open_table(SUBJECT_NAMES)?;
            let existing_id = names_table.get(name)?.map(|v| v.value().to_string());

            match existing_id {
                Some(id) => {
                    let known: Option<SubjectRecord> = {
                        let table = write_txn.open_table(SUBJECTS)?;
                        let found = match table.get(id.as_str())? {
                            Some(data) => Some(rmp_serde::from_slice(data.value())?),
                            None => None,
                        };
                        found
                    };

                    match known {
                        Some(subject) => subject,
                        // Dangling name index entry; recreate the record.
                        None => {
                            let subject = SubjectRecord {
                                id,
                                name: name.to_string(),
                                category: DEFAULT_CATEGORY.to_string(),
                            };
                            let mut table = write_txn.open_table(SUBJECTS)?;
                            let data = rmp_serde::to_vec_named(&subject)?;
                            table.insert(subject.id.as_str(), data.as_slice())?;
                            subject
                        }
                    }
                }
                None => {
                    let subject = SubjectRecord {
                        id: uuid::Uuid::new_v4().to_string(),
                        name: name.to_string(),
                        category: DEFAULT_CATEGORY.to_string(),
                    };
                    names_table.insert(name, subject.id.as_str())?;
                    let mut table = write_txn.open_table(SUBJECTS)?;
                    let data = rmp_serde::to_vec_named(&subject)?;
                    table.insert(subject.id.as_str(), data.as_slice())?;
                    subject
                }
            }
        };
        write_txn.commit()?;

        Ok(subject)
    }

    /// Get a subject by its UUID
    pub fn get_subject(&self, id: &str) -> Result<Option<SubjectRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBJECTS)?;

        match table.get(id)? {
            Some(data) => {
                let subject: SubjectRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(subject))
            }
            None => Ok(None),
        }
    }

    /// All known subjects, sorted by name (for the filter UI)
    pub fn list_subjects(&self) -> Result<Vec<SubjectRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBJECTS)?;

        let mut subjects = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let subject: SubjectRecord = rmp_serde::from_slice(value.value())?;
            subjects.push(subject);
        }
        subjects.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(subjects)
    }
}
