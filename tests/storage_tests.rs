use chrono::{Duration, Utc};
use study_shelf::storage::models::{
    CommentRecord, Level, ResourceRecord, SessionRecord, UserRecord, VoteDirection,
};
use study_shelf::storage::Database;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn sample_user(name: &str, email: &str) -> UserRecord {
    UserRecord {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "pbkdf2-sha256$1$c2FsdA$aGFzaA".to_string(),
        created_at: Utc::now(),
    }
}

fn sample_resource(author_id: &str, subject_id: &str) -> ResourceRecord {
    ResourceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        title: "Stoichiometry basics".to_string(),
        description: "Balancing equations step by step".to_string(),
        url: "https://example.com/stoichiometry".to_string(),
        subject_id: subject_id.to_string(),
        level: Level::Intermediate,
        tags: "chemistry,practice".to_string(),
        upvotes: 0,
        downvotes: 0,
        author_id: author_id.to_string(),
        created_at: Utc::now(),
    }
}

// ============================================================================
// Users
// ============================================================================

#[test]
fn test_create_and_get_user() {
    let (_dir, db) = test_db();
    let user = sample_user("Ana", "ana@example.com");

    let created = db.create_user(&user).unwrap();
    assert!(created.is_some());

    let fetched = db.get_user(&user.id).unwrap().unwrap();
    assert_eq!(fetched.name, "Ana");
    assert_eq!(fetched.email, "ana@example.com");
    assert_eq!(fetched.password_hash, user.password_hash);
}

#[test]
fn test_get_user_by_email() {
    let (_dir, db) = test_db();
    let user = sample_user("Ana", "Ana@Example.com");
    db.create_user(&user).unwrap().unwrap();

    // Lookup is case-insensitive on the email
    let fetched = db.get_user_by_email("ana@example.COM").unwrap().unwrap();
    assert_eq!(fetched.id, user.id);

    assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
}

#[test]
fn test_duplicate_email_rejected() {
    let (_dir, db) = test_db();
    let first = sample_user("Ana", "ana@example.com");
    db.create_user(&first).unwrap().unwrap();

    // Same address, different case, different user
    let second = sample_user("Impostor", "ANA@example.com");
    assert!(db.create_user(&second).unwrap().is_none());

    // The original record is untouched
    let fetched = db.get_user_by_email("ana@example.com").unwrap().unwrap();
    assert_eq!(fetched.id, first.id);
    assert!(db.get_user(&second.id).unwrap().is_none());
}

#[test]
fn test_get_nonexistent_user() {
    let (_dir, db) = test_db();
    assert!(db.get_user("nonexistent").unwrap().is_none());
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_session_lifecycle() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    let session = SessionRecord {
        user_id: "user-1".to_string(),
        created_at: now,
        expires_at: now + Duration::hours(1),
    };

    db.put_session("digest-key", &session).unwrap();
    let fetched = db.get_session("digest-key").unwrap().unwrap();
    assert_eq!(fetched.user_id, "user-1");

    assert!(db.delete_session("digest-key").unwrap());
    assert!(db.get_session("digest-key").unwrap().is_none());

    // Deleting again is a no-op
    assert!(!db.delete_session("digest-key").unwrap());
}

// ============================================================================
// Subjects
// ============================================================================

#[test]
fn test_find_or_create_subject_is_idempotent() {
    let (_dir, db) = test_db();

    let first = db.find_or_create_subject("Calculus").unwrap();
    let second = db.find_or_create_subject("Calculus").unwrap();
    assert_eq!(first.id, second.id);

    // Exact-match names: different case means a different subject
    let other = db.find_or_create_subject("calculus").unwrap();
    assert_ne!(first.id, other.id);
}

#[test]
fn test_list_subjects_sorted_by_name() {
    let (_dir, db) = test_db();
    db.find_or_create_subject("Physics").unwrap();
    db.find_or_create_subject("Algebra").unwrap();
    db.find_or_create_subject("Chemistry").unwrap();

    let names: Vec<String> = db
        .list_subjects()
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Algebra", "Chemistry", "Physics"]);
}

#[test]
fn test_get_subject() {
    let (_dir, db) = test_db();
    let subject = db.find_or_create_subject("Biology").unwrap();

    let fetched = db.get_subject(&subject.id).unwrap().unwrap();
    assert_eq!(fetched.name, "Biology");
    assert_eq!(fetched.category, "other");

    assert!(db.get_subject("nonexistent").unwrap().is_none());
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn test_put_and_get_resource() {
    let (_dir, db) = test_db();
    let user = sample_user("Ana", "ana@example.com");
    db.create_user(&user).unwrap().unwrap();
    let subject = db.find_or_create_subject("Chemistry").unwrap();
    let resource = sample_resource(&user.id, &subject.id);

    db.put_resource(&resource).unwrap();

    let fetched = db.get_resource(&resource.id).unwrap().unwrap();
    assert_eq!(fetched.title, resource.title);
    assert_eq!(fetched.level, Level::Intermediate);
    assert_eq!(fetched.upvotes, 0);
}

#[test]
fn test_update_resource_replaces_fields() {
    let (_dir, db) = test_db();
    let user = sample_user("Ana", "ana@example.com");
    db.create_user(&user).unwrap().unwrap();
    let subject = db.find_or_create_subject("Chemistry").unwrap();
    let resource = sample_resource(&user.id, &subject.id);
    db.put_resource(&resource).unwrap();

    db.cast_vote(&user.id, &resource.id, VoteDirection::Up)
        .unwrap()
        .unwrap();

    let new_subject = db.find_or_create_subject("Physics").unwrap();
    let updated = db
        .update_resource(
            &resource.id,
            "New title",
            "New description",
            "https://example.com/new",
            &new_subject.id,
            Level::Advanced,
            "updated",
        )
        .unwrap();
    assert!(updated);

    let fetched = db.get_resource(&resource.id).unwrap().unwrap();
    assert_eq!(fetched.title, "New title");
    assert_eq!(fetched.subject_id, new_subject.id);
    assert_eq!(fetched.level, Level::Advanced);
    // Counters and provenance survive an edit
    assert_eq!(fetched.upvotes, 1);
    assert_eq!(fetched.author_id, user.id);
    assert_eq!(fetched.created_at, resource.created_at);
}

#[test]
fn test_update_nonexistent_resource() {
    let (_dir, db) = test_db();
    let subject = db.find_or_create_subject("Chemistry").unwrap();
    let updated = db
        .update_resource(
            "nonexistent",
            "Title",
            "Description",
            "https://example.com",
            &subject.id,
            Level::Basic,
            "",
        )
        .unwrap();
    assert!(!updated);
}

#[test]
fn test_delete_resource_cascades() {
    let (_dir, db) = test_db();
    let author = sample_user("Ana", "ana@example.com");
    let voter = sample_user("Ben", "ben@example.com");
    db.create_user(&author).unwrap().unwrap();
    db.create_user(&voter).unwrap().unwrap();
    let subject = db.find_or_create_subject("Chemistry").unwrap();
    let resource = sample_resource(&author.id, &subject.id);
    db.put_resource(&resource).unwrap();

    let comment = CommentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: resource.id.clone(),
        author_id: voter.id.clone(),
        content: "Very helpful".to_string(),
        created_at: Utc::now(),
    };
    db.put_comment(&comment).unwrap();
    db.cast_vote(&voter.id, &resource.id, VoteDirection::Down)
        .unwrap()
        .unwrap();

    assert!(db.delete_resource(&resource.id).unwrap());

    assert!(db.get_resource(&resource.id).unwrap().is_none());
    assert!(db.get_comment(&comment.id).unwrap().is_none());
    assert!(db.comments_for_resource(&resource.id).unwrap().is_empty());
    assert!(db.votes_for_resource(&resource.id).unwrap().is_empty());

    // The author, voter, and subject are untouched
    assert!(db.get_user(&author.id).unwrap().is_some());
    assert!(db.get_subject(&subject.id).unwrap().is_some());
}

#[test]
fn test_delete_nonexistent_resource() {
    let (_dir, db) = test_db();
    assert!(!db.delete_resource("nonexistent").unwrap());
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comments_newest_first() {
    let (_dir, db) = test_db();
    let user = sample_user("Ana", "ana@example.com");
    db.create_user(&user).unwrap().unwrap();
    let subject = db.find_or_create_subject("Chemistry").unwrap();
    let resource = sample_resource(&user.id, &subject.id);
    db.put_resource(&resource).unwrap();

    let base = Utc::now();
    for (i, text) in ["first", "second", "third"].iter().enumerate() {
        let comment = CommentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            resource_id: resource.id.clone(),
            author_id: user.id.clone(),
            content: text.to_string(),
            created_at: base + Duration::seconds(i as i64),
        };
        db.put_comment(&comment).unwrap();
    }

    let contents: Vec<String> = db
        .comments_for_resource(&resource.id)
        .unwrap()
        .into_iter()
        .map(|c| c.content)
        .collect();
    assert_eq!(contents, vec!["third", "second", "first"]);
    assert_eq!(db.comment_count(&resource.id).unwrap(), 3);
}

#[test]
fn test_corrupt_comment_index_surfaces_as_error() {
    let (_dir, db) = test_db();
    let user = sample_user("Ana", "ana@example.com");
    db.create_user(&user).unwrap().unwrap();
    let subject = db.find_or_create_subject("Chemistry").unwrap();
    let resource = sample_resource(&user.id, &subject.id);
    db.put_resource(&resource).unwrap();

    // Plant bytes that do not decode as a comment id list
    let write_txn = db.begin_write().unwrap();
    {
        let mut index = write_txn
            .open_table(study_shelf::storage::RESOURCE_COMMENTS)
            .unwrap();
        index.insert(resource.id.as_str(), [0xc1u8].as_slice()).unwrap();
    }
    write_txn.commit().unwrap();

    let comment = CommentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: resource.id.clone(),
        author_id: user.id.clone(),
        content: "never lands".to_string(),
        created_at: Utc::now(),
    };
    // The bad index is an error, not a silent reset
    assert!(db.put_comment(&comment).is_err());
    assert!(db.get_comment(&comment.id).unwrap().is_none());
}

#[test]
fn test_delete_comment_updates_index() {
    let (_dir, db) = test_db();
    let user = sample_user("Ana", "ana@example.com");
    db.create_user(&user).unwrap().unwrap();
    let subject = db.find_or_create_subject("Chemistry").unwrap();
    let resource = sample_resource(&user.id, &subject.id);
    db.put_resource(&resource).unwrap();

    let comment = CommentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: resource.id.clone(),
        author_id: user.id.clone(),
        content: "Short-lived".to_string(),
        created_at: Utc::now(),
    };
    db.put_comment(&comment).unwrap();
    assert_eq!(db.comment_count(&resource.id).unwrap(), 1);

    assert!(db.delete_comment(&comment.id).unwrap());
    assert!(db.get_comment(&comment.id).unwrap().is_none());
    assert_eq!(db.comment_count(&resource.id).unwrap(), 0);

    assert!(!db.delete_comment(&comment.id).unwrap());
}

// ============================================================================
// Purge
// ============================================================================

#[test]
fn test_purge_all() {
    let (_dir, db) = test_db();
    let user = sample_user("Ana", "ana@example.com");
    db.create_user(&user).unwrap().unwrap();
    let subject = db.find_or_create_subject("Chemistry").unwrap();
    let resource = sample_resource(&user.id, &subject.id);
    db.put_resource(&resource).unwrap();
    let comment = CommentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: resource.id.clone(),
        author_id: user.id.clone(),
        content: "Gone soon".to_string(),
        created_at: Utc::now(),
    };
    db.put_comment(&comment).unwrap();
    db.cast_vote(&user.id, &resource.id, VoteDirection::Up)
        .unwrap()
        .unwrap();
    let session = SessionRecord {
        user_id: user.id.clone(),
        created_at: Utc::now(),
        expires_at: Utc::now() + Duration::hours(1),
    };
    db.put_session("digest", &session).unwrap();

    let stats = db.purge_all().unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.subjects, 1);
    assert_eq!(stats.resources, 1);
    assert_eq!(stats.comments, 1);
    assert_eq!(stats.votes, 1);
    assert_eq!(stats.sessions, 1);

    assert!(db.get_user(&user.id).unwrap().is_none());
    assert!(db.get_user_by_email("ana@example.com").unwrap().is_none());
    assert!(db.get_resource(&resource.id).unwrap().is_none());
    assert!(db.list_subjects().unwrap().is_empty());

    // The store is reusable afterwards
    let again = sample_user("Ben", "ben@example.com");
    assert!(db.create_user(&again).unwrap().is_some());
}
