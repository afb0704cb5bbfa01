use chrono::{Duration, Utc};
use study_shelf::storage::models::{
    CommentRecord, Level, ResourceFilter, ResourceRecord, SortKey, UserRecord,
};
use study_shelf::storage::Database;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn seed_user(db: &Database) -> UserRecord {
    let user = UserRecord {
        id: uuid::Uuid::new_v4().to_string(),
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        password_hash: "pbkdf2-sha256$1$c2FsdA$aGFzaA".to_string(),
        created_at: Utc::now(),
    };
    db.create_user(&user).unwrap().unwrap()
}

struct Seed<'a> {
    title: &'a str,
    description: &'a str,
    subject: &'a str,
    level: Level,
    tags: &'a str,
    upvotes: u64,
    downvotes: u64,
    age_hours: i64,
}

impl Default for Seed<'_> {
    fn default() -> Self {
        Seed {
            title: "Untitled",
            description: "No description",
            subject: "Algebra",
            level: Level::Basic,
            tags: "",
            upvotes: 0,
            downvotes: 0,
            age_hours: 0,
        }
    }
}

fn seed_resource(db: &Database, author: &UserRecord, seed: Seed) -> ResourceRecord {
    let subject = db.find_or_create_subject(seed.subject).unwrap();
    let resource = ResourceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        title: seed.title.to_string(),
        description: seed.description.to_string(),
        url: "https://example.com/page".to_string(),
        subject_id: subject.id,
        level: seed.level,
        tags: seed.tags.to_string(),
        upvotes: seed.upvotes,
        downvotes: seed.downvotes,
        author_id: author.id.clone(),
        created_at: Utc::now() - Duration::hours(seed.age_hours),
    };
    db.put_resource(&resource).unwrap();
    resource
}

fn titles(db: &Database, filter: &ResourceFilter) -> Vec<String> {
    db.list_resources(filter)
        .unwrap()
        .into_iter()
        .map(|l| l.title)
        .collect()
}

#[test]
fn test_unfiltered_listing_returns_everything() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(&db, &author, Seed { title: "A", ..Default::default() });
    seed_resource(&db, &author, Seed { title: "B", ..Default::default() });

    let listings = db.list_resources(&ResourceFilter::default()).unwrap();
    assert_eq!(listings.len(), 2);
}

#[test]
fn test_filter_by_level() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(
        &db,
        &author,
        Seed { title: "Intro", level: Level::Beginner, ..Default::default() },
    );
    seed_resource(
        &db,
        &author,
        Seed { title: "Deep dive", level: Level::Advanced, ..Default::default() },
    );

    let filter = ResourceFilter {
        level: Some(Level::Advanced),
        ..Default::default()
    };
    assert_eq!(titles(&db, &filter), vec!["Deep dive"]);
}

#[test]
fn test_filter_by_subject() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(
        &db,
        &author,
        Seed { title: "Derivatives", subject: "Calculus", ..Default::default() },
    );
    seed_resource(
        &db,
        &author,
        Seed { title: "Bonding", subject: "Chemistry", ..Default::default() },
    );

    let filter = ResourceFilter {
        subject: Some("Calculus".to_string()),
        ..Default::default()
    };
    assert_eq!(titles(&db, &filter), vec!["Derivatives"]);
}

#[test]
fn test_filters_are_conjunctive() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(
        &db,
        &author,
        Seed {
            title: "Calc basics",
            subject: "Calculus",
            level: Level::Beginner,
            ..Default::default()
        },
    );
    seed_resource(
        &db,
        &author,
        Seed {
            title: "Calc limits",
            subject: "Calculus",
            level: Level::Advanced,
            ..Default::default()
        },
    );
    seed_resource(
        &db,
        &author,
        Seed {
            title: "Chem basics",
            subject: "Chemistry",
            level: Level::Beginner,
            ..Default::default()
        },
    );

    let filter = ResourceFilter {
        subject: Some("Calculus".to_string()),
        level: Some(Level::Beginner),
        ..Default::default()
    };
    assert_eq!(titles(&db, &filter), vec!["Calc basics"]);
}

#[test]
fn test_unmatched_filter_is_empty_not_error() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(&db, &author, Seed::default());

    let filter = ResourceFilter {
        subject: Some("Astrophysics".to_string()),
        ..Default::default()
    };
    assert!(db.list_resources(&filter).unwrap().is_empty());
}

#[test]
fn test_search_is_case_insensitive() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(
        &db,
        &author,
        Seed { title: "Linear Algebra Primer", ..Default::default() },
    );
    seed_resource(&db, &author, Seed { title: "Organic chemistry", ..Default::default() });

    let filter = ResourceFilter {
        search: Some("ALGEBRA".to_string()),
        ..Default::default()
    };
    assert_eq!(titles(&db, &filter), vec!["Linear Algebra Primer"]);
}

#[test]
fn test_search_matches_across_fields() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(
        &db,
        &author,
        Seed { title: "Vectors explained", ..Default::default() },
    );
    seed_resource(
        &db,
        &author,
        Seed {
            title: "Study guide",
            description: "Covers vectors and matrices",
            ..Default::default()
        },
    );
    seed_resource(
        &db,
        &author,
        Seed { title: "Cheat sheet", tags: "vectors,exam", ..Default::default() },
    );
    seed_resource(&db, &author, Seed { title: "Unrelated", ..Default::default() });

    // Title, description, or tags. Any one field matching is enough.
    let filter = ResourceFilter {
        search: Some("vector".to_string()),
        ..Default::default()
    };
    let found = titles(&db, &filter);
    assert_eq!(found.len(), 3);
    assert!(!found.contains(&"Unrelated".to_string()));
}

#[test]
fn test_search_combines_with_filters() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(
        &db,
        &author,
        Seed {
            title: "Vectors for beginners",
            level: Level::Beginner,
            ..Default::default()
        },
    );
    seed_resource(
        &db,
        &author,
        Seed {
            title: "Vectors in depth",
            level: Level::Advanced,
            ..Default::default()
        },
    );

    let filter = ResourceFilter {
        level: Some(Level::Advanced),
        search: Some("vectors".to_string()),
        ..Default::default()
    };
    assert_eq!(titles(&db, &filter), vec!["Vectors in depth"]);
}

#[test]
fn test_sort_most_recent_is_default() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    seed_resource(&db, &author, Seed { title: "Oldest", age_hours: 48, ..Default::default() });
    seed_resource(&db, &author, Seed { title: "Newest", age_hours: 0, ..Default::default() });
    seed_resource(&db, &author, Seed { title: "Middle", age_hours: 24, ..Default::default() });

    let found = titles(&db, &ResourceFilter::default());
    assert_eq!(found, vec!["Newest", "Middle", "Oldest"]);
}

#[test]
fn test_sort_most_voted_uses_net_score() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    // Net scores: 8, 2, 10. Raw upvotes alone would order these differently.
    seed_resource(
        &db,
        &author,
        Seed { title: "Second", upvotes: 10, downvotes: 2, ..Default::default() },
    );
    seed_resource(
        &db,
        &author,
        Seed { title: "Third", upvotes: 50, downvotes: 48, ..Default::default() },
    );
    seed_resource(
        &db,
        &author,
        Seed { title: "First", upvotes: 13, downvotes: 1, ..Default::default() },
    );

    let filter = ResourceFilter {
        sort: SortKey::MostVoted,
        ..Default::default()
    };
    assert_eq!(titles(&db, &filter), vec!["First", "Second", "Third"]);
}

#[test]
fn test_sort_most_commented() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    let quiet = seed_resource(&db, &author, Seed { title: "Quiet", ..Default::default() });
    let busy = seed_resource(&db, &author, Seed { title: "Busy", ..Default::default() });

    for i in 0..3 {
        let comment = CommentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            resource_id: busy.id.clone(),
            author_id: author.id.clone(),
            content: format!("comment {i}"),
            created_at: Utc::now(),
        };
        db.put_comment(&comment).unwrap();
    }
    let comment = CommentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: quiet.id.clone(),
        author_id: author.id.clone(),
        content: "only one".to_string(),
        created_at: Utc::now(),
    };
    db.put_comment(&comment).unwrap();

    let filter = ResourceFilter {
        sort: SortKey::MostCommented,
        ..Default::default()
    };
    let listings = db.list_resources(&filter).unwrap();
    assert_eq!(listings[0].title, "Busy");
    assert_eq!(listings[0].comments, 3);
    assert_eq!(listings[1].title, "Quiet");
    assert_eq!(listings[1].comments, 1);
}

#[test]
fn test_listing_is_enriched() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    let resource = seed_resource(
        &db,
        &author,
        Seed { title: "Enriched", subject: "Calculus", ..Default::default() },
    );

    let listings = db.list_resources(&ResourceFilter::default()).unwrap();
    assert_eq!(listings.len(), 1);
    let listing = &listings[0];
    assert_eq!(listing.id, resource.id);
    assert_eq!(listing.subject, "Calculus");
    assert_eq!(listing.author, "Ana");
    assert_eq!(listing.author_id, author.id);
    assert_eq!(listing.comments, 0);
}

#[test]
fn test_single_resource_view() {
    let (_dir, db) = test_db();
    let author = seed_user(&db);
    let resource = seed_resource(
        &db,
        &author,
        Seed { title: "Detail", subject: "Chemistry", ..Default::default() },
    );

    let view = db.get_resource_view(&resource.id).unwrap().unwrap();
    assert_eq!(view.title, "Detail");
    assert_eq!(view.subject, "Chemistry");
    assert_eq!(view.author, "Ana");

    assert!(db.get_resource_view("nonexistent").unwrap().is_none());
}
