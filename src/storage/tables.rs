use redb::TableDefinition;

/// User records: uuid -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Email index: lowercased email -> user uuid (case-insensitive uniqueness)
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Session records: token digest -> SessionRecord (msgpack)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Subject records: uuid -> SubjectRecord (msgpack)
pub const SUBJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("subjects");

/// Subject name index: name -> subject uuid (for lazy find-or-create)
pub const SUBJECT_NAMES: TableDefinition<&str, &str> = TableDefinition::new("subject_names");

/// Resource records: uuid -> ResourceRecord (msgpack)
pub const RESOURCES: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");

/// Comment records: uuid -> CommentRecord (msgpack)
pub const COMMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("comments");

/// Comment index: resource uuid -> msgpack Vec of comment UUIDs
pub const RESOURCE_COMMENTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("resource_comments");

/// Vote records: "resource_uuid/user_uuid" -> VoteRecord (msgpack).
/// The composite key enforces at most one vote per (user, resource) pair,
/// and a prefix range scan yields all votes for a resource.
pub const VOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("votes");
