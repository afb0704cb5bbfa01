use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty level of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Basic,
    Intermediate,
    Advanced,
}

impl Level {
    /// Parse a query-parameter value. Returns `None` for unrecognized input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Some(Level::Beginner),
            "basic" => Some(Level::Basic),
            "intermediate" => Some(Level::Intermediate),
            "advanced" => Some(Level::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Basic => "basic",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

/// Direction of a vote on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// What the vote engine did with a cast vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Created,
    Updated,
    Removed,
}

/// Result of casting a vote: the recorded transition plus the resource's
/// counters after it was applied.
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub action: VoteAction,
    /// The direction now on record; `None` after a toggle-off.
    pub direction: Option<VoteDirection>,
    pub upvotes: u64,
    pub downvotes: u64,
}

/// Sort order for resource listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    MostRecent,
    MostVoted,
    MostCommented,
}

/// Caller-supplied listing constraints. All filters are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    /// Exact subject name match.
    pub subject: Option<String>,
    /// Exact level match.
    pub level: Option<Level>,
    /// Case-insensitive substring, OR-ed across title, description, and tags.
    pub search: Option<String>,
    pub sort: SortKey,
}

/// A registered user stored in redb.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A bearer session, keyed by the token's digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A subject (course/topic) referenced by resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// A shared study resource stored in redb.
///
/// Invariant: `upvotes` and `downvotes` always equal the number of vote
/// rows in the corresponding direction for this resource. Only the vote
/// engine ([`crate::storage::Database::cast_vote`]) and cascade deletion
/// may move them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub subject_id: String,
    pub level: Level,
    /// Free-text comma-separated tags.
    pub tags: String,
    pub upvotes: u64,
    pub downvotes: u64,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// A comment on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub resource_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A user's vote on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub user_id: String,
    pub resource_id: String,
    pub direction: VoteDirection,
    pub created_at: DateTime<Utc>,
}

/// A resource enriched with its subject name, author display name, and
/// live comment count — the shape the listing and detail endpoints serve.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceListing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub subject: String,
    pub level: Level,
    pub tags: String,
    pub upvotes: u64,
    pub downvotes: u64,
    pub author: String,
    pub author_id: String,
    pub comments: u64,
    pub created_at: DateTime<Utc>,
}

impl ResourceListing {
    /// Net score used by the `mostVoted` sort.
    pub fn score(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }
}
