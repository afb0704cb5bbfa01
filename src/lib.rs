//! study-shelf - A collaborative study-resource sharing REST API
//!
//! Users register, publish links to study resources tagged by subject and
//! level, comment on them, and vote them up or down:
//! - redb embedded database (ACID, MVCC, crash-safe) for all records
//! - single-transaction vote engine keeping counters and vote rows in sync
//! - filtered/sorted listings with live comment counts
//! - opaque bearer-token sessions
//!
//! The JSON API is consumed by a single-page frontend (not part of this crate).

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

use config::Config;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
}
