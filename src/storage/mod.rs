mod comments;
pub mod db;
pub mod models;
mod resources;
mod subjects;
mod tables;
mod users;
mod votes;

pub use db::{Database, DatabaseError};
pub use tables::*;
