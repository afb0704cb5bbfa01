mod admin;
pub mod auth;
pub mod comments;
pub mod resources;

pub use admin::{admin_purge, health};
pub use auth::{login, logout, me, register};
pub use comments::{create_comment, delete_comment, list_comments};
pub use resources::{
    create_resource, delete_resource, get_resource, list_resources, list_subjects,
    update_resource, vote_resource,
};
