//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - namespaces(name)
//! - extensions(namespace_id, name, download_count, average_rating, latest_id)
//! - extension_versions(extension_id, version, metadata...)
//! - file_resources(extension_version_id, type, name, content)
//! - namespace_memberships(namespace_id, user_login, role)
//! - extension_reviews(extension_id, user_login, rating, active)
//! - extension_search (FTS5 index over names and descriptions)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, Publication, DbStats};
