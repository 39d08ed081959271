//! # vsx-gallery - VS Code Gallery compatible extension server
//!
//! Serves the marketplace protocol spoken by VS Code and its forks:
//! - Gallery queries (`/vscode/gallery/extensionquery`) resolved through a search index
//! - Versioned asset downloads (`/vscode/asset/...`)
//! - SQLite-backed storage with an FTS5 search index
//! - Import of unpacked extensions from disk

pub mod entity;
pub mod repository;
pub mod storage;
pub mod search;
pub mod gallery;
pub mod server;
pub mod import;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use entity::{Extension, ExtensionVersion, FileResource, FileType, Namespace, MembershipRole};
pub use repository::RepositoryService;
pub use search::{SearchService, SearchOptions, SearchPage};
pub use gallery::VsCodeAdapter;
pub use storage::SqliteStore;

/// Result type alias for gallery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gallery operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Version already published: {0}")]
    DuplicateVersion(String),

    #[error("Invalid review: {0}")]
    InvalidReview(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown asset type: {0}")]
    UnknownAssetType(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}
