//! Database schema definitions

/// SQL to create the namespaces table
pub const CREATE_NAMESPACES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS namespaces (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the extensions table
pub const CREATE_EXTENSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS extensions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    namespace_id INTEGER NOT NULL REFERENCES namespaces(id),
    name TEXT NOT NULL,
    download_count INTEGER NOT NULL DEFAULT 0,
    average_rating REAL,
    latest_id INTEGER REFERENCES extension_versions(id),
    UNIQUE(namespace_id, name)
)
"#;

/// SQL to create the extension_versions table
/// List columns (engines, dependencies, ...) hold JSON arrays of strings
pub const CREATE_EXTENSION_VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS extension_versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    extension_id INTEGER NOT NULL REFERENCES extensions(id),
    version TEXT NOT NULL,
    preview INTEGER NOT NULL DEFAULT 0,
    timestamp TEXT NOT NULL,
    display_name TEXT,
    description TEXT,
    readme_file_name TEXT,
    license_file_name TEXT,
    icon_file_name TEXT,
    extension_file_name TEXT,
    repository TEXT,
    engines TEXT NOT NULL DEFAULT '[]',
    dependencies TEXT NOT NULL DEFAULT '[]',
    bundled_extensions TEXT NOT NULL DEFAULT '[]',
    categories TEXT NOT NULL DEFAULT '[]',
    tags TEXT NOT NULL DEFAULT '[]',
    UNIQUE(extension_id, version)
)
"#;

/// SQL to create the file_resources table
pub const CREATE_FILE_RESOURCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS file_resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    extension_version_id INTEGER NOT NULL REFERENCES extension_versions(id),
    type TEXT NOT NULL,
    name TEXT NOT NULL,
    content BLOB NOT NULL,
    UNIQUE(extension_version_id, type)
)
"#;

/// SQL to create the namespace_memberships table
pub const CREATE_MEMBERSHIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS namespace_memberships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    namespace_id INTEGER NOT NULL REFERENCES namespaces(id),
    user_login TEXT NOT NULL,
    role TEXT NOT NULL,
    UNIQUE(namespace_id, user_login)
)
"#;

/// SQL to create the extension_reviews table
/// A user has at most one active review per extension
pub const CREATE_REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS extension_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    extension_id INTEGER NOT NULL REFERENCES extensions(id),
    user_login TEXT NOT NULL,
    rating INTEGER NOT NULL,
    comment TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    timestamp TEXT NOT NULL
)
"#;

/// SQL to create the full-text search index
pub const CREATE_SEARCH_TABLE: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS extension_search USING fts5(
    extension_id UNINDEXED,
    namespace,
    name,
    display_name,
    description,
    tags
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_extensions_namespace ON extensions(namespace_id)",
    "CREATE INDEX IF NOT EXISTS idx_versions_extension ON extension_versions(extension_id)",
    "CREATE INDEX IF NOT EXISTS idx_files_version ON file_resources(extension_version_id)",
    "CREATE INDEX IF NOT EXISTS idx_memberships_namespace ON namespace_memberships(namespace_id, role)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_extension ON extension_reviews(extension_id, active)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_NAMESPACES_TABLE,
        CREATE_EXTENSIONS_TABLE,
        CREATE_EXTENSION_VERSIONS_TABLE,
        CREATE_FILE_RESOURCES_TABLE,
        CREATE_MEMBERSHIPS_TABLE,
        CREATE_REVIEWS_TABLE,
        CREATE_SEARCH_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
