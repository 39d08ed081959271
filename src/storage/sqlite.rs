//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use rusqlite::{Connection, Params, params, params_from_iter, OptionalExtension};
use rusqlite::types::{Type, Value};
use crate::{Result, Error};
use crate::entity::{sort_newest_first, Extension, ExtensionSearch, ExtensionVersion, FileResource, FileType, MembershipRole, Namespace};
use crate::repository::RepositoryService;
use crate::search::{SearchOptions, SearchPage, SortBy, SortOrder};
use super::schema;

const EXTENSION_SELECT: &str = "SELECT e.id, e.name, n.id, n.name, e.download_count, e.average_rating, e.latest_id \
     FROM extensions e JOIN namespaces n ON n.id = e.namespace_id";

const VERSION_SELECT: &str = "SELECT v.id, v.extension_id, v.version, v.preview, v.timestamp, v.display_name, \
     v.description, v.readme_file_name, v.license_file_name, v.icon_file_name, v.extension_file_name, \
     v.repository, v.engines, v.dependencies, v.bundled_extensions, v.categories, v.tags \
     FROM extension_versions v JOIN extensions e ON e.id = v.extension_id JOIN namespaces n ON n.id = e.namespace_id";

// The FTS table stays unaliased: MATCH and bm25() address it by name
const SEARCH_FROM: &str = "FROM extension_search \
     JOIN extensions e ON e.id = extension_search.extension_id \
     JOIN namespaces n ON n.id = e.namespace_id \
     JOIN extension_versions v ON v.id = e.latest_id";

/// SQLite-backed storage for namespaces, extensions and their assets
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Everything needed to publish one extension version
#[derive(Debug, Clone)]
pub struct Publication {
    pub namespace: String,
    pub extension: String,
    /// `id` and `extension_id` are assigned on insert
    pub version: ExtensionVersion,
    /// `extension_version_id` is assigned on insert
    pub files: Vec<FileResource>,
    /// Recorded as namespace owner when given
    pub owner: Option<String>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    // ========== Write Operations ==========

    /// Publish a version, creating namespace and extension on demand.
    ///
    /// Runs in one transaction: moves the latest pointer to the highest
    /// semver of the extension and refreshes its search index entry.
    pub fn publish(&self, publication: &Publication) -> Result<Extension> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let namespace = get_or_create_namespace(&tx, &publication.namespace)?;
        if let Some(owner) = &publication.owner {
            insert_membership(&tx, namespace.id, owner, MembershipRole::Owner)?;
        }
        let extension_id = get_or_create_extension(&tx, namespace.id, &publication.extension)?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM extension_versions WHERE extension_id = ?1 AND version = ?2)",
            params![extension_id, publication.version.version],
            |row| row.get(0),
        )?;
        if exists {
            return Err(Error::DuplicateVersion(format!(
                "{}.{}@{}",
                publication.namespace, publication.extension, publication.version.version
            )));
        }

        let version_id = insert_version(&tx, extension_id, &publication.version)?;
        for file in &publication.files {
            insert_file(&tx, version_id, file)?;
        }

        let latest_id = pick_latest(&tx, extension_id)?;
        tx.execute(
            "UPDATE extensions SET latest_id = ?2 WHERE id = ?1",
            params![extension_id, latest_id],
        )?;

        let extension = load_extension(&tx, "e.id = ?1", [extension_id])?
            .ok_or_else(|| Error::NotFound(format!("extension {}", extension_id)))?;
        index_extension(&tx, &extension)?;
        tx.commit()?;

        tracing::debug!(
            "Published {}@{} (latest: {:?})",
            extension.qualified_name(),
            publication.version.version,
            extension.latest.as_ref().map(|v| v.version.as_str())
        );
        Ok(extension)
    }

    /// Grant a user a role in a namespace (replaces a previous role)
    pub fn add_membership(&self, namespace: &Namespace, user_login: &str, role: MembershipRole) -> Result<()> {
        let conn = self.lock()?;
        insert_membership(&conn, namespace.id, user_login, role)
    }

    /// Record a review; the user's previous review becomes inactive.
    /// Recomputes the extension's average rating over active reviews.
    pub fn add_review(&self, extension: &Extension, user_login: &str, rating: u8, comment: Option<&str>) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidReview(format!("rating must be between 1 and 5, got {}", rating)));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE extension_reviews SET active = 0 WHERE extension_id = ?1 AND user_login = ?2 AND active = 1",
            params![extension.id, user_login],
        )?;
        tx.execute(
            r#"
            INSERT INTO extension_reviews (extension_id, user_login, rating, comment, active, timestamp)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            "#,
            params![extension.id, user_login, rating, comment, chrono::Utc::now().naive_utc()],
        )?;
        tx.execute(
            r#"
            UPDATE extensions SET average_rating =
                (SELECT AVG(rating) FROM extension_reviews WHERE extension_id = ?1 AND active = 1)
            WHERE id = ?1
            "#,
            [extension.id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ========== Search Operations ==========

    /// Run a full-text query against the search index
    pub fn search_extensions(&self, options: &SearchOptions) -> Result<SearchPage> {
        let mut conditions = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let match_query = options.query_string.as_deref().and_then(fts_query);
        if let Some(query) = &match_query {
            values.push(Value::Text(query.clone()));
            conditions.push(format!("extension_search MATCH ?{}", values.len()));
        }
        if let Some(namespace) = &options.namespace {
            values.push(Value::Text(namespace.clone()));
            conditions.push(format!("n.name = ?{}", values.len()));
        }
        if let Some(category) = &options.category {
            values.push(Value::Text(category.clone()));
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM json_each(v.categories) WHERE json_each.value = ?{})",
                values.len()
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let conn = self.lock()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) {} {}", SEARCH_FROM, where_clause),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let order_clause = order_clause(options.sort_by, options.sort_order, match_query.is_some());
        values.push(Value::Integer(options.page.size as i64));
        values.push(Value::Integer(options.page.offset() as i64));
        let sql = format!(
            "SELECT e.id, n.name, e.name {} {} ORDER BY {} LIMIT ?{} OFFSET ?{}",
            SEARCH_FROM,
            where_clause,
            order_clause,
            values.len() - 1,
            values.len()
        );

        let mut stmt = conn.prepare(&sql)?;
        let hits = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(ExtensionSearch {
                    id: row.get(0)?,
                    namespace: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(SearchPage { hits, total: total as usize })
    }

    // ========== Statistics ==========

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.lock()?;
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(DbStats {
            namespaces: count("namespaces")?,
            extensions: count("extensions")?,
            versions: count("extension_versions")?,
            files: count("file_resources")?,
            reviews: count("extension_reviews WHERE active = 1")?,
        })
    }
}

impl RepositoryService for SqliteStore {
    fn find_extension(&self, name: &str, namespace: &str) -> Result<Option<Extension>> {
        let conn = self.lock()?;
        load_extension(&conn, "e.name = ?1 AND n.name = ?2", params![name, namespace])
    }

    fn find_extension_by_id(&self, id: i64) -> Result<Option<Extension>> {
        let conn = self.lock()?;
        load_extension(&conn, "e.id = ?1", [id])
    }

    fn find_version(&self, version: &str, extension: &str, namespace: &str) -> Result<Option<ExtensionVersion>> {
        let conn = self.lock()?;
        let mut versions = query_versions(
            &conn,
            "v.version = ?1 AND e.name = ?2 AND n.name = ?3",
            params![version, extension, namespace],
        )?;
        Ok(versions.pop())
    }

    fn find_versions(&self, extension: &Extension) -> Result<Vec<ExtensionVersion>> {
        let conn = self.lock()?;
        let mut versions = query_versions(&conn, "v.extension_id = ?1", [extension.id])?;
        sort_newest_first(&mut versions);
        Ok(versions)
    }

    fn find_file(&self, version: &ExtensionVersion, file_type: FileType) -> Result<Option<FileResource>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, extension_version_id, type, name, content FROM file_resources WHERE extension_version_id = ?1 AND type = ?2",
            params![version.id, file_type.as_str()],
            row_to_file,
        )
        .optional()
        .map_err(Into::into)
    }

    fn count_memberships(&self, namespace: &Namespace, role: MembershipRole) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM namespace_memberships WHERE namespace_id = ?1 AND role = ?2",
            params![namespace.id, role.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn count_active_reviews(&self, extension: &Extension) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM extension_reviews WHERE extension_id = ?1 AND active = 1",
            [extension.id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn record_download(&self, version: &ExtensionVersion) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE extensions SET download_count = download_count + 1 WHERE id = ?1",
            [version.extension_id],
        )?;
        Ok(())
    }
}

// ========== Row Helpers ==========

/// Load one extension with namespace and latest version.
/// The latest version is only accepted when it belongs to the extension.
fn load_extension<P: Params>(conn: &Connection, clause: &str, params: P) -> Result<Option<Extension>> {
    let sql = format!("{} WHERE {}", EXTENSION_SELECT, clause);
    let row = conn
        .query_row(&sql, params, |row| {
            let extension = Extension {
                id: row.get(0)?,
                name: row.get(1)?,
                namespace: Namespace::new(row.get(2)?, row.get::<_, String>(3)?),
                download_count: row.get(4)?,
                average_rating: row.get(5)?,
                latest: None,
            };
            let latest_id: Option<i64> = row.get(6)?;
            Ok((extension, latest_id))
        })
        .optional()?;

    let Some((mut extension, latest_id)) = row else {
        return Ok(None);
    };
    if let Some(latest_id) = latest_id {
        let mut latest = query_versions(conn, "v.id = ?1 AND v.extension_id = ?2", [latest_id, extension.id])?;
        extension.latest = latest.pop();
    }
    Ok(Some(extension))
}

fn query_versions<P: Params>(conn: &Connection, clause: &str, params: P) -> Result<Vec<ExtensionVersion>> {
    let sql = format!("{} WHERE {}", VERSION_SELECT, clause);
    let mut stmt = conn.prepare(&sql)?;
    let versions = stmt
        .query_map(params, row_to_version)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(versions)
}

fn row_to_version(row: &rusqlite::Row) -> rusqlite::Result<ExtensionVersion> {
    Ok(ExtensionVersion {
        id: row.get(0)?,
        extension_id: row.get(1)?,
        version: row.get(2)?,
        preview: row.get(3)?,
        timestamp: row.get(4)?,
        display_name: row.get(5)?,
        description: row.get(6)?,
        readme_file_name: row.get(7)?,
        license_file_name: row.get(8)?,
        icon_file_name: row.get(9)?,
        extension_file_name: row.get(10)?,
        repository: row.get(11)?,
        engines: json_list(row, 12)?,
        dependencies: json_list(row, 13)?,
        bundled_extensions: json_list(row, 14)?,
        categories: json_list(row, 15)?,
        tags: json_list(row, 16)?,
    })
}

fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<FileResource> {
    let type_str: String = row.get(2)?;
    let file_type: FileType = type_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
    })?;

    Ok(FileResource {
        id: row.get(0)?,
        extension_version_id: row.get(1)?,
        file_type,
        name: row.get(3)?,
        content: row.get(4)?,
    })
}

fn json_list(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ========== Write Helpers ==========

fn get_or_create_namespace(conn: &Connection, name: &str) -> Result<Namespace> {
    conn.execute("INSERT OR IGNORE INTO namespaces (name) VALUES (?1)", [name])?;
    let id: i64 = conn.query_row("SELECT id FROM namespaces WHERE name = ?1", [name], |row| row.get(0))?;
    Ok(Namespace::new(id, name))
}

fn get_or_create_extension(conn: &Connection, namespace_id: i64, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO extensions (namespace_id, name) VALUES (?1, ?2)",
        params![namespace_id, name],
    )?;
    let id = conn.query_row(
        "SELECT id FROM extensions WHERE namespace_id = ?1 AND name = ?2",
        params![namespace_id, name],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn insert_membership(conn: &Connection, namespace_id: i64, user_login: &str, role: MembershipRole) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO namespace_memberships (namespace_id, user_login, role) VALUES (?1, ?2, ?3)",
        params![namespace_id, user_login, role.as_str()],
    )?;
    Ok(())
}

fn insert_version(conn: &Connection, extension_id: i64, version: &ExtensionVersion) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO extension_versions (
            extension_id, version, preview, timestamp, display_name, description,
            readme_file_name, license_file_name, icon_file_name, extension_file_name,
            repository, engines, dependencies, bundled_extensions, categories, tags
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
        params![
            extension_id,
            version.version,
            version.preview,
            version.timestamp,
            version.display_name,
            version.description,
            version.readme_file_name,
            version.license_file_name,
            version.icon_file_name,
            version.extension_file_name,
            version.repository,
            serde_json::to_string(&version.engines)?,
            serde_json::to_string(&version.dependencies)?,
            serde_json::to_string(&version.bundled_extensions)?,
            serde_json::to_string(&version.categories)?,
            serde_json::to_string(&version.tags)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_file(conn: &Connection, version_id: i64, file: &FileResource) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO file_resources (extension_version_id, type, name, content) VALUES (?1, ?2, ?3, ?4)",
        params![version_id, file.file_type.as_str(), file.name, file.content],
    )?;
    Ok(())
}

/// Highest semver among the extension's versions
fn pick_latest(conn: &Connection, extension_id: i64) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id, version FROM extension_versions WHERE extension_id = ?1")?;
    let versions = stmt
        .query_map([extension_id], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    versions
        .into_iter()
        .filter_map(|(id, version)| semver::Version::parse(&version).ok().map(|parsed| (parsed, id)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, id)| id)
        .ok_or_else(|| Error::InvalidVersion(format!("no valid versions for extension {}", extension_id)))
}

/// Replace the search index entry of an extension
fn index_extension(conn: &Connection, extension: &Extension) -> Result<()> {
    conn.execute("DELETE FROM extension_search WHERE extension_id = ?1", [extension.id])?;
    let Some(latest) = &extension.latest else {
        return Ok(());
    };

    conn.execute(
        r#"
        INSERT INTO extension_search (extension_id, namespace, name, display_name, description, tags)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            extension.id,
            extension.namespace.name,
            extension.name,
            latest.display_name,
            latest.description,
            latest.tags.join(" "),
        ],
    )?;
    Ok(())
}

/// Turn free text into an FTS5 prefix query: every token must match.
fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .map(|token| format!("\"{}\"*", token.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

fn order_clause(sort_by: SortBy, sort_order: SortOrder, has_match: bool) -> String {
    let direction = sort_order.as_str().to_uppercase();
    match sort_by {
        // bm25 scores are lower for better matches
        SortBy::Relevance if has_match => {
            let direction = match sort_order {
                SortOrder::Desc => "ASC",
                SortOrder::Asc => "DESC",
            };
            format!("bm25(extension_search) {}, e.id ASC", direction)
        }
        SortBy::Relevance | SortBy::DownloadCount => format!("e.download_count {}, e.id ASC", direction),
        SortBy::Timestamp => format!("v.timestamp {}, e.id ASC", direction),
        SortBy::AverageRating => format!("COALESCE(e.average_rating, 0) {}, e.id ASC", direction),
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub namespaces: usize,
    pub extensions: usize,
    pub versions: usize,
    pub files: usize,
    pub reviews: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Namespaces: {}", self.namespaces)?;
        writeln!(f, "  Extensions: {}", self.extensions)?;
        writeln!(f, "  Versions: {}", self.versions)?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Active reviews: {}", self.reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::PageRequest;
    use chrono::NaiveDateTime;

    fn timestamp(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn sample_publication(namespace: &str, name: &str, version: &str, description: &str) -> Publication {
        let mut ext_version = ExtensionVersion::new(0, 0, version, timestamp("2000-01-01T10:00:00"));
        ext_version.display_name = Some(name.to_uppercase());
        ext_version.description = Some(description.to_string());
        ext_version.readme_file_name = Some("README.md".to_string());
        ext_version.engines = vec!["vscode@^1.31.0".to_string()];
        ext_version.categories = vec!["Programming Languages".to_string()];

        Publication {
            namespace: namespace.to_string(),
            extension: name.to_string(),
            version: ext_version,
            files: vec![
                FileResource::new(0, FileType::Manifest, "package.json", br#"{"foo":"bar"}"#.to_vec()),
                FileResource::new(0, FileType::Readme, "README.md", b"# Hello".to_vec()),
            ],
            owner: None,
        }
    }

    fn set_download_count(store: &SqliteStore, extension_id: i64, count: i64) {
        store
            .lock()
            .unwrap()
            .execute("UPDATE extensions SET download_count = ?2 WHERE id = ?1", [extension_id, count])
            .unwrap();
    }

    #[test]
    fn test_publish_and_find() {
        let store = SqliteStore::open_in_memory().unwrap();
        let published = store
            .publish(&sample_publication("redhat", "vscode-yaml", "0.5.2", "YAML Language Support"))
            .unwrap();

        let found = store.find_extension("vscode-yaml", "redhat").unwrap().unwrap();
        assert_eq!(found.id, published.id);
        assert_eq!(found.namespace.name, "redhat");
        let latest = found.latest.unwrap();
        assert_eq!(latest.version, "0.5.2");
        assert_eq!(latest.extension_id, found.id);
        assert_eq!(latest.engines, vec!["vscode@^1.31.0"]);
        assert_eq!(latest.timestamp, timestamp("2000-01-01T10:00:00"));

        assert!(store.find_extension("vscode-yaml", "microsoft").unwrap().is_none());
        assert!(store.find_extension_by_id(published.id).unwrap().is_some());
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let publication = sample_publication("redhat", "vscode-yaml", "0.5.2", "YAML");
        store.publish(&publication).unwrap();

        let err = store.publish(&publication).unwrap_err();
        assert!(matches!(err, Error::DuplicateVersion(_)));
        assert_eq!(store.stats().unwrap().versions, 1);
    }

    #[test]
    fn test_latest_is_highest_semver() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.publish(&sample_publication("redhat", "vscode-yaml", "0.5.2", "YAML")).unwrap();
        store.publish(&sample_publication("redhat", "vscode-yaml", "0.10.0", "YAML")).unwrap();
        let extension = store.publish(&sample_publication("redhat", "vscode-yaml", "0.7.0", "YAML")).unwrap();

        assert_eq!(extension.latest.as_ref().unwrap().version, "0.10.0");
        assert_eq!(store.find_versions(&extension).unwrap().len(), 3);
    }

    #[test]
    fn test_versions_newest_first_when_published_out_of_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut release = sample_publication("redhat", "vscode-yaml", "1.0.0", "YAML");
        release.version.timestamp = timestamp("2021-01-01T00:00:00");
        store.publish(&release).unwrap();
        let mut backport = sample_publication("redhat", "vscode-yaml", "0.9.1", "YAML");
        backport.version.timestamp = timestamp("2021-02-01T00:00:00");
        let extension = store.publish(&backport).unwrap();

        assert_eq!(extension.latest.as_ref().unwrap().version, "1.0.0");
        let versions: Vec<_> = store
            .find_versions(&extension)
            .unwrap()
            .into_iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(versions, vec!["1.0.0", "0.9.1"]);
    }

    #[test]
    fn test_record_download() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.publish(&sample_publication("redhat", "vscode-yaml", "0.5.2", "YAML")).unwrap();
        let version = store.find_version("0.5.2", "vscode-yaml", "redhat").unwrap().unwrap();

        store.record_download(&version).unwrap();
        store.record_download(&version).unwrap();
        let extension = store.find_extension("vscode-yaml", "redhat").unwrap().unwrap();
        assert_eq!(extension.download_count, 2);
    }

    #[test]
    fn test_find_version_and_file() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.publish(&sample_publication("redhat", "vscode-yaml", "0.5.2", "YAML")).unwrap();

        let version = store.find_version("0.5.2", "vscode-yaml", "redhat").unwrap().unwrap();
        let manifest = store.find_file(&version, FileType::Manifest).unwrap().unwrap();
        assert_eq!(manifest.content, br#"{"foo":"bar"}"#);
        assert_eq!(manifest.name, "package.json");
        assert!(store.find_file(&version, FileType::Icon).unwrap().is_none());
        assert!(store.find_version("9.9.9", "vscode-yaml", "redhat").unwrap().is_none());
    }

    #[test]
    fn test_memberships_and_reviews() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut publication = sample_publication("redhat", "vscode-yaml", "0.5.2", "YAML");
        publication.owner = Some("alice".to_string());
        let extension = store.publish(&publication).unwrap();

        store.add_membership(&extension.namespace, "bob", MembershipRole::Contributor).unwrap();
        assert_eq!(store.count_memberships(&extension.namespace, MembershipRole::Owner).unwrap(), 1);
        assert_eq!(store.count_memberships(&extension.namespace, MembershipRole::Contributor).unwrap(), 1);

        store.add_review(&extension, "alice", 5, Some("great")).unwrap();
        store.add_review(&extension, "bob", 2, None).unwrap();
        // replaces bob's first review
        store.add_review(&extension, "bob", 3, None).unwrap();
        assert!(store.add_review(&extension, "carol", 6, None).is_err());

        assert_eq!(store.count_active_reviews(&extension).unwrap(), 2);
        let reloaded = store.find_extension_by_id(extension.id).unwrap().unwrap();
        assert_eq!(reloaded.average_rating, Some(4.0));
    }

    #[test]
    fn test_search_matches_prefix_and_filters() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.publish(&sample_publication("redhat", "vscode-yaml", "0.5.2", "YAML Language Support")).unwrap();
        store.publish(&sample_publication("redhat", "java", "1.0.0", "Java Language Support")).unwrap();
        store.publish(&sample_publication("ms-python", "python", "2020.1.0", "Python tooling")).unwrap();

        let page = store
            .search_extensions(&SearchOptions::new(Some("yam".to_string()), PageRequest::of(0, 50)))
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.hits[0].name, "vscode-yaml");

        let options = SearchOptions::new(Some("language".to_string()), PageRequest::of(0, 50))
            .with_namespace("redhat");
        assert_eq!(store.search_extensions(&options).unwrap().total, 2);

        let options = SearchOptions::new(None, PageRequest::of(0, 50)).with_category("Programming Languages");
        assert_eq!(store.search_extensions(&options).unwrap().total, 3);
        let options = SearchOptions::new(None, PageRequest::of(0, 50)).with_category("Themes");
        assert_eq!(store.search_extensions(&options).unwrap().total, 0);
    }

    #[test]
    fn test_category_filter_is_exact() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut theme = sample_publication("ns", "dark", "1.0.0", "A theme");
        theme.version.categories = vec!["Themes".to_string(), "Other".to_string()];
        store.publish(&theme).unwrap();
        store.publish(&sample_publication("ns", "yaml", "1.0.0", "YAML")).unwrap();

        let total = |category: &str| {
            let options = SearchOptions::new(None, PageRequest::of(0, 50)).with_category(category);
            store.search_extensions(&options).unwrap().total
        };
        assert_eq!(total("Themes"), 1);
        assert_eq!(total("Other"), 1);
        assert_eq!(total("themes"), 0);
        assert_eq!(total("Programming%"), 0);
        assert_eq!(total("Them_s"), 0);
        assert_eq!(total("Programming Languages"), 1);
    }

    #[test]
    fn test_search_sorting_and_paging() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.publish(&sample_publication("ns", "alpha", "1.0.0", "tool")).unwrap();
        let b = store.publish(&sample_publication("ns", "beta", "1.0.0", "tool")).unwrap();
        let c = store.publish(&sample_publication("ns", "gamma", "1.0.0", "tool")).unwrap();
        set_download_count(&store, a.id, 5);
        set_download_count(&store, b.id, 50);
        set_download_count(&store, c.id, 20);

        let options = SearchOptions::new(Some("tool".to_string()), PageRequest::of(0, 2))
            .with_sort(SortOrder::Desc, SortBy::DownloadCount);
        let page = store.search_extensions(&options).unwrap();
        assert_eq!(page.total, 3);
        let names: Vec<_> = page.hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "gamma"]);

        let options = SearchOptions::new(Some("tool".to_string()), PageRequest::of(1, 2))
            .with_sort(SortOrder::Desc, SortBy::DownloadCount);
        let page = store.search_extensions(&options).unwrap();
        assert_eq!(page.hits.len(), 1);
        assert_eq!(page.hits[0].name, "alpha");

        let options = SearchOptions::new(None, PageRequest::of(0, 10))
            .with_sort(SortOrder::Asc, SortBy::DownloadCount);
        let names: Vec<_> = store.search_extensions(&options).unwrap().hits.into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["alpha", "gamma", "beta"]);
    }

    #[test]
    fn test_fts_query_quotes_tokens() {
        assert_eq!(fts_query("yaml"), Some("\"yaml\"*".to_string()));
        assert_eq!(fts_query("  "), None);
        assert_eq!(fts_query("a\"b c"), Some("\"a\"\"b\"* \"c\"*".to_string()));
    }
}
