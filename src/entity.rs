//! Marketplace entities
//!
//! - `Namespace`: publisher account that owns extensions
//! - `Extension`: an add-on identified by namespace + name
//! - `ExtensionVersion`: one published release of an extension
//! - `FileResource`: a stored asset of a version (manifest, readme, icon, ...)
//! - `ExtensionSearch`: lightweight hit returned by the search index

use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Publisher account grouping extensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub id: i64,
    /// Unique, human-readable name (the `publisher` field of package.json)
    pub name: String,
}

impl Namespace {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// An extension with its owning namespace and, once published, its latest version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub id: i64,
    /// Name, unique within the namespace
    pub name: String,
    pub namespace: Namespace,
    pub download_count: i64,
    /// Average over active reviews, `None` until the first review
    pub average_rating: Option<f64>,
    /// Always a version of this extension
    pub latest: Option<ExtensionVersion>,
}

impl Extension {
    pub fn new(id: i64, name: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            id,
            name: name.into(),
            namespace,
            download_count: 0,
            average_rating: None,
            latest: None,
        }
    }

    pub fn with_download_count(mut self, count: i64) -> Self {
        self.download_count = count;
        self
    }

    pub fn with_average_rating(mut self, rating: f64) -> Self {
        self.average_rating = Some(rating);
        self
    }

    /// Attach the latest version.
    ///
    /// Fails when the version belongs to another extension.
    pub fn with_latest(mut self, version: ExtensionVersion) -> Result<Self> {
        if version.extension_id != self.id {
            return Err(Error::InvalidVersion(format!(
                "version {} belongs to extension {}, not {}",
                version.version, version.extension_id, self.id
            )));
        }
        self.latest = Some(version);
        Ok(self)
    }

    /// `namespace.name`, the identifier used by gallery clients
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace.name, self.name)
    }
}

/// One published release of an extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionVersion {
    pub id: i64,
    pub extension_id: i64,
    pub version: String,
    pub preview: bool,
    pub timestamp: NaiveDateTime,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub readme_file_name: Option<String>,
    pub license_file_name: Option<String>,
    pub icon_file_name: Option<String>,
    pub extension_file_name: Option<String>,
    /// Source repository URL
    pub repository: Option<String>,
    /// Engine constraints such as `vscode@^1.31.0`
    pub engines: Vec<String>,
    pub dependencies: Vec<String>,
    pub bundled_extensions: Vec<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl ExtensionVersion {
    pub fn new(id: i64, extension_id: i64, version: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            id,
            extension_id,
            version: version.into(),
            preview: false,
            timestamp,
            display_name: None,
            description: None,
            readme_file_name: None,
            license_file_name: None,
            icon_file_name: None,
            extension_file_name: None,
            repository: None,
            engines: Vec::new(),
            dependencies: Vec::new(),
            bundled_extensions: Vec::new(),
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Version range of the `vscode` engine, e.g. `^1.31.0`
    pub fn vscode_engine(&self) -> Option<&str> {
        self.engines
            .iter()
            .find_map(|engine| engine.strip_prefix("vscode@"))
    }

    /// File name registered for a resource type, if the version carries one.
    ///
    /// Manifests have no registered name; every version has one.
    pub fn file_name(&self, file_type: FileType) -> Option<&str> {
        match file_type {
            FileType::Manifest => Some("package.json"),
            FileType::Readme => self.readme_file_name.as_deref(),
            FileType::License => self.license_file_name.as_deref(),
            FileType::Icon => self.icon_file_name.as_deref(),
            FileType::Download => self.extension_file_name.as_deref(),
        }
    }
}

/// Order versions newest first: highest semver, then most recent publish.
///
/// Versions that are not valid semver sort after all valid ones.
pub fn sort_newest_first(versions: &mut [ExtensionVersion]) {
    versions.sort_by(|a, b| {
        let by_version = match (semver::Version::parse(&a.version), semver::Version::parse(&b.version)) {
            (Ok(a), Ok(b)) => b.cmp(&a),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => Ordering::Equal,
        };
        by_version.then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

/// Role of a stored asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// package.json
    Manifest,
    Readme,
    License,
    Icon,
    /// The .vsix package
    Download,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Manifest => "manifest",
            FileType::Readme => "readme",
            FileType::License => "license",
            FileType::Icon => "icon",
            FileType::Download => "download",
        }
    }

    pub fn all() -> &'static [FileType] {
        &[
            FileType::Manifest,
            FileType::Readme,
            FileType::License,
            FileType::Icon,
            FileType::Download,
        ]
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "manifest" => Ok(FileType::Manifest),
            "readme" => Ok(FileType::Readme),
            "license" => Ok(FileType::License),
            "icon" => Ok(FileType::Icon),
            "download" | "vsix" => Ok(FileType::Download),
            _ => Err(Error::UnknownAssetType(s.to_string())),
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored asset of an extension version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    pub id: i64,
    pub extension_version_id: i64,
    pub file_type: FileType,
    /// Original file name, used to pick a content type
    pub name: String,
    pub content: Vec<u8>,
}

impl FileResource {
    pub fn new(extension_version_id: i64, file_type: FileType, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: 0, // Set by DB
            extension_version_id,
            file_type,
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Role of a user within a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    Owner,
    Contributor,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Contributor => "contributor",
        }
    }
}

impl FromStr for MembershipRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(MembershipRole::Owner),
            "contributor" => Ok(MembershipRole::Contributor),
            _ => Err(Error::InvalidManifest(format!("Unknown membership role: {}", s))),
        }
    }
}

/// Search hit. Carries just enough to re-fetch the full extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSearch {
    pub id: i64,
    pub namespace: String,
    pub name: String,
}
