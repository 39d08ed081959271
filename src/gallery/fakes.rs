//! In-memory stand-ins for the repository and search seams

use std::sync::atomic::{AtomicI64, Ordering};
use chrono::NaiveDateTime;
use crate::Result;
use crate::entity::{sort_newest_first, Extension, ExtensionSearch, ExtensionVersion, FileResource, FileType, MembershipRole, Namespace};
use crate::repository::RepositoryService;
use crate::search::{PageRequest, SearchOptions, SearchPage, SearchService};

pub(crate) fn testdata(name: &str) -> &'static str {
    match name {
        "search-yaml-query.json" => include_str!("testdata/search-yaml-query.json"),
        "search-yaml-response.json" => include_str!("testdata/search-yaml-response.json"),
        "findid-yaml-query.json" => include_str!("testdata/findid-yaml-query.json"),
        "findid-yaml-response.json" => include_str!("testdata/findid-yaml-response.json"),
        "findname-yaml-query.json" => include_str!("testdata/findname-yaml-query.json"),
        "findname-yaml-response.json" => include_str!("testdata/findname-yaml-response.json"),
        other => panic!("no test data named {}", other),
    }
}

#[derive(Default)]
pub(crate) struct FakeRepository {
    extensions: Vec<Extension>,
    versions: Vec<ExtensionVersion>,
    files: Vec<FileResource>,
    pub owners: usize,
    pub active_reviews: usize,
    downloads: AtomicI64,
}

impl FakeRepository {
    /// Register an extension together with its latest version
    pub fn add(&mut self, extension: Extension) {
        if let Some(latest) = &extension.latest {
            self.versions.push(latest.clone());
        }
        self.extensions.push(extension);
    }

    pub fn add_version(&mut self, version: ExtensionVersion) {
        self.versions.push(version);
    }

    pub fn add_file(&mut self, file: FileResource) {
        self.files.push(file);
    }

    pub fn extension(&self, id: i64) -> Option<Extension> {
        self.extensions.iter().find(|e| e.id == id).cloned()
    }

    pub fn downloads(&self) -> i64 {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl RepositoryService for FakeRepository {
    fn find_extension(&self, name: &str, namespace: &str) -> Result<Option<Extension>> {
        Ok(self
            .extensions
            .iter()
            .find(|e| e.name == name && e.namespace.name == namespace)
            .cloned())
    }

    fn find_extension_by_id(&self, id: i64) -> Result<Option<Extension>> {
        Ok(self.extension(id))
    }

    fn find_version(&self, version: &str, extension: &str, namespace: &str) -> Result<Option<ExtensionVersion>> {
        let Some(extension) = self.find_extension(extension, namespace)? else {
            return Ok(None);
        };
        Ok(self
            .versions
            .iter()
            .find(|v| v.extension_id == extension.id && v.version == version)
            .cloned())
    }

    fn find_versions(&self, extension: &Extension) -> Result<Vec<ExtensionVersion>> {
        let mut versions: Vec<_> = self
            .versions
            .iter()
            .filter(|v| v.extension_id == extension.id)
            .cloned()
            .collect();
        sort_newest_first(&mut versions);
        Ok(versions)
    }

    fn find_file(&self, version: &ExtensionVersion, file_type: FileType) -> Result<Option<FileResource>> {
        Ok(self
            .files
            .iter()
            .find(|f| f.extension_version_id == version.id && f.file_type == file_type)
            .cloned())
    }

    fn count_memberships(&self, _namespace: &Namespace, role: MembershipRole) -> Result<usize> {
        Ok(match role {
            MembershipRole::Owner => self.owners,
            MembershipRole::Contributor => 0,
        })
    }

    fn count_active_reviews(&self, _extension: &Extension) -> Result<usize> {
        Ok(self.active_reviews)
    }

    fn record_download(&self, _version: &ExtensionVersion) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Answers one expected query with fixed ids; anything else gets an empty page
pub(crate) struct FakeSearch {
    enabled: bool,
    expected: Option<SearchOptions>,
    ids: Vec<i64>,
}

impl FakeSearch {
    pub fn disabled() -> Self {
        Self { enabled: false, expected: None, ids: Vec::new() }
    }

    pub fn expecting(expected: SearchOptions, ids: Vec<i64>) -> Self {
        Self { enabled: true, expected: Some(expected), ids }
    }
}

impl SearchService for FakeSearch {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn search(&self, options: &SearchOptions) -> Result<SearchPage> {
        if self.expected.as_ref() != Some(options) {
            return Ok(SearchPage::empty());
        }
        Ok(SearchPage {
            hits: self
                .ids
                .iter()
                .map(|id| ExtensionSearch { id: *id, namespace: String::new(), name: String::new() })
                .collect(),
            total: self.ids.len(),
        })
    }
}

/// Search for "yaml" on the first page of 50, hitting extension 1
pub(crate) fn yaml_search() -> FakeSearch {
    FakeSearch::expecting(
        SearchOptions::new(Some("yaml".to_string()), PageRequest::of(0, 50)),
        vec![1],
    )
}

pub(crate) fn version(extension: &Extension, id: i64, version: &str) -> ExtensionVersion {
    let timestamp = NaiveDateTime::parse_from_str("2000-01-01T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    let mut ext_version = ExtensionVersion::new(id, extension.id, version, timestamp);
    ext_version.preview = true;
    ext_version.display_name = Some("YAML".to_string());
    ext_version.description = Some("YAML Language Support".to_string());
    ext_version.readme_file_name = Some("README.md".to_string());
    ext_version.license_file_name = Some("LICENSE.txt".to_string());
    ext_version.icon_file_name = Some("icon128.png".to_string());
    ext_version.extension_file_name = Some(format!("{}.{}-{}.vsix", extension.namespace.name, extension.name, version));
    ext_version.repository = Some("https://github.com/redhat-developer/vscode-yaml".to_string());
    ext_version.engines = vec!["vscode@^1.31.0".to_string()];
    ext_version.categories = vec!["Programming Languages".to_string()];
    ext_version
}

pub(crate) fn extension(id: i64, namespace: &str, name: &str, latest: &str) -> Extension {
    let extension = Extension::new(id, name, Namespace::new(2, namespace))
        .with_download_count(100)
        .with_average_rating(3.0);
    let latest = version(&extension, id * 100, latest);
    extension.with_latest(latest).unwrap()
}

/// redhat/vscode-yaml 0.5.2 with a manifest, no owners and ten active reviews
pub(crate) fn repository() -> FakeRepository {
    let extension = extension(1, "redhat", "vscode-yaml", "0.5.2");
    let latest_id = extension.latest.as_ref().unwrap().id;

    let mut repository = FakeRepository { owners: 0, active_reviews: 10, ..Default::default() };
    repository.add(extension);
    repository.add_file(FileResource::new(latest_id, FileType::Manifest, "package.json", br#"{"foo":"bar"}"#.to_vec()));
    repository
}
