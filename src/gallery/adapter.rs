//! Gallery adapter
//!
//! Composes the search and repository seams into gallery responses:
//! - queries by id, by `namespace.name`, or by free text through the search index
//! - hydration of hits into full extension entries, honoring the query flags
//! - asset lookup by namespace / extension / version / asset type

use std::sync::Arc;
use chrono::NaiveDateTime;
use crate::Result;
use crate::entity::{Extension, ExtensionVersion, FileResource, FileType, MembershipRole};
use crate::repository::RepositoryService;
use crate::search::{PageRequest, SearchOptions, SearchService, SortBy, SortOrder};
use super::model::{
    ExtensionQueryResult, GalleryExtension, GalleryFile, GalleryProperty, GalleryPublisher, GalleryVersion,
    QueryFilter, QueryParam, Statistic,
};
use super::{asset_type_name, file_type_for_asset, filter_type, flags, property};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

/// Answers gallery queries and asset requests.
#[derive(Clone)]
pub struct VsCodeAdapter {
    repositories: Arc<dyn RepositoryService>,
    search: Arc<dyn SearchService>,
    base_url: String,
    default_page_size: usize,
    max_page_size: usize,
}

impl VsCodeAdapter {
    /// `base_url` prefixes every asset link in query responses
    pub fn new(repositories: Arc<dyn RepositoryService>, search: Arc<dyn SearchService>, base_url: impl Into<String>) -> Self {
        Self {
            repositories,
            search,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_sizes(mut self, default_page_size: usize, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self.default_page_size = default_page_size.clamp(1, self.max_page_size);
        self
    }

    // ========== Query ==========

    /// Resolve a gallery query.
    ///
    /// Id and name criteria take precedence over free-text search. Hits that
    /// cannot be hydrated are dropped; the order of the remaining hits is kept.
    pub fn query(&self, param: &QueryParam) -> Result<ExtensionQueryResult> {
        let default_filter = QueryFilter::default();
        let filter = param.filters.first().unwrap_or(&default_filter);

        let (extensions, total) = if filter.find_criterion(filter_type::EXTENSION_ID).is_some() {
            let found = self.find_by_ids(filter)?;
            let total = found.len();
            (found, total)
        } else if filter.find_criterion(filter_type::EXTENSION_NAME).is_some() {
            let found = self.find_by_names(filter)?;
            let total = found.len();
            (found, total)
        } else if self.search.is_enabled() {
            self.find_by_search(filter)?
        } else {
            tracing::debug!("Search is disabled, answering with an empty result");
            return Ok(ExtensionQueryResult::empty());
        };

        let mut results = Vec::with_capacity(extensions.len());
        for extension in &extensions {
            if let Some(entry) = self.to_query_extension(extension, param.flags)? {
                results.push(entry);
            }
        }
        Ok(ExtensionQueryResult::new(results, total))
    }

    fn find_by_ids(&self, filter: &QueryFilter) -> Result<Vec<Extension>> {
        let mut found = Vec::new();
        for value in filter.find_criteria(filter_type::EXTENSION_ID) {
            let Ok(id) = value.parse::<i64>() else {
                tracing::debug!("Ignoring foreign extension id {}", value);
                continue;
            };
            if let Some(extension) = self.repositories.find_extension_by_id(id)? {
                found.push(extension);
            }
        }
        Ok(found)
    }

    fn find_by_names(&self, filter: &QueryFilter) -> Result<Vec<Extension>> {
        let mut found = Vec::new();
        for value in filter.find_criteria(filter_type::EXTENSION_NAME) {
            let Some((namespace, name)) = value.split_once('.') else {
                tracing::debug!("Ignoring malformed extension name {}", value);
                continue;
            };
            if let Some(extension) = self.repositories.find_extension(name, namespace)? {
                found.push(extension);
            }
        }
        Ok(found)
    }

    fn find_by_search(&self, filter: &QueryFilter) -> Result<(Vec<Extension>, usize)> {
        let page_size = match filter.page_size as usize {
            0 => self.default_page_size,
            size => size.min(self.max_page_size),
        };
        let page_number = (filter.page_number as usize).saturating_sub(1);

        let mut options = SearchOptions::new(
            filter.find_criterion(filter_type::SEARCH_TEXT).map(str::to_string),
            PageRequest::of(page_number, page_size),
        )
        .with_sort(sort_order(filter.sort_order), sort_by(filter.sort_by));
        if let Some(category) = filter.find_criterion(filter_type::CATEGORY) {
            options = options.with_category(category);
        }

        let page = self.search.search(&options)?;
        tracing::debug!("Search {:?} matched {} extensions", options.query_string, page.total);

        let mut extensions = Vec::with_capacity(page.hits.len());
        for hit in &page.hits {
            match self.repositories.find_extension_by_id(hit.id)? {
                Some(extension) => extensions.push(extension),
                None => tracing::warn!(
                    "Search hit {}.{} (id {}) has no extension, omitting it",
                    hit.namespace,
                    hit.name,
                    hit.id
                ),
            }
        }
        Ok((extensions, page.total))
    }

    fn to_query_extension(&self, extension: &Extension, query_flags: u32) -> Result<Option<GalleryExtension>> {
        let Some(latest) = &extension.latest else {
            tracing::warn!("Extension {} has no published version, omitting it", extension.qualified_name());
            return Ok(None);
        };

        let mut all_versions = self.repositories.find_versions(extension)?;
        if all_versions.is_empty() {
            all_versions.push(latest.clone());
        }
        let release_date = all_versions
            .iter()
            .map(|v| v.timestamp)
            .min()
            .unwrap_or(latest.timestamp);

        let versions = if flags::test(query_flags, flags::INCLUDE_LATEST_VERSION_ONLY)
            || !flags::test(query_flags, flags::INCLUDE_VERSIONS)
        {
            vec![self.to_gallery_version(extension, latest, query_flags)]
        } else {
            all_versions
                .iter()
                .map(|v| self.to_gallery_version(extension, v, query_flags))
                .collect()
        };

        let statistics = if flags::test(query_flags, flags::INCLUDE_STATISTICS) {
            let mut statistics = vec![Statistic::new("install", extension.download_count as f64)];
            if let Some(rating) = extension.average_rating {
                statistics.push(Statistic::new("averagerating", rating));
            }
            let reviews = self.repositories.count_active_reviews(extension)?;
            statistics.push(Statistic::new("ratingcount", reviews as f64));
            Some(statistics)
        } else {
            None
        };

        let (categories, tags) = if flags::test(query_flags, flags::INCLUDE_CATEGORY_AND_TAGS) {
            (Some(latest.categories.clone()), Some(latest.tags.clone()))
        } else {
            (None, None)
        };

        let namespace = &extension.namespace;
        let owners = self.repositories.count_memberships(namespace, MembershipRole::Owner)?;
        let publisher = GalleryPublisher {
            publisher_id: namespace.id.to_string(),
            publisher_name: namespace.name.clone(),
            display_name: namespace.name.clone(),
            flags: if owners > 0 { "verified" } else { "none" }.to_string(),
        };

        Ok(Some(GalleryExtension {
            extension_id: extension.id.to_string(),
            extension_name: extension.name.clone(),
            display_name: latest.display_name.clone().unwrap_or_else(|| extension.name.clone()),
            short_description: latest.description.clone().unwrap_or_default(),
            publisher,
            versions,
            statistics,
            categories,
            tags,
            flags: if latest.preview { "preview" } else { "" }.to_string(),
            release_date: to_utc_string(&release_date),
            published_date: to_utc_string(&release_date),
            last_updated: to_utc_string(&latest.timestamp),
        }))
    }

    fn to_gallery_version(&self, extension: &Extension, version: &ExtensionVersion, query_flags: u32) -> GalleryVersion {
        let asset_uri = format!(
            "{}/vscode/asset/{}/{}/{}",
            self.base_url, extension.namespace.name, extension.name, version.version
        );

        let files = flags::test(query_flags, flags::INCLUDE_FILES).then(|| {
            FileType::all()
                .iter()
                .filter(|file_type| version.file_name(**file_type).is_some())
                .map(|file_type| {
                    let asset_type = asset_type_name(*file_type);
                    GalleryFile {
                        asset_type: asset_type.to_string(),
                        source: format!("{}/{}", asset_uri, asset_type),
                    }
                })
                .collect()
        });

        let properties = flags::test(query_flags, flags::INCLUDE_VERSION_PROPERTIES).then(|| {
            let mut properties = Vec::new();
            if let Some(engine) = version.vscode_engine() {
                properties.push(GalleryProperty { key: property::ENGINE.to_string(), value: engine.to_string() });
            }
            properties.push(GalleryProperty {
                key: property::DEPENDENCY.to_string(),
                value: version.dependencies.join(","),
            });
            properties.push(GalleryProperty {
                key: property::EXTENSION_PACK.to_string(),
                value: version.bundled_extensions.join(","),
            });
            if let Some(repository) = &version.repository {
                properties.push(GalleryProperty { key: property::SOURCE_LINK.to_string(), value: repository.clone() });
            }
            properties
        });

        let with_uri = flags::test(query_flags, flags::INCLUDE_ASSET_URI);
        GalleryVersion {
            version: version.version.clone(),
            last_updated: to_utc_string(&version.timestamp),
            asset_uri: with_uri.then(|| asset_uri.clone()),
            fallback_asset_uri: with_uri.then(|| asset_uri.clone()),
            files,
            properties,
        }
    }

    // ========== Assets ==========

    /// Look up a stored asset.
    ///
    /// `None` when the asset type is unknown or the extension, version or
    /// file does not exist. `latest` resolves to the latest version.
    pub fn asset(&self, namespace: &str, extension: &str, version: &str, asset_type: &str) -> Result<Option<FileResource>> {
        let Ok(file_type) = file_type_for_asset(asset_type) else {
            tracing::debug!("Unknown asset type {}", asset_type);
            return Ok(None);
        };
        self.file(namespace, extension, version, file_type)
    }

    /// Look up the stored file of a version by type.
    ///
    /// Serving a package counts as one download of the extension.
    pub fn file(&self, namespace: &str, extension: &str, version: &str, file_type: FileType) -> Result<Option<FileResource>> {
        let ext_version = if version == "latest" {
            self.repositories
                .find_extension(extension, namespace)?
                .and_then(|ext| ext.latest)
        } else {
            self.repositories.find_version(version, extension, namespace)?
        };

        let Some(ext_version) = ext_version else {
            tracing::debug!("No version {} of {}.{}", version, namespace, extension);
            return Ok(None);
        };
        let file = self.repositories.find_file(&ext_version, file_type)?;
        if file.is_some() && file_type == FileType::Download {
            if let Err(e) = self.repositories.record_download(&ext_version) {
                tracing::warn!("Failed to count download of {}.{}: {}", namespace, extension, e);
            }
        }
        Ok(file)
    }
}

fn sort_order(value: u32) -> SortOrder {
    match value {
        1 => SortOrder::Asc,
        _ => SortOrder::Desc,
    }
}

fn sort_by(value: u32) -> SortBy {
    match value {
        4 => SortBy::DownloadCount,
        5 => SortBy::Timestamp,
        6 => SortBy::AverageRating,
        _ => SortBy::Relevance,
    }
}

/// Timestamps are stored in UTC
fn to_utc_string(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::fakes::{self, FakeRepository, FakeSearch};
    use crate::gallery::QueryParam;

    fn adapter(repository: FakeRepository, search: FakeSearch) -> VsCodeAdapter {
        VsCodeAdapter::new(Arc::new(repository), Arc::new(search), "http://localhost/")
    }

    fn query(body: &str) -> QueryParam {
        serde_json::from_str(body).unwrap()
    }

    fn golden(name: &str) -> serde_json::Value {
        serde_json::from_str(fakes::testdata(name)).unwrap()
    }

    #[test]
    fn test_search_matches_golden_response() {
        let adapter = adapter(fakes::repository(), fakes::yaml_search());
        let result = adapter.query(&query(fakes::testdata("search-yaml-query.json"))).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), golden("search-yaml-response.json"));
    }

    #[test]
    fn test_find_by_id_matches_golden_response() {
        let adapter = adapter(fakes::repository(), FakeSearch::disabled());
        let result = adapter.query(&query(fakes::testdata("findid-yaml-query.json"))).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), golden("findid-yaml-response.json"));
    }

    #[test]
    fn test_find_by_name_matches_golden_response() {
        let adapter = adapter(fakes::repository(), FakeSearch::disabled());
        let result = adapter.query(&query(fakes::testdata("findname-yaml-query.json"))).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), golden("findname-yaml-response.json"));
    }

    #[test]
    fn test_disabled_search_answers_empty() {
        let adapter = adapter(fakes::repository(), FakeSearch::disabled());
        let result = adapter.query(&query(fakes::testdata("search-yaml-query.json"))).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), serde_json::to_value(ExtensionQueryResult::empty()).unwrap());
    }

    #[test]
    fn test_search_arguments_follow_query() {
        let expected = SearchOptions::new(Some("yaml".to_string()), PageRequest::of(2, 10))
            .with_sort(SortOrder::Asc, SortBy::DownloadCount);
        let adapter = adapter(fakes::repository(), FakeSearch::expecting(expected, vec![1]));

        let result = adapter
            .query(&query(
                r#"{"filters":[{"criteria":[{"filterType":10,"value":"yaml"}],"pageNumber":3,"pageSize":10,"sortBy":4,"sortOrder":1}],"flags":0}"#,
            ))
            .unwrap();
        assert_eq!(result.results[0].extensions.len(), 1);
    }

    #[test]
    fn test_unresolved_hits_are_omitted_in_order() {
        let mut repository = fakes::repository();
        let second = fakes::extension(3, "redhat", "java", "1.0.0");
        repository.add(second);
        let expected = SearchOptions::new(Some("yaml".to_string()), PageRequest::of(0, 50));
        let adapter = adapter(repository, FakeSearch::expecting(expected, vec![3, 42, 1]));

        let result = adapter.query(&query(fakes::testdata("search-yaml-query.json"))).unwrap();
        let names: Vec<_> = result.results[0].extensions.iter().map(|e| e.extension_name.as_str()).collect();
        assert_eq!(names, vec!["java", "vscode-yaml"]);
        // total comes from the index
        assert_eq!(result.results[0].result_metadata[0].metadata_items[0].count, 3);
    }

    #[test]
    fn test_all_versions_when_requested() {
        let mut repository = fakes::repository();
        let extension = repository.extension(1).unwrap();
        let mut older = fakes::version(&extension, 5, "0.4.0");
        older.timestamp = NaiveDateTime::parse_from_str("1999-06-01T08:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        repository.add_version(older);
        let adapter = adapter(repository, FakeSearch::disabled());

        let result = adapter
            .query(&query(r#"{"filters":[{"criteria":[{"filterType":4,"value":"1"}]}],"flags":5}"#))
            .unwrap();
        let entry = &result.results[0].extensions[0];
        let versions: Vec<_> = entry.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, vec!["0.5.2", "0.4.0"]);
        assert_eq!(entry.release_date, "1999-06-01T08:00:00Z");
        assert_eq!(entry.last_updated, "2000-01-01T10:00:00Z");
        assert_eq!(entry.categories.as_deref(), Some(&["Programming Languages".to_string()][..]));
        assert!(entry.statistics.is_none());
        assert!(entry.versions[0].files.is_none());
    }

    #[test]
    fn test_versions_follow_semver_not_publish_time() {
        let mut repository = FakeRepository::default();
        let extension = fakes::extension(1, "redhat", "vscode-yaml", "1.0.0");
        let mut backport = fakes::version(&extension, 7, "0.9.1");
        backport.timestamp = NaiveDateTime::parse_from_str("2001-02-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        repository.add(extension);
        repository.add_version(backport);
        let adapter = adapter(repository, FakeSearch::disabled());

        let result = adapter
            .query(&query(r#"{"filters":[{"criteria":[{"filterType":7,"value":"redhat.vscode-yaml"}]}],"flags":1}"#))
            .unwrap();
        let versions: Vec<_> = result.results[0].extensions[0].versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0.0", "0.9.1"]);
    }

    #[test]
    fn test_package_download_is_counted() {
        let mut repository = fakes::repository();
        let latest_id = repository.extension(1).unwrap().latest.unwrap().id;
        repository.add_file(FileResource::new(latest_id, FileType::Download, "yaml.vsix", b"PK".to_vec()));
        let repository = Arc::new(repository);
        let adapter = VsCodeAdapter::new(repository.clone(), Arc::new(FakeSearch::disabled()), "http://localhost");

        adapter.asset("redhat", "vscode-yaml", "0.5.2", "Manifest").unwrap().unwrap();
        assert_eq!(repository.downloads(), 0);
        adapter
            .asset("redhat", "vscode-yaml", "0.5.2", "Microsoft.VisualStudio.Services.VSIXPackage")
            .unwrap()
            .unwrap();
        adapter.file("redhat", "vscode-yaml", "latest", FileType::Download).unwrap().unwrap();
        assert_eq!(repository.downloads(), 2);
        assert!(adapter.file("redhat", "vscode-yaml", "9.9.9", FileType::Download).unwrap().is_none());
        assert_eq!(repository.downloads(), 2);
    }

    #[test]
    fn test_owned_namespace_is_verified() {
        let mut repository = fakes::repository();
        repository.owners = 2;
        let adapter = adapter(repository, FakeSearch::disabled());

        let result = adapter
            .query(&query(r#"{"filters":[{"criteria":[{"filterType":7,"value":"redhat.vscode-yaml"}]}]}"#))
            .unwrap();
        assert_eq!(result.results[0].extensions[0].publisher.flags, "verified");
    }

    #[test]
    fn test_asset_lookup() {
        let adapter = adapter(fakes::repository(), FakeSearch::disabled());

        let manifest = adapter
            .asset("redhat", "vscode-yaml", "0.5.2", "Microsoft.VisualStudio.Code.Manifest")
            .unwrap()
            .unwrap();
        assert_eq!(manifest.content, br#"{"foo":"bar"}"#);

        let latest = adapter.asset("redhat", "vscode-yaml", "latest", "Manifest").unwrap();
        assert!(latest.is_some());

        assert!(adapter
            .asset("redhat", "vscode-yaml", "0.5.2", "Microsoft.VisualStudio.Services.Content.Details")
            .unwrap()
            .is_none());
        assert!(adapter.asset("redhat", "vscode-yaml", "0.5.2", "Bogus").unwrap().is_none());
        assert!(adapter.asset("redhat", "vscode-yaml", "1.0.0", "Manifest").unwrap().is_none());
        assert!(adapter.asset("microsoft", "vscode-yaml", "0.5.2", "Manifest").unwrap().is_none());
    }
}
