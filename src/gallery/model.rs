//! Wire types of the gallery query endpoint (camelCase JSON)

use serde::{Deserialize, Serialize};

/// Body of `POST /vscode/gallery/extensionquery`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParam {
    pub filters: Vec<QueryFilter>,
    pub asset_types: Vec<String>,
    pub flags: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryFilter {
    pub criteria: Vec<Criterion>,
    /// One-based
    pub page_number: u32,
    pub page_size: u32,
    pub sort_by: u32,
    pub sort_order: u32,
}

impl QueryFilter {
    /// First non-blank value of a criterion type
    pub fn find_criterion(&self, filter_type: u32) -> Option<&str> {
        self.find_criteria(filter_type).next()
    }

    /// All non-blank values of a criterion type, in request order
    pub fn find_criteria(&self, filter_type: u32) -> impl Iterator<Item = &str> {
        self.criteria
            .iter()
            .filter(move |c| c.filter_type == filter_type)
            .map(|c| c.value.trim())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub filter_type: u32,
    #[serde(default)]
    pub value: String,
}

/// Response of the query endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionQueryResult {
    pub results: Vec<ResultItem>,
}

impl ExtensionQueryResult {
    /// Single result entry carrying the `TotalCount` metadata
    pub fn new(extensions: Vec<GalleryExtension>, total: usize) -> Self {
        Self {
            results: vec![ResultItem {
                extensions,
                paging_token: None,
                result_metadata: vec![ResultMetadata {
                    metadata_type: "ResultCount".to_string(),
                    metadata_items: vec![ResultMetadataItem {
                        name: "TotalCount".to_string(),
                        count: total,
                    }],
                }],
            }],
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub extensions: Vec<GalleryExtension>,
    pub paging_token: Option<String>,
    pub result_metadata: Vec<ResultMetadata>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub metadata_type: String,
    pub metadata_items: Vec<ResultMetadataItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadataItem {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryExtension {
    pub extension_id: String,
    pub extension_name: String,
    pub display_name: String,
    pub short_description: String,
    pub publisher: GalleryPublisher,
    pub versions: Vec<GalleryVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Vec<Statistic>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub flags: String,
    pub release_date: String,
    pub published_date: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPublisher {
    pub publisher_id: String,
    pub publisher_name: String,
    pub display_name: String,
    pub flags: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryVersion {
    pub version: String,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_asset_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<GalleryFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<GalleryProperty>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryFile {
    pub asset_type: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryProperty {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
    pub statistic_name: String,
    pub value: f64,
}

impl Statistic {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            statistic_name: name.to_string(),
            value,
        }
    }
}
