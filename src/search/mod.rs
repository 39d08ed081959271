//! Search seam - full-text lookup returning lightweight hits
//!
//! The gallery adapter only sees `SearchService`; `IndexSearch` answers it
//! from the FTS5 index kept in the SQLite store.

pub mod index;

pub use index::IndexSearch;

use crate::Result;
use crate::entity::ExtensionSearch;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Full-text search over published extensions.
pub trait SearchService: Send + Sync {
    /// Whether searching is available at all
    fn is_enabled(&self) -> bool;

    /// Run a query and return one page of hits in ranking order
    fn search(&self, options: &SearchOptions) -> Result<SearchPage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(crate::Error::InvalidQuery(format!("Unknown sort order: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevance,
    DownloadCount,
    Timestamp,
    AverageRating,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::DownloadCount => "downloadCount",
            SortBy::Timestamp => "timestamp",
            SortBy::AverageRating => "averageRating",
        }
    }
}

impl FromStr for SortBy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "downloadcount" | "downloads" => Ok(SortBy::DownloadCount),
            "timestamp" | "date" => Ok(SortBy::Timestamp),
            "averagerating" | "rating" => Ok(SortBy::AverageRating),
            _ => Err(crate::Error::InvalidQuery(format!("Unknown sort key: {}", s))),
        }
    }
}

/// Zero-based page index and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub number: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn of(number: usize, size: usize) -> Self {
        Self { number, size }
    }

    pub fn offset(&self) -> usize {
        self.number * self.size
    }
}

/// Parameters of one search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Free text; `None` lists everything
    pub query_string: Option<String>,
    /// Restrict hits to one namespace
    pub namespace: Option<String>,
    pub category: Option<String>,
    pub page: PageRequest,
    pub sort_order: SortOrder,
    pub sort_by: SortBy,
}

impl SearchOptions {
    pub fn new(query_string: Option<String>, page: PageRequest) -> Self {
        Self {
            query_string,
            namespace: None,
            category: None,
            page,
            sort_order: SortOrder::Desc,
            sort_by: SortBy::Relevance,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sort(mut self, sort_order: SortOrder, sort_by: SortBy) -> Self {
        self.sort_order = sort_order;
        self.sort_by = sort_by;
        self
    }
}

/// One page of hits plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub hits: Vec<ExtensionSearch>,
    pub total: usize,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }
}
