use std::sync::Arc;
use crate::Result;
use crate::storage::SqliteStore;
use super::{SearchOptions, SearchPage, SearchService};

/// Search backed by the FTS5 index of the SQLite store.
///
/// A disabled index answers every query with an empty page.
pub struct IndexSearch {
    store: Arc<SqliteStore>,
    enabled: bool,
}

impl IndexSearch {
    pub fn new(store: Arc<SqliteStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }
}

impl SearchService for IndexSearch {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn search(&self, options: &SearchOptions) -> Result<SearchPage> {
        if !self.enabled {
            return Ok(SearchPage::empty());
        }
        tracing::debug!(
            "Index search {:?} (namespace: {:?}, page: {:?}, sort: {} {})",
            options.query_string,
            options.namespace,
            options.page,
            options.sort_by.as_str(),
            options.sort_order.as_str()
        );
        self.store.search_extensions(options)
    }
}
