//! Cache freshness policy for the user mapping
//!
//! Decides whether the cached mapping is still good enough or whether the
//! directory page has to be fetched and parsed again. Fetch failures are not
//! papered over with stale data: they surface to the caller.

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CacheError, CacheStore};
use crate::data::{
    FetchError, HasAttributes, KeyCellRule, MappingRecord, PageSource, TableRowParser,
};

/// How old a cached mapping may get before it is fetched again
pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// `DEFAULT_MAX_AGE_DAYS` as a duration
pub fn default_max_age() -> Duration {
    Duration::days(DEFAULT_MAX_AGE_DAYS)
}

/// Errors that can occur when producing the current mapping
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The directory page could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The cached mapping could not be read
    #[error(transparent)]
    Load(CacheError),

    /// A fresh mapping was fetched but could not be saved
    ///
    /// The fetched record is still valid and is handed back here.
    #[error("Fetched mapping could not be saved: {source}")]
    Persist {
        record: Box<MappingRecord>,
        #[source]
        source: CacheError,
    },
}

impl RefreshError {
    /// The freshly fetched record, if the failure happened after fetching
    pub fn into_record(self) -> Option<MappingRecord> {
        match self {
            RefreshError::Persist { record, .. } => Some(*record),
            _ => None,
        }
    }
}

/// Serves the mapping from cache and refreshes it when it gets too old
#[derive(Debug)]
pub struct RefreshPolicy<S, R = HasAttributes> {
    source: S,
    store: CacheStore,
    parser: TableRowParser<R>,
}

impl<S: PageSource> RefreshPolicy<S, HasAttributes> {
    /// Creates a policy using the default identifier-cell rule
    pub fn new(source: S, store: CacheStore) -> Self {
        Self::with_parser(source, store, TableRowParser::new())
    }
}

impl<S: PageSource, R: KeyCellRule> RefreshPolicy<S, R> {
    pub fn with_parser(source: S, store: CacheStore, parser: TableRowParser<R>) -> Self {
        Self {
            source,
            store,
            parser,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns the current mapping
    ///
    /// # Behavior
    /// - No cache file: fetch, parse, save and return the new mapping
    /// - Cached mapping older than `max_age`: same as above
    /// - Otherwise the cached mapping is returned as is
    pub fn get_current(&mut self, max_age: Duration) -> Result<MappingRecord, RefreshError> {
        if !self.store.exists() {
            info!(path = %self.store.path().display(), "No cached mapping, fetching");
            return self.refresh();
        }

        let cached = self.store.load().map_err(RefreshError::Load)?;
        let age = Utc::now() - cached.updated_at();
        if age > max_age {
            info!(
                age_days = age.num_days(),
                "Mapping has not been updated in {} days, updating now",
                max_age.num_days()
            );
            return self.refresh();
        }

        debug!(entries = cached.len(), "Using cached mapping");
        Ok(cached)
    }

    /// Fetches, parses and saves the mapping unconditionally
    pub fn refresh(&mut self) -> Result<MappingRecord, RefreshError> {
        let html = self.source.fetch_page()?;
        let record = self.parser.feed(&html);

        if let Err(source) = self.store.save(&record) {
            return Err(RefreshError::Persist {
                record: Box::new(record),
                source,
            });
        }

        info!(entries = record.len(), "Updated mapping");
        Ok(record)
    }
}
