//! usermap Library
//!
//! Fetches the HPC user directory page, turns its table into an
//! identifier-to-name mapping and keeps a local copy that is refreshed
//! once it gets too old.

pub mod cache;
pub mod cli;
pub mod data;
pub mod refresh;

pub use cache::{CacheError, CacheStore};
pub use data::{FetchError, HttpSource, MappingRecord, PageSource, TableRowParser};
pub use refresh::{default_max_age, RefreshError, RefreshPolicy};
