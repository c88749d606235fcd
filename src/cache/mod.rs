//! Cache module for storing the user mapping on disk
//!
//! This module provides a cache store that persists a `MappingRecord` to a
//! single JSON file at a location chosen by the caller. The file carries a
//! schema version so newer writers stay readable by older readers.

mod store;

pub use store::{default_cache_path, CacheError, CacheStore, CACHE_VERSION};
