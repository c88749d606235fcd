//! Core data model for the user mapping
//!
//! This module contains the `MappingRecord` value object together with the
//! parser that builds it from the directory page and the source that fetches
//! that page.

pub mod parser;
pub mod source;

pub use parser::{HasAttributes, KeyCellRule, TableRowParser};
pub use source::{FetchError, HttpSource, PageSource, DEFAULT_URL};

use chrono::{DateTime, Local, Utc};
use std::collections::HashMap;
use std::fmt;

/// Format used for the "Updated on" line of the rendering
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A snapshot of the identifier-to-name directory
///
/// Entries keep the order in which they were first seen on the page so the
/// rendering is deterministic. A record is never edited after it has been
/// built; a refresh produces a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    entries: Vec<(String, String)>,
    /// Position of each id in `entries`
    index: HashMap<String, usize>,
    updated_at: DateTime<Utc>,
}

impl MappingRecord {
    /// Builds a record from `(id, name)` pairs
    ///
    /// A repeated id replaces the earlier name but keeps its position.
    pub fn new<I>(pairs: I, updated_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (id, name) in pairs {
            match index.get(&id) {
                Some(&pos) => entries[pos].1 = name,
                None => {
                    index.insert(id.clone(), entries.len());
                    entries.push((id, name));
                }
            }
        }
        Self {
            entries,
            index,
            updated_at,
        }
    }

    /// Iterates over `(id, name)` pairs in page order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Looks up the display name for an identifier
    pub fn name_for(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    /// When the mapping was fetched
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for MappingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(0);

        for (id, name) in &self.entries {
            writeln!(f, "{:<width$} {}", id, name, width = width)?;
        }

        let local = self.updated_at.with_timezone(&Local);
        writeln!(f)?;
        writeln!(f, "Updated on {}", local.format(DATE_FORMAT))
    }
}
