//! # Source Registry
//!
//! Named upstream sources, each with a fetch URL and an optional dotted path
//! that locates the array of interest inside the source's JSON body.
//!
//! The registry is built once from configuration and shared read-only
//! (behind an `Arc`) by every request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configured upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub array_path: Option<String>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>, array_path: Option<&str>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            array_path: array_path.map(str::to_string),
        }
    }

    /// Sources with a blank URL are skipped by the fan-out.
    pub fn is_fetchable(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Shape of a source entry in the config file (name comes from the table key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceEntry {
    #[serde(default, alias = "Url")]
    pub url: Option<String>,
    #[serde(default, alias = "ArrayPath", alias = "arrayPath")]
    pub array_path: Option<String>,
}

/// Immutable, name-unique set of sources.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
}

impl SourceRegistry {
    /// Build from `name -> entry` pairs. Names are trimmed and blank names dropped;
    /// a later duplicate (after trimming) replaces the earlier one.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, SourceEntry)>,
    {
        let mut by_name: BTreeMap<String, SourceConfig> = BTreeMap::new();
        for (name, entry) in entries {
            let name = name.trim().to_string();
            if name.is_empty() {
                continue;
            }
            let array_path = entry
                .array_path
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty());
            by_name.insert(
                name.clone(),
                SourceConfig {
                    name,
                    url: entry.url.unwrap_or_default().trim().to_string(),
                    array_path,
                },
            );
        }
        Self {
            sources: by_name.into_values().collect(),
        }
    }

    /// Build directly from configs (tests, embedding). Same uniqueness rules apply.
    pub fn from_sources<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = SourceConfig>,
    {
        Self::from_entries(sources.into_iter().map(|s| {
            (
                s.name,
                SourceEntry {
                    url: Some(s.url),
                    array_path: s.array_path,
                },
            )
        }))
    }

    pub fn get(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter()
    }

    /// Sources that will actually be fetched.
    pub fn fetchable(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.is_fetchable())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
