//! Registry index (index.json)
//!
//! The index lists every published component version and where its manifest lives.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::manifest::ComponentType;
use crate::version::{Version, VersionReq};

/// One published component version
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexEntry {
    pub name: String,
    pub version: String,
    pub r#type: ComponentType,

    #[serde(default)]
    pub description: String,

    /// Manifest location relative to the index
    pub manifest_path: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl IndexEntry {
    /// Parsed version; unparseable versions sort lowest
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }

    fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self.description.to_lowercase().contains(query)
            || self.r#type.as_str().contains(query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(query))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryIndex {
    #[serde(default = "default_registry_version")]
    pub registry_version: String,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub components: Vec<IndexEntry>,
}

fn default_registry_version() -> String {
    "1.0.0".to_string()
}

impl RegistryIndex {
    /// Find a component by name, either an exact version or the highest one
    pub fn find(&self, name: &str, version: &VersionReq) -> Option<&IndexEntry> {
        let mut candidates = self.components.iter().filter(|c| c.name == name);
        match version {
            VersionReq::Exact(wanted) => candidates.find(|c| c.parsed_version().as_ref() == Some(wanted)),
            VersionReq::Latest => candidates.max_by(|a, b| a.parsed_version().cmp(&b.parsed_version())),
        }
    }

    /// All published versions of a component, newest first
    pub fn versions(&self, name: &str) -> Vec<&str> {
        let mut entries: Vec<&IndexEntry> = self.components.iter().filter(|c| c.name == name).collect();
        entries.sort_by(|a, b| b.parsed_version().cmp(&a.parsed_version()));
        entries.into_iter().map(|c| c.version.as_str()).collect()
    }

    /// Newest entry per component name, sorted by type then name
    pub fn latest_entries(&self) -> Vec<&IndexEntry> {
        let mut latest: HashMap<&str, &IndexEntry> = HashMap::new();
        for entry in &self.components {
            latest
                .entry(entry.name.as_str())
                .and_modify(|current| {
                    if entry.parsed_version() > current.parsed_version() {
                        *current = entry;
                    }
                })
                .or_insert(entry);
        }

        let mut entries: Vec<&IndexEntry> = latest.into_values().collect();
        entries.sort_by(|a, b| a.r#type.cmp(&b.r#type).then_with(|| a.name.cmp(&b.name)));
        entries
    }

    /// Search the newest entries by name, description, type and tags
    pub fn search(&self, query: &str, component_type: Option<ComponentType>) -> Vec<&IndexEntry> {
        let query_lower = query.trim().to_lowercase();
        self.latest_entries()
            .into_iter()
            .filter(|e| component_type.is_none_or(|t| e.r#type == t))
            .filter(|e| query_lower.is_empty() || e.matches(&query_lower))
            .collect()
    }
}
