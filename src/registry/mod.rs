//! Registry access
//!
//! This module handles:
//! - Fetching registry indexes from configured sources
//! - Resolving component identifiers to manifests
//! - Searching across sources

pub mod fetch;
pub mod index;
pub mod manifest;

use eyre::Result;

use crate::project::RegistrySource;
use crate::version::ComponentRef;
use fetch::{Fetcher, Location};
use index::{IndexEntry, RegistryIndex};
use manifest::ComponentManifest;

/// A component resolved to a concrete manifest
#[derive(Debug, Clone)]
pub struct ResolvedComponent {
    pub manifest: ComponentManifest,
    /// Where the manifest was fetched from; file sources resolve against it
    pub manifest_location: Location,
    /// Source name, or None for direct manifest locations
    pub source: Option<String>,
}

/// An index loaded from one source
#[derive(Debug, Clone)]
pub struct LoadedIndex {
    pub source: RegistrySource,
    pub location: Location,
    pub index: RegistryIndex,
}

/// Resolves components against an ordered list of registry sources
pub struct RegistryClient {
    sources: Vec<RegistrySource>,
    fetcher: Fetcher,
}

impl RegistryClient {
    pub fn new(sources: Vec<RegistrySource>, fetcher: Fetcher) -> Self {
        Self { sources, fetcher }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Restrict lookups to a single named source
    pub fn only_source(mut self, name: &str) -> Result<Self> {
        let source = self
            .sources
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| eyre::eyre!("Registry source '{}' is not configured or is disabled", name))?;
        self.sources = vec![source];
        Ok(self)
    }

    /// Fetch one source's index
    pub fn load_index(&self, source: &RegistrySource) -> Result<LoadedIndex> {
        let location = Location::parse(&source.url);
        log::info!("Fetching registry index '{}' from {}", source.name, location);
        let index: RegistryIndex = self.fetcher.read_json(&location)?;
        log::debug!("Index '{}' lists {} component(s)", source.name, index.components.len());
        Ok(LoadedIndex {
            source: source.clone(),
            location,
            index,
        })
    }

    /// Fetch every reachable index; unreachable sources are logged and skipped
    pub fn load_all(&self) -> Result<Vec<LoadedIndex>> {
        let mut loaded = Vec::new();
        let mut last_error = None;

        for source in &self.sources {
            match self.load_index(source) {
                Ok(index) => loaded.push(index),
                Err(e) => {
                    log::warn!("Skipping registry source '{}': {:#}", source.name, e);
                    last_error = Some(e.wrap_err(format!("Registry source '{}' failed", source.name)));
                }
            }
        }

        match (loaded.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(loaded),
        }
    }

    /// Resolve an identifier to its manifest
    pub fn resolve(&self, component: &ComponentRef) -> Result<ResolvedComponent> {
        match component {
            ComponentRef::Manifest(location) => {
                let location = Location::parse(location);
                let manifest = self.load_manifest(&location)?;
                Ok(ResolvedComponent {
                    manifest,
                    manifest_location: location,
                    source: None,
                })
            }
            ComponentRef::Named { name, version } => {
                let mut last_error = None;
                let mut available_versions: Vec<String> = Vec::new();

                for source in &self.sources {
                    let loaded = match self.load_index(source) {
                        Ok(loaded) => loaded,
                        Err(e) => {
                            log::warn!("Skipping registry source '{}': {:#}", source.name, e);
                            last_error = Some(e.wrap_err(format!("Registry source '{}' failed", source.name)));
                            continue;
                        }
                    };

                    if let Some(entry) = loaded.index.find(name, version) {
                        log::info!("Found {}@{} in source '{}'", entry.name, entry.version, source.name);
                        return self.resolve_entry(&loaded, entry);
                    }

                    available_versions.extend(loaded.index.versions(name).into_iter().map(str::to_string));
                }

                if !available_versions.is_empty() {
                    eyre::bail!(
                        "Component '{}' has no version {} (available: {})",
                        name,
                        version,
                        available_versions.join(", ")
                    );
                }

                let searched: Vec<&str> = self.sources.iter().map(|s| s.name.as_str()).collect();
                let not_found = eyre::eyre!(
                    "Component '{}' not found in registry sources: {}",
                    name,
                    searched.join(", ")
                );
                match last_error {
                    Some(e) if searched.len() == 1 => Err(e),
                    Some(e) => Err(not_found.wrap_err(format!("{:#}", e))),
                    None => Err(not_found),
                }
            }
        }
    }

    /// Load the manifest an index entry points at
    pub fn resolve_entry(&self, loaded: &LoadedIndex, entry: &IndexEntry) -> Result<ResolvedComponent> {
        let location = loaded.location.join(&entry.manifest_path);
        let manifest = self.load_manifest(&location)?;

        if manifest.name != entry.name {
            log::warn!(
                "Index entry '{}' points at manifest named '{}'",
                entry.name,
                manifest.name
            );
        }

        Ok(ResolvedComponent {
            manifest,
            manifest_location: location,
            source: Some(loaded.source.name.clone()),
        })
    }

    fn load_manifest(&self, location: &Location) -> Result<ComponentManifest> {
        log::info!("Fetching manifest {}", location);
        let content = self.fetcher.read_text(location)?;
        ComponentManifest::from_str(&content).map_err(|e| e.wrap_err(format!("Invalid manifest at {}", location)))
    }
}
