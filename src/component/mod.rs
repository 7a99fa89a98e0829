//! Component installation, registry building and documentation
//!
//! Everything here works on `component.json` manifests found on disk or
//! fetched through a registry.

pub mod builder;
pub mod docs;
pub mod installer;

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::registry::manifest::ComponentManifest;

pub const MANIFEST_FILE: &str = "component.json";

/// A manifest found on disk
#[derive(Debug, Clone)]
pub struct LocalComponent {
    pub manifest: ComponentManifest,
    /// Path to component.json
    pub path: PathBuf,
}

impl LocalComponent {
    /// Directory holding the component's files
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Find every component.json under `root`
pub fn find_manifests(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();

    if !root.exists() {
        return found;
    }

    let walker = WalkDir::new(root).into_iter().filter_entry(should_enter);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::debug!("Error walking directory: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
            found.push(entry.into_path());
        }
    }

    found.sort();
    found
}

/// Load every valid manifest under `root`; invalid ones are logged and skipped
pub fn discover(root: &Path) -> Vec<LocalComponent> {
    find_manifests(root)
        .into_iter()
        .filter_map(|path| match ComponentManifest::load(&path) {
            Ok(manifest) => Some(LocalComponent { manifest, path }),
            Err(e) => {
                log::warn!("Failed to load component manifest {}: {:#}", path.display(), e);
                None
            }
        })
        .collect()
}

/// Check if we should enter a directory during scanning
fn should_enter(entry: &DirEntry) -> bool {
    // Always process the root (depth 0)
    if entry.depth() == 0 {
        return true;
    }

    let name = entry.file_name().to_string_lossy();

    if entry.file_type().is_dir() && name.starts_with('.') {
        return false;
    }

    !matches!(name.as_ref(), "node_modules" | "__pycache__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            format!(
                r#"{{"name": "{}", "version": "0.1.0", "type": "tool", "files_to_copy": [{{"source": "tool.py"}}]}}"#,
                name
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_find_manifests_skips_ignored_dirs() {
        let temp = TempDir::new().unwrap();
        write_manifest(&temp.path().join("tools/a"), "a");
        write_manifest(&temp.path().join("tools/b"), "b");
        write_manifest(&temp.path().join(".venv/lib/c"), "c");
        write_manifest(&temp.path().join("node_modules/d"), "d");
        write_manifest(&temp.path().join("tools/__pycache__"), "e");

        let found = find_manifests(temp.path());
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("tools/a/component.json"));
        assert!(found[1].ends_with("tools/b/component.json"));
    }

    #[test]
    fn test_find_manifests_keeps_build_named_dirs() {
        let temp = TempDir::new().unwrap();
        write_manifest(&temp.path().join("components/dist"), "dist");
        write_manifest(&temp.path().join("target/tool"), "tool");
        write_manifest(&temp.path().join("venv/agent"), "agent");

        assert_eq!(find_manifests(temp.path()).len(), 3);
    }

    #[test]
    fn test_discover_skips_invalid() {
        let temp = TempDir::new().unwrap();
        write_manifest(&temp.path().join("good"), "good");
        fs::create_dir_all(temp.path().join("bad")).unwrap();
        fs::write(temp.path().join("bad").join(MANIFEST_FILE), "{not json").unwrap();

        let components = discover(temp.path());
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].manifest.name, "good");
        assert_eq!(components[0].dir(), temp.path().join("good"));
    }

    #[test]
    fn test_find_manifests_missing_root() {
        assert!(find_manifests(Path::new("/nonexistent/registry")).is_empty());
    }
}
