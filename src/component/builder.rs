//! Registry index generation (`sygaldry build`)

use eyre::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use super::find_manifests;
use crate::registry::index::{IndexEntry, RegistryIndex};
use crate::registry::manifest::ComponentManifest;

pub const REGISTRY_VERSION: &str = "1.0.0";

/// Scan `root` for manifests and build an index whose manifest paths are relative to `output`
pub fn build_index(root: &Path, output: &Path) -> Result<RegistryIndex> {
    if !root.is_dir() {
        eyre::bail!("Registry directory not found: {}", root.display());
    }

    let index_dir = output.parent().unwrap_or_else(|| Path::new("."));
    let mut problems: Vec<String> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut components = Vec::new();

    for path in find_manifests(root) {
        let manifest = match ComponentManifest::load(&path) {
            Ok(m) => m,
            Err(e) => {
                problems.push(format!("{}: {:#}", path.display(), e));
                continue;
            }
        };

        let dir = path.parent().unwrap_or(root);
        for file in &manifest.files_to_copy {
            if !dir.join(&file.source).is_file() {
                problems.push(format!(
                    "{}: '{}' lists missing file '{}'",
                    path.display(),
                    manifest.name,
                    file.source
                ));
            }
        }

        if !seen.insert((manifest.name.clone(), manifest.version.clone())) {
            problems.push(format!(
                "{}: duplicate component {}@{}",
                path.display(),
                manifest.name,
                manifest.version
            ));
            continue;
        }

        log::debug!("Indexed {}@{} from {}", manifest.name, manifest.version, path.display());
        components.push(IndexEntry {
            name: manifest.name,
            version: manifest.version,
            r#type: manifest.r#type,
            description: manifest.description,
            manifest_path: relative_path(&path, index_dir),
            tags: manifest.tags,
        });
    }

    if !problems.is_empty() {
        eyre::bail!(
            "Registry has {} problem(s):\n  {}",
            problems.len(),
            problems.join("\n  ")
        );
    }

    components.sort_by(|a, b| {
        a.r#type
            .cmp(&b.r#type)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.parsed_version().cmp(&b.parsed_version()))
    });

    Ok(RegistryIndex {
        registry_version: REGISTRY_VERSION.to_string(),
        updated_at: Some(chrono::Utc::now().to_rfc3339()),
        components,
    })
}

/// Write an index as pretty JSON
pub fn write_index(index: &RegistryIndex, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(index).context("Failed to serialize index")?;
    fs::write(output, format!("{}\n", json)).with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Wrote {} component(s) to {}", index.components.len(), output.display());
    Ok(())
}

/// `path` relative to `base` with forward slashes, climbing with `..` where needed
fn relative_path(path: &Path, base: &Path) -> String {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = path_parts.iter().zip(&base_parts).take_while(|(a, b)| a == b).count();

    if common == 0 && (path.is_absolute() || base.is_absolute()) {
        return path.to_string_lossy().replace('\\', "/");
    }

    let mut parts: Vec<String> = std::iter::repeat_n("..".to_string(), base_parts.len() - common).collect();
    parts.extend(
        path_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionReq;
    use tempfile::{TempDir, tempdir};

    fn component(root: &Path, rel: &str, name: &str, version: &str, kind: &str, with_file: bool) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("component.json"),
            format!(
                r#"{{"name": "{}", "version": "{}", "type": "{}", "description": "{} component",
                    "tags": ["t"], "files_to_copy": [{{"source": "main.py"}}]}}"#,
                name, version, kind, name
            ),
        )
        .unwrap();
        if with_file {
            fs::write(dir.join("main.py"), "pass\n").unwrap();
        }
    }

    fn registry() -> TempDir {
        let temp = tempdir().unwrap();
        component(temp.path(), "components/tools/search", "search_tool", "0.1.0", "tool", true);
        component(temp.path(), "components/agents/summary", "summary_agent", "1.0.0", "agent", true);
        component(temp.path(), "components/agents/coord", "coordinator_agent", "0.3.0", "agent", true);
        temp
    }

    #[test]
    fn test_build_index_sorted_and_relative() {
        let temp = registry();
        let output = temp.path().join("index.json");
        let index = build_index(temp.path(), &output).unwrap();

        let names: Vec<_> = index.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["coordinator_agent", "summary_agent", "search_tool"]);
        assert_eq!(
            index.components[1].manifest_path,
            "components/agents/summary/component.json"
        );
        assert_eq!(index.components[2].description, "search_tool component");
        assert_eq!(index.registry_version, REGISTRY_VERSION);
        assert!(index.updated_at.is_some());
    }

    #[test]
    fn test_written_index_round_trips_through_lookup() {
        let temp = registry();
        let output = temp.path().join("public/index.json");
        let index = build_index(temp.path(), &output).unwrap();
        write_index(&index, &output).unwrap();

        let loaded: RegistryIndex = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let entry = loaded.find("summary_agent", &VersionReq::Latest).unwrap();
        assert_eq!(entry.manifest_path, "../components/agents/summary/component.json");
    }

    #[test]
    fn test_missing_file_reported() {
        let temp = registry();
        component(temp.path(), "components/tools/broken", "broken_tool", "0.1.0", "tool", false);

        let err = build_index(temp.path(), &temp.path().join("index.json")).unwrap_err();
        assert!(err.to_string().contains("missing file 'main.py'"));
    }

    #[test]
    fn test_duplicate_version_reported() {
        let temp = registry();
        component(temp.path(), "components/tools/search_copy", "search_tool", "0.1.0", "tool", true);

        let err = build_index(temp.path(), &temp.path().join("index.json")).unwrap_err();
        assert!(err.to_string().contains("duplicate component search_tool@0.1.0"));
    }

    #[test]
    fn test_invalid_manifest_reported() {
        let temp = registry();
        let dir = temp.path().join("components/tools/bad");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("component.json"), r#"{"name": "bad"}"#).unwrap();

        let err = build_index(temp.path(), &temp.path().join("index.json")).unwrap_err();
        assert!(err.to_string().contains("1 problem(s)"));
    }

    #[test]
    fn test_missing_root() {
        assert!(build_index(Path::new("/nonexistent/registry"), Path::new("/tmp/index.json")).is_err());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/r/components/a/component.json"), Path::new("/r")),
            "components/a/component.json"
        );
        assert_eq!(relative_path(Path::new("/elsewhere/c.json"), Path::new("/r")), "../elsewhere/c.json");
        assert_eq!(relative_path(Path::new("reg/a/component.json"), Path::new("")), "reg/a/component.json");
    }
}
