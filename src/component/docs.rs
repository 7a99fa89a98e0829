//! Component documentation generation (`sygaldry docs generate`)
//!
//! Writes a `sygaldry.md` next to each component.json describing how to add and use it.

use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::discover;
use crate::registry::manifest::{ComponentManifest, ComponentType, shell_args};
use crate::template::title_case;

pub const DOC_FILE: &str = "sygaldry.md";

#[derive(Debug, Clone, Default)]
pub struct DocsOptions {
    pub force: bool,
    pub dry_run: bool,
    pub component_type: Option<ComponentType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStatus {
    Written,
    WouldWrite,
    Exists,
}

#[derive(Debug, Clone)]
pub struct DocResult {
    pub name: String,
    pub path: PathBuf,
    pub status: DocStatus,
}

/// Generate docs for every component under the given roots
pub fn generate(roots: &[PathBuf], options: &DocsOptions) -> Result<Vec<DocResult>> {
    let mut results = Vec::new();

    for root in roots {
        for component in discover(root) {
            if options.component_type.is_some_and(|t| t != component.manifest.r#type) {
                continue;
            }

            let path = component.dir().join(DOC_FILE);
            let status = if path.exists() && !options.force {
                DocStatus::Exists
            } else if options.dry_run {
                DocStatus::WouldWrite
            } else {
                fs::write(&path, render(&component.manifest))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!("Wrote {}", path.display());
                DocStatus::Written
            };

            results.push(DocResult {
                name: component.manifest.name.clone(),
                path,
                status,
            });
        }
    }

    Ok(results)
}

/// Human-readable title for a component name ("text_summarization_agent" → "Text Summarization Agent")
pub fn display_title(name: &str) -> String {
    title_case(&name.replace(['_', '-'], " "))
}

/// Render the markdown documentation for a manifest
pub fn render(manifest: &ComponentManifest) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# {}\n", display_title(&manifest.name)));
    doc.push('\n');
    if !manifest.description.trim().is_empty() {
        doc.push_str(&format!("{}\n", manifest.description.trim()));
        doc.push('\n');
    }

    doc.push_str("## Overview\n\n");
    doc.push_str(&format!("- **Name:** `{}`\n", manifest.name));
    doc.push_str(&format!("- **Version:** {}\n", manifest.version));
    doc.push_str(&format!("- **Type:** {}\n", manifest.r#type));
    if let Some(license) = &manifest.license {
        doc.push_str(&format!("- **License:** {}\n", license));
    }
    if !manifest.authors.is_empty() {
        let authors: Vec<String> = manifest.authors.iter().map(ToString::to_string).collect();
        doc.push_str(&format!("- **Authors:** {}\n", authors.join(", ")));
    }
    if !manifest.tags.is_empty() {
        doc.push_str(&format!("- **Tags:** {}\n", manifest.tags.join(", ")));
    }
    doc.push('\n');

    doc.push_str("## Installation\n\n```bash\n");
    doc.push_str(&format!("sygaldry add {}\n", manifest.name));
    doc.push_str("```\n\n");

    doc.push_str("Files:\n\n");
    for file in &manifest.files_to_copy {
        doc.push_str(&format!("- `{}`\n", file.destination()));
    }
    doc.push('\n');

    let requirements = manifest.python_requirements();
    if !requirements.is_empty() || !manifest.registry_dependencies.is_empty() {
        doc.push_str("## Dependencies\n\n");
        if !requirements.is_empty() {
            doc.push_str("```bash\n");
            doc.push_str(&format!("uv add {}\n", shell_args(&requirements)));
            doc.push_str("```\n\n");
        }
        if !manifest.registry_dependencies.is_empty() {
            doc.push_str("Registry components added alongside:\n\n");
            for dep in &manifest.registry_dependencies {
                doc.push_str(&format!("- `{}`\n", dep));
            }
            doc.push('\n');
        }
    }

    if !manifest.environment_variables.is_empty() {
        doc.push_str("## Environment Variables\n\n");
        for var in &manifest.environment_variables {
            doc.push_str(&format!("- `{}`\n", var));
        }
        doc.push('\n');
    }

    if !manifest.template_variables.is_empty() {
        doc.push_str("## Template Variables\n\n");
        doc.push_str("| Variable | Default |\n|---|---|\n");
        for (name, default) in &manifest.template_variables {
            doc.push_str(&format!("| `{}` | `{}` |\n", name, crate::template::value_to_string(default)));
        }
        doc.push('\n');
    }

    if let Some(example) = manifest.example_usage.as_deref().filter(|e| !e.trim().is_empty()) {
        doc.push_str("## Example Usage\n\n```python\n");
        doc.push_str(&format!("{}\n", example.trim_end()));
        doc.push_str("```\n\n");
    }

    if let Some(instructions) = manifest.post_add_instructions.as_deref().filter(|i| !i.trim().is_empty()) {
        doc.push_str("## Post-Add Instructions\n\n");
        doc.push_str(&format!("{}\n", instructions.trim()));
        doc.push('\n');
    }

    doc
}

/// Whether `dir` already has generated docs
pub fn has_docs(dir: &Path) -> bool {
    dir.join(DOC_FILE).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"{
  "name": "text_summarization_agent",
  "version": "1.2.0",
  "type": "agent",
  "description": "Summarizes long documents.",
  "authors": [{"name": "Sygaldry Team"}],
  "license": "MIT",
  "files_to_copy": [{"source": "agent.py"}],
  "python_dependencies": ["mirascope>=1.24"],
  "registry_dependencies": ["web_search_tool"],
  "environment_variables": ["OPENAI_API_KEY"],
  "example_usage": "from agents import summarize\nsummarize(text)",
  "post_add_instructions": "Export OPENAI_API_KEY first.",
  "tags": ["summarization"],
  "template_variables": {"provider": "openai", "stream": false}
}"#;

    fn write_component(dir: &Path, manifest: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("component.json"), manifest).unwrap();
    }

    #[test]
    fn test_render_sections() {
        let manifest = ComponentManifest::from_str(MANIFEST).unwrap();
        let doc = render(&manifest);
        assert!(doc.starts_with("# Text Summarization Agent\n"));
        assert!(doc.contains("- **Version:** 1.2.0"));
        assert!(doc.contains("- **Authors:** Sygaldry Team"));
        assert!(doc.contains("sygaldry add text_summarization_agent"));
        assert!(doc.contains("uv add \"mirascope>=1.24\""));
        assert!(doc.contains("- `web_search_tool`"));
        assert!(doc.contains("- `OPENAI_API_KEY`"));
        assert!(doc.contains("| `stream` | `False` |"));
        assert!(doc.contains("## Example Usage"));
        assert!(doc.contains("Export OPENAI_API_KEY first."));
    }

    #[test]
    fn test_render_minimal_omits_empty_sections() {
        let manifest = ComponentManifest::from_str(
            r#"{"name": "dice_roller", "version": "0.1.0", "type": "tool", "files_to_copy": [{"source": "tool.py"}]}"#,
        )
        .unwrap();
        let doc = render(&manifest);
        assert!(doc.starts_with("# Dice Roller\n"));
        assert!(!doc.contains("## Dependencies"));
        assert!(!doc.contains("## Template Variables"));
        assert!(!doc.contains("## Example Usage"));
    }

    #[test]
    fn test_generate_respects_existing_and_force() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("agents/text_summarization_agent");
        write_component(&dir, MANIFEST);
        fs::write(dir.join(DOC_FILE), "hand written").unwrap();

        let results = generate(&[temp.path().to_path_buf()], &DocsOptions::default()).unwrap();
        assert_eq!(results[0].status, DocStatus::Exists);
        assert_eq!(fs::read_to_string(dir.join(DOC_FILE)).unwrap(), "hand written");

        let options = DocsOptions {
            force: true,
            ..DocsOptions::default()
        };
        let results = generate(&[temp.path().to_path_buf()], &options).unwrap();
        assert_eq!(results[0].status, DocStatus::Written);
        assert!(fs::read_to_string(dir.join(DOC_FILE)).unwrap().contains("# Text Summarization Agent"));
    }

    #[test]
    fn test_generate_dry_run_and_type_filter() {
        let temp = tempdir().unwrap();
        write_component(&temp.path().join("agents/summary"), MANIFEST);
        write_component(
            &temp.path().join("tools/dice"),
            r#"{"name": "dice_roller", "version": "0.1.0", "type": "tool", "files_to_copy": [{"source": "tool.py"}]}"#,
        );

        let options = DocsOptions {
            dry_run: true,
            component_type: Some(ComponentType::Tool),
            ..DocsOptions::default()
        };
        let results = generate(&[temp.path().to_path_buf()], &options).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "dice_roller");
        assert_eq!(results[0].status, DocStatus::WouldWrite);
        assert!(!has_docs(&temp.path().join("tools/dice")));
    }
}
