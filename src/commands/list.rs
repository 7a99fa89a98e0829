//! List registry or installed components

use colored::*;
use eyre::{Context as _, Result};
use serde::Serialize;

use super::{Context, parse_type, terminal_width, truncate};
use crate::cli::OutputFormat;
use crate::component::{discover, docs};
use crate::project::ProjectConfig;
use crate::registry::index::IndexEntry;
use crate::registry::manifest::ComponentType;

/// Serializable component info for JSON/YAML output
#[derive(Serialize)]
pub struct ComponentInfo {
    pub name: String,
    pub version: String,
    pub r#type: ComponentType,
    pub description: String,
    pub source: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ComponentInfo {
    pub fn from_entry(entry: &IndexEntry, source: &str) -> Self {
        Self {
            name: entry.name.clone(),
            version: entry.version.clone(),
            r#type: entry.r#type,
            description: entry.description.clone(),
            source: source.to_string(),
            tags: entry.tags.clone(),
        }
    }
}

#[derive(Serialize)]
struct InstalledInfo {
    name: String,
    version: String,
    r#type: ComponentType,
    path: String,
    has_docs: bool,
}

pub fn run(
    component_type: Option<&str>,
    source: Option<&str>,
    installed: bool,
    format: OutputFormat,
    ctx: &Context,
) -> Result<()> {
    let component_type = parse_type(component_type)?;
    let project = ProjectConfig::load_or_default(&ctx.root)?;

    if installed {
        return list_installed(&project, component_type, format, ctx);
    }

    let client = ctx.registry_client(&project, source)?;
    let mut infos = Vec::new();
    for loaded in client.load_all()? {
        for entry in loaded.index.latest_entries() {
            if component_type.is_none_or(|t| t == entry.r#type) {
                infos.push(ComponentInfo::from_entry(entry, &loaded.source.name));
            }
        }
    }

    print_components(&infos, format, "No components found.")
}

/// Shared text/JSON/YAML rendering for list and search
pub fn print_components(infos: &[ComponentInfo], format: OutputFormat, empty_message: &str) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if infos.is_empty() {
                println!("{}", empty_message);
                return Ok(());
            }

            let mut sorted: Vec<&ComponentInfo> = infos.iter().collect();
            sorted.sort_by(|a, b| a.r#type.cmp(&b.r#type).then_with(|| a.name.cmp(&b.name)));

            let width = terminal_width();
            let name_width = infos.iter().map(|i| i.name.len()).max().unwrap_or(0).max(4);
            let version_width = infos.iter().map(|i| i.version.len()).max().unwrap_or(0).max(7);

            let mut current_type = None;
            for info in sorted {
                if current_type != Some(info.r#type) {
                    if current_type.is_some() {
                        println!();
                    }
                    println!("{}", heading(info.r#type).bold());
                    current_type = Some(info.r#type);
                }

                // indent + name + gap + version + gap
                let used = 2 + name_width + 2 + version_width + 2;
                let description = truncate(&info.description, width.saturating_sub(used).max(20));
                println!(
                    "  {:<name_width$}  {:<version_width$}  {}",
                    info.name.cyan(),
                    info.version,
                    description.dimmed(),
                    name_width = name_width,
                    version_width = version_width
                );
            }

            println!();
            println!("Total: {} component(s)", infos.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(infos)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(infos)?);
        }
    }

    Ok(())
}

fn list_installed(
    project: &ProjectConfig,
    component_type: Option<ComponentType>,
    format: OutputFormat,
    ctx: &Context,
) -> Result<()> {
    let mut infos = Vec::new();
    for (kind, dir) in project.component_dirs(&ctx.root) {
        if component_type.is_some_and(|t| t != kind) {
            continue;
        }
        for component in discover(&dir) {
            infos.push(InstalledInfo {
                name: component.manifest.name.clone(),
                version: component.manifest.version.clone(),
                r#type: component.manifest.r#type,
                path: component
                    .dir()
                    .strip_prefix(&ctx.root)
                    .unwrap_or(component.dir())
                    .display()
                    .to_string(),
                has_docs: docs::has_docs(component.dir()),
            });
        }
    }

    match format {
        OutputFormat::Text => {
            if infos.is_empty() {
                println!("No components installed.");
                println!();
                println!("To add one:");
                println!("  sygaldry add <name>");
                return Ok(());
            }
            println!("{}", "Installed components:".bold());
            for info in &infos {
                println!(
                    "  {} {} ({}) {}",
                    info.name.cyan(),
                    info.version,
                    info.r#type,
                    info.path.dimmed()
                );
            }
            println!();
            println!("Total: {} component(s)", infos.len());
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&infos).context("Failed to serialize installed components")?
            );
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&infos)?);
        }
    }

    Ok(())
}

fn heading(component_type: ComponentType) -> &'static str {
    match component_type {
        ComponentType::Agent => "Agents",
        ComponentType::Tool => "Tools",
        ComponentType::PromptTemplate => "Prompt Templates",
        ComponentType::ResponseModel => "Response Models",
        ComponentType::Eval => "Evals",
    }
}
