//! Initialize a sygaldry project

use colored::*;
use eyre::{Context as _, Result};
use std::fs;

use super::Context;
use crate::project::{CONFIG_FILE, ProjectConfig, SourceSpec};

pub struct InitArgs {
    pub force: bool,
    pub agent_dir: Option<String>,
    pub tool_dir: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub registry: Option<String>,
}

pub fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    let root = &ctx.root;

    ctx.status(format!("{} Initializing sygaldry in {}", "→".blue(), root.display()));

    if let Some(existing) = ProjectConfig::find_file(root) {
        if !args.force {
            ctx.status(format!("  {} Already initialized: {}", "✓".green(), existing.display()));
            ctx.status(format!("  Use {} to reinitialize", "--force".cyan()));
            return Ok(());
        }
    }

    fs::create_dir_all(root).with_context(|| format!("Failed to create {}", root.display()))?;

    let mut project = ProjectConfig::default();
    if let Some(dir) = args.agent_dir {
        project.agent_directory = dir;
    }
    if let Some(dir) = args.tool_dir {
        project.tool_directory = dir;
    }
    project.default_provider = args.provider;
    project.default_model = args.model;
    let registry = args.registry.unwrap_or_else(|| ctx.config.default_registry.clone());
    project
        .registry_sources
        .insert("default".to_string(), SourceSpec::Simple(registry));

    for (component_type, dir) in project.component_dirs(root) {
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        ctx.status(format!(
            "  {} Created {} directory: {}",
            "✓".green(),
            component_type,
            dir.strip_prefix(root).unwrap_or(&dir).display()
        ));
    }

    let path = project.save(root)?;
    ctx.status(format!("  {} Created {}", "✓".green(), path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()));

    ctx.status("");
    ctx.status(format!("{} sygaldry initialized!", "✓".green().bold()));
    ctx.status("");
    ctx.status("Next steps:");
    ctx.status(format!("  1. Run {} to browse components", "sygaldry list".cyan()));
    ctx.status(format!("  2. Run {} to add one", "sygaldry add <name>".cyan()));
    ctx.status(format!("  3. Edit {} to change directories or sources", CONFIG_FILE.cyan()));

    Ok(())
}
