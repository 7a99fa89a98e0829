//! Manage registry sources in sygaldry.json

use colored::*;
use eyre::Result;

use super::Context;
use crate::cli::{OutputFormat, SourceAction};
use crate::project::ProjectConfig;
use crate::registry::fetch::Location;

pub fn run(action: SourceAction, ctx: &Context) -> Result<()> {
    match action {
        SourceAction::Add {
            name,
            url,
            priority,
            disabled,
        } => add(&name, &url, priority, !disabled, ctx),
        SourceAction::List { format } => list(OutputFormat::resolve(format), ctx),
        SourceAction::Remove { name } => remove(&name, ctx),
    }
}

fn add(name: &str, url: &str, priority: Option<i32>, enabled: bool, ctx: &Context) -> Result<()> {
    let mut project = ProjectConfig::load(&ctx.root)?;
    let replaced = project.registry_sources.contains_key(name);

    project.add_source(name, url, priority, enabled)?;
    project.save(&ctx.root)?;

    ctx.status(format!(
        "{} {} registry source: {} → {}",
        "✓".green(),
        if replaced { "Updated" } else { "Added" },
        name.cyan(),
        url.dimmed()
    ));
    Ok(())
}

fn list(format: OutputFormat, ctx: &Context) -> Result<()> {
    let project = ProjectConfig::load_or_default(&ctx.root)?;
    let sources = project.all_sources();

    match format {
        OutputFormat::Text => {
            println!("{}", "Registry sources (in lookup order):".bold());
            println!();

            if sources.is_empty() {
                println!("  {}", "(none)".dimmed());
                println!();
                println!("  Falling back to {}", ctx.config.default_registry.dimmed());
                return Ok(());
            }

            for source in &sources {
                let kind = if Location::parse(&source.url).is_remote() { "remote" } else { "local" };
                let state = if source.enabled { String::new() } else { " (disabled)".yellow().to_string() };
                println!(
                    "  {} [{}] {} {}{}",
                    source.name.cyan(),
                    source.priority,
                    source.url.dimmed(),
                    kind.dimmed(),
                    state
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sources)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&sources)?);
        }
    }

    Ok(())
}

fn remove(name: &str, ctx: &Context) -> Result<()> {
    let mut project = ProjectConfig::load(&ctx.root)?;
    let removed = project.remove_source(name)?;
    project.save(&ctx.root)?;

    ctx.status(format!(
        "{} Removed registry source: {} ({})",
        "✓".green(),
        name.cyan(),
        removed.url().dimmed()
    ));
    Ok(())
}
