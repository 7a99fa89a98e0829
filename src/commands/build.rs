//! Build a registry index from component manifests

use colored::*;
use eyre::Result;
use std::path::Path;

use super::Context;
use crate::component::builder::{build_index, write_index};

pub fn run(registry_dir: &Path, output: Option<&Path>, check: bool, ctx: &Context) -> Result<()> {
    let registry_dir = ctx.root.join(registry_dir);
    let output = match output {
        Some(path) => ctx.root.join(path),
        None => registry_dir.join("index.json"),
    };

    ctx.status(format!("{} Scanning {}", "→".blue(), registry_dir.display()));

    let index = build_index(&registry_dir, &output)?;

    for entry in &index.components {
        ctx.status(format!(
            "  {} {}@{} ({})",
            "✓".green(),
            entry.name.cyan(),
            entry.version,
            entry.r#type
        ));
    }

    if check {
        ctx.status(format!(
            "{} {} component(s) valid, index not written",
            "✓".green().bold(),
            index.components.len()
        ));
        return Ok(());
    }

    write_index(&index, &output)?;
    ctx.status(format!(
        "{} Wrote {} component(s) to {}",
        "✓".green().bold(),
        index.components.len(),
        output.display()
    ));

    Ok(())
}
