//! Generate component documentation

use colored::*;
use eyre::Result;

use super::{Context, parse_type};
use crate::cli::DocsAction;
use crate::component::docs::{DocStatus, DocsOptions, generate};
use crate::project::ProjectConfig;

pub fn run(action: DocsAction, ctx: &Context) -> Result<()> {
    match action {
        DocsAction::Generate {
            path,
            r#type,
            force,
            dry_run,
        } => {
            let options = DocsOptions {
                force,
                dry_run,
                component_type: parse_type(r#type.as_deref())?,
            };

            let roots = match path {
                Some(path) => vec![ctx.root.join(path)],
                None => {
                    let project = ProjectConfig::load_or_default(&ctx.root)?;
                    project.component_dirs(&ctx.root).into_iter().map(|(_, dir)| dir).collect()
                }
            };

            generate_docs(&roots, &options, ctx)
        }
    }
}

fn generate_docs(roots: &[std::path::PathBuf], options: &DocsOptions, ctx: &Context) -> Result<()> {
    let results = generate(roots, options)?;

    if results.is_empty() {
        ctx.status("No components found.");
        return Ok(());
    }

    let mut written = 0;
    for result in &results {
        let shown = result.path.strip_prefix(&ctx.root).unwrap_or(&result.path).display().to_string();
        match result.status {
            DocStatus::Written => {
                written += 1;
                ctx.status(format!("  {} {} → {}", "✓".green(), result.name.cyan(), shown));
            }
            DocStatus::WouldWrite => {
                ctx.status(format!("  {} {} → {} (dry run)", "→".blue(), result.name.cyan(), shown));
            }
            DocStatus::Exists => {
                ctx.status(format!("  {} {} exists, skipped", "-".dimmed(), shown));
            }
        }
    }

    let skipped = results.iter().filter(|r| r.status == DocStatus::Exists).count();
    ctx.status("");
    ctx.status(format!(
        "{} doc(s) written, {} skipped{}",
        written,
        skipped,
        if skipped > 0 { " (use --force to overwrite)" } else { "" }
    ));

    Ok(())
}
