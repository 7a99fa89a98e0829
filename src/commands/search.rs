//! Search registry components

use eyre::Result;

use super::list::{ComponentInfo, print_components};
use super::{Context, parse_type};
use crate::cli::OutputFormat;
use crate::project::ProjectConfig;

pub fn run(
    query: &str,
    component_type: Option<&str>,
    source: Option<&str>,
    format: OutputFormat,
    ctx: &Context,
) -> Result<()> {
    let component_type = parse_type(component_type)?;
    let project = ProjectConfig::load_or_default(&ctx.root)?;
    let client = ctx.registry_client(&project, source)?;

    let mut infos = Vec::new();
    for loaded in client.load_all()? {
        let hits = loaded.index.search(query, component_type);
        log::info!("Source '{}': {} match(es) for '{}'", loaded.source.name, hits.len(), query);
        infos.extend(hits.into_iter().map(|e| ComponentInfo::from_entry(e, &loaded.source.name)));
    }

    print_components(&infos, format, &format!("No components match '{}'.", query))
}
