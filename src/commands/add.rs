//! Add a component to the project

use colored::*;
use eyre::Result;

use super::Context;
use crate::cli::OutputFormat;
use crate::component::installer::{AddOptions, AddReport, AddStatus, Installer, parse_var};
use crate::project::ProjectConfig;
use crate::registry::manifest::shell_args;
use crate::version::ComponentRef;

/// Raw `add` flags from the command line
pub struct AddFlags {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub stream: bool,
    pub with_lilypad: bool,
    pub vars: Vec<String>,
    pub force: bool,
    pub no_deps: bool,
    pub dry_run: bool,
}

impl AddFlags {
    fn into_options(self) -> Result<AddOptions> {
        let vars = self.vars.iter().map(|v| parse_var(v)).collect::<Result<Vec<_>>>()?;
        Ok(AddOptions {
            force: self.force,
            dry_run: self.dry_run,
            no_deps: self.no_deps,
            provider: self.provider,
            model: self.model,
            // Flags only ever switch these on; otherwise the project config decides
            stream: self.stream.then_some(true),
            lilypad: self.with_lilypad.then_some(true),
            vars,
        })
    }
}

pub fn run(identifier: &str, source: Option<&str>, flags: AddFlags, format: OutputFormat, ctx: &Context) -> Result<()> {
    let component = match ComponentRef::parse(identifier)? {
        ComponentRef::Manifest(location) => ComponentRef::Manifest(ctx.resolve_location(&location)),
        named => named,
    };
    let options = flags.into_options()?;

    let project = ProjectConfig::load_or_default(&ctx.root)?;
    let client = ctx.registry_client(&project, source)?;

    if format == OutputFormat::Text {
        ctx.status(format!(
            "{} Adding {}{}",
            "→".blue(),
            component.to_string().cyan(),
            if options.dry_run { " (dry run)".dimmed().to_string() } else { String::new() }
        ));
    }

    let installer = Installer::new(&client, &project, ctx.root.clone());
    let report = installer.add(&component, &options)?;

    match format {
        OutputFormat::Text => print_report(&report, ctx),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&report)?),
    }
    Ok(())
}

/// Shell line installing the report's Python requirements
fn install_line(tool: &str, requirements: &[String]) -> String {
    format!("{} {}", tool, shell_args(requirements))
}

fn print_report(report: &AddReport, ctx: &Context) {
    for component in &report.components {
        let label = format!("{}@{}", component.name, component.version);
        let relative = component
            .target_dir
            .strip_prefix(&ctx.root)
            .unwrap_or(&component.target_dir)
            .display()
            .to_string();
        let dep = if component.dependency { " (dependency)".dimmed().to_string() } else { String::new() };

        match component.status {
            AddStatus::AlreadyExists => {
                ctx.status(format!(
                    "  {} {} already exists at {}{}",
                    "⚠".yellow(),
                    label.cyan(),
                    relative,
                    dep
                ));
                if !component.dependency {
                    ctx.status(format!("    Use {} to overwrite", "--force".cyan()));
                }
            }
            AddStatus::Added => {
                let verb = if report.dry_run { "Would add" } else { "Added" };
                ctx.status(format!("  {} {} {} → {}{}", "✓".green(), verb, label.cyan(), relative, dep));
                for file in &component.files {
                    let shown = file.strip_prefix(&ctx.root).unwrap_or(file);
                    ctx.status(format!("      {}", shown.display().to_string().dimmed()));
                }
                if !component.unresolved.is_empty() {
                    ctx.status(format!(
                        "    {} No value for template variable(s): {} (pass --var name=value)",
                        "⚠".yellow(),
                        component.unresolved.join(", ")
                    ));
                }
            }
        }
    }

    let skipped = report.skipped().count();
    if report.added().count() == 0 {
        if skipped > 0 {
            ctx.status("");
            ctx.status(format!("Nothing added, {} component(s) already present", skipped));
        }
        return;
    }

    if !report.python_dependencies.is_empty() {
        ctx.status("");
        ctx.status("Python dependencies:".bold());
        ctx.status(format!("  {}", install_line("uv add", &report.python_dependencies)));
        ctx.status(format!(
            "  {} {}",
            "or".dimmed(),
            install_line("pip install", &report.python_dependencies)
        ));
    }

    if !report.environment_variables.is_empty() {
        ctx.status("");
        ctx.status("Environment variables:".bold());
        for var in &report.environment_variables {
            let state = if std::env::var_os(var).is_some() { "set".green() } else { "not set".yellow() };
            ctx.status(format!("  {} ({})", var, state));
        }
    }

    for component in report.added() {
        if let Some(instructions) = &component.instructions {
            ctx.status("");
            ctx.status(format!("{} {}", "Next steps for".bold(), component.name.cyan().bold()));
            for line in instructions.lines() {
                ctx.status(format!("  {}", line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_line_quotes_specifiers() {
        let reqs = vec!["mirascope>=1.0".to_string(), "httpx>=0.27".to_string(), "exa-py".to_string()];
        assert_eq!(install_line("uv add", &reqs), r#"uv add "mirascope>=1.0" "httpx>=0.27" exa-py"#);
        assert_eq!(install_line("pip install", &reqs[2..]), "pip install exa-py");
    }

    #[test]
    fn test_flags_into_options() {
        let flags = AddFlags {
            provider: Some("anthropic".to_string()),
            model: None,
            stream: false,
            with_lilypad: true,
            vars: vec!["temperature=0.9".to_string()],
            force: false,
            no_deps: true,
            dry_run: false,
        };
        let options = flags.into_options().unwrap();
        assert_eq!(options.stream, None);
        assert_eq!(options.lilypad, Some(true));
        assert_eq!(options.vars, vec![("temperature".to_string(), "0.9".to_string())]);
        assert!(options.no_deps);
    }
}
