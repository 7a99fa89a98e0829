//! The `add` pipeline: resolve → fetch manifest → render files → write into the project

use eyre::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::project::ProjectConfig;
use crate::registry::manifest::{ComponentManifest, ComponentType, check_relative};
use crate::registry::{RegistryClient, ResolvedComponent};
use crate::template::TemplateEngine;
use crate::version::ComponentRef;

/// Name of the manifest copy written next to installed files
pub const INSTALLED_MANIFEST: &str = "component.json";

const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Options for a single `sygaldry add` run
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Overwrite components that are already present
    pub force: bool,
    /// Resolve and render but write nothing
    pub dry_run: bool,
    /// Skip registry dependencies
    pub no_deps: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub stream: Option<bool>,
    pub lilypad: Option<bool>,
    /// Extra `key=value` template variables
    pub vars: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddStatus {
    Added,
    AlreadyExists,
}

/// Outcome for one component in an add run
#[derive(Debug, Clone, Serialize)]
pub struct AddedComponent {
    pub name: String,
    pub version: String,
    pub r#type: ComponentType,
    pub status: AddStatus,
    pub target_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub source: Option<String>,
    /// Placeholders left in place because no value was provided
    pub unresolved: Vec<String>,
    /// True when pulled in as a registry dependency
    pub dependency: bool,
    /// Rendered post-add instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Everything an add run did, plus what the user still has to do
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddReport {
    pub dry_run: bool,
    pub components: Vec<AddedComponent>,
    pub python_dependencies: Vec<String>,
    pub environment_variables: Vec<String>,
}

impl AddReport {
    fn record(&mut self, manifest: &ComponentManifest, component: AddedComponent) {
        for requirement in manifest.python_requirements() {
            if !self.python_dependencies.contains(&requirement) {
                self.python_dependencies.push(requirement);
            }
        }
        for var in &manifest.environment_variables {
            if !self.environment_variables.contains(var) {
                self.environment_variables.push(var.clone());
            }
        }
        self.components.push(component);
    }

    pub fn added(&self) -> impl Iterator<Item = &AddedComponent> {
        self.components.iter().filter(|c| c.status == AddStatus::Added)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &AddedComponent> {
        self.components.iter().filter(|c| c.status == AddStatus::AlreadyExists)
    }
}

/// Installs components from a registry into a project directory
pub struct Installer<'a> {
    client: &'a RegistryClient,
    project: &'a ProjectConfig,
    root: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(client: &'a RegistryClient, project: &'a ProjectConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            project,
            root: root.into(),
        }
    }

    /// Add a component and, unless disabled, its registry dependencies
    pub fn add(&self, component: &ComponentRef, options: &AddOptions) -> Result<AddReport> {
        let mut report = AddReport {
            dry_run: options.dry_run,
            ..AddReport::default()
        };
        let mut visited = HashSet::new();
        self.add_recursive(component, options, false, &mut visited, &mut report)?;
        Ok(report)
    }

    fn add_recursive(
        &self,
        component: &ComponentRef,
        options: &AddOptions,
        dependency: bool,
        visited: &mut HashSet<String>,
        report: &mut AddReport,
    ) -> Result<()> {
        if !visited.insert(component.display_name().to_string()) {
            log::debug!("Already handled {}, skipping", component);
            return Ok(());
        }

        let resolved = self
            .client
            .resolve(component)
            .with_context(|| format!("Failed to resolve {}", component))?;
        visited.insert(resolved.manifest.name.clone());

        let added = self.install(&resolved, options, dependency)?;
        report.record(&resolved.manifest, added);

        if options.no_deps {
            return Ok(());
        }

        // --force only applies to the component the user asked for
        let dep_options = AddOptions {
            force: false,
            ..options.clone()
        };
        for dep in &resolved.manifest.registry_dependencies {
            let dep_ref = ComponentRef::parse(dep)
                .with_context(|| format!("Component '{}' has a bad dependency '{}'", resolved.manifest.name, dep))?;
            log::info!("{} depends on {}", resolved.manifest.name, dep_ref);
            self.add_recursive(&dep_ref, &dep_options, true, visited, report)?;
        }

        Ok(())
    }

    /// Render and write one component's files
    fn install(&self, resolved: &ResolvedComponent, options: &AddOptions, dependency: bool) -> Result<AddedComponent> {
        let manifest = &resolved.manifest;
        let target_dir = self.project.target_dir(&self.root, manifest)?;

        let mut added = AddedComponent {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            r#type: manifest.r#type,
            status: AddStatus::Added,
            target_dir: target_dir.clone(),
            files: Vec::new(),
            source: resolved.source.clone(),
            unresolved: Vec::new(),
            dependency,
            instructions: None,
        };

        if target_dir.exists() && !options.force {
            log::info!("{} already exists at {}", manifest.name, target_dir.display());
            added.status = AddStatus::AlreadyExists;
            return Ok(added);
        }

        let engine = self.template_engine(manifest, options);

        // Fetch and render everything before touching the project
        let mut rendered: Vec<(PathBuf, Vec<u8>)> = Vec::new();
        for file in &manifest.files_to_copy {
            let destination = file.destination();
            check_relative(destination)?;

            let location = resolved.manifest_location.join(&file.source);
            let bytes = self
                .client
                .fetcher()
                .read_bytes(&location)
                .with_context(|| format!("Failed to download {} for {}", file.source, manifest.name))?;

            let content = match String::from_utf8(bytes) {
                Ok(text) => {
                    for name in engine.unresolved(&text) {
                        if !added.unresolved.contains(&name) {
                            added.unresolved.push(name);
                        }
                    }
                    engine.render(&text).into_bytes()
                }
                Err(e) => {
                    log::debug!("{} is binary, copying verbatim", file.source);
                    e.into_bytes()
                }
            };

            rendered.push((target_dir.join(destination), content));
        }

        if !added.unresolved.is_empty() {
            log::warn!(
                "{}: no value for template variable(s) {}",
                manifest.name,
                added.unresolved.join(", ")
            );
        }

        added.files = rendered.iter().map(|(path, _)| path.clone()).collect();
        added.instructions = manifest
            .post_add_instructions
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| engine.render(t.trim()));

        if options.dry_run {
            log::info!("Dry run: would write {} file(s) for {}", rendered.len(), manifest.name);
            return Ok(added);
        }

        fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create {}", target_dir.display()))?;

        for (path, content) in &rendered {
            write_file(path, content)?;
        }

        let ships_manifest = manifest
            .files_to_copy
            .iter()
            .any(|f| Path::new(f.destination()) == Path::new(INSTALLED_MANIFEST));
        if !ships_manifest {
            let record = serde_json::to_string_pretty(manifest).context("Failed to serialize manifest")?;
            write_file(&target_dir.join(INSTALLED_MANIFEST), record.as_bytes())?;
        }

        log::info!(
            "Added {}@{} to {} ({} file(s))",
            manifest.name,
            manifest.version,
            target_dir.display(),
            rendered.len()
        );

        Ok(added)
    }

    /// Variables for a component: built-in defaults < manifest defaults < project config < command line
    fn template_engine(&self, manifest: &ComponentManifest, options: &AddOptions) -> TemplateEngine {
        let mut engine = TemplateEngine::new();

        engine.set("provider", DEFAULT_PROVIDER);
        engine.set("model", DEFAULT_MODEL);
        engine.set_value("stream", &serde_json::Value::Bool(false));

        for (name, value) in &manifest.template_variables {
            engine.set_value(name.as_str(), value);
        }

        if let Some(provider) = &self.project.default_provider {
            engine.set("provider", provider.as_str());
        }
        if let Some(model) = &self.project.default_model {
            engine.set("model", model.as_str());
        }
        if let Some(stream) = self.project.stream {
            engine.set_value("stream", &serde_json::Value::Bool(stream));
        }

        if let Some(provider) = &options.provider {
            engine.set("provider", provider.as_str());
        }
        if let Some(model) = &options.model {
            engine.set("model", model.as_str());
        }
        if let Some(stream) = options.stream {
            engine.set_value("stream", &serde_json::Value::Bool(stream));
        }

        // Tracing only goes into components built for it
        let lilypad = options.lilypad.unwrap_or(self.project.enable_lilypad) && manifest.supports_lilypad;
        engine.set_value("lilypad", &serde_json::Value::Bool(lilypad));

        for (name, value) in &options.vars {
            engine.set(name.as_str(), value.as_str());
        }

        engine.set("component_name", manifest.name.as_str());
        engine
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Parse a `key=value` template variable from the command line
pub fn parse_var(input: &str) -> Result<(String, String)> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| eyre::eyre!("Invalid variable '{}' (expected key=value)", input))?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        eyre::bail!("Invalid variable name '{}'", key);
    }
    Ok((key.to_string(), value.to_string()))
}
