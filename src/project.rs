//! Project configuration (sygaldry.json)
//!
//! Maps component types to directories inside the project and lists the
//! registry sources components are resolved against.

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_REGISTRY_URL;
use crate::registry::manifest::{ComponentManifest, ComponentType};

pub const CONFIG_FILE: &str = "sygaldry.json";
pub const LEGACY_CONFIG_FILE: &str = "funcn.json";

const DEFAULT_PRIORITY: i32 = 100;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    #[serde(rename = "$schema")]
    pub schema: String,

    #[serde(rename = "agentDirectory")]
    pub agent_directory: String,

    #[serde(rename = "toolDirectory")]
    pub tool_directory: String,

    #[serde(rename = "promptTemplateDirectory")]
    pub prompt_template_directory: String,

    #[serde(rename = "responseModelDirectory")]
    pub response_model_directory: String,

    #[serde(rename = "evalDirectory")]
    pub eval_directory: String,

    pub registry_sources: IndexMap<String, SourceSpec>,

    /// Template overrides; when absent the component's own defaults apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    #[serde(rename = "enableLilypad")]
    pub enable_lilypad: bool,

    pub aliases: IndexMap<String, String>,

    /// Keys this version doesn't know about, kept on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A registry source as written in sygaldry.json
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SourceSpec {
    Simple(String),
    Detailed {
        url: String,
        #[serde(default = "default_enabled")]
        enabled: bool,
        #[serde(default = "default_priority")]
        priority: i32,
    },
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl SourceSpec {
    pub fn url(&self) -> &str {
        match self {
            SourceSpec::Simple(url) => url,
            SourceSpec::Detailed { url, .. } => url,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            SourceSpec::Simple(_) => true,
            SourceSpec::Detailed { enabled, .. } => *enabled,
        }
    }

    pub fn priority(&self) -> i32 {
        match self {
            SourceSpec::Simple(_) => DEFAULT_PRIORITY,
            SourceSpec::Detailed { priority, .. } => *priority,
        }
    }
}

/// A named registry source, resolved for lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySource {
    pub name: String,
    pub url: String,
    pub priority: i32,
    pub enabled: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            schema: "./sygaldry.schema.json".to_string(),
            agent_directory: "packages/components/agents".to_string(),
            tool_directory: "packages/components/tools".to_string(),
            prompt_template_directory: "packages/components/prompt_templates".to_string(),
            response_model_directory: "packages/components/response_models".to_string(),
            eval_directory: "packages/components/evals".to_string(),
            registry_sources: IndexMap::from([(
                "default".to_string(),
                SourceSpec::Simple(DEFAULT_REGISTRY_URL.to_string()),
            )]),
            default_provider: None,
            default_model: None,
            stream: None,
            enable_lilypad: false,
            aliases: IndexMap::new(),
            extra: serde_json::Map::new(),
        }
    }
}

impl ProjectConfig {
    /// Path of the config file in `dir`, preferring sygaldry.json over the legacy name
    pub fn find_file(dir: &Path) -> Option<PathBuf> {
        [CONFIG_FILE, LEGACY_CONFIG_FILE]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::find_file(dir).ok_or_else(|| {
            eyre::eyre!(
                "No {} found in {} (run `sygaldry init` first)",
                CONFIG_FILE,
                dir.display()
            )
        })?;
        Self::load_from_file(&path)
    }

    /// Load the project config, falling back to defaults when the project has none
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        match Self::find_file(dir) {
            Some(path) => Self::load_from_file(&path),
            None => {
                log::warn!("No {} in {}, using default project settings", CONFIG_FILE, dir.display());
                Ok(Self::default())
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        log::info!("Loaded project config from: {}", path.display());
        Ok(config)
    }

    /// Write the config into `dir`, keeping the legacy file name if that is what the project uses
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::find_file(dir).unwrap_or_else(|| dir.join(CONFIG_FILE));
        let json = serde_json::to_string_pretty(self).context("Failed to serialize project config")?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        let permissions = config_permissions(&path, tmp.as_file())?;
        tmp.as_file()
            .set_permissions(permissions)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!("Saved project config to: {}", path.display());
        Ok(path)
    }

    /// Configured directory for a component type, relative to the project root
    pub fn directory_for(&self, component_type: ComponentType) -> &str {
        match component_type {
            ComponentType::Agent => &self.agent_directory,
            ComponentType::Tool => &self.tool_directory,
            ComponentType::PromptTemplate => &self.prompt_template_directory,
            ComponentType::ResponseModel => &self.response_model_directory,
            ComponentType::Eval => &self.eval_directory,
        }
    }

    /// Look up a directory by its config key (e.g. "agentDirectory"), including custom keys
    pub fn directory_by_key(&self, key: &str) -> Option<&str> {
        let known = match key {
            "agentDirectory" => Some(ComponentType::Agent),
            "toolDirectory" => Some(ComponentType::Tool),
            "promptTemplateDirectory" => Some(ComponentType::PromptTemplate),
            "responseModelDirectory" => Some(ComponentType::ResponseModel),
            "evalDirectory" => Some(ComponentType::Eval),
            _ => None,
        };
        match known {
            Some(t) => Some(self.directory_for(t)),
            None => self.extra.get(key).and_then(|v| v.as_str()),
        }
    }

    /// Directory a component is installed into
    pub fn target_dir(&self, root: &Path, manifest: &ComponentManifest) -> Result<PathBuf> {
        let base = match &manifest.target_directory_key {
            Some(key) => self.directory_by_key(key).ok_or_else(|| {
                eyre::eyre!(
                    "Component '{}' wants directory key '{}', which is not set in {}",
                    manifest.name,
                    key,
                    CONFIG_FILE
                )
            })?,
            None => self.directory_for(manifest.r#type),
        };
        Ok(root.join(base).join(&manifest.name))
    }

    /// Every component directory of the project, one per type
    pub fn component_dirs(&self, root: &Path) -> Vec<(ComponentType, PathBuf)> {
        ComponentType::ALL
            .iter()
            .map(|t| (*t, root.join(self.directory_for(*t))))
            .collect()
    }

    /// Enabled sources in lookup order; falls back to `default_url` when none are configured
    pub fn sources(&self, default_url: &str) -> Vec<RegistrySource> {
        let mut sources = self.all_sources();
        sources.retain(|s| s.enabled);

        if sources.is_empty() {
            return vec![RegistrySource {
                name: "default".to_string(),
                url: default_url.to_string(),
                priority: DEFAULT_PRIORITY,
                enabled: true,
            }];
        }
        sources
    }

    /// All declared sources (enabled or not), sorted by priority then declaration order
    pub fn all_sources(&self) -> Vec<RegistrySource> {
        let mut sources: Vec<RegistrySource> = self
            .registry_sources
            .iter()
            .map(|(name, spec)| RegistrySource {
                name: name.clone(),
                url: spec.url().to_string(),
                priority: spec.priority(),
                enabled: spec.enabled(),
            })
            .collect();
        sources.sort_by_key(|s| s.priority);
        sources
    }

    /// Add or replace a source
    pub fn add_source(&mut self, name: &str, url: &str, priority: Option<i32>, enabled: bool) -> Result<()> {
        if name.trim().is_empty() {
            eyre::bail!("Source name cannot be empty");
        }
        if url.trim().is_empty() {
            eyre::bail!("Source URL cannot be empty");
        }

        let spec = if priority.is_none() && enabled {
            SourceSpec::Simple(url.to_string())
        } else {
            SourceSpec::Detailed {
                url: url.to_string(),
                enabled,
                priority: priority.unwrap_or(DEFAULT_PRIORITY),
            }
        };
        self.registry_sources.insert(name.to_string(), spec);
        Ok(())
    }

    pub fn remove_source(&mut self, name: &str) -> Result<SourceSpec> {
        self.registry_sources
            .shift_remove(name)
            .ok_or_else(|| eyre::eyre!("Registry source '{}' not found", name))
    }
}

/// Mode for the rewritten config: the existing file's, or 0644 for a new one
fn config_permissions(path: &Path, tmp: &fs::File) -> Result<fs::Permissions> {
    if let Ok(meta) = fs::metadata(path) {
        return Ok(meta.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = tmp;
        Ok(fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        Ok(tmp.metadata()?.permissions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_project_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.directory_for(ComponentType::Agent), "packages/components/agents");
        assert_eq!(config.default_provider, None);
        assert_eq!(config.stream, None);
        assert!(config.registry_sources.contains_key("default"));
    }

    #[test]
    fn test_parse_camel_case_keys_and_sources() {
        let json = r#"{
  "agentDirectory": "src/agents",
  "toolDirectory": "src/tools",
  "registry_sources": {
    "default": "https://example.com/index.json",
    "internal": {"url": "/srv/registry/index.json", "priority": 10},
    "off": {"url": "https://off.example.com/index.json", "enabled": false}
  },
  "default_model": "claude-3-5-sonnet",
  "customDirectory": "src/custom"
}"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.directory_for(ComponentType::Agent), "src/agents");
        assert_eq!(config.directory_for(ComponentType::Eval), "packages/components/evals");
        assert_eq!(config.default_model.as_deref(), Some("claude-3-5-sonnet"));
        assert_eq!(config.default_provider, None);
        assert_eq!(config.directory_by_key("customDirectory"), Some("src/custom"));

        let names: Vec<_> = config.sources(DEFAULT_REGISTRY_URL).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["internal", "default"]);
        assert_eq!(config.all_sources().len(), 3);
    }

    #[test]
    fn test_sources_fall_back_to_default() {
        let config = ProjectConfig {
            registry_sources: IndexMap::new(),
            ..ProjectConfig::default()
        };
        let sources = config.sources("/srv/index.json");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "/srv/index.json");
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            r#"{"agentDirectory": "agents", "myTeamSetting": {"nested": [1, 2]}}"#,
        )
        .unwrap();

        let mut config = ProjectConfig::load(temp.path()).unwrap();
        config.add_source("extra", "https://extra.example.com/index.json", None, true).unwrap();
        config.save(temp.path()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap()).unwrap();
        assert_eq!(raw["myTeamSetting"]["nested"], serde_json::json!([1, 2]));
        assert_eq!(raw["agentDirectory"], serde_json::json!("agents"));
        assert_eq!(
            raw["registry_sources"]["extra"],
            serde_json::json!("https://extra.example.com/index.json")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE);

        ProjectConfig::default().save(temp.path()).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o664)).unwrap();
        let mut config = ProjectConfig::load(temp.path()).unwrap();
        config.add_source("extra", "/srv/extra/index.json", None, true).unwrap();
        config.save(temp.path()).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o664);
    }

    #[test]
    fn test_legacy_config_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(LEGACY_CONFIG_FILE), r#"{"toolDirectory": "legacy/tools"}"#).unwrap();

        let config = ProjectConfig::load(temp.path()).unwrap();
        assert_eq!(config.directory_for(ComponentType::Tool), "legacy/tools");

        let saved = config.save(temp.path()).unwrap();
        assert_eq!(saved, temp.path().join(LEGACY_CONFIG_FILE));
        assert!(!temp.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_load_missing_config() {
        let temp = tempdir().unwrap();
        let err = ProjectConfig::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("sygaldry init"));
        assert!(ProjectConfig::load_or_default(temp.path()).is_ok());
    }

    #[test]
    fn test_add_and_remove_sources() {
        let mut config = ProjectConfig::default();
        config.add_source("mirror", "/srv/mirror/index.json", Some(5), true).unwrap();
        assert_eq!(
            config.registry_sources["mirror"],
            SourceSpec::Detailed {
                url: "/srv/mirror/index.json".to_string(),
                enabled: true,
                priority: 5,
            }
        );
        assert_eq!(config.sources(DEFAULT_REGISTRY_URL)[0].name, "mirror");

        config.remove_source("mirror").unwrap();
        assert!(config.remove_source("mirror").is_err());
        assert!(config.add_source("", "x", None, true).is_err());
    }

    #[test]
    fn test_target_dir_uses_type_or_key() {
        let root = Path::new("/project");
        let config: ProjectConfig =
            serde_json::from_str(r#"{"toolDirectory": "src/tools", "sharedDirectory": "src/shared"}"#).unwrap();

        let mut manifest = ComponentManifest::from_str(
            r#"{"name": "dice_roller", "version": "0.1.0", "type": "tool", "files_to_copy": [{"source": "tool.py"}]}"#,
        )
        .unwrap();
        assert_eq!(
            config.target_dir(root, &manifest).unwrap(),
            PathBuf::from("/project/src/tools/dice_roller")
        );

        manifest.target_directory_key = Some("sharedDirectory".to_string());
        assert_eq!(
            config.target_dir(root, &manifest).unwrap(),
            PathBuf::from("/project/src/shared/dice_roller")
        );

        manifest.target_directory_key = Some("missingDirectory".to_string());
        assert!(config.target_dir(root, &manifest).is_err());
    }
}
