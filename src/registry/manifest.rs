//! Component manifest parsing (component.json)

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use crate::version::{Version, validate_name};

/// Kind of component; decides which project directory it lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Agent,
    Tool,
    #[serde(alias = "prompt")]
    PromptTemplate,
    ResponseModel,
    Eval,
}

impl ComponentType {
    pub const ALL: [ComponentType; 5] = [
        ComponentType::Agent,
        ComponentType::Tool,
        ComponentType::PromptTemplate,
        ComponentType::ResponseModel,
        ComponentType::Eval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Agent => "agent",
            ComponentType::Tool => "tool",
            ComponentType::PromptTemplate => "prompt_template",
            ComponentType::ResponseModel => "response_model",
            ComponentType::Eval => "eval",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "agent" | "agents" => Ok(ComponentType::Agent),
            "tool" | "tools" => Ok(ComponentType::Tool),
            "prompt" | "prompt_template" | "prompt_templates" => Ok(ComponentType::PromptTemplate),
            "response_model" | "response_models" => Ok(ComponentType::ResponseModel),
            "eval" | "evals" => Ok(ComponentType::Eval),
            other => eyre::bail!(
                "Unknown component type: '{}' (expected agent, tool, prompt_template, response_model or eval)",
                other
            ),
        }
    }
}

/// Component manifest structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComponentManifest {
    pub name: String,
    pub version: String,
    pub r#type: ComponentType,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub authors: Vec<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Overrides the project directory key derived from `type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_directory_key: Option<String>,

    pub files_to_copy: Vec<FileSpec>,

    #[serde(default)]
    pub python_dependencies: Vec<PythonDependency>,

    #[serde(default)]
    pub registry_dependencies: Vec<String>,

    #[serde(default)]
    pub environment_variables: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_usage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_add_instructions: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub supports_lilypad: bool,

    /// Template variable names and their default values
    #[serde(default)]
    pub template_variables: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::Name(name) => write!(f, "{}", name),
            Author::Detailed { name, email: Some(email) } => write!(f, "{} <{}>", name, email),
            Author::Detailed { name, email: None } => write!(f, "{}", name),
        }
    }
}

/// A file shipped with a component
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileSpec {
    /// Path relative to the manifest location
    pub source: String,

    /// Path relative to the component's target directory (defaults to `source`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl FileSpec {
    pub fn destination(&self) -> &str {
        self.destination.as_deref().unwrap_or(&self.source)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PythonDependency {
    Spec(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },
}

impl PythonDependency {
    /// Requirement string suitable for `pip install` / `uv add`
    pub fn requirement(&self) -> String {
        match self {
            PythonDependency::Spec(spec) => spec.clone(),
            PythonDependency::Detailed { name, version: Some(v) } => {
                if v.starts_with(['<', '>', '=', '!', '~']) {
                    format!("{}{}", name, v)
                } else {
                    format!("{}=={}", name, v)
                }
            }
            PythonDependency::Detailed { name, version: None } => name.clone(),
        }
    }
}

/// Requirements as shell arguments; specifiers like `pkg>=1.0` are double-quoted
pub fn shell_args(requirements: &[String]) -> String {
    requirements.iter().map(|r| shell_quote(r)).collect::<Vec<_>>().join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ',' | ':' | '@' | '+'));
    if plain {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

impl ComponentManifest {
    /// Load a manifest from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        Self::from_str(&content).with_context(|| format!("Invalid manifest {}", path.as_ref().display()))
    }

    /// Parse and validate a manifest from a JSON string
    pub fn from_str(content: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(content).context("Failed to parse component manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        Version::parse(&self.version).with_context(|| format!("Component '{}' has a bad version", self.name))?;

        if self.files_to_copy.is_empty() {
            eyre::bail!("Component '{}' lists no files_to_copy", self.name);
        }

        for file in &self.files_to_copy {
            if file.source.trim().is_empty() {
                eyre::bail!("Component '{}' has a file entry with an empty source", self.name);
            }
            check_relative(file.destination())
                .with_context(|| format!("Component '{}' has an unsafe destination", self.name))?;
        }

        Ok(())
    }

    pub fn python_requirements(&self) -> Vec<String> {
        self.python_dependencies.iter().map(PythonDependency::requirement).collect()
    }
}

/// Reject absolute paths and paths that climb out with `..`
pub fn check_relative(path: &str) -> Result<()> {
    let p = Path::new(path);
    if path.trim().is_empty() {
        eyre::bail!("Empty path");
    }
    for component in p.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => eyre::bail!("Path '{}' must stay inside the component directory", path),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_args_quotes_specifiers() {
        let reqs = vec![
            "mirascope>=1.0".to_string(),
            "exa-py".to_string(),
            "httpx[http2]~=0.27; python_version<'3.13'".to_string(),
        ];
        assert_eq!(
            shell_args(&reqs),
            r#""mirascope>=1.0" exa-py "httpx[http2]~=0.27; python_version<'3.13'""#
        );
        assert_eq!(shell_args(&["weird\"$name".to_string()]), r#""weird\"\$name""#);
        assert_eq!(shell_args(&[]), "");
    }

    const MINIMAL_MANIFEST: &str = r#"{
  "name": "dice_roller",
  "version": "0.1.0",
  "type": "tool",
  "files_to_copy": [{"source": "tool.py"}]
}"#;

    const FULL_MANIFEST: &str = r#"{
  "name": "text_summarization_agent",
  "version": "1.2.0",
  "type": "agent",
  "description": "Summarizes long documents",
  "authors": [{"name": "Sygaldry Team", "email": "team@example.com"}, "Jane Doe"],
  "license": "MIT",
  "files_to_copy": [
    {"source": "agent.py", "destination": "agent.py"},
    {"source": "prompts/system.md", "destination": "prompts/system.md"},
    {"source": "__init__.py"}
  ],
  "python_dependencies": ["mirascope>=1.24", {"name": "pydantic", "version": ">=2.0"}, {"name": "httpx", "version": "0.27.0"}],
  "registry_dependencies": ["web_search_tool@0.2.0"],
  "environment_variables": ["OPENAI_API_KEY"],
  "example_usage": "from agents.text_summarization_agent import summarize",
  "post_add_instructions": "Set OPENAI_API_KEY before running.",
  "tags": ["summarization", "text"],
  "supports_lilypad": true,
  "template_variables": {"provider": "openai", "model": "gpt-4o-mini", "stream": false}
}"#;

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = ComponentManifest::from_str(MINIMAL_MANIFEST).unwrap();
        assert_eq!(manifest.name, "dice_roller");
        assert_eq!(manifest.r#type, ComponentType::Tool);
        assert_eq!(manifest.files_to_copy[0].destination(), "tool.py");
        assert!(manifest.registry_dependencies.is_empty());
        assert!(manifest.template_variables.is_empty());
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = ComponentManifest::from_str(FULL_MANIFEST).unwrap();
        assert_eq!(manifest.r#type, ComponentType::Agent);
        assert_eq!(manifest.authors.len(), 2);
        assert_eq!(manifest.authors[0].to_string(), "Sygaldry Team <team@example.com>");
        assert_eq!(manifest.authors[1].to_string(), "Jane Doe");
        assert_eq!(manifest.files_to_copy.len(), 3);
        assert_eq!(
            manifest.python_requirements(),
            vec!["mirascope>=1.24", "pydantic>=2.0", "httpx==0.27.0"]
        );
        assert_eq!(manifest.template_variables["stream"], serde_json::json!(false));
        let keys: Vec<_> = manifest.template_variables.keys().collect();
        assert_eq!(keys, vec!["provider", "model", "stream"]);
    }

    #[test]
    fn test_missing_required_key() {
        let err = ComponentManifest::from_str(r#"{"name": "x", "version": "1.0.0", "type": "tool"}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("files_to_copy"));
    }

    #[test]
    fn test_empty_files_rejected() {
        let err = ComponentManifest::from_str(
            r#"{"name": "x", "version": "1.0.0", "type": "tool", "files_to_copy": []}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no files_to_copy"));
    }

    #[test]
    fn test_bad_version_rejected() {
        let err = ComponentManifest::from_str(
            r#"{"name": "x", "version": "one", "type": "tool", "files_to_copy": [{"source": "a.py"}]}"#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid version format"));
    }

    #[test]
    fn test_escaping_destination_rejected() {
        for dest in ["../outside.py", "/etc/passwd", "a/../../b.py"] {
            let json = format!(
                r#"{{"name": "x", "version": "1.0.0", "type": "tool",
                    "files_to_copy": [{{"source": "a.py", "destination": "{}"}}]}}"#,
                dest
            );
            assert!(ComponentManifest::from_str(&json).is_err(), "{}", dest);
        }
    }

    #[test]
    fn test_component_type_from_str() {
        assert_eq!("agents".parse::<ComponentType>().unwrap(), ComponentType::Agent);
        assert_eq!("prompt-template".parse::<ComponentType>().unwrap(), ComponentType::PromptTemplate);
        assert_eq!("Response_Model".parse::<ComponentType>().unwrap(), ComponentType::ResponseModel);
        assert!("widget".parse::<ComponentType>().is_err());
    }

    #[test]
    fn test_prompt_alias_deserializes() {
        let t: ComponentType = serde_json::from_str(r#""prompt""#).unwrap();
        assert_eq!(t, ComponentType::PromptTemplate);
    }
}
