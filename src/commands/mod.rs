//! Subcommand implementations

pub mod add;
pub mod build;
pub mod completions;
pub mod docs;
pub mod init;
pub mod list;
pub mod search;
pub mod source;

use eyre::Result;
use std::fmt::Display;
use std::path::PathBuf;
use terminal_size::{Width, terminal_size};

use crate::config::Config;
use crate::project::ProjectConfig;
use crate::registry::RegistryClient;
use crate::registry::fetch::{Fetcher, Location};
use crate::registry::manifest::ComponentType;

/// State shared by every subcommand
pub struct Context {
    pub config: Config,
    /// Project root
    pub root: PathBuf,
    pub quiet: bool,
}

impl Context {
    /// Print a progress line unless --quiet
    pub fn status(&self, message: impl Display) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    /// Anchor a relative path source on the project root; URLs pass through
    pub fn resolve_location(&self, source: &str) -> String {
        Location::parse_relative_to(source, &self.root).to_string()
    }

    /// Registry client over the project's enabled sources, optionally narrowed to one
    pub fn registry_client(&self, project: &ProjectConfig, source: Option<&str>) -> Result<RegistryClient> {
        let sources = project
            .sources(&self.config.default_registry)
            .into_iter()
            .map(|mut source| {
                source.url = self.resolve_location(&source.url);
                source
            })
            .collect();
        let client = RegistryClient::new(sources, Fetcher::new(&self.config.http));
        match source {
            Some(name) => client.only_source(name),
            None => Ok(client),
        }
    }
}

/// Parse an optional `--type` flag
pub fn parse_type(input: Option<&str>) -> Result<Option<ComponentType>> {
    input.map(str::parse).transpose()
}

/// Get terminal width, defaulting to 80 if not available
pub fn terminal_width() -> usize {
    terminal_size().map(|(Width(w), _)| w as usize).unwrap_or(80)
}

/// Shorten `s` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type(None).unwrap(), None);
        assert_eq!(parse_type(Some("tool")).unwrap(), Some(ComponentType::Tool));
        assert!(parse_type(Some("gadget")).is_err());
    }

    #[test]
    fn test_resolve_location_uses_project_root() {
        let ctx = Context {
            config: Config::default(),
            root: PathBuf::from("/work/project"),
            quiet: true,
        };
        assert_eq!(ctx.resolve_location("../registry/index.json"), "/work/registry/index.json");
        assert_eq!(ctx.resolve_location("./component.json"), "/work/project/component.json");
        assert_eq!(
            ctx.resolve_location("https://example.com/index.json"),
            "https://example.com/index.json"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer description", 8), "a longe…");
        assert_eq!(truncate("abc", 0), "");
    }
}
