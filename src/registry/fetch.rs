//! Fetching registry documents from HTTP(S) URLs or the local filesystem

use eyre::{Context, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::HttpConfig;

/// Where a registry document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Url(String),
    Path(PathBuf),
}

impl Location {
    /// Parse a source string: http(s) URLs stay URLs, `file://` and bare strings become paths
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Location::Url(source.to_string())
        } else if let Some(path) = source.strip_prefix("file://") {
            Location::Path(PathBuf::from(path))
        } else {
            Location::Path(crate::config::Config::expand_path(Path::new(source)))
        }
    }

    /// Like `parse`, but relative filesystem paths are taken from `base` instead of the working directory
    pub fn parse_relative_to(source: &str, base: &Path) -> Self {
        match Self::parse(source) {
            Location::Path(path) if path.is_relative() => Location::Path(normalize_path(&base.join(path))),
            other => other,
        }
    }

    /// Resolve `relative` against the directory containing this location
    pub fn join(&self, relative: &str) -> Location {
        if relative.starts_with("http://") || relative.starts_with("https://") || relative.starts_with("file://") {
            return Location::parse(relative);
        }

        match self {
            Location::Url(url) => {
                let (without_query, _) = url.split_once(['?', '#']).unwrap_or((url.as_str(), ""));
                let base = match without_query.rfind('/') {
                    Some(idx) if idx > without_query.find("://").map(|i| i + 2).unwrap_or(0) => {
                        &without_query[..=idx]
                    }
                    _ => without_query,
                };
                let base = if base.ends_with('/') { base.to_string() } else { format!("{}/", base) };
                Location::Url(normalize_url(&format!("{}{}", base, relative.trim_start_matches("./"))))
            }
            Location::Path(path) => {
                let rel = Path::new(relative);
                if rel.is_absolute() {
                    return Location::Path(rel.to_path_buf());
                }
                let dir = path.parent().unwrap_or_else(|| Path::new(""));
                Location::Path(normalize_path(&dir.join(rel)))
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Url(url) => write!(f, "{}", url),
            Location::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads documents and files from registry locations
#[derive(Debug, Clone)]
pub struct Fetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl Fetcher {
    pub fn new(http: &HttpConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(http.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            user_agent: http.user_agent.clone(),
        }
    }

    /// Read a UTF-8 document
    pub fn read_text(&self, location: &Location) -> Result<String> {
        let bytes = self.read_bytes(location)?;
        String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", location))
    }

    /// Read raw bytes
    pub fn read_bytes(&self, location: &Location) -> Result<Vec<u8>> {
        match location {
            Location::Url(url) => {
                log::debug!("GET {}", url);
                let mut response = self
                    .agent
                    .get(url)
                    .header("User-Agent", &self.user_agent)
                    .call()
                    .with_context(|| format!("Network request failed: {}", url))?;

                response
                    .body_mut()
                    .read_to_vec()
                    .with_context(|| format!("Failed to read response body from {}", url))
            }
            Location::Path(path) => {
                log::debug!("Reading {}", path.display());
                std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
            }
        }
    }

    /// Read and parse a JSON document
    pub fn read_json<T: serde::de::DeserializeOwned>(&self, location: &Location) -> Result<T> {
        let content = self.read_text(location)?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON from {}", location))
    }
}

/// Collapse `.` and `..` segments in a URL path
fn normalize_url(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    format!("{}://{}/{}", scheme, host, segments.join("/"))
}

/// Collapse `.` and `..` components without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
