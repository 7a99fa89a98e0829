//! Component versions and identifiers
//!
//! Handles `name`, `name@version` and direct manifest locations given to `sygaldry add`.

use eyre::Result;
use lazy_regex::regex_is_match;
use std::cmp::Ordering;
use std::fmt;

/// A component version (`major.minor.patch[-pre]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl Version {
    /// Parse a version string like "1.2.3", "1.2", "v1.0.0" or "2.0.0-beta.1"
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let raw = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let (core, pre) = match raw.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (raw, None),
        };

        if core.is_empty() || pre.is_some_and(|p| p.is_empty() || !regex_is_match!(r"^[0-9A-Za-z.-]+$", p)) {
            eyre::bail!("Invalid version format: '{}' (expected MAJOR.MINOR.PATCH)", input);
        }

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            eyre::bail!("Invalid version format: '{}' (expected MAJOR.MINOR.PATCH)", input);
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                eyre::bail!("Invalid version format: '{}' (expected MAJOR.MINOR.PATCH)", input);
            }
            *slot = part
                .parse()
                .map_err(|_| eyre::eyre!("Invalid version format: '{}' (number out of range)", input))?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre: pre.map(str::to_string),
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre(a, b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dot-separated identifiers; numeric ones compare numerically and sort first
fn compare_pre(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(n), Ok(m)) => n.cmp(&m),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

/// Which version of a named component to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionReq {
    Latest,
    Exact(Version),
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionReq::Latest => write!(f, "latest"),
            VersionReq::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// A component identifier as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentRef {
    /// Looked up by name in the registry index
    Named { name: String, version: VersionReq },
    /// Manifest fetched directly from a URL or path
    Manifest(String),
}

impl ComponentRef {
    pub fn parse(identifier: &str) -> Result<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            eyre::bail!("Component identifier cannot be empty");
        }

        if is_manifest_location(identifier) {
            return Ok(ComponentRef::Manifest(identifier.to_string()));
        }

        let (name, version) = match identifier.split_once('@') {
            Some((name, "latest")) | Some((name, "")) => (name, VersionReq::Latest),
            Some((name, version)) => (name, VersionReq::Exact(Version::parse(version)?)),
            None => (identifier, VersionReq::Latest),
        };

        validate_name(name)?;

        Ok(ComponentRef::Named {
            name: name.to_string(),
            version,
        })
    }

    /// Name used for dependency bookkeeping
    pub fn display_name(&self) -> &str {
        match self {
            ComponentRef::Named { name, .. } => name,
            ComponentRef::Manifest(location) => location,
        }
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentRef::Named {
                name,
                version: VersionReq::Latest,
            } => write!(f, "{}", name),
            ComponentRef::Named { name, version } => write!(f, "{}@{}", name, version),
            ComponentRef::Manifest(location) => write!(f, "{}", location),
        }
    }
}

/// Check a component name against the registry naming rules
pub fn validate_name(name: &str) -> Result<()> {
    if !regex_is_match!(r"^[a-z0-9][a-z0-9_-]*$", name) {
        eyre::bail!(
            "Invalid component name: '{}' (use lowercase letters, digits, '_' or '-')",
            name
        );
    }
    Ok(())
}

fn is_manifest_location(identifier: &str) -> bool {
    identifier.starts_with("http://")
        || identifier.starts_with("https://")
        || identifier.starts_with("file://")
        || identifier.ends_with(".json")
}
