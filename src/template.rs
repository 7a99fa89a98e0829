//! Template variable substitution for component files
//!
//! Supports `{{ var }}` placeholders with optional `|upper`, `|lower` and `|title` filters.
//! Placeholders naming unknown variables are left untouched.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)((?:\s*\|\s*[A-Za-z_]+)*)\s*\}\}").unwrap()
});

/// Variables available to a template, in insertion order
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    vars: IndexMap<String, String>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any earlier value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Set a variable from a JSON value (manifest defaults)
    pub fn set_value(&mut self, name: impl Into<String>, value: &serde_json::Value) {
        self.set(name, value_to_string(value));
    }

    /// Substitute every known placeholder in `text`
    pub fn render(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                match self.vars.get(name) {
                    Some(value) => apply_filters(value, &caps[2]),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Variable names referenced in `text` that have no value
    pub fn unresolved(&self, text: &str) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(text) {
            let name = &caps[1];
            if !self.vars.contains_key(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }
}

fn apply_filters(value: &str, filters: &str) -> String {
    filters
        .split('|')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .fold(value.to_string(), |acc, filter| match filter {
            "upper" => acc.to_uppercase(),
            "lower" => acc.to_lowercase(),
            "title" => title_case(&acc),
            other => {
                log::warn!("Unknown template filter '{}', leaving value unchanged", other);
                acc
            }
        })
}

/// Upper-case the first letter of each alphabetic run, lower-case the rest
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Render a JSON value the way component source files expect it (Python literals for scalars)
pub fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(true) => "True".to_string(),
        serde_json::Value::Bool(false) => "False".to_string(),
        serde_json::Value::Null => "None".to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
