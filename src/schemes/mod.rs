use crate::error::{Result, TagitError};
use crate::version::Version;
use log::{debug, info};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

pub mod builtin;
pub mod matcher;

pub use matcher::{fallback_candidates, find_matching_scheme, select_scheme};

const REPLACEMENT_PLACEHOLDERS: [&str; 4] = ["major", "minor", "patch", "micro"];

/// The on-disk shape of a scheme, as found in a `--scheme-file`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemeDefinition {
    pub name: String,
    pub patterns: BTreeMap<String, String>,
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
    #[serde(default)]
    pub supports_micro: bool,
}

/// One pattern of a scheme. A field without a replacement only takes part in
/// matching.
#[derive(Debug, Clone)]
pub struct SchemeField {
    pub name: String,
    pub pattern: Regex,
    pub replacement: Option<String>,
}

/// A named set of compiled patterns and their replacement templates.
#[derive(Debug, Clone)]
pub struct Scheme {
    name: String,
    fields: Vec<SchemeField>,
    supports_micro: bool,
}

/// Matches `${...}` capture references so they are left alone, and `{name}`
/// placeholders so they can be interpolated.
static REPLACEMENT_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{[^}]*\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("replacement placeholder pattern is valid")
});

static GROUP_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\g<([A-Za-z0-9_]+)>|\\([0-9]+)").expect("group reference pattern is valid"));

/// Rewrites `\g<1>`, `\g<name>` and `\1` group references into the `${1}`
/// form the regex crate understands.
fn normalize_group_references(replacement: &str) -> String {
    GROUP_REFERENCE
        .replace_all(replacement, |captures: &Captures| {
            let group = captures
                .get(1)
                .or_else(|| captures.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            format!("${{{}}}", group)
        })
        .into_owned()
}

impl Scheme {
    /// Compiles a definition. Invalid regexes, replacements without a
    /// pattern, and unknown placeholders are configuration errors.
    pub fn compile(definition: SchemeDefinition) -> Result<Self> {
        let SchemeDefinition {
            name,
            patterns,
            mut replacements,
            supports_micro,
        } = definition;

        if patterns.is_empty() {
            return Err(TagitError::config(format!("Scheme '{}' has no patterns", name)));
        }
        if let Some(orphan) = replacements.keys().find(|key| !patterns.contains_key(*key)) {
            return Err(TagitError::config(format!(
                "Scheme '{}' has a replacement for '{}' but no pattern",
                name, orphan
            )));
        }

        let mut fields = Vec::with_capacity(patterns.len());
        for (field, pattern) in patterns {
            let pattern = Regex::new(&pattern).map_err(|e| {
                TagitError::config(format!(
                    "Scheme '{}' field '{}' has an invalid pattern: {}",
                    name, field, e
                ))
            })?;

            let replacement = match replacements.remove(&field) {
                Some(replacement) => {
                    let replacement = normalize_group_references(&replacement);
                    for captures in REPLACEMENT_PLACEHOLDER.captures_iter(&replacement) {
                        if let Some(placeholder) = captures.get(1) {
                            if !REPLACEMENT_PLACEHOLDERS.contains(&placeholder.as_str()) {
                                return Err(TagitError::config(format!(
                                    "Scheme '{}' field '{}' uses unknown placeholder '{{{}}}'",
                                    name,
                                    field,
                                    placeholder.as_str()
                                )));
                            }
                        }
                    }
                    Some(replacement)
                }
                None => None,
            };

            fields.push(SchemeField {
                name: field,
                pattern,
                replacement,
            });
        }

        Ok(Scheme {
            name,
            fields,
            supports_micro,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[SchemeField] {
        &self.fields
    }

    pub fn supports_micro(&self) -> bool {
        self.supports_micro
    }

    /// True when any of the scheme's patterns is found in `content`.
    pub fn matches(&self, content: &str) -> bool {
        self.fields.iter().any(|field| field.pattern.is_match(content))
    }

    /// Runs every field's substitution over `content`.
    pub fn apply(&self, content: &str, version: &Version) -> String {
        let mut updated = content.to_string();
        for field in &self.fields {
            let Some(template) = &field.replacement else {
                continue;
            };
            let replacement = interpolate(template, version);
            updated = field
                .pattern
                .replace_all(&updated, replacement.as_str())
                .into_owned();
        }
        updated
    }
}

fn interpolate(template: &str, version: &Version) -> String {
    REPLACEMENT_PLACEHOLDER
        .replace_all(template, |captures: &Captures| match captures.get(1).map(|m| m.as_str()) {
            Some("major") => version.major.to_string(),
            Some("minor") => version.minor.to_string(),
            Some("patch") => version.patch.to_string(),
            Some("micro") => version.micro.unwrap_or(0).to_string(),
            _ => captures[0].to_string(),
        })
        .into_owned()
}

/// The schemes available to a run: built-ins first, then any loaded from a
/// scheme file. Registration order decides which scheme wins a file.
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    schemes: Vec<Scheme>,
}

impl SchemeRegistry {
    pub fn builtin() -> Result<Self> {
        Self::from_definitions(builtin::definitions())
    }

    pub fn from_definitions(definitions: Vec<SchemeDefinition>) -> Result<Self> {
        let schemes = definitions
            .into_iter()
            .map(Scheme::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(SchemeRegistry { schemes })
    }

    /// Appends the schemes from a JSON scheme file.
    pub fn extend_from_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let definitions = load_scheme_file(path)?;
        let count = definitions.len();
        for definition in definitions {
            self.schemes.push(Scheme::compile(definition)?);
        }
        info!("{} additional versioning schemes loaded from '{}'", count, path.display());
        Ok(self)
    }

    pub fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }

    pub fn get(&self, name: &str) -> Option<&Scheme> {
        self.schemes.iter().find(|scheme| scheme.name == name)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

/// Reads a scheme file: a JSON array of scheme definitions.
pub fn load_scheme_file(path: impl AsRef<Path>) -> Result<Vec<SchemeDefinition>> {
    let path = path.as_ref();
    debug!("Reading scheme file '{}'", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| {
        TagitError::config(format!("Error reading the scheme file '{}': {}", path.display(), e))
    })?;
    parse_scheme_definitions(&contents)
}

pub fn parse_scheme_definitions(contents: &str) -> Result<Vec<SchemeDefinition>> {
    let value: serde_json::Value = serde_json::from_str(contents)
        .map_err(|e| TagitError::config(format!("The scheme file is not valid JSON: {}", e)))?;
    if !value.is_array() {
        return Err(TagitError::config(
            "The scheme file must contain a list of versioning schemes",
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| TagitError::config(format!("Malformed scheme definition: {}", e)))
}
