use crate::arguments::VersionMode;
use crate::error::{Result, TagitError};
use log::debug;
use std::fmt;

/// A release version: `major.minor.patch`, or `major.minor.micro.patch` when a
/// micro component is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub micro: Option<u64>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            micro: None,
        }
    }

    pub fn with_micro(mut self, micro: u64) -> Self {
        self.micro = Some(micro);
        self
    }

    /// Parses an `--initial-version` value. One to four numeric segments are
    /// accepted and missing ones are zero-padded up to three.
    pub fn parse_initial(value: &str) -> Result<Self> {
        let segments: Vec<&str> = value.trim().split('.').collect();
        if segments.len() > 4 {
            return Err(TagitError::validation(format!(
                "Initial version '{}' has more than four components",
                value
            )));
        }

        let mut numbers = Vec::with_capacity(4);
        for segment in &segments {
            numbers.push(parse_component(segment, "initial version", value)?);
        }
        while numbers.len() < 3 {
            numbers.push(0);
        }

        Ok(from_components(&numbers))
    }

    /// Parses a tag such as `v1.2.3` or `0.3.1.2`.
    ///
    /// The first two segments are major and minor. What remains is the patch:
    /// a single segment, or `micro.patch` when there are two. A tag with only
    /// major and minor has no trailing patch component and reads as patch 0.
    pub fn parse_tag(tag: &str) -> Result<Self> {
        let raw = tag.trim();
        let raw = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw);

        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() < 2 {
            return Err(TagitError::validation(format!(
                "Tag '{}' does not match the expected format MAJOR.MINOR[.PATCH]",
                tag
            )));
        }
        if segments.len() > 4 {
            return Err(TagitError::validation(format!(
                "Tag '{}' has more than four version components",
                tag
            )));
        }

        let major = parse_component(segments[0], "major", tag)?;
        let minor = parse_component(segments[1], "minor", tag)?;
        let mut numbers = vec![major, minor];
        for segment in &segments[2..] {
            numbers.push(parse_component(segment, "patch", tag)?);
        }
        if numbers.len() == 2 {
            numbers.push(0);
        }

        Ok(from_components(&numbers))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.micro {
            Some(micro) => write!(f, "{}.{}.{}.{}", self.major, self.minor, micro, self.patch),
            None => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

fn from_components(numbers: &[u64]) -> Version {
    match numbers {
        [major, minor, micro, patch] => Version::new(*major, *minor, *patch).with_micro(*micro),
        [major, minor, patch, ..] => Version::new(*major, *minor, *patch),
        _ => Version::default(),
    }
}

fn parse_component(segment: &str, what: &str, source: &str) -> Result<u64> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(TagitError::validation(format!(
            "The {} component '{}' of '{}' is not a non-negative integer",
            what, segment, source
        )));
    }
    segment.parse::<u64>().map_err(|e| {
        TagitError::validation(format!(
            "The {} component '{}' of '{}' is out of range: {}",
            what, segment, source, e
        ))
    })
}

/// Operator supplied `--major/--minor/--micro/--patch` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub major: Option<u64>,
    pub minor: Option<u64>,
    pub micro: Option<u64>,
    pub patch: Option<u64>,
}

impl Overrides {
    /// Validates the raw command line values.
    pub fn parse(
        major: Option<&str>,
        minor: Option<&str>,
        micro: Option<&str>,
        patch: Option<&str>,
    ) -> Result<Self> {
        Ok(Overrides {
            major: parse_override(major, "major")?,
            minor: parse_override(minor, "minor")?,
            micro: parse_override(micro, "micro")?,
            patch: parse_override(patch, "patch")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.major.is_none() && self.minor.is_none() && self.micro.is_none() && self.patch.is_none()
    }

    fn apply(&self, version: &mut Version) {
        if let Some(major) = self.major {
            version.major = major;
        }
        if let Some(minor) = self.minor {
            version.minor = minor;
        }
        if let Some(micro) = self.micro {
            version.micro = Some(micro);
        }
        if let Some(patch) = self.patch {
            version.patch = patch;
        }
    }
}

fn parse_override(value: Option<&str>, name: &str) -> Result<Option<u64>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(TagitError::validation(format!(
            "--{} must be a non-negative integer, got '{}'",
            name, value
        )));
    }
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|e| TagitError::validation(format!("--{} value '{}' is out of range: {}", name, value, e)))
}

/// Computes the version for this run.
///
/// `previous` is the version read from the latest tag, `None` when the
/// repository has no tag yet, in which case `initial` is used and the commit
/// count is ignored. `wants_micro` is set when the tag template contains
/// `{micro}`: a version that never had a micro component then has its patch
/// moved into micro and the patch restarted at 0. Overrides are applied last.
pub fn resolve_version(
    previous: Option<Version>,
    commits_since_tag: usize,
    mode: VersionMode,
    overrides: &Overrides,
    initial: Version,
    wants_micro: bool,
) -> Version {
    let mut version = match previous {
        None => initial,
        Some(mut version) => {
            if commits_since_tag > 0 {
                let step = match mode {
                    VersionMode::Commits => commits_since_tag as u64,
                    VersionMode::Increment => 1,
                };
                version.patch = version.patch.saturating_add(step);
            }
            version
        }
    };

    if wants_micro && version.micro.is_none() && overrides.micro.is_none() {
        debug!(
            "Template uses {{micro}} but {} has none, moving patch {} into micro",
            version, version.patch
        );
        version.micro = Some(version.patch);
        version.patch = 0;
    }

    overrides.apply(&mut version);
    version
}
