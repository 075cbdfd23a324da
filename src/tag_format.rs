use crate::error::{Result, TagitError};
use crate::version::Version;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::debug;
use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

pub const DEFAULT_TAG_FORMAT: &str = "v{major}.{minor}.{patch}";

const VERSION_PLACEHOLDERS: [&str; 4] = ["major", "minor", "patch", "micro"];
const DATE_PLACEHOLDERS: [&str; 7] = [
    "year",
    "short_year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
];
const REQUIRED_PLACEHOLDERS: [&str; 3] = ["major", "minor", "patch"];

/// Sequences git refuses inside a ref name.
const FORBIDDEN_SEQUENCES: [&str; 2] = ["..", "@{"];
const FORBIDDEN_CHARS: [char; 7] = ['~', '^', ':', '?', '*', '[', '\\'];

/// A validated tag name template such as `v{major}.{minor}.{patch}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTemplate {
    template: String,
    placeholders: Vec<String>,
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"));

fn is_known(name: &str) -> bool {
    VERSION_PLACEHOLDERS.contains(&name) || DATE_PLACEHOLDERS.contains(&name)
}

impl TagTemplate {
    /// Parses and validates a template. Nothing here touches the repository,
    /// so callers run it before any mutation.
    pub fn parse(template: &str) -> Result<Self> {
        let regex = &*PLACEHOLDER;

        let mut placeholders = Vec::new();
        for captures in regex.captures_iter(template) {
            let name = &captures[1];
            if !is_known(name) {
                return Err(TagitError::validation(format!(
                    "Unknown placeholder '{{{}}}' in tag format '{}'",
                    name, template
                )));
            }
            if !placeholders.iter().any(|p| p == name) {
                placeholders.push(name.to_string());
            }
        }

        let literal = regex.replace_all(template, "");
        if literal.contains('{') || literal.contains('}') {
            return Err(TagitError::validation(format!(
                "Unbalanced braces in tag format '{}'",
                template
            )));
        }

        for required in REQUIRED_PLACEHOLDERS {
            if !placeholders.iter().any(|p| p == required) {
                return Err(TagitError::validation(format!(
                    "Tag format '{}' must contain {{{}}}",
                    template, required
                )));
            }
        }

        check_literal_text(template, &regex.replace_all(template, "0"))?;

        let parsed = TagTemplate {
            template: template.to_string(),
            placeholders,
        };
        parsed.check_sample()?;

        debug!("Using tag format '{}'", parsed.template);
        Ok(parsed)
    }

    pub fn has_micro(&self) -> bool {
        self.placeholders.iter().any(|p| p == "micro")
    }

    /// Substitutes version and date/time placeholders. An absent micro
    /// component renders as `0`. When the template has no `{micro}`, a micro
    /// component is carried in `{patch}` as `micro.patch`.
    pub fn format(&self, version: &Version, now: &NaiveDateTime) -> String {
        let carry_micro = !self.has_micro();

        PLACEHOLDER
            .replace_all(&self.template, |captures: &Captures| {
                match &captures[1] {
                    "major" => version.major.to_string(),
                    "minor" => version.minor.to_string(),
                    "patch" => match version.micro {
                        Some(micro) if carry_micro => format!("{}.{}", micro, version.patch),
                        _ => version.patch.to_string(),
                    },
                    "micro" => version.micro.unwrap_or(0).to_string(),
                    "year" => format!("{:04}", now.year()),
                    "short_year" => format!("{:02}", now.year().rem_euclid(100)),
                    "month" => format!("{:02}", now.month()),
                    "day" => format!("{:02}", now.day()),
                    "hour" => format!("{:02}", now.hour()),
                    "minute" => format!("{:02}", now.minute()),
                    "second" => format!("{:02}", now.second()),
                    _ => captures[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Reads the version back out of a tag this template produced, so custom
    /// prefixes and suffixes round-trip. Tags in any other shape go through
    /// [Version::parse_tag].
    pub fn parse_version(&self, tag: &str) -> Result<Version> {
        let tag = tag.trim();
        let matcher = self.tag_regex()?;
        let Some(captures) = matcher.captures(tag) else {
            debug!("Tag '{}' does not follow '{}', parsing it as a plain version", tag, self.template);
            return Version::parse_tag(tag);
        };

        let component = |name: &str| -> Result<Option<u64>> {
            captures
                .name(name)
                .map(|m| {
                    m.as_str().parse::<u64>().map_err(|e| {
                        TagitError::validation(format!(
                            "The {} component '{}' of '{}' is out of range: {}",
                            name,
                            m.as_str(),
                            tag,
                            e
                        ))
                    })
                })
                .transpose()
        };

        let mut version = Version::new(
            component("major")?.unwrap_or_default(),
            component("minor")?.unwrap_or_default(),
            component("patch")?.unwrap_or_default(),
        );
        version.micro = component("micro")?;
        if version.micro.is_none() {
            version.micro = component("carried_micro")?;
        }
        debug!("Tag '{}' read as version {}", tag, version);
        Ok(version)
    }

    /// An anchored regex matching the tags this template renders. The first
    /// occurrence of each version placeholder is captured.
    fn tag_regex(&self) -> Result<Regex> {
        let mut pattern = String::from("^");
        let mut captured: Vec<&str> = Vec::new();
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(&self.template) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            pattern.push_str(&regex::escape(&self.template[last..whole.start()]));
            last = whole.end();

            let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let first = !captured.contains(&name);
            match name {
                "patch" if first && !self.has_micro() => {
                    pattern.push_str(r"(?:(?P<carried_micro>\d+)\.)?(?P<patch>\d+)")
                }
                "major" | "minor" | "patch" | "micro" if first => {
                    pattern.push_str(&format!(r"(?P<{}>\d+)", name))
                }
                "year" => pattern.push_str(r"\d{4}"),
                "major" | "minor" | "patch" | "micro" => pattern.push_str(r"\d+"),
                _ => pattern.push_str(r"\d{2}"),
            }
            captured.push(name);
        }
        pattern.push_str(&regex::escape(&self.template[last..]));
        pattern.push('$');
        Ok(Regex::new(&pattern)?)
    }

    /// Renders the template with sample values and asks git whether the
    /// result is a usable tag name.
    fn check_sample(&self) -> Result<()> {
        let sample_time = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let sample = self.format(&Version::new(1, 2, 3).with_micro(4), &sample_time);
        if !git2::Reference::is_valid_name(&format!("refs/tags/{}", sample)) {
            return Err(TagitError::security(format!(
                "Tag format '{}' produces an invalid tag name ('{}')",
                self.template, sample
            )));
        }
        Ok(())
    }
}

impl fmt::Display for TagTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn check_literal_text(template: &str, literal: &str) -> Result<()> {
    if let Some(c) = literal
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(TagitError::security(format!(
            "Tag format '{}' contains the disallowed character {:?}",
            template, c
        )));
    }
    if let Some(sequence) = FORBIDDEN_SEQUENCES.iter().find(|s| literal.contains(**s)) {
        return Err(TagitError::security(format!(
            "Tag format '{}' contains the disallowed sequence '{}'",
            template, sequence
        )));
    }
    if literal.starts_with('-') {
        return Err(TagitError::security(format!(
            "Tag format '{}' must not start with '-'",
            template
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_default_format() {
        let template = TagTemplate::parse(DEFAULT_TAG_FORMAT).unwrap();
        let tag = template.format(&Version::new(1, 2, 7), &at(2024, 5, 6, 7, 8, 9));
        assert_eq!(tag, "v1.2.7");
        assert!(!template.has_micro());
    }

    #[test]
    fn test_micro_format() {
        let template = TagTemplate::parse("v{major}.{minor}.{micro}.{patch}").unwrap();
        assert!(template.has_micro());
        let version = Version::new(0, 3, 2).with_micro(1);
        assert_eq!(template.format(&version, &at(2024, 1, 1, 0, 0, 0)), "v0.3.1.2");
        assert_eq!(
            template.format(&Version::new(1, 2, 3), &at(2024, 1, 1, 0, 0, 0)),
            "v1.2.0.3"
        );
    }

    #[test]
    fn test_patch_carries_micro_without_micro_placeholder() {
        let template = TagTemplate::parse(DEFAULT_TAG_FORMAT).unwrap();
        let version = Version::new(0, 3, 3).with_micro(1);
        assert_eq!(template.format(&version, &at(2024, 1, 1, 0, 0, 0)), "v0.3.1.3");
    }

    #[test]
    fn test_parse_version_with_custom_prefix() {
        let template = TagTemplate::parse("release-{major}.{minor}.{patch}").unwrap();
        assert_eq!(
            template.parse_version("release-1.2.3").unwrap(),
            Version::new(1, 2, 3)
        );
        assert_eq!(
            template.parse_version("release-0.3.1.2").unwrap(),
            Version::new(0, 3, 2).with_micro(1)
        );
        // tags from before the template was adopted still parse
        assert_eq!(template.parse_version("v1.0.0").unwrap(), Version::new(1, 0, 0));
        assert!(template.parse_version("release-candidate").is_err());
    }

    #[test]
    fn test_parse_version_round_trips_format() {
        let now = at(2024, 3, 5, 14, 7, 9);
        for (raw, version) in [
            ("build-{year}{month}{day}-{major}.{minor}.{patch}", Version::new(1, 2, 7)),
            ("{major}.{minor}.{micro}.{patch}-stable", Version::new(2, 0, 4).with_micro(9)),
            ("v{major}.{minor}.{patch}", Version::new(0, 3, 3).with_micro(1)),
        ] {
            let template = TagTemplate::parse(raw).unwrap();
            let tag = template.format(&version, &now);
            assert_eq!(template.parse_version(&tag).unwrap(), version, "{}", tag);
        }
    }

    #[test]
    fn test_parse_version_falls_back_for_micro_template() {
        let template = TagTemplate::parse("v{major}.{minor}.{micro}.{patch}").unwrap();
        assert_eq!(template.parse_version("v1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn test_date_placeholders_are_zero_padded() {
        let template = TagTemplate::parse(
            "release-{year}{month}{day}-{hour}{minute}{second}-{short_year}/{major}.{minor}.{patch}",
        )
        .unwrap();
        let tag = template.format(&Version::new(1, 0, 0), &at(2009, 3, 4, 5, 6, 7));
        assert_eq!(tag, "release-20090304-050607-09/1.0.0");
    }

    #[test]
    fn test_unknown_placeholder_is_rejected() {
        let err = TagTemplate::parse("v{major}.{minor}.{patch}.{unknown}").unwrap_err();
        assert!(matches!(err, TagitError::Validation(_)));
        assert!(err.to_string().contains("{unknown}"));
    }

    #[test]
    fn test_missing_required_placeholder() {
        let err = TagTemplate::parse("v{major}.{minor}").unwrap_err();
        assert!(matches!(err, TagitError::Validation(_)));
        assert!(TagTemplate::parse("").is_err());
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(
            TagTemplate::parse("v{major}.{minor}.{patch}}").unwrap_err(),
            TagitError::Validation(_)
        ));
        assert!(matches!(
            TagTemplate::parse("v{major.{minor}.{patch}").unwrap_err(),
            TagitError::Validation(_)
        ));
    }

    #[test]
    fn test_disallowed_characters_are_security_errors() {
        for template in [
            "v {major}.{minor}.{patch}",
            "v{major}.{minor}.{patch}~1",
            "v{major}:{minor}:{patch}",
            "v{major}..{minor}.{patch}",
            "v@{{major}.{minor}.{patch}",
            "-{major}.{minor}.{patch}",
            "v{major}.{minor}.{patch}.lock",
        ] {
            let err = TagTemplate::parse(template).unwrap_err();
            assert!(
                matches!(err, TagitError::Security(_) | TagitError::Validation(_)),
                "{} gave {:?}",
                template,
                err
            );
        }
        assert!(matches!(
            TagTemplate::parse("v{major}.{minor}.{patch}.lock").unwrap_err(),
            TagitError::Security(_)
        ));
        assert!(matches!(
            TagTemplate::parse("v{major}:{minor}.{patch}").unwrap_err(),
            TagitError::Security(_)
        ));
    }

    #[test]
    fn test_repeated_placeholders() {
        let template = TagTemplate::parse("{major}.{minor}.{patch}-{major}").unwrap();
        assert_eq!(
            template.format(&Version::new(3, 1, 4), &at(2024, 1, 1, 0, 0, 0)),
            "3.1.4-3"
        );
    }
}
