use crate::schemes::SchemeDefinition;

/// `(name, supports_micro, [(field, pattern, replacement)])`
type BuiltinScheme = (&'static str, bool, &'static [(&'static str, &'static str, &'static str)]);

const BUILTIN_SCHEMES: &[BuiltinScheme] = &[
    (
        "ac_init_micro",
        true,
        &[(
            "version",
            r"(AC_INIT\(\[.*?\],\s*\[)\d+\.\d+\.\d+\.\d+(\],\s*\[.*?\]\))",
            "${1}{major}.{minor}.{micro}.{patch}${2}",
        )],
    ),
    (
        "ac_init",
        false,
        &[(
            "version",
            r"(AC_INIT\(\[.*?\],\s*\[)\d+\.\d+\.\d+(\],\s*\[.*?\]\))",
            "${1}{major}.{minor}.{patch}${2}",
        )],
    ),
    (
        "version_assignment_micro",
        true,
        &[(
            "version",
            r#"VERSION\s*=\s*"\d+\.\d+\.\d+\.\d+""#,
            r#"VERSION = "{major}.{minor}.{micro}.{patch}""#,
        )],
    ),
    (
        "version_assignment",
        false,
        &[(
            "version",
            r#"VERSION\s*=\s*"\d+\.\d+\.\d+""#,
            r#"VERSION = "{major}.{minor}.{patch}""#,
        )],
    ),
    (
        "define_ver",
        false,
        &[
            ("ver_major", r"define\(ver_major,\s*\d+\)", "define(ver_major, {major})"),
            ("ver_minor", r"define\(ver_minor,\s*\d+\)", "define(ver_minor, {minor})"),
            ("ver_micro", r"define\(ver_micro,\s*\d+\)", "define(ver_micro, {patch})"),
        ],
    ),
    (
        "env_version_micro",
        true,
        &[
            ("VERSION_MAJOR", r#"VERSION_MAJOR="\d+""#, r#"VERSION_MAJOR="{major}""#),
            ("VERSION_MINOR", r#"VERSION_MINOR="\d+""#, r#"VERSION_MINOR="{minor}""#),
            ("VERSION_MICRO", r#"VERSION_MICRO="\d+""#, r#"VERSION_MICRO="{micro}""#),
            ("VERSION_PATCH", r#"VERSION_PATCH="\d+""#, r#"VERSION_PATCH="{patch}""#),
        ],
    ),
    (
        "env_version",
        false,
        &[
            ("VERSION_MAJOR", r#"VERSION_MAJOR="\d+""#, r#"VERSION_MAJOR="{major}""#),
            ("VERSION_MINOR", r#"VERSION_MINOR="\d+""#, r#"VERSION_MINOR="{minor}""#),
            ("VERSION_PATCH", r#"VERSION_PATCH="\d+""#, r#"VERSION_PATCH="{patch}""#),
        ],
    ),
];

/// The schemes every run starts with, in registration order.
pub fn definitions() -> Vec<SchemeDefinition> {
    BUILTIN_SCHEMES
        .iter()
        .map(|(name, supports_micro, fields)| SchemeDefinition {
            name: name.to_string(),
            patterns: fields
                .iter()
                .map(|(field, pattern, _)| (field.to_string(), pattern.to_string()))
                .collect(),
            replacements: fields
                .iter()
                .map(|(field, _, replacement)| (field.to_string(), replacement.to_string()))
                .collect(),
            supports_micro: *supports_micro,
        })
        .collect()
}
