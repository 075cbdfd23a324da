use crate::release::DEFAULT_INITIAL_VERSION;
use crate::tag_format::DEFAULT_TAG_FORMAT;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How commits since the latest tag move the patch number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Default)]
pub enum VersionMode {
    /// Add the number of commits since the tag
    #[default]
    Commits,
    /// Add one, however many commits there are
    Increment,
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Automated tagging and version updating.",
    bin_name = "tagit",
    after_help = "Examples:\n  tagit -f configure.ac -f opkg-upgrade.sh --scheme-file custom_schemes.json\n  tagit --file configure.ac --tag-format 'v{major}.{minor}.{micro}.{patch}'\n  tagit"
)]
pub struct Arguments {
    /// File to be updated (e.g. configure.ac). Can be used multiple times.
    #[arg(long = "file", short = 'f', value_name = "PATH")]
    pub files: Vec<PathBuf>,
    /// JSON file containing additional versioning schemes
    #[arg(long, env = "TAGIT_SCHEME_FILE", value_name = "PATH")]
    pub scheme_file: Option<PathBuf>,
    /// Tag name template; must contain {major}, {minor} and {patch}. The latest
    /// tag is read back through the same template.
    #[arg(long, env = "TAGIT_TAG_FORMAT", default_value = DEFAULT_TAG_FORMAT)]
    pub tag_format: String,
    /// Version used when the repository has no tag yet
    #[arg(long, default_value = DEFAULT_INITIAL_VERSION)]
    pub initial_version: String,
    #[arg(long, value_enum, ignore_case = true, default_value_t = VersionMode::Commits)]
    pub version_mode: VersionMode,
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub major: Option<String>,
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub minor: Option<String>,
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub micro: Option<String>,
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub patch: Option<String>,
    /// Update and commit files but do not create a tag
    #[arg(long)]
    pub no_tag: bool,
    /// Report what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Only use the first matching scheme for each file
    #[arg(long)]
    pub no_fallback: bool,
    /// Path inside the git repository
    #[arg(long, short, default_value = "./")]
    pub path: String,
    #[arg(long, short)]
    pub verbose: bool,
}
