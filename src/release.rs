use crate::arguments::{Arguments, VersionMode};
use crate::error::{Result, TagitError};
use crate::git::VersionControl;
use crate::schemes::SchemeRegistry;
use crate::tag_format::{DEFAULT_TAG_FORMAT, TagTemplate};
use crate::updater::{FileOutcome, UpdateOptions, update_target};
use crate::version::{Overrides, Version, resolve_version};
use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use std::path::PathBuf;

pub const DEFAULT_INITIAL_VERSION: &str = "0.1.0";

/// Everything a release run is configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub files: Vec<PathBuf>,
    pub tag_format: String,
    pub initial_version: String,
    pub version_mode: VersionMode,
    pub major: Option<String>,
    pub minor: Option<String>,
    pub micro: Option<String>,
    pub patch: Option<String>,
    pub no_tag: bool,
    pub dry_run: bool,
    pub fallback: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        ReleaseOptions {
            files: Vec::new(),
            tag_format: DEFAULT_TAG_FORMAT.to_string(),
            initial_version: DEFAULT_INITIAL_VERSION.to_string(),
            version_mode: VersionMode::default(),
            major: None,
            minor: None,
            micro: None,
            patch: None,
            no_tag: false,
            dry_run: false,
            fallback: true,
        }
    }
}

impl From<&Arguments> for ReleaseOptions {
    fn from(args: &Arguments) -> Self {
        ReleaseOptions {
            files: args.files.clone(),
            tag_format: args.tag_format.clone(),
            initial_version: args.initial_version.clone(),
            version_mode: args.version_mode,
            major: args.major.clone(),
            minor: args.minor.clone(),
            micro: args.micro.clone(),
            patch: args.patch.clone(),
            no_tag: args.no_tag,
            dry_run: args.dry_run,
            fallback: !args.no_fallback,
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    pub previous_tag: Option<String>,
    pub commits_since_tag: usize,
    pub version: Version,
    pub tag: String,
    pub files: Vec<(PathBuf, FileOutcome)>,
    pub committed: bool,
    pub tag_created: bool,
}

/// A target file as given on the command line and its resolved location.
struct Target {
    given: PathBuf,
    resolved: PathBuf,
}

pub struct Release<'a, V: VersionControl> {
    vcs: &'a V,
    schemes: &'a SchemeRegistry,
    root: PathBuf,
    options: ReleaseOptions,
}

impl<'a, V: VersionControl> Release<'a, V> {
    /// `root` is the repository's working directory; target files must lie
    /// inside it.
    pub fn new(vcs: &'a V, schemes: &'a SchemeRegistry, root: impl Into<PathBuf>, options: ReleaseOptions) -> Self {
        Release {
            vcs,
            schemes,
            root: root.into(),
            options,
        }
    }

    pub fn run(&self) -> Result<ReleaseReport> {
        self.run_at(Local::now().naive_local())
    }

    /// Runs the release with `now` as the time for date placeholders.
    ///
    /// Every check that can fail without side effects runs before the first
    /// file is written.
    pub fn run_at(&self, now: NaiveDateTime) -> Result<ReleaseReport> {
        let template = TagTemplate::parse(&self.options.tag_format)?;
        let overrides = Overrides::parse(
            self.options.major.as_deref(),
            self.options.minor.as_deref(),
            self.options.micro.as_deref(),
            self.options.patch.as_deref(),
        )?;
        if !overrides.is_empty() {
            debug!("Version overrides: {:?}", overrides);
        }
        let initial = Version::parse_initial(&self.options.initial_version)?;
        let targets = self.resolve_targets()?;

        if !self.vcs.is_clean()? {
            return Err(TagitError::git(
                "The working directory is not clean. Please commit or stash your changes.",
            ));
        }

        let previous_tag = self.vcs.latest_tag()?;
        let (previous, commits_since_tag) = match &previous_tag {
            Some(tag) => {
                let previous = template.parse_version(tag)?;
                let commits = self.vcs.commits_since(tag)?;
                info!("Latest tag: {}, commits since tag: {}", tag, commits);
                (Some(previous), commits)
            }
            None => {
                warn!(
                    "No existing tags found. Initializing version to {}.",
                    self.options.initial_version
                );
                (None, 0)
            }
        };

        let version = resolve_version(
            previous,
            commits_since_tag,
            self.options.version_mode,
            &overrides,
            initial,
            template.has_micro(),
        );
        info!("Version for this run: {}", version);

        let update_options = UpdateOptions {
            dry_run: self.options.dry_run,
            fallback: self.options.fallback,
        };

        let mut files = Vec::with_capacity(targets.len());
        let mut changed = Vec::new();
        for target in &targets {
            let outcome = update_target(&target.resolved, &version, self.schemes.schemes(), update_options)?;
            if outcome.changed() {
                changed.push(target.resolved.clone());
            }
            files.push((target.given.clone(), outcome));
        }

        if targets.is_empty() && !self.options.no_tag {
            warn!("No files specified with -f/--file. Only a tag will be created without updating any files.");
        }

        let committed = self.commit(&changed, &version, previous_tag.as_deref(), commits_since_tag)?;

        let tag = template.format(&version, &now);
        let tag_created = self.tag(&tag)?;

        Ok(ReleaseReport {
            previous_tag,
            commits_since_tag,
            version,
            tag,
            files,
            committed,
            tag_created,
        })
    }

    /// Checks that every target exists and lies inside the repository before
    /// anything is modified.
    fn resolve_targets(&self) -> Result<Vec<Target>> {
        let root = self
            .root
            .canonicalize()
            .map_err(|e| TagitError::file(&self.root, format!("could not be resolved: {}", e)))?;

        let mut targets = Vec::with_capacity(self.options.files.len());
        for given in &self.options.files {
            if !given.is_file() {
                return Err(TagitError::file(given, "not found. Operation aborted."));
            }
            let resolved = given
                .canonicalize()
                .map_err(|e| TagitError::file(given, format!("could not be resolved: {}", e)))?;
            if !resolved.starts_with(&root) {
                return Err(TagitError::security(format!(
                    "{} resolves outside the repository root {}",
                    given.display(),
                    root.display()
                )));
            }
            debug!("Target {} resolved to {}", given.display(), resolved.display());
            targets.push(Target {
                given: given.clone(),
                resolved,
            });
        }
        Ok(targets)
    }

    fn commit(
        &self,
        changed: &[PathBuf],
        version: &Version,
        previous_tag: Option<&str>,
        commits_since_tag: usize,
    ) -> Result<bool> {
        if changed.is_empty() {
            if !self.options.files.is_empty() {
                info!("No files were updated.");
            }
            return Ok(false);
        }

        let message = commit_message(version, previous_tag, commits_since_tag);
        if self.options.dry_run {
            info!("[dry-run] Would commit {} file(s): {}", changed.len(), message);
            return Ok(false);
        }

        self.vcs.commit_files(changed, &message)?;
        info!("Commit created: {}", message);
        Ok(true)
    }

    fn tag(&self, tag: &str) -> Result<bool> {
        if self.options.no_tag {
            info!("Tag creation disabled, not creating {}", tag);
            return Ok(false);
        }
        if self.vcs.tag_exists(tag)? {
            info!("Tag {} already exists. No new tag will be created.", tag);
            return Ok(false);
        }
        if self.options.dry_run {
            info!("[dry-run] Would create tag {}", tag);
            return Ok(false);
        }

        self.vcs.create_tag(tag)?;
        info!("New Git tag created: {}", tag);
        Ok(true)
    }
}

fn commit_message(version: &Version, previous_tag: Option<&str>, commits_since_tag: usize) -> String {
    match (previous_tag, commits_since_tag) {
        (None, _) => format!("Version {} - Initial version.", version),
        (Some(_), 0) => format!("Version {} - Files updated to match the latest tag.", version),
        (Some(_), _) => format!("Version {} - Synchronized with the latest tag.", version),
    }
}
