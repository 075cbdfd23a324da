//! The version control collaborator.
//!
//! Release logic only ever talks to the [VersionControl] trait, so it can run
//! against a real repository ([GitTracker], backed by `git2`) or an in-memory
//! [MockRepository] in tests.

pub mod mock;
pub mod tracker;

pub use mock::{MockCommit, MockRepository};
pub use tracker::GitTracker;

use crate::error::Result;
use std::path::PathBuf;

/// The six repository operations a release needs.
pub trait VersionControl {
    /// The most recent tag reachable from HEAD (`git describe --tags --abbrev=0`),
    /// or `None` when there is no tag yet.
    fn latest_tag(&self) -> Result<Option<String>>;

    /// Number of commits reachable from HEAD but not from `reference`.
    fn commits_since(&self, reference: &str) -> Result<usize>;

    /// True when there are no staged, unstaged, or untracked changes.
    fn is_clean(&self) -> Result<bool>;

    /// Stages exactly `files` and commits them with `message`.
    fn commit_files(&self, files: &[PathBuf], message: &str) -> Result<()>;

    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Tags HEAD.
    fn create_tag(&self, name: &str) -> Result<()>;
}
