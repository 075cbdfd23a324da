use crate::error::{Result, TagitError};
use crate::git::VersionControl;
use std::cell::RefCell;
use std::path::PathBuf;

/// A commit recorded by [MockRepository].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommit {
    pub message: String,
    pub files: Vec<PathBuf>,
}

/// In-memory repository for exercising release logic without git.
pub struct MockRepository {
    latest_tag: Option<String>,
    commits_since_tag: usize,
    clean: bool,
    tags: RefCell<Vec<String>>,
    commits: RefCell<Vec<MockCommit>>,
}

impl MockRepository {
    /// A clean repository with no tags.
    pub fn new() -> Self {
        MockRepository {
            latest_tag: None,
            commits_since_tag: 0,
            clean: true,
            tags: RefCell::new(Vec::new()),
            commits: RefCell::new(Vec::new()),
        }
    }

    /// Sets the tag `latest_tag` reports and how many commits follow it.
    pub fn with_latest_tag(mut self, tag: impl Into<String>, commits_since_tag: usize) -> Self {
        let tag = tag.into();
        self.tags.get_mut().push(tag.clone());
        self.latest_tag = Some(tag);
        self.commits_since_tag = commits_since_tag;
        self
    }

    /// Adds a tag that is not the latest one.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_mut().push(tag.into());
        self
    }

    pub fn dirty(mut self) -> Self {
        self.clean = false;
        self
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().clone()
    }

    pub fn commits(&self) -> Vec<MockCommit> {
        self.commits.borrow().clone()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionControl for MockRepository {
    fn latest_tag(&self) -> Result<Option<String>> {
        Ok(self.latest_tag.clone())
    }

    fn commits_since(&self, reference: &str) -> Result<usize> {
        if self.tags.borrow().iter().any(|tag| tag == reference) {
            Ok(self.commits_since_tag)
        } else {
            Err(TagitError::git(format!("Cannot resolve '{}'", reference)))
        }
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(self.clean)
    }

    fn commit_files(&self, files: &[PathBuf], message: &str) -> Result<()> {
        self.commits.borrow_mut().push(MockCommit {
            message: message.to_string(),
            files: files.to_vec(),
        });
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.borrow().iter().any(|tag| tag == name))
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        if self.tag_exists(name)? {
            return Err(TagitError::git(format!("tag '{}' already exists", name)));
        }
        self.tags.borrow_mut().push(name.to_string());
        Ok(())
    }
}
