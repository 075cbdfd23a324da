use crate::error::{Result, TagitError};
use crate::git::VersionControl;
use git2::{DescribeFormatOptions, DescribeOptions, ErrorCode, Oid, Repository, Signature, StatusOptions};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

pub struct GitTracker {
    pub repository: Repository,
}

impl GitTracker {
    /// Opens the repository containing `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repository = Repository::discover(path).map_err(|e| {
            TagitError::git(format!("Failed to find git repository at {:?}: {}", path, e))
        })?;

        debug!("Opened repository at {:?}", repository.path());

        Ok(GitTracker { repository })
    }

    /// The canonical working directory of the repository.
    pub fn workdir(&self) -> Result<PathBuf> {
        let workdir = self
            .repository
            .workdir()
            .ok_or_else(|| TagitError::git("Bare repositories have no working directory"))?;
        Ok(workdir.canonicalize()?)
    }

    /// Gets the repository signature from local git config
    fn get_signature(&self) -> Result<Signature<'_>> {
        self.repository.signature().map_err(|e| {
            TagitError::git(format!(
                "Failed to get git signature. Please configure user.name and user.email in git config: {}",
                e
            ))
        })
    }

    fn head_commit_id(&self) -> Result<Oid> {
        let head = self.repository.head()?;
        Ok(head.peel_to_commit()?.id())
    }

    /// Path of `file` relative to the working directory, as the index wants it.
    fn relative_path(&self, file: &Path) -> Result<PathBuf> {
        let workdir = self.workdir()?;
        let absolute = file
            .canonicalize()
            .map_err(|e| TagitError::file(file, format!("could not be resolved: {}", e)))?;
        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                TagitError::security(format!(
                    "{} is outside the repository at {}",
                    file.display(),
                    workdir.display()
                ))
            })
    }

    /// Creates a commit of the current index with the given message
    pub fn create_commit(&self, message: &str) -> Result<Oid> {
        info!("Creating commit: {}", message);

        let mut index = self.repository.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repository.find_tree(tree_id)?;

        let sig = self.get_signature()?;

        let parent_commit = match self.repository.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => {
                warn!("No parent commit found - this will be the initial commit");
                None
            }
        };

        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();

        let commit_id = self
            .repository
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        info!("Created commit: {}", commit_id);
        Ok(commit_id)
    }

    /// Creates an annotated tag for the given commit
    pub fn create_tag_at(&self, tag_name: &str, commit_id: Oid) -> Result<()> {
        let sig = self.get_signature()?;
        let commit_obj = self
            .repository
            .find_object(commit_id, Some(git2::ObjectType::Commit))?;

        self.repository.tag(
            tag_name,
            &commit_obj,
            &sig,
            &format!("Release {}", tag_name),
            false,
        )?;

        debug!("Created annotated tag {} at {}", tag_name, commit_id);
        Ok(())
    }
}

impl VersionControl for GitTracker {
    fn latest_tag(&self) -> Result<Option<String>> {
        let mut options = DescribeOptions::new();
        options.describe_tags();

        let describe = match self.repository.describe(&options) {
            Ok(describe) => describe,
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::UnbornBranch) => {
                debug!("No tag describes HEAD: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        let tag = describe.format(Some(&format))?;
        debug!("Latest tag: {}", tag);
        Ok(Some(tag.trim().to_string()))
    }

    fn commits_since(&self, reference: &str) -> Result<usize> {
        let target = self
            .repository
            .revparse_single(reference)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| TagitError::git(format!("Cannot resolve '{}': {}", reference, e)))?;

        let mut revwalk = self.repository.revwalk()?;
        revwalk.push_head()?;
        revwalk.hide(target.id())?;

        let mut count = 0;
        for oid in revwalk {
            oid?;
            count += 1;
        }

        debug!("{} commits since {}", count, reference);
        Ok(count)
    }

    fn is_clean(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repository.statuses(Some(&mut options))?;
        for entry in statuses.iter() {
            debug!("Uncommitted change: {:?} {:?}", entry.status(), entry.path());
        }
        Ok(statuses.is_empty())
    }

    fn commit_files(&self, files: &[PathBuf], message: &str) -> Result<()> {
        let mut index = self.repository.index()?;
        for file in files {
            let relative = self.relative_path(file)?;
            debug!("Staging {}", relative.display());
            index.add_path(&relative)?;
        }
        index.write()?;

        self.create_commit(message)?;
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repository.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self.head_commit_id()?;
        self.create_tag_at(name, head)
    }
}
