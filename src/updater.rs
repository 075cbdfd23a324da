use crate::error::{Result, TagitError};
use crate::schemes::{Scheme, fallback_candidates, select_scheme};
use crate::version::Version;
use log::{debug, error, info, warn};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const BACKUP_SUFFIX: &str = ".tagit-backup";

/// What happened to one target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was rewritten (or would be, in a dry run).
    Updated { scheme: String, fallback: bool },
    /// A scheme matched but the file already holds the version.
    UpToDate { scheme: String },
    /// No scheme matched the file's contents.
    NoScheme,
}

impl FileOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, FileOutcome::Updated { .. })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    pub dry_run: bool,
    pub fallback: bool,
}

/// Applies `scheme` to the file at `path`, writing only if the text changed.
/// Returns whether the file changed.
pub fn update_file(path: impl AsRef<Path>, version: &Version, scheme: &Scheme) -> Result<bool> {
    let path = path.as_ref();
    let content = read_target(path)?;
    let updated = scheme.apply(&content, version);

    if updated == content {
        info!("{} is already up to date: {}", path.display(), version);
        return Ok(false);
    }

    write_with_backup(path, &updated)?;
    info!("{} updated to version {}", path.display(), version);
    Ok(true)
}

/// Picks a scheme for the file and applies it, trying the other matching
/// schemes when the primary one leaves the text unchanged.
pub fn update_target(
    path: impl AsRef<Path>,
    version: &Version,
    schemes: &[Scheme],
    options: UpdateOptions,
) -> Result<FileOutcome> {
    let path = path.as_ref();
    let content = read_target(path)?;

    let Some(primary) = select_scheme(&content, schemes, version) else {
        info!("No supported versioning scheme found in {}, skipping", path.display());
        return Ok(FileOutcome::NoScheme);
    };
    debug!("Using scheme '{}' for {}", primary.name(), path.display());

    let updated = primary.apply(&content, version);
    if updated != content {
        commit_content(path, &updated, version, options)?;
        debug!("Scheme '{}' applied to {}", primary.name(), path.display());
        return Ok(FileOutcome::Updated {
            scheme: primary.name().to_string(),
            fallback: false,
        });
    }

    if options.fallback {
        for candidate in fallback_candidates(&content, schemes, primary, version) {
            let updated = candidate.apply(&content, version);
            if updated != content {
                commit_content(path, &updated, version, options)?;
                info!(
                    "Scheme '{}' made no change to {}, used fallback scheme '{}'",
                    primary.name(),
                    path.display(),
                    candidate.name()
                );
                return Ok(FileOutcome::Updated {
                    scheme: candidate.name().to_string(),
                    fallback: true,
                });
            }
            debug!("Fallback scheme '{}' made no change either", candidate.name());
        }
    }

    info!("{} is already up to date: {}", path.display(), version);
    Ok(FileOutcome::UpToDate {
        scheme: primary.name().to_string(),
    })
}

fn commit_content(path: &Path, content: &str, version: &Version, options: UpdateOptions) -> Result<()> {
    if options.dry_run {
        info!("[dry-run] Would update {} to version {}", path.display(), version);
        return Ok(());
    }
    write_with_backup(path, content)?;
    info!("{} updated to version {}", path.display(), version);
    Ok(())
}

fn read_target(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TagitError::file(path, "not found. Operation aborted."),
        _ => TagitError::file(path, format!("could not be read: {}", e)),
    })
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Writes `content` to `path`, keeping a sibling backup until the write has
/// succeeded. A failed write restores the original.
pub fn write_with_backup(path: impl AsRef<Path>, content: &str) -> Result<()> {
    write_with_backup_using(path.as_ref(), content, |path, content| std::fs::write(path, content))
}

fn write_with_backup_using<W>(path: &Path, content: &str, write: W) -> Result<()>
where
    W: FnOnce(&Path, &str) -> std::io::Result<()>,
{
    let backup = backup_path(path);

    std::fs::copy(path, &backup)
        .map_err(|e| TagitError::file(path, format!("could not create backup: {}", e)))?;
    debug!("Backed up {} to {}", path.display(), backup.display());

    if let Err(e) = write(path, content) {
        error!("Writing {} failed, restoring backup", path.display());
        if let Err(restore) = std::fs::copy(&backup, path) {
            error!(
                "Could not restore {} from {}: {}",
                path.display(),
                backup.display(),
                restore
            );
            return Err(TagitError::file(
                path,
                format!("write failed ({}) and the backup at {} could not be restored", e, backup.display()),
            ));
        }
        let _ = std::fs::remove_file(&backup);
        return Err(TagitError::file(path, format!("write failed: {}", e)));
    }

    if let Err(e) = std::fs::remove_file(&backup) {
        warn!("Could not remove backup {}: {}", backup.display(), e);
    }
    Ok(())
}
