//! Integration tests for git operations

use std::fs;
use std::path::{Path, PathBuf};
use tagit::{
    git::{GitTracker, VersionControl},
    release::{Release, ReleaseOptions},
    schemes::SchemeRegistry,
};
use tempfile::TempDir;

/// Helper to create a temporary git repository
fn create_test_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();

    // Initialize git repo
    let repo = git2::Repository::init(temp_dir.path()).unwrap();

    // Configure user for commits
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    // Create initial file and commit
    let file_path = temp_dir.path().join("README.md");
    fs::write(&file_path, "# Test Repo").unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("README.md")).unwrap();
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = repo.signature().unwrap();

    repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .unwrap();

    temp_dir
}

fn commit_file(tracker: &GitTracker, dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    tracker
        .commit_files(&[path.clone()], &format!("update {}", name))
        .unwrap();
    path
}

fn head_message(tracker: &GitTracker) -> String {
    let head = tracker.repository.head().unwrap();
    let commit = head.peel_to_commit().unwrap();
    commit.message().unwrap().trim().to_string()
}

fn tag_names(tracker: &GitTracker) -> Vec<String> {
    let names = tracker.repository.tag_names(None).unwrap();
    names.iter().flatten().map(str::to_string).collect()
}

#[test]
fn test_git_tracker_open() {
    let temp_dir = create_test_repo();

    let tracker = GitTracker::open(temp_dir.path());
    assert!(tracker.is_ok());
}

#[test]
fn test_git_tracker_open_non_repo_fails() {
    let temp_dir = TempDir::new().unwrap();

    let tracker = GitTracker::open(temp_dir.path());
    assert!(tracker.is_err());
}

#[test]
fn test_workdir_is_canonical() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    assert_eq!(
        tracker.workdir().unwrap(),
        temp_dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_latest_tag_none_without_tags() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    assert_eq!(tracker.latest_tag().unwrap(), None);
}

#[test]
fn test_latest_tag_and_commit_count() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    tracker.create_tag("v1.0.0").unwrap();
    assert_eq!(tracker.latest_tag().unwrap(), Some("v1.0.0".to_string()));
    assert_eq!(tracker.commits_since("v1.0.0").unwrap(), 0);

    commit_file(&tracker, &temp_dir, "a.txt", "a");
    commit_file(&tracker, &temp_dir, "b.txt", "b");

    // --abbrev=0 semantics: the tag name only, no distance suffix
    assert_eq!(tracker.latest_tag().unwrap(), Some("v1.0.0".to_string()));
    assert_eq!(tracker.commits_since("v1.0.0").unwrap(), 2);
}

#[test]
fn test_latest_tag_is_most_recent() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    tracker.create_tag("v1.0.0").unwrap();
    commit_file(&tracker, &temp_dir, "a.txt", "a");
    tracker.create_tag("v1.1.0").unwrap();
    commit_file(&tracker, &temp_dir, "b.txt", "b");

    assert_eq!(tracker.latest_tag().unwrap(), Some("v1.1.0".to_string()));
    assert_eq!(tracker.commits_since("v1.1.0").unwrap(), 1);
}

#[test]
fn test_commits_since_unknown_reference_fails() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    assert!(tracker.commits_since("v9.9.9").is_err());
}

#[test]
fn test_is_clean() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();
    assert!(tracker.is_clean().unwrap());

    fs::write(temp_dir.path().join("untracked.txt"), "new").unwrap();
    assert!(!tracker.is_clean().unwrap());
}

#[test]
fn test_is_clean_detects_modification() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    fs::write(temp_dir.path().join("README.md"), "# Changed").unwrap();
    assert!(!tracker.is_clean().unwrap());
}

#[test]
fn test_commit_files_stages_only_given_files() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    let version = temp_dir.path().join("version.txt");
    fs::write(&version, "1.0.0").unwrap();
    fs::write(temp_dir.path().join("other.txt"), "unrelated").unwrap();

    tracker
        .commit_files(&[version], "Version 1.0.0 - Initial version.")
        .unwrap();

    assert_eq!(head_message(&tracker), "Version 1.0.0 - Initial version.");
    let head = tracker.repository.head().unwrap().peel_to_commit().unwrap();
    let tree = head.tree().unwrap();
    assert!(tree.get_name("version.txt").is_some());
    assert!(tree.get_name("other.txt").is_none());

    // other.txt is still untracked
    assert!(!tracker.is_clean().unwrap());
}

#[test]
fn test_commit_files_outside_repository_fails() {
    let temp_dir = create_test_repo();
    let outside = TempDir::new().unwrap();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    let file = outside.path().join("version.txt");
    fs::write(&file, "1.0.0").unwrap();

    assert!(tracker.commit_files(&[file], "should fail").is_err());
}

#[test]
fn test_tag_exists() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    assert!(!tracker.tag_exists("v1.0.0").unwrap());
    tracker.create_tag("v1.0.0").unwrap();
    assert!(tracker.tag_exists("v1.0.0").unwrap());

    let tags = tag_names(&tracker);
    assert_eq!(tags, vec!["v1.0.0".to_string()]);
}

#[test]
fn test_created_tag_is_annotated_release() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    tracker.create_tag("v0.1.0").unwrap();

    let reference = tracker.repository.find_reference("refs/tags/v0.1.0").unwrap();
    let tag = reference.peel_to_tag().unwrap();
    assert_eq!(tag.message().map(str::trim), Some("Release v0.1.0"));
}

#[test]
fn test_duplicate_tag_fails() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    tracker.create_tag("v1.0.0").unwrap();
    commit_file(&tracker, &temp_dir, "v2.txt", "2");

    // Try to create duplicate tag - should fail
    let result = tracker.create_tag("v1.0.0");
    assert!(result.is_err());
}

#[test]
fn test_release_against_real_repository() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();

    let configure = commit_file(
        &tracker,
        &temp_dir,
        "configure.ac",
        "AC_INIT([tool], [1.2.3], [dev@example.com])\n",
    );
    tracker.create_tag("v1.2.3").unwrap();
    for i in 0..4 {
        commit_file(&tracker, &temp_dir, &format!("change{}.txt", i), "x");
    }

    let schemes = SchemeRegistry::builtin().unwrap();
    let options = ReleaseOptions {
        files: vec![configure.clone()],
        ..ReleaseOptions::default()
    };
    let report = Release::new(&tracker, &schemes, tracker.workdir().unwrap(), options)
        .run()
        .unwrap();

    assert_eq!(report.version.to_string(), "1.2.7");
    assert_eq!(report.tag, "v1.2.7");
    assert!(report.committed);
    assert!(report.tag_created);

    assert_eq!(
        fs::read_to_string(&configure).unwrap(),
        "AC_INIT([tool], [1.2.7], [dev@example.com])\n"
    );
    assert_eq!(
        head_message(&tracker),
        "Version 1.2.7 - Synchronized with the latest tag."
    );
    assert!(tracker.is_clean().unwrap());
    assert_eq!(tracker.latest_tag().unwrap(), Some("v1.2.7".to_string()));
}

#[test]
fn test_release_refuses_dirty_repository() {
    let temp_dir = create_test_repo();
    let tracker = GitTracker::open(temp_dir.path()).unwrap();
    fs::write(temp_dir.path().join("scratch.txt"), "wip").unwrap();

    let schemes = SchemeRegistry::builtin().unwrap();
    let result = Release::new(
        &tracker,
        &schemes,
        tracker.workdir().unwrap(),
        ReleaseOptions::default(),
    )
    .run();

    assert!(result.is_err());
    assert!(tag_names(&tracker).is_empty());
}
