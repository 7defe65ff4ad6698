use std::fs;
use std::path::Path;

use git2::{ErrorClass, ErrorCode, IndexAddOption, Repository as GitRepository};
use sdt_api::{FileStatus, RenderStyle, ReportKind, ReportOptions, NO_SEMANTIC_DIFFERENCES};
use sdt_core::{Comparer, Error, PathFilter, Repository, Result};
use sdt_lang_api::Config;
use tempfile::TempDir;

#[test]
fn workspace_changes_split_like_git_status() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;
    write_file(temp.path(), "staged.sql", "select 1;\n");
    write_file(temp.path(), "edited.json", "[1]\n");
    commit_all(&git_repo, "base")?;

    write_file(temp.path(), "staged.sql", "select 2;\n");
    stage(&git_repo, "staged.sql")?;
    write_file(temp.path(), "fresh.rb", "puts 1\n");
    stage(&git_repo, "fresh.rb")?;
    write_file(temp.path(), "edited.json", "[2]\n");
    write_file(temp.path(), "nested/new.py", "x = 1\n");

    let repo = Repository::open(temp.path())?;
    let changes = repo.workspace_changes()?;

    let summary = |list: &[sdt_api::FileChange]| -> Vec<(String, FileStatus)> {
        list.iter().map(|c| (c.path.clone(), c.status)).collect()
    };
    assert_eq!(
        summary(&changes.staged),
        vec![
            ("fresh.rb".to_owned(), FileStatus::Added),
            ("staged.sql".to_owned(), FileStatus::Modified),
        ]
    );
    assert_eq!(
        summary(&changes.unstaged),
        vec![("edited.json".to_owned(), FileStatus::Modified)]
    );
    assert_eq!(changes.untracked, vec!["nested/new.py".to_owned()]);
    let comparable: Vec<&str> = changes.comparable().iter().map(|c| c.path.as_str()).collect();
    assert_eq!(comparable, vec!["edited.json", "staged.sql"]);
    Ok(())
}

#[test]
fn changes_between_revisions_detect_renames() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;
    let body = "select id, name, email, created_at from accounts where active = 1;\n";
    write_file(temp.path(), "old.sql", body);
    write_file(temp.path(), "gone.json", r#"{"legacy": true, "owner": "ops"}"#);
    commit_all(&git_repo, "base")?;

    fs::rename(temp.path().join("old.sql"), temp.path().join("new.sql")).expect("rename");
    fs::remove_file(temp.path().join("gone.json")).expect("remove");
    write_file(temp.path(), "added.json", "[1, 2, 3, 4, 5, 6, 7, 8]\n");
    commit_all(&git_repo, "second")?;

    let repo = Repository::open(temp.path())?;
    let mut changes = repo.changes_between("HEAD~1", Some("HEAD"))?;
    changes.sort_by(|a, b| a.path.cmp(&b.path));

    let summary: Vec<(&str, FileStatus)> = changes
        .iter()
        .map(|change| (change.path.as_str(), change.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("added.json", FileStatus::Added),
            ("gone.json", FileStatus::Deleted),
            ("new.sql", FileStatus::Renamed),
        ]
    );
    let renamed = &changes[2];
    assert_eq!(renamed.source_path(), "old.sql");
    assert!(renamed.is_comparable());
    Ok(())
}

#[test]
fn unknown_revisions_are_reported() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;
    write_file(temp.path(), "a.json", "{}\n");
    commit_all(&git_repo, "base")?;

    let repo = Repository::open(temp.path())?;
    let err = repo.changes_between("no-such-branch", None);
    assert!(matches!(err, Err(Error::UnknownRevision { .. })));
    Ok(())
}

#[test]
fn working_tree_is_compared_with_a_revision() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;
    write_file(temp.path(), "config/app.json", r#"{"workers": 2, "queues": ["fast", "slow"]}"#);
    write_file(temp.path(), "config/layout.json", r#"{"a": 1}"#);
    commit_all(&git_repo, "base")?;

    write_file(temp.path(), "config/app.json", r#"{"workers": 4, "queues": ["fast", "slow"]}"#);
    write_file(temp.path(), "config/layout.json", "{\n    \"a\":   1\n}\n");

    let repo = Repository::open(temp.path())?;
    let options = ReportOptions::new(ReportKind::Semantic).with_style(RenderStyle::Dumbterm);
    let comparer = Comparer::from_config(&Config::default(), options)?;

    let report = comparer.compare_to_revision(&repo, "HEAD", "config/app.json")?;
    assert!(report.contains("{{-2}}"), "{report}");
    assert!(report.contains("{{+4}}"), "{report}");

    let report = comparer.compare_to_revision(&repo, "HEAD", "config/layout.json")?;
    assert_eq!(report, NO_SEMANTIC_DIFFERENCES);
    Ok(())
}

#[test]
fn two_revisions_are_compared_through_staged_copies() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;
    write_file(temp.path(), "report.sql", "select id from users;\n");
    commit_all(&git_repo, "base")?;
    write_file(temp.path(), "report.sql", "-- reformatted\nSELECT id\nFROM users;\n");
    commit_all(&git_repo, "style only")?;
    write_file(temp.path(), "report.sql", "SELECT id FROM users WHERE active;\n");
    commit_all(&git_repo, "filter")?;

    let repo = Repository::open(temp.path())?;
    let comparer = Comparer::from_config(&Config::default(), ReportOptions::new(ReportKind::Semantic))?;

    assert_eq!(
        comparer.compare_revisions(&repo, "HEAD~2", "HEAD~1", "report.sql")?,
        NO_SEMANTIC_DIFFERENCES
    );
    let report = comparer.compare_revisions(&repo, "HEAD~1", "HEAD", "report.sql")?;
    assert!(report.contains("WHERE"), "{report}");
    Ok(())
}

#[test]
fn renamed_files_compare_against_their_old_path() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;
    let body = r#"{"name": "sdt", "keywords": ["diff", "ast", "semantic", "review"]}"#;
    write_file(temp.path(), "package.json", body);
    commit_all(&git_repo, "base")?;
    fs::rename(temp.path().join("package.json"), temp.path().join("manifest.json")).expect("rename");
    commit_all(&git_repo, "rename")?;

    let repo = Repository::open(temp.path())?;
    let changes = repo.changes_between("HEAD~1", Some("HEAD"))?;
    assert_eq!(changes.len(), 1);
    let comparer = Comparer::from_config(&Config::default(), ReportOptions::new(ReportKind::Semantic))?;
    let report = comparer.compare_change(&repo, "HEAD~1", Some("HEAD"), &changes[0])?;
    assert_eq!(report, NO_SEMANTIC_DIFFERENCES);
    Ok(())
}

#[test]
fn missing_file_at_revision_is_unavailable() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;
    write_file(temp.path(), "a.json", "{}\n");
    commit_all(&git_repo, "base")?;
    write_file(temp.path(), "b.json", "{}\n");

    let repo = Repository::open(temp.path())?;
    let comparer = Comparer::from_config(&Config::default(), ReportOptions::new(ReportKind::Semantic))?;
    let err = comparer.compare_to_revision(&repo, "HEAD", "b.json");
    assert!(matches!(
        err,
        Err(Error::RevisionUnavailable { ref revision, ref path }) if revision == "HEAD" && path == "b.json"
    ));
    Ok(())
}

#[test]
fn glob_filters_changed_paths() -> Result<()> {
    let filter = PathFilter::new(Some("config/*.json"))?;
    assert!(filter.matches("config/app.json"));
    assert!(!filter.matches("app.json"));
    assert!(!filter.matches("config/app.sql"));
    Ok(())
}

#[test]
fn open_discovers_root_from_nested_path() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    GitRepository::init(temp.path()).map_err(Error::from)?;
    let nested = temp.path().join("src/deeper");
    fs::create_dir_all(&nested).expect("nested dirs");

    let repo = Repository::open(&nested)?;
    assert_eq!(
        repo.root().canonicalize().expect("canonical root"),
        temp.path().canonicalize().expect("canonical temp path")
    );
    assert_eq!(repo.current_branch()?, None);
    Ok(())
}

#[test]
fn open_rejects_bare_repository() {
    let temp = TempDir::new().expect("tempdir");
    let bare = temp.path().join("bare.git");
    GitRepository::init_bare(&bare).expect("bare repo");

    assert!(matches!(
        Repository::open(&bare),
        Err(Error::BareRepository { .. })
    ));
}

#[test]
fn current_branch_follows_head() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;
    write_file(temp.path(), "a.json", "{}\n");
    commit_all(&git_repo, "base")?;
    let expected = git_repo
        .head()
        .map_err(Error::from)?
        .shorthand()
        .map(str::to_owned);

    let repo = Repository::open(temp.path())?;
    assert_eq!(repo.current_branch()?, expected);
    Ok(())
}

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

fn stage(repo: &GitRepository, path: &str) -> Result<()> {
    let mut index = repo.index().map_err(Error::from)?;
    index.add_path(Path::new(path)).map_err(Error::from)?;
    index.write().map_err(Error::from)?;
    Ok(())
}

fn commit_all(repo: &GitRepository, message: &str) -> Result<()> {
    let mut index = repo.index().map_err(Error::from)?;
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .map_err(Error::from)?;
    index.update_all(["*"], None).map_err(Error::from)?;
    index.write().map_err(Error::from)?;
    let tree_id = index.write_tree().map_err(Error::from)?;
    let tree = repo.find_tree(tree_id).map_err(Error::from)?;
    let signature = git2::Signature::now("Test User", "test@example.com").map_err(Error::from)?;

    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().map_err(Error::from)?],
        Err(err)
            if matches!(
                (err.class(), err.code()),
                (
                    ErrorClass::Reference,
                    ErrorCode::NotFound | ErrorCode::UnbornBranch
                )
            ) =>
        {
            Vec::new()
        }
        Err(err) => return Err(Error::from(err)),
    };

    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parent_refs,
    )
    .map_err(Error::from)?;
    Ok(())
}
