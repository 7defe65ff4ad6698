//! Repository access built on top of libgit2: change listings, revision
//! content and source-level unified diffs.

use std::fmt;
use std::path::{Path, PathBuf};

use git2::{
    Delta, DiffFindOptions, DiffOptions, ErrorClass, ErrorCode, Patch, Pathspec, PathspecFlags,
    Repository as GitRepository, Status, StatusOptions,
};
use sdt_api::{FileChange, FileStatus, WorkspaceChanges};

use crate::{Error, Result};

/// Lines of context around each hunk of a source diff.
pub const DIFF_CONTEXT_LINES: u32 = 3;

/// Handle to the working repository a comparison reads from.
pub struct Repository {
    inner: GitRepository,
    root: PathBuf,
}

impl Repository {
    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be canonicalized, does not resolve
    /// to a git repository, or resolves to a bare repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let original = path.as_ref();
        let canonical = std::fs::canonicalize(original).map_err(|source| Error::Io {
            path: display_path(original),
            source,
        })?;

        let repo = match GitRepository::discover(&canonical) {
            Ok(repo) => repo,
            Err(err)
                if err.class() == ErrorClass::Repository && err.code() == ErrorCode::NotFound =>
            {
                return Err(Error::NotARepository {
                    path: display_path(&canonical),
                })
            }
            Err(err) => return Err(Error::from(err)),
        };

        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::BareRepository {
                path: display_path(&canonical),
            })?;

        Ok(Self { inner: repo, root })
    }

    /// Absolute path of the working tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the checked-out branch, `None` when detached or unborn.
    ///
    /// # Errors
    ///
    /// Propagates failures resolving `HEAD`.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.inner.head() {
            Ok(head) => head,
            Err(err) if is_unborn(&err) => return Ok(None),
            Err(err) => return Err(Error::from(err)),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(str::to_owned))
        } else {
            Ok(None)
        }
    }

    /// Pending changes relative to `HEAD`: staged, unstaged and untracked.
    ///
    /// # Errors
    ///
    /// Propagates libgit2 status enumeration failures.
    pub fn workspace_changes(&self) -> Result<WorkspaceChanges> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .renames_head_to_index(true);

        let mut changes = WorkspaceChanges::default();
        for entry in self.inner.statuses(Some(&mut opts))?.iter() {
            let Some(path) = entry.path() else {
                tracing::warn!("skipping status entry with a non UTF-8 path");
                continue;
            };
            let status = entry.status();
            if let Some(kind) = staged_status(status) {
                let old_path = entry
                    .head_to_index()
                    .filter(|_| kind == FileStatus::Renamed)
                    .and_then(|delta| delta.old_file().path().map(display_path));
                changes.staged.push(FileChange {
                    path: path.to_owned(),
                    old_path,
                    status: kind,
                });
            }
            if let Some(kind) = unstaged_status(status) {
                changes.unstaged.push(FileChange {
                    path: path.to_owned(),
                    old_path: None,
                    status: kind,
                });
            }
            if status.contains(Status::WT_NEW) {
                changes.untracked.push(path.to_owned());
            }
        }
        Ok(changes)
    }

    /// Files that differ between revision `src` and revision `dst`, or the
    /// working tree when `dst` is `None`. Renames are detected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRevision`] when a revision does not resolve to a
    /// tree, and propagates libgit2 diff failures.
    pub fn changes_between(&self, src: &str, dst: Option<&str>) -> Result<Vec<FileChange>> {
        let old_tree = self.tree_at(src)?;
        let mut opts = DiffOptions::new();
        let mut diff = match dst {
            Some(rev) => {
                let new_tree = self.tree_at(rev)?;
                self.inner
                    .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut opts))?
            }
            None => self
                .inner
                .diff_tree_to_workdir_with_index(Some(&old_tree), Some(&mut opts))?,
        };

        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))?;

        Ok(diff.deltas().filter_map(|delta| convert_delta(&delta)).collect())
    }

    /// Content of `path` (relative to the repository root) at `revision`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RevisionUnavailable`] when the revision does not
    /// resolve or the path does not exist in it.
    pub fn read_file(&self, revision: &str, path: &str) -> Result<Vec<u8>> {
        let unavailable = || Error::RevisionUnavailable {
            revision: revision.to_owned(),
            path: path.to_owned(),
        };
        let tree = self.tree_at(revision).map_err(|err| match err {
            Error::UnknownRevision { .. } => unavailable(),
            other => other,
        })?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(err) if err.code() == ErrorCode::NotFound => return Err(unavailable()),
            Err(err) => return Err(Error::from(err)),
        };
        let blob = entry
            .to_object(&self.inner)?
            .peel_to_blob()
            .map_err(|_| unavailable())?;
        Ok(blob.content().to_vec())
    }

    /// Content of `path` (relative to the repository root) in the working tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read.
    pub fn read_worktree_file(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|source| Error::Io {
            path: display_path(&full),
            source,
        })
    }

    fn tree_at(&self, revision: &str) -> Result<git2::Tree<'_>> {
        let unavailable = || Error::UnknownRevision {
            revision: revision.to_owned(),
        };
        let object = self.inner.revparse_single(revision).map_err(|err| {
            tracing::debug!(revision, %err, "revision does not resolve");
            unavailable()
        })?;
        object.peel_to_tree().map_err(|_| unavailable())
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Path filter built from a git pathspec glob; an absent glob matches everything.
pub struct PathFilter {
    spec: Option<Pathspec>,
}

impl PathFilter {
    /// Compile `glob`.
    ///
    /// # Errors
    ///
    /// Propagates libgit2 errors for invalid pathspecs.
    pub fn new(glob: Option<&str>) -> Result<Self> {
        let spec = glob.map(|glob| Pathspec::new([glob])).transpose()?;
        Ok(Self { spec })
    }

    /// Whether `path` (relative to the repository root) passes the filter.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.spec
            .as_ref()
            .map_or(true, |spec| spec.matches_path(Path::new(path), PathspecFlags::DEFAULT))
    }
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFilter")
            .field("active", &self.spec.is_some())
            .finish()
    }
}

/// Source-level unified diff of two buffers, with [`DIFF_CONTEXT_LINES`] of
/// context and `a/` / `b/` file headers naming `path`.
///
/// # Errors
///
/// Propagates libgit2 failures building or printing the patch.
pub fn unified_diff(before: &[u8], after: &[u8], path: &str) -> Result<String> {
    let mut opts = DiffOptions::new();
    opts.context_lines(DIFF_CONTEXT_LINES);
    let name = Path::new(path);
    let mut patch = Patch::from_buffers(before, Some(name), after, Some(name), Some(&mut opts))?;
    let buf = patch.to_buf()?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn convert_delta(delta: &git2::DiffDelta<'_>) -> Option<FileChange> {
    let status = match delta.status() {
        Delta::Added => FileStatus::Added,
        Delta::Deleted => FileStatus::Deleted,
        Delta::Modified => FileStatus::Modified,
        Delta::Renamed => FileStatus::Renamed,
        Delta::Copied => FileStatus::Copied,
        Delta::Typechange => FileStatus::TypeChange,
        _ => return None,
    };
    let old = delta.old_file().path().map(display_path);
    let new = delta.new_file().path().map(display_path);
    let (path, old_path) = match status {
        FileStatus::Deleted => (old?, None),
        FileStatus::Renamed | FileStatus::Copied => (new?, old),
        _ => (new.or(old)?, None),
    };
    Some(FileChange {
        path,
        old_path,
        status,
    })
}

fn staged_status(status: Status) -> Option<FileStatus> {
    if status.contains(Status::INDEX_NEW) {
        Some(FileStatus::Added)
    } else if status.contains(Status::INDEX_DELETED) {
        Some(FileStatus::Deleted)
    } else if status.contains(Status::INDEX_RENAMED) {
        Some(FileStatus::Renamed)
    } else if status.contains(Status::INDEX_TYPECHANGE) {
        Some(FileStatus::TypeChange)
    } else if status.contains(Status::INDEX_MODIFIED) {
        Some(FileStatus::Modified)
    } else {
        None
    }
}

fn unstaged_status(status: Status) -> Option<FileStatus> {
    if status.contains(Status::WT_DELETED) {
        Some(FileStatus::Deleted)
    } else if status.contains(Status::WT_RENAMED) {
        Some(FileStatus::Renamed)
    } else if status.contains(Status::WT_TYPECHANGE) {
        Some(FileStatus::TypeChange)
    } else if status.contains(Status::WT_MODIFIED) {
        Some(FileStatus::Modified)
    } else {
        None
    }
}

fn is_unborn(err: &git2::Error) -> bool {
    matches!(
        (err.class(), err.code()),
        (
            ErrorClass::Reference,
            ErrorCode::NotFound | ErrorCode::UnbornBranch
        )
    )
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
