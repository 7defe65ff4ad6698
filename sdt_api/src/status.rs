use serde::{Deserialize, Serialize};

/// File status from the comparison's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// File only exists on the destination side.
    Added,
    /// File only exists on the source side.
    Deleted,
    /// File exists on both sides with modifications.
    Modified,
    /// File path changed between the two sides.
    Renamed,
    /// File content copied from another location.
    Copied,
    /// File type changed (e.g., regular file to symlink).
    TypeChange,
}

impl FileStatus {
    /// Wording `git status` uses for the change.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Added => "new file",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
            Self::TypeChange => "typechange",
        }
    }
}

/// One changed path between two revisions, or a revision and the working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root on the destination side.
    pub path: String,
    /// Previous path when the file was renamed or copied.
    #[serde(default)]
    pub old_path: Option<String>,
    /// Kind of change.
    pub status: FileStatus,
}

impl FileChange {
    /// Whether both sides carry content that can be compared.
    #[must_use]
    pub const fn is_comparable(&self) -> bool {
        matches!(
            self.status,
            FileStatus::Modified | FileStatus::Renamed | FileStatus::Copied
        )
    }

    /// Path of the file on the source side.
    #[must_use]
    pub fn source_path(&self) -> &str {
        self.old_path.as_deref().unwrap_or(&self.path)
    }
}

/// Pending changes of a working tree relative to `HEAD`, split the way
/// `git status` reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorkspaceChanges {
    /// Changes recorded in the index.
    #[serde(default)]
    pub staged: Vec<FileChange>,
    /// Changes to tracked files not yet staged.
    #[serde(default)]
    pub unstaged: Vec<FileChange>,
    /// Paths git does not track yet.
    #[serde(default)]
    pub untracked: Vec<String>,
}

impl WorkspaceChanges {
    /// Staged or unstaged changes whose file exists both in `HEAD` and on
    /// disk, one per path, ordered by path.
    #[must_use]
    pub fn comparable(&self) -> Vec<&FileChange> {
        let mut changes: Vec<&FileChange> = self
            .staged
            .iter()
            .chain(self.unstaged.iter())
            .filter(|change| change.is_comparable())
            .collect();
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        changes.dedup_by(|a, b| a.path == b.path);
        changes
    }

    /// Whether nothing differs from `HEAD`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}
