//! Interpretation of `--src` / `--dst` and the consistency rules between them.

use std::path::{Path, PathBuf};

/// Source used when `--src` is not given.
pub const DEFAULT_SOURCE: &str = "HEAD:";

/// What a run compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `HEAD` against staged, unstaged and untracked changes on disk.
    Workspace,
    /// A revision against another revision, or against the working tree.
    Revisions { src: String, dst: Option<String> },
    /// Two local files outside of git.
    Files { before: PathBuf, after: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("You may only compare a branch/revision with another branch/revision")]
    RevisionWithFile,
    #[error("A source of a filepath must be matched by a destination filepath")]
    FileWithoutFile,
    #[error("The file {0} does not exist!")]
    MissingFile(String),
    #[error("The --glob option may not be used when comparing two local files")]
    GlobWithFiles,
}

/// Strip the trailing `:` marking a branch or revision.
fn revision(value: &str) -> Option<&str> {
    value.strip_suffix(':')
}

/// Decide what to compare. A trailing `:` marks a branch or revision;
/// anything else is a local file path.
pub fn resolve(src: &str, dst: Option<&str>, glob: Option<&str>) -> Result<Target, OptionsError> {
    let dst = dst.filter(|value| !value.is_empty());
    if let Some(src_rev) = revision(src) {
        return match dst {
            None if src == DEFAULT_SOURCE => Ok(Target::Workspace),
            None => Ok(Target::Revisions {
                src: src_rev.to_owned(),
                dst: None,
            }),
            Some(dst) => match revision(dst) {
                Some(dst_rev) => Ok(Target::Revisions {
                    src: src_rev.to_owned(),
                    dst: Some(dst_rev.to_owned()),
                }),
                None => Err(OptionsError::RevisionWithFile),
            },
        };
    }

    let Some(dst) = dst.filter(|value| revision(value).is_none()) else {
        return Err(OptionsError::FileWithoutFile);
    };
    for path in [src, dst] {
        if !Path::new(path).exists() {
            return Err(OptionsError::MissingFile(path.to_owned()));
        }
    }
    if glob.is_some() {
        return Err(OptionsError::GlobWithFiles);
    }
    Ok(Target::Files {
        before: PathBuf::from(src),
        after: PathBuf::from(dst),
    })
}
