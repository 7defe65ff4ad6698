//! Semantic diff engine.
//!
//! The crate turns structural dumps of two versions of a file into a report
//! of the source diff hunks that plausibly change behavior:
//! - tree normalization and character-level tree diffing
//! - projection of tree hunks back onto source lines
//! - filtering and rendering of the source-level unified diff
//! - git access and scoped staging of revision content

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

/// Comparison orchestration.
pub mod compare;
/// Tree-hunk to source-line correlation.
pub mod correlate;
/// Tree normalization.
pub mod normalize;
/// Byte offset to line lookups.
pub mod offsets;
/// Report rendering.
pub mod render;
/// Git repository access.
pub mod repository;
/// Temporary copies of revision content.
pub mod staging;
/// Character-level diffing of tree text.
pub mod textdiff;
/// Unified diff parsing.
pub mod unified;

pub use compare::Comparer;
pub use correlate::SemanticLineSet;
pub use offsets::LineOffsetTable;
pub use repository::{PathFilter, Repository};
pub use unified::HunkHeaderError;

use sdt_lang_api::LangError;

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured parser for a language cannot be run.
    #[error("{language} parser `{tool}` is not available")]
    ToolUnavailable {
        /// Language identifier.
        language: String,
        /// Program that could not be started.
        tool: String,
    },
    /// Neither a dedicated language nor the generic fallback could produce a tree.
    #[error("no structural support for {path}")]
    UnsupportedLanguage {
        /// File that could not be parsed.
        path: String,
    },
    /// The file does not exist at the requested revision.
    #[error("{path} does not exist at {revision}")]
    RevisionUnavailable {
        /// Requested revision.
        revision: String,
        /// Path relative to the repository root.
        path: String,
    },
    /// A revision expression did not resolve to a tree.
    #[error("revision {revision} not found")]
    UnknownRevision {
        /// Requested revision.
        revision: String,
    },
    /// The language's tool ran but failed, hung, or produced nothing.
    #[error("{language} tool failed: {source}")]
    Tool {
        /// Language identifier.
        language: String,
        /// Underlying failure.
        #[source]
        source: LangError,
    },
    /// A language profile could not be built from the configuration.
    #[error("invalid language configuration: {source}")]
    InvalidProfile {
        /// Underlying failure.
        #[source]
        source: LangError,
    },
    /// Underlying git operation failed.
    #[error("git error: {source}")]
    Git {
        /// Original libgit2 error.
        #[from]
        source: git2::Error,
    },
    /// Provided path does not correspond to a git repository.
    #[error("path does not reference a git repository: {path}")]
    NotARepository {
        /// Path that failed to resolve to a repository.
        path: String,
    },
    /// Bare repositories have no working tree to compare against.
    #[error("repository at {path} is bare and unsupported")]
    BareRepository {
        /// Path of the repository lacking a working tree.
        path: String,
    },
    /// Filesystem interaction failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Filesystem path involved in the failed operation.
        path: String,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
}
