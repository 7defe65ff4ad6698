//! Language profile interfaces shared by the core engine and language crates.

mod profile;
mod registry;
mod types;

use std::path::Path;

pub use profile::{Analysis, Extractor, LanguageProfile, NormalizationRule, PositionUnit};
pub use registry::{Language, LanguageRegistry};
pub use types::{CommandSpec, Config, LangError, LangResult, BUILT_IN, OPTIONS_PLACEHOLDER};

/// Producer of the structural dump (parse tree or canonical rendering) of a file.
pub trait TreeSource: Send + Sync {
    /// Human-readable description of the producer, used in messages and logs.
    fn describe(&self) -> String;

    /// Produce the raw structural dump for the file at `path`.
    ///
    /// # Errors
    ///
    /// Implementors report a missing tool as [`LangError::ToolNotFound`], a
    /// hung tool as [`LangError::ToolTimedOut`], a non-zero exit as
    /// [`LangError::ToolFailed`] and an empty dump as [`LangError::EmptyOutput`].
    fn dump(&self, path: &Path) -> LangResult<Vec<u8>>;
}
