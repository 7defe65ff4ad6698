use std::fmt;
use std::path::Path;
use std::sync::Arc;

use sdt_api::{FileChange, ReportKind, ReportOptions, NO_DIFF_TYPE};
use sdt_lang_api::{Analysis, Config, LangError, Language, LanguageRegistry};

use crate::correlate::correlate;
use crate::normalize::normalize;
use crate::offsets::LineOffsetTable;
use crate::render::{filter_and_render, render_tree_diff};
use crate::repository::{display_path, unified_diff, Repository};
use crate::staging::StagedFile;
use crate::textdiff::{diff_text, patch_hunks};
use crate::unified::parse_unified;
use crate::{Error, Result};

/// High-level façade running comparisons against an immutable language registry.
#[derive(Clone)]
pub struct Comparer {
    registry: Arc<LanguageRegistry>,
    options: ReportOptions,
}

impl Comparer {
    /// Create a comparer backed by the provided registry.
    #[must_use]
    pub fn new(registry: LanguageRegistry, options: ReportOptions) -> Self {
        Self {
            registry: Arc::new(registry),
            options,
        }
    }

    /// Create a comparer over the built-in languages with `config` merged in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfile`] when the configuration cannot be applied.
    pub fn from_config(config: &Config, options: ReportOptions) -> Result<Self> {
        let registry =
            sdt_langs::registry_with(config).map_err(|source| Error::InvalidProfile { source })?;
        Ok(Self::new(registry, options))
    }

    /// Access the underlying registry.
    #[must_use]
    pub fn registry(&self) -> Arc<LanguageRegistry> {
        Arc::clone(&self.registry)
    }

    /// Report options in effect.
    #[must_use]
    pub const fn options(&self) -> ReportOptions {
        self.options
    }

    /// Compare two local files. The language is chosen from `after`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when a file cannot be read, and any error of
    /// [`Comparer::compare_sources`].
    pub fn compare_files(&self, before: &Path, after: &Path) -> Result<String> {
        let language = self.language_for(after)?;
        if let Some(other) = self.registry.resolve(before) {
            if other.id() != language.id() {
                tracing::warn!(
                    before = %before.display(),
                    after = %after.display(),
                    "files resolve to different languages, using {}",
                    language.id()
                );
            }
        }
        let before_src = read(before)?;
        let after_src = read(after)?;
        self.compare_sources(
            &language,
            before,
            after,
            &before_src,
            &after_src,
            &display_path(after),
        )
    }

    /// Compare `path` at `revision` with its working tree copy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RevisionUnavailable`] when the file is absent at the
    /// revision, and any error of [`Comparer::compare_sources`].
    pub fn compare_to_revision(
        &self,
        repo: &Repository,
        revision: &str,
        path: &str,
    ) -> Result<String> {
        self.compare_in_repo(repo, revision, None, path, path)
    }

    /// Compare `path` between revisions `src` and `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RevisionUnavailable`] when the file is absent at
    /// either revision, and any error of [`Comparer::compare_sources`].
    pub fn compare_revisions(
        &self,
        repo: &Repository,
        src: &str,
        dst: &str,
        path: &str,
    ) -> Result<String> {
        self.compare_in_repo(repo, src, Some(dst), path, path)
    }

    /// Compare one entry of [`Repository::changes_between`], following renames.
    ///
    /// # Errors
    ///
    /// Same as [`Comparer::compare_revisions`].
    pub fn compare_change(
        &self,
        repo: &Repository,
        src: &str,
        dst: Option<&str>,
        change: &FileChange,
    ) -> Result<String> {
        self.compare_in_repo(repo, src, dst, change.source_path(), &change.path)
    }

    /// Run the comparison pipeline on two versions already on disk.
    ///
    /// `before` and `after` are handed to the language's tool; `before_src`
    /// and `after_src` are their contents, used for the source diff and for
    /// resolving byte offsets. `name` labels the source diff.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolUnavailable`] or [`Error::Tool`] for a failing
    /// dedicated tool, [`Error::UnsupportedLanguage`] when the generic
    /// fallback cannot parse the file, and git errors from building the
    /// source diff.
    pub fn compare_sources(
        &self,
        language: &Language,
        before: &Path,
        after: &Path,
        before_src: &[u8],
        after_src: &[u8],
        name: &str,
    ) -> Result<String> {
        let Some(kind) = self.options.kind else {
            return Ok(NO_DIFF_TYPE.to_owned());
        };
        let profile = language.profile();
        if profile.analysis == Analysis::Canonical && kind == ReportKind::ParseTree {
            return Ok(format!(
                "| {} comparison uses canonicalization not AST analysis",
                language.label()
            ));
        }
        tracing::info!(language = language.id(), file = name, ?kind, "comparing");

        let before_raw = Self::dump(language, before, name)?;
        let after_raw = Self::dump(language, after, name)?;
        let left = normalize(&before_raw, profile);
        let right = normalize(&after_raw, profile);
        let ops = diff_text(&left, &right);
        let ReportOptions { style, minimal, .. } = self.options;

        let report = match (profile.analysis, kind) {
            (Analysis::SyntaxTree, ReportKind::Semantic) => {
                let hunks = patch_hunks(&ops);
                let raw_tree = String::from_utf8_lossy(&before_raw);
                let lines = correlate(
                    &hunks,
                    &raw_tree,
                    &LineOffsetTable::build(&left),
                    profile,
                    &LineOffsetTable::from_bytes(before_src),
                );
                tracing::debug!(tree_hunks = hunks.len(), lines = lines.len(), "correlated");
                let source_diff = unified_diff(before_src, after_src, name)?;
                filter_and_render(&parse_unified(&source_diff), &lines, style, minimal)
            }
            _ => render_tree_diff(&ops, profile, style, minimal),
        };
        tracing::info!(language = language.id(), file = name, "comparison finished");
        Ok(report)
    }

    fn compare_in_repo(
        &self,
        repo: &Repository,
        src: &str,
        dst: Option<&str>,
        before_path: &str,
        after_path: &str,
    ) -> Result<String> {
        if self.options.kind.is_none() {
            return Ok(NO_DIFF_TYPE.to_owned());
        }
        let language = self.language_for(Path::new(after_path))?;
        let before_src = repo.read_file(src, before_path)?;
        let before = StagedFile::write(Path::new(before_path), &before_src)?;

        match dst {
            Some(rev) => {
                let after_src = repo.read_file(rev, after_path)?;
                let after = StagedFile::write(Path::new(after_path), &after_src)?;
                self.compare_sources(
                    &language,
                    before.path(),
                    after.path(),
                    &before_src,
                    &after_src,
                    after_path,
                )
            }
            None => {
                let after_src = repo.read_worktree_file(after_path)?;
                self.compare_sources(
                    &language,
                    before.path(),
                    &repo.root().join(after_path),
                    &before_src,
                    &after_src,
                    after_path,
                )
            }
        }
    }

    fn language_for(&self, path: &Path) -> Result<Arc<Language>> {
        self.registry
            .resolve(path)
            .ok_or_else(|| Error::UnsupportedLanguage {
                path: display_path(path),
            })
    }

    fn dump(language: &Language, path: &Path, name: &str) -> Result<Vec<u8>> {
        language
            .source()
            .dump(path)
            .map_err(|err| Self::classify(language, name, err))
    }

    fn classify(language: &Language, name: &str, err: LangError) -> Error {
        let unsupported = matches!(
            err,
            LangError::ToolNotFound { .. }
                | LangError::ToolFailed { .. }
                | LangError::EmptyOutput { .. }
                | LangError::Failure { .. }
        );
        if unsupported && !language.is_configured() {
            tracing::debug!(file = name, %err, "generic parser cannot handle file");
            return Error::UnsupportedLanguage {
                path: name.to_owned(),
            };
        }
        match err {
            LangError::ToolNotFound { program } => Error::ToolUnavailable {
                language: language.id().to_owned(),
                tool: program,
            },
            source => Error::Tool {
                language: language.id().to_owned(),
                source,
            },
        }
    }
}

impl fmt::Debug for Comparer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparer")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::Io {
        path: display_path(path),
        source,
    })
}
