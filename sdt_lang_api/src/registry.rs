//! Registry mapping file extensions to language definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::{LanguageProfile, TreeSource};

/// A language the engine can compare: its profile plus the producer of its dumps.
pub struct Language {
    id: &'static str,
    label: &'static str,
    extensions: Vec<String>,
    profile: LanguageProfile,
    source: Arc<dyn TreeSource>,
    configured: bool,
}

impl Language {
    /// Define a language.
    ///
    /// `extensions` are matched case-insensitively and include the leading dot.
    #[must_use]
    pub fn new(
        id: &'static str,
        label: &'static str,
        extensions: &[&str],
        profile: LanguageProfile,
        source: Arc<dyn TreeSource>,
    ) -> Self {
        Self {
            id,
            label,
            extensions: extensions.iter().map(|ext| ext.to_ascii_lowercase()).collect(),
            profile,
            source,
            configured: true,
        }
    }

    /// Stable identifier, also the key of the language's `[commands.<id>]` table.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// Human-friendly name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Extensions resolved to this language.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Normalization and correlation profile.
    #[must_use]
    pub const fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    /// Producer of raw dumps.
    #[must_use]
    pub fn source(&self) -> &dyn TreeSource {
        self.source.as_ref()
    }

    /// Whether a failing tool is a hard error (`true`) or means the file is
    /// simply not supported (`false`, the generic fallback).
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.configured
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("id", &self.id)
            .field("extensions", &self.extensions)
            .field("analysis", &self.profile.analysis)
            .field("source", &self.source.describe())
            .field("configured", &self.configured)
            .finish()
    }
}

/// Immutable-after-construction table of supported languages.
#[derive(Default)]
pub struct LanguageRegistry {
    languages: HashMap<&'static str, Arc<Language>>,
    by_extension: HashMap<String, &'static str>,
    fallback: Option<Arc<Language>>,
}

impl LanguageRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a language keyed by its id and extensions.
    ///
    /// A later registration of the same id or extension replaces the earlier one.
    pub fn register(&mut self, language: Language) {
        let id = language.id;
        for ext in &language.extensions {
            self.by_extension.insert(ext.clone(), id);
        }
        self.languages.insert(id, Arc::new(language));
    }

    /// Register the generic language used for unknown extensions.
    ///
    /// Its tool failures are reported as "unsupported" rather than as errors.
    pub fn register_fallback(&mut self, mut language: Language) {
        language.configured = false;
        self.fallback = Some(Arc::new(language));
    }

    /// Retrieve a language by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Language>> {
        if let Some(language) = self.languages.get(id) {
            return Some(Arc::clone(language));
        }
        self.fallback
            .as_ref()
            .filter(|fallback| fallback.id == id)
            .map(Arc::clone)
    }

    /// Resolve the language for a file path by its extension.
    ///
    /// Multi-part extensions such as `.tfstate.backup` win over their last
    /// component. Unknown extensions resolve to the fallback, if any.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Option<Arc<Language>> {
        self.resolve_known(path)
            .or_else(|| self.fallback.as_ref().map(Arc::clone))
    }

    /// Resolve a path without consulting the fallback.
    #[must_use]
    pub fn resolve_known(&self, path: &Path) -> Option<Arc<Language>> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        name.match_indices('.')
            .map(|(idx, _)| &name[idx..])
            .find_map(|suffix| self.by_extension.get(suffix))
            .and_then(|id| self.languages.get(id))
            .map(Arc::clone)
    }

    /// Returns the identifiers of registered languages, fallback excluded.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.languages.keys().copied()
    }

    /// Whether a fallback language is registered.
    #[must_use]
    pub const fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        f.debug_struct("LanguageRegistry")
            .field("languages", &ids)
            .field("fallback", &self.fallback.as_ref().map(|lang| lang.id))
            .finish()
    }
}
