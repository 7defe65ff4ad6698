use std::borrow::Cow;

use regex::Regex;

use crate::{LangError, LangResult};

/// How a language's dump is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    /// Position-annotated parse tree, correlated back to source lines.
    SyntaxTree,
    /// Canonical re-rendering of the file; the canonical texts are compared directly.
    Canonical,
}

/// Unit of the positions an [`Extractor`] pulls out of the raw tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionUnit {
    /// 1-based source line numbers.
    Line,
    /// 0-based byte offsets into the source file.
    ByteOffset,
}

/// A pattern-based substitution applied to a dump.
#[derive(Debug, Clone)]
pub struct NormalizationRule {
    pattern: Regex,
    replacement: String,
}

impl NormalizationRule {
    /// Compile a rule replacing every match of `pattern` with `replacement`.
    ///
    /// The replacement may reference capture groups (`${1}`).
    ///
    /// # Errors
    ///
    /// Returns [`LangError::InvalidPattern`] if the pattern does not compile.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> LangResult<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Compile a rule deleting every match of `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`LangError::InvalidPattern`] if the pattern does not compile.
    pub fn strip(pattern: &str) -> LangResult<Self> {
        Self::new(pattern, "")
    }

    /// Apply the rule to `text`.
    #[must_use]
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, self.replacement.as_str())
    }
}

/// Strategy for pulling source positions out of a single raw-tree line.
#[derive(Debug, Clone)]
pub enum Extractor {
    /// Every match of the pattern contributes its first capture group.
    Captures(Regex),
    /// A fixed-width decimal prefix followed by a literal separator.
    LinePrefix {
        /// Number of digits in the prefix.
        width: usize,
        /// Text that must follow the digits.
        separator: &'static str,
    },
    /// The dump carries no positions.
    Nothing,
}

impl Extractor {
    /// Compile a capture-based extractor.
    ///
    /// # Errors
    ///
    /// Returns [`LangError::InvalidPattern`] if the pattern does not compile.
    pub fn captures(pattern: &str) -> LangResult<Self> {
        compile(pattern).map(Self::Captures)
    }

    /// Extractor for the `NNNNN | node` layout.
    #[must_use]
    pub const fn line_prefix() -> Self {
        Self::LinePrefix {
            width: 5,
            separator: " | ",
        }
    }

    /// Positions found on `line`. Lines without a match yield nothing.
    #[must_use]
    pub fn extract(&self, line: &str) -> Vec<u32> {
        match self {
            Self::Captures(pattern) => pattern
                .captures_iter(line)
                .filter_map(|caps| caps.get(1))
                .filter_map(|value| value.as_str().parse().ok())
                .collect(),
            Self::LinePrefix { width, separator } => line
                .get(..*width)
                .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
                .filter(|_| line[*width..].starts_with(separator))
                .and_then(|digits| digits.parse().ok())
                .into_iter()
                .collect(),
            Self::Nothing => Vec::new(),
        }
    }
}

/// Per-language bundle driving normalization and correlation.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    /// Comparison mode.
    pub analysis: Analysis,
    /// Ordered rules turning a raw dump into its position-insensitive form.
    pub rules: Vec<NormalizationRule>,
    /// Extra rules applied to diff spans in parse-tree reports only.
    pub display_rules: Vec<NormalizationRule>,
    /// Position extraction strategy applied to raw-tree lines.
    pub extractor: Extractor,
    /// Unit of extracted positions.
    pub unit: PositionUnit,
    /// Raw-tree lines inspected on each side of the line a hunk lands on.
    pub window_radius: usize,
}

impl LanguageProfile {
    /// Profile for a position-annotated parse tree.
    #[must_use]
    pub const fn syntax_tree(extractor: Extractor, unit: PositionUnit, window_radius: usize) -> Self {
        Self {
            analysis: Analysis::SyntaxTree,
            rules: Vec::new(),
            display_rules: Vec::new(),
            extractor,
            unit,
            window_radius,
        }
    }

    /// Profile for a canonicalized rendering with nothing to strip.
    #[must_use]
    pub const fn canonical() -> Self {
        Self {
            analysis: Analysis::Canonical,
            rules: Vec::new(),
            display_rules: Vec::new(),
            extractor: Extractor::Nothing,
            unit: PositionUnit::Line,
            window_radius: 0,
        }
    }

    /// Append a normalization rule.
    #[must_use]
    pub fn with_rule(mut self, rule: NormalizationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a display-only rule.
    #[must_use]
    pub fn with_display_rule(mut self, rule: NormalizationRule) -> Self {
        self.display_rules.push(rule);
        self
    }

    /// Whether the dump is a canonical rendering rather than a parse tree.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.analysis == Analysis::Canonical
    }
}

fn compile(pattern: &str) -> LangResult<Regex> {
    Regex::new(pattern).map_err(|source| LangError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}
