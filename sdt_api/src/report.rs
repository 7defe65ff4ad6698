use serde::{Deserialize, Serialize};

/// Banner opening a filtered source-diff report.
pub const SEMANTIC_BANNER: &str = "Segments with likely semantic changes";
/// Banner opening a full parse-tree or canonical-format report.
pub const TREE_BANNER: &str = "Comparison of parse trees or canonical format";
/// Report emitted when nothing semantically relevant changed.
pub const NO_SEMANTIC_DIFFERENCES: &str = "| No semantic differences detected";
/// Report emitted when no report kind was requested.
pub const NO_DIFF_TYPE: &str = "| No diff type specified";

/// Output profile used when rendering a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStyle {
    /// ANSI color escapes around changed spans.
    #[default]
    Color,
    /// `{{+…}}` / `{{-…}}` bracket markers for terminals without color.
    Dumbterm,
    /// No markup at all.
    Plain,
}

impl RenderStyle {
    /// Returns the markup table for this style.
    #[must_use]
    pub const fn markup(self) -> Markup {
        match self {
            Self::Color => Markup::COLOR,
            Self::Dumbterm => Markup::DUMBTERM,
            Self::Plain => Markup::PLAIN,
        }
    }
}

/// Which report a comparison should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Source diff hunks filtered down to semantically touched lines.
    Semantic,
    /// Full diff of the normalized parse trees.
    ParseTree,
}

/// Rendering preferences handed to the comparison engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReportOptions {
    /// Report to produce; `None` yields the "no diff type" sentinel.
    #[serde(default)]
    pub kind: Option<ReportKind>,
    /// Markup profile.
    #[serde(default)]
    pub style: RenderStyle,
    /// Keep only lines carrying a change marker plus headers.
    #[serde(default)]
    pub minimal: bool,
}

impl ReportOptions {
    /// Options for the given report kind with default styling.
    #[must_use]
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Replace the render style.
    #[must_use]
    pub const fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Toggle minimal output.
    #[must_use]
    pub const fn with_minimal(mut self, minimal: bool) -> Self {
        self.minimal = minimal;
        self
    }
}

/// Opening/closing sequences emitted around report spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markup {
    /// Prefix for banners and the line gutter.
    pub header: &'static str,
    /// Prefix for hunk headers.
    pub info: &'static str,
    /// Prefix for inserted text.
    pub add: &'static str,
    /// Prefix for deleted text.
    pub del: &'static str,
    /// Closes any of the above.
    pub clear: &'static str,
}

impl Markup {
    /// ANSI escapes.
    pub const COLOR: Self = Self {
        header: "\x1b[33m",
        info: "\x1b[36m",
        add: "\x1b[32m",
        del: "\x1b[31m",
        clear: "\x1b[0m",
    };

    /// Bracket markers.
    pub const DUMBTERM: Self = Self {
        header: "",
        info: "",
        add: "{{+",
        del: "{{-",
        clear: "}}",
    };

    /// No markup.
    pub const PLAIN: Self = Self {
        header: "",
        info: "",
        add: "",
        del: "",
        clear: "",
    };

    /// Wrap `text` between `open` and this table's closing sequence.
    ///
    /// Nothing is emitted around the text when `open` is empty, so plain and
    /// dumbterm gutters stay free of stray closers.
    #[must_use]
    pub fn wrap(&self, open: &str, text: &str) -> String {
        if open.is_empty() {
            text.to_owned()
        } else {
            format!("{open}{text}{}", self.clear)
        }
    }
}
