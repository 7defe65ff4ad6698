use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Executable value selecting the in-process implementation of a language.
pub const BUILT_IN: &str = "BUILT-IN";
/// Placeholder inside a switch that is replaced by the command's options.
pub const OPTIONS_PLACEHOLDER: &str = "${OPTIONS}";

/// External command used to produce a structural dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to run, or [`BUILT_IN`].
    pub executable: String,
    /// Arguments placed before the file path.
    #[serde(default)]
    pub switches: Vec<String>,
    /// Text substituted for `${OPTIONS}` inside switches.
    #[serde(default)]
    pub options: Option<String>,
}

impl CommandSpec {
    /// Construct a command from an executable and its switches.
    #[must_use]
    pub fn new<I, S>(executable: impl Into<String>, switches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            executable: executable.into(),
            switches: switches.into_iter().map(Into::into).collect(),
            options: None,
        }
    }

    /// A command selecting the built-in implementation.
    #[must_use]
    pub fn built_in() -> Self {
        Self::new(BUILT_IN, Vec::<String>::new())
    }

    /// Attach an options string.
    #[must_use]
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Whether the command selects the in-process implementation.
    #[must_use]
    pub fn is_built_in(&self) -> bool {
        self.executable == BUILT_IN
    }

    /// Switches with `${OPTIONS}` expanded.
    #[must_use]
    pub fn expanded_switches(&self) -> Vec<String> {
        let options = self.options.as_deref().unwrap_or_default();
        self.switches
            .iter()
            .map(|switch| switch.replace(OPTIONS_PLACEHOLDER, options))
            .collect()
    }

    /// Command line rendered for messages.
    #[must_use]
    pub fn display(&self) -> String {
        let mut parts = vec![self.executable.clone()];
        parts.extend(self.expanded_switches());
        parts.join(" ")
    }
}

/// User configuration, usually read from `.sdt.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Free-form description of the configuration.
    #[serde(default)]
    pub description: Option<String>,
    /// Default pathspec limiting which files are compared.
    #[serde(default)]
    pub glob: Option<String>,
    /// Per-invocation timeout for external tools, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Command overrides keyed by language id.
    #[serde(default)]
    pub commands: BTreeMap<String, CommandSpec>,
}

/// Errors surfaced while producing structural dumps.
#[derive(Debug, thiserror::Error)]
pub enum LangError {
    /// A normalization or extraction pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Compilation failure reported by the regex engine.
        #[source]
        source: regex::Error,
    },
    /// The external program could not be found.
    #[error("`{program}` was not found")]
    ToolNotFound {
        /// Program that failed to start.
        program: String,
    },
    /// The external program did not finish in time and was killed.
    #[error("`{program}` timed out after {seconds}s")]
    ToolTimedOut {
        /// Program that hung.
        program: String,
        /// Timeout that elapsed.
        seconds: u64,
    },
    /// The external program exited unsuccessfully.
    #[error("`{program}` failed with status {status}: {stderr}")]
    ToolFailed {
        /// Program that failed.
        program: String,
        /// Exit code, or `terminated` when killed by a signal.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },
    /// The producer succeeded but wrote nothing.
    #[error("`{program}` produced no output{}", stderr_detail(.stderr))]
    EmptyOutput {
        /// Program that stayed silent.
        program: String,
        /// Trimmed standard error output, often the reason nothing was printed.
        stderr: String,
    },
    /// Generic failure surfaced by a producer.
    #[error("{message}")]
    Failure {
        /// Human-readable error message.
        message: String,
    },
}

impl LangError {
    /// Helper to construct a failure from any displayable message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Whether the error means "no tool able to handle this input" rather than
    /// a malfunction of a tool that should have worked.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. })
    }
}

fn stderr_detail(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Convenience result alias for language operations.
pub type LangResult<T> = std::result::Result<T, LangError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_mentions_stderr_when_present() {
        let silent = LangError::EmptyOutput {
            program: "tree-sitter".into(),
            stderr: String::new(),
        };
        assert_eq!(silent.to_string(), "`tree-sitter` produced no output");
        let warned = LangError::EmptyOutput {
            program: "tree-sitter".into(),
            stderr: "no language found".into(),
        };
        assert_eq!(
            warned.to_string(),
            "`tree-sitter` produced no output: no language found"
        );
    }

    #[test]
    fn options_placeholder_is_expanded() {
        let command = CommandSpec::new("node", ["-e", "parse(${OPTIONS})"])
            .with_options("{ecmaVersion: 'latest'}");
        assert_eq!(
            command.expanded_switches(),
            vec!["-e".to_owned(), "parse({ecmaVersion: 'latest'})".to_owned()]
        );
    }

    #[test]
    fn missing_options_expand_to_nothing() {
        let command = CommandSpec::new("tool", ["--opts=${OPTIONS}"]);
        assert_eq!(command.expanded_switches(), vec!["--opts=".to_owned()]);
        assert_eq!(command.display(), "tool --opts=");
    }

    #[test]
    fn built_in_marker_is_recognised() {
        assert!(CommandSpec::built_in().is_built_in());
        assert!(!CommandSpec::new("ruby", ["--dump=parsetree"]).is_built_in());
    }
}
