//! Ruby parse trees from `ruby --dump=parsetree`.
//!
//! Nodes are printed as `# @ NODE_X (id: 7, line: 3, location: (3,2)-(3,9))`
//! under `# +- ` / `# | ` drawing characters.

use sdt_lang_api::{CommandSpec, Extractor, LangResult, LanguageProfile, NormalizationRule, PositionUnit};

/// Registry id and `[commands.ruby]` key.
pub const ID: &str = "ruby";
/// Display name.
pub const LABEL: &str = "Ruby";
/// Recognised extensions.
pub const EXTENSIONS: &[&str] = &[
    ".rb", ".rake", ".gemspec", ".god", ".irbrc", ".mspec", ".pluginspec", ".podspec", ".rabl",
    ".rbuild", ".rbw", ".rbx", ".ru", ".ruby", ".thor", ".watchr",
];

/// Default producer command.
#[must_use]
pub fn default_command() -> CommandSpec {
    CommandSpec::new("ruby", ["--dump=parsetree"])
}

/// Profile for Ruby parse-tree dumps.
///
/// # Errors
///
/// Returns an error if one of the built-in patterns fails to compile.
pub fn profile() -> LangResult<LanguageProfile> {
    Ok(
        LanguageProfile::syntax_tree(
            Extractor::captures(r"\bline: (\d+)")?,
            PositionUnit::Line,
            4,
        )
        .with_rule(NormalizationRule::strip(r"(?m)[ \t]*\((?:id: \d+, )?line: .*$")?)
        .with_rule(NormalizationRule::strip(r"(?m)^(?:# )+")?)
        .with_display_rule(NormalizationRule::strip(r"(?m)^##.*$[\r\n]*")?)
        .with_display_rule(NormalizationRule::strip(r"(\| |\+-)")?),
    )
}
