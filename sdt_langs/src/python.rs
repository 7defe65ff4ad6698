//! Python parse trees from `python3 -m ast -a`.

use sdt_lang_api::{CommandSpec, Extractor, LangResult, LanguageProfile, NormalizationRule, PositionUnit};

/// Registry id and `[commands.python]` key.
pub const ID: &str = "python";
/// Display name.
pub const LABEL: &str = "Python";
/// Recognised extensions.
pub const EXTENSIONS: &[&str] = &[".py", ".pyw", ".pyde", ".pyt"];

/// Default producer command.
#[must_use]
pub fn default_command() -> CommandSpec {
    CommandSpec::new("python3", ["-m", "ast", "-a"])
}

/// Profile for Python AST dumps with attributes.
///
/// # Errors
///
/// Returns an error if one of the built-in patterns fails to compile.
pub fn profile() -> LangResult<LanguageProfile> {
    Ok(LanguageProfile::syntax_tree(
        Extractor::captures(r"\b(?:end_)?lineno=(\d+)")?,
        PositionUnit::Line,
        4,
    )
    .with_rule(NormalizationRule::new(
        r"\b(lineno|end_lineno|col_offset|end_col_offset)=\d+",
        "${1}=?",
    )?)
    .with_display_rule(NormalizationRule::strip(
        r"(?m)^[ \t]*(?:lineno|end_lineno|col_offset)=\?,?[ \t]*$[\r\n]*",
    )?)
    .with_display_rule(NormalizationRule::strip(r",?[ \t]*end_col_offset=\?")?))
}
