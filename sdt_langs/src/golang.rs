//! Go parse trees from `gotree`, one `NNNNN | node` line per node.

use sdt_lang_api::{CommandSpec, Extractor, LangResult, LanguageProfile, NormalizationRule, PositionUnit};

/// Registry id and `[commands.go]` key.
pub const ID: &str = "go";
/// Display name.
pub const LABEL: &str = "Go";
/// Recognised extensions.
pub const EXTENSIONS: &[&str] = &[".go", ".v"];

/// Default producer command.
#[must_use]
pub fn default_command() -> CommandSpec {
    CommandSpec::new("gotree", Vec::<String>::new())
}

/// Profile shared by every dump using the `NNNNN | node` layout.
///
/// The line number is attached to the node itself, so no neighbouring lines
/// are inspected.
///
/// # Errors
///
/// Returns an error if the built-in pattern fails to compile.
pub fn prefixed_profile() -> LangResult<LanguageProfile> {
    Ok(
        LanguageProfile::syntax_tree(Extractor::line_prefix(), PositionUnit::Line, 0)
            .with_rule(NormalizationRule::strip(r"(?m)^(?:\d{5}|SrcLn) \| ")?),
    )
}

/// Profile for `gotree` dumps.
///
/// # Errors
///
/// Returns an error if the built-in pattern fails to compile.
pub fn profile() -> LangResult<LanguageProfile> {
    prefixed_profile()
}
