//! JavaScript parse trees as acorn JSON, positioned by byte offsets.

use sdt_lang_api::{CommandSpec, Extractor, LangResult, LanguageProfile, NormalizationRule, PositionUnit};

/// Registry id and `[commands.javascript]` key.
pub const ID: &str = "javascript";
/// Display name.
pub const LABEL: &str = "JavaScript";
/// Recognised extensions.
pub const EXTENSIONS: &[&str] = &[".js", ".jsx", ".mdx", ".cjs", ".mjs", ".es", ".es6"];

const ACORN_SCRIPT: &str = "const acorn = require('acorn'); \
const fs = require('fs'); \
const source = fs.readFileSync(process.argv[1], 'utf8'); \
const tree = acorn.parse(source, ${OPTIONS}); \
console.log(JSON.stringify(tree, null, '  '));";

const ACORN_OPTIONS: &str = "{sourceType: 'module', ecmaVersion: 'latest'}";

/// Default producer command.
#[must_use]
pub fn default_command() -> CommandSpec {
    CommandSpec::new("node", ["-e", ACORN_SCRIPT]).with_options(ACORN_OPTIONS)
}

/// Profile for acorn JSON dumps.
///
/// # Errors
///
/// Returns an error if one of the built-in patterns fails to compile.
pub fn profile() -> LangResult<LanguageProfile> {
    Ok(LanguageProfile::syntax_tree(
        Extractor::captures(r#""(?:start|end)":\s*(\d+)"#)?,
        PositionUnit::ByteOffset,
        4,
    )
    .with_rule(NormalizationRule::new(r#""(start|end)":\s*\d+"#, r#""${1}": ?"#)?)
    .with_display_rule(NormalizationRule::strip(r#"(?m)^\s*"start": \?,$[\r\n]*"#)?)
    .with_display_rule(NormalizationRule::strip(r#"(?m)^\s*"end": \?,$[\r\n]*"#)?)
    .with_display_rule(NormalizationRule::strip(r"(?m)^\s*[\]}],?$[\r\n]*")?)
    .with_display_rule(NormalizationRule::strip(r#"[\[{,"]"#)?)
    .with_display_rule(NormalizationRule::strip(r"(?m)^\s*$[\r\n]*")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_masked_and_extracted() {
        let profile = profile().expect("profile");
        let line = r#"  "type": "Identifier", "start": 14, "end": 17,"#;
        assert_eq!(profile.extractor.extract(line), vec![14, 17]);
        assert_eq!(
            profile.rules[0].apply(line),
            r#"  "type": "Identifier", "start": ?, "end": ?,"#
        );
    }

    #[test]
    fn default_command_expands_parser_options() {
        let switches = default_command().expanded_switches();
        assert_eq!(switches[0], "-e");
        assert!(switches[1].contains("ecmaVersion: 'latest'"));
        assert!(!switches[1].contains("${OPTIONS}"));
    }

    #[test]
    fn display_rules_drop_positions_and_punctuation() {
        let profile = profile().expect("profile");
        let span = "    {\n      \"type\": \"Literal\",\n      \"start\": ?,\n      \"end\": ?,\n      \"value\": 2\n    },\n";
        let shown = profile
            .display_rules
            .iter()
            .fold(span.to_owned(), |acc, rule| rule.apply(&acc).into_owned());
        assert!(!shown.contains("start"));
        assert!(shown.contains("type: Literal"));
        assert!(shown.contains("value: 2"));
    }
}
