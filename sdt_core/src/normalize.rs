//! Position-insensitive rendering of raw structural dumps.

use sdt_lang_api::{LanguageProfile, NormalizationRule};

/// Apply the profile's normalization rules, in order, to a raw dump.
///
/// Rules only rewrite within lines, so line `n` of the result corresponds to
/// line `n` of the raw dump. A profile without rules returns the dump as is.
#[must_use]
pub fn normalize(raw: &[u8], profile: &LanguageProfile) -> String {
    apply_rules(&String::from_utf8_lossy(raw), &profile.rules)
}

/// Apply the profile's display-only rules to a span of normalized text.
#[must_use]
pub fn for_display(text: &str, profile: &LanguageProfile) -> String {
    apply_rules(text, &profile.display_rules)
}

fn apply_rules(text: &str, rules: &[NormalizationRule]) -> String {
    rules
        .iter()
        .fold(text.to_owned(), |acc, rule| rule.apply(&acc).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdt_langs::{golang, javascript, json, python, ruby, sql, treesitter};

    const PYTHON: &str = "\
Module(
  body=[
    Assign(
      targets=[
        Name(id='total', ctx=Store(), lineno=2, col_offset=4, end_lineno=2, end_col_offset=9)],
      value=BinOp(
        left=Name(id='a', ctx=Load(), lineno=2, col_offset=12, end_lineno=2, end_col_offset=13),
        op=Add(),
        right=Name(id='b', ctx=Load(), lineno=2, col_offset=16, end_lineno=2, end_col_offset=17),
        lineno=2,
        col_offset=12,
        end_lineno=2,
        end_col_offset=17),
      lineno=2,
      col_offset=4,
      end_lineno=2,
      end_col_offset=17)],
  type_ignores=[])
";

    const RUBY: &str = "\
# @ NODE_SCOPE (id: 4, line: 1, location: (1,0)-(1,5))
# +- nd_body:
#     @ NODE_OPCALL (id: 3, line: 1, location: (1,0)-(1,5))*
#     +- nd_recv:
#     |   @ NODE_INTEGER (id: 0, line: 1, location: (1,0)-(1,1))
";

    const JAVASCRIPT: &str = "{\n  \"type\": \"Program\",\n  \"start\": 0,\n  \"end\": 12,\n  \"body\": []\n}\n";

    const GO: &str = "SrcLn | Node\n00001 | *ast.File\n00003 | *ast.FuncDecl main\n";

    fn check(raw: &str, profile: &LanguageProfile) {
        let once = normalize(raw.as_bytes(), profile);
        let twice = normalize(once.as_bytes(), profile);
        assert_eq!(once, twice);
        assert_eq!(once.lines().count(), raw.lines().count());
    }

    #[test]
    fn normalization_is_idempotent_and_line_preserving() {
        check(PYTHON, &python::profile().expect("python"));
        check(RUBY, &ruby::profile().expect("ruby"));
        check(JAVASCRIPT, &javascript::profile().expect("javascript"));
        check(GO, &golang::profile().expect("go"));
        check(GO, &treesitter::profile().expect("treesitter"));
        check("SELECT 1;\n", &sql::profile());
        check("{\n  \"a\": 1\n}\n", &json::profile());
    }

    #[test]
    fn position_only_differences_vanish() {
        let profile = python::profile().expect("python");
        let shifted = PYTHON.replace("lineno=2", "lineno=7").replace("col_offset=4", "col_offset=8");
        assert_eq!(
            normalize(PYTHON.as_bytes(), &profile),
            normalize(shifted.as_bytes(), &profile)
        );
    }

    #[test]
    fn content_differences_survive() {
        let profile = python::profile().expect("python");
        let renamed = PYTHON.replace("id='a'", "id='c'");
        assert_ne!(
            normalize(PYTHON.as_bytes(), &profile),
            normalize(renamed.as_bytes(), &profile)
        );
    }

    #[test]
    fn empty_rule_list_is_identity() {
        let text = "SELECT A\nFROM T;\n";
        assert_eq!(normalize(text.as_bytes(), &sql::profile()), text);
    }

    #[test]
    fn display_rules_only_touch_spans() {
        let profile = ruby::profile().expect("ruby");
        let normalized = normalize(RUBY.as_bytes(), &profile);
        let shown = for_display(&normalized, &profile);
        assert!(!shown.contains("+-"));
        assert!(shown.contains("@ NODE_INTEGER"));
    }
}
