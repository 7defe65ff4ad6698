//! Generic fallback built on `tree-sitter parse`.
//!
//! The S-expression printed by tree-sitter is rewritten into the same
//! `NNNNN | node` layout `gotree` produces: position spans are dropped,
//! single-line identifiers and literals get their source text inlined, and
//! comment nodes are skipped unless requested.

use std::path::Path;

use regex::Regex;
use sdt_lang_api::{CommandSpec, LangError, LangResult, LanguageProfile, TreeSource};

use crate::command::CommandSource;
use crate::golang;

/// Registry id and `[commands.treesitter]` key.
pub const ID: &str = "treesitter";
/// Display name.
pub const LABEL: &str = "Tree-Sitter";
/// Environment variable that keeps comment nodes in the dump when set.
pub const KEEP_COMMENTS_ENV: &str = "TREESIT_COMMENTS";

/// Command wrapped by the built-in adapter.
#[must_use]
pub fn parser_command() -> CommandSpec {
    CommandSpec::new("tree-sitter", ["parse"])
}

/// Profile for rewritten tree-sitter dumps.
///
/// # Errors
///
/// Returns an error if the built-in pattern fails to compile.
pub fn profile() -> LangResult<LanguageProfile> {
    golang::prefixed_profile()
}

/// Built-in adapter turning `tree-sitter parse` output into a prefixed dump.
#[derive(Debug, Clone)]
pub struct TreeSitterSource {
    parser: CommandSource,
    keep_comments: bool,
    comment: Regex,
    span: Regex,
    literal: Regex,
}

impl TreeSitterSource {
    /// Wrap the given parser invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the node patterns fails to compile.
    pub fn new(parser: CommandSource, keep_comments: bool) -> LangResult<Self> {
        Ok(Self {
            parser,
            keep_comments,
            comment: compile(r"\((?:line_)?comment")?,
            span: compile(r" \[(\d+), (\d+)\] - \[(\d+), (\d+)\]")?,
            literal: compile(r"\((?:identifier |[a-z]+_literal |system_lib_string |operator )")?,
        })
    }

    /// Rewrite raw parser output for the file whose text is `source`.
    #[must_use]
    pub fn rewrite(&self, parsed: &str, source: &str) -> String {
        let source_lines: Vec<&str> = source.split('\n').collect();
        let mut out = String::from("SrcLn | Node\n");

        for line in parsed.lines() {
            if line.is_empty() || (!self.keep_comments && self.comment.is_match(line)) {
                continue;
            }
            let Some(caps) = self.span.captures(line) else {
                tracing::debug!(node = line, "tree-sitter node without position span");
                continue;
            };
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let numbers: Vec<usize> = (1..=4)
                .filter_map(|idx| caps.get(idx))
                .filter_map(|m| m.as_str().parse().ok())
                .collect();
            let [row, left, end_row, right] = numbers[..] else {
                continue;
            };

            let inlined = if row == end_row && self.literal.is_match(line) {
                source_lines
                    .get(row)
                    .and_then(|text| text.get(left..right))
                    .map(|text| format!(" {text}"))
                    .unwrap_or_default()
            } else {
                String::new()
            };
            let node = line.replacen(whole, &inlined, 1);
            out.push_str(&format!("{:05} | {node}\n", row + 1));
        }
        out
    }
}

impl TreeSource for TreeSitterSource {
    fn describe(&self) -> String {
        format!("built-in adapter over `{}`", self.parser.spec().display())
    }

    fn dump(&self, path: &Path) -> LangResult<Vec<u8>> {
        let output = self.parser.run(path)?;
        let source = std::fs::read(path)
            .map_err(|err| LangError::message(format!("failed to read {}: {err}", path.display())))?;
        let source = String::from_utf8_lossy(&source);
        let parsed = String::from_utf8_lossy(&output.stdout);
        if parsed.trim().is_empty() {
            return Err(LangError::EmptyOutput {
                program: self.parser.spec().executable.clone(),
                stderr: output.stderr_text(),
            });
        }
        Ok(self.rewrite(&parsed, &source).into_bytes())
    }
}

fn compile(pattern: &str) -> LangResult<Regex> {
    Regex::new(pattern).map_err(|source| LangError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "int main() {\n  // greet\n  return x + 1;\n}\n";
    const PARSED: &str = "\
(translation_unit [0, 0] - [4, 0]
  (function_definition [0, 0] - [3, 1]
    body: (compound_statement [0, 11] - [3, 1]
      (comment [1, 2] - [1, 10])
      (return_statement [2, 2] - [2, 15]
        (binary_expression [2, 9] - [2, 14]
          left: (identifier [2, 9] - [2, 10])
          right: (number_literal [2, 13] - [2, 14]))))))
";

    fn adapter(keep_comments: bool) -> TreeSitterSource {
        TreeSitterSource::new(CommandSource::new(parser_command()), keep_comments)
            .expect("adapter")
    }

    #[test]
    fn rewrites_into_prefixed_layout() {
        let dump = adapter(false).rewrite(PARSED, SOURCE);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "SrcLn | Node");
        assert_eq!(lines[1], "00001 | (translation_unit");
        assert!(lines.contains(&"00003 |           left: (identifier x)"));
        assert!(lines.contains(&"00003 |           right: (number_literal 1))))))"));
        assert!(!dump.contains("comment"));
        assert!(!dump.contains('['));
    }

    #[test]
    fn comments_can_be_kept() {
        let dump = adapter(true).rewrite(PARSED, SOURCE);
        assert!(dump.contains("00002 |       (comment)"));
    }

    #[test]
    fn rewritten_dump_feeds_prefix_extractor() {
        let profile = profile().expect("profile");
        let dump = adapter(false).rewrite(PARSED, SOURCE);
        let lines: Vec<u32> = dump
            .lines()
            .flat_map(|line| profile.extractor.extract(line))
            .collect();
        assert_eq!(lines.first(), Some(&1));
        assert!(lines.contains(&3));
    }
}
