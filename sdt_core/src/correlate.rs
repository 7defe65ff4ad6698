//! Projection of tree-diff hunks back onto source line numbers.

use std::collections::BTreeSet;

use sdt_api::PatchHunk;
use sdt_lang_api::{LanguageProfile, PositionUnit};

use crate::offsets::LineOffsetTable;

/// 1-based source line numbers judged to lie inside semantically changed nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemanticLineSet(BTreeSet<u32>);

impl SemanticLineSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line; returns `false` if it was already present.
    pub fn insert(&mut self, line: u32) -> bool {
        self.0.insert(line)
    }

    /// Whether `line` is in the set.
    #[must_use]
    pub fn contains(&self, line: u32) -> bool {
        self.0.contains(&line)
    }

    /// Whether any line of the inclusive range `low..=high` is in the set.
    #[must_use]
    pub fn intersects(&self, low: u32, high: u32) -> bool {
        low <= high && self.0.range(low..=high).next().is_some()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no line was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lines in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for SemanticLineSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<u32> for SemanticLineSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// Map each hunk's `old_start` back to a before-text position.
///
/// Every hunk is shifted by the accumulated `old_count - new_count` of the
/// hunks before it. Results can be negative for inconsistent input.
#[must_use]
pub fn project(hunks: &[PatchHunk]) -> Vec<i64> {
    let mut adjustment = 0i64;
    hunks
        .iter()
        .map(|hunk| {
            let projected = i64::from(hunk.old_start) + adjustment;
            adjustment += i64::from(hunk.old_count) - i64::from(hunk.new_count);
            projected
        })
        .collect()
}

/// Compute the semantic line set for a tree diff.
///
/// `raw_tree` is the un-normalized before dump and `normalized` indexes its
/// normalized text. For each hunk, the line the projected position lands on
/// is widened by the profile's window radius, clamped to the raw tree, and
/// every line of that window is fed to the profile's extractor. Byte-offset
/// positions are resolved through `source`, the index of the before source
/// file, once all hunks are processed.
#[must_use]
pub fn correlate(
    hunks: &[PatchHunk],
    raw_tree: &str,
    normalized: &LineOffsetTable,
    profile: &LanguageProfile,
    source: &LineOffsetTable,
) -> SemanticLineSet {
    let raw_lines: Vec<&str> = raw_tree.split('\n').collect();
    let last = raw_lines.len().saturating_sub(1);
    let radius = profile.window_radius;
    let mut lines = SemanticLineSet::new();
    let mut offsets = BTreeSet::new();

    for (hunk, projected) in hunks.iter().zip(project(hunks)) {
        let Some(line) = u32::try_from(projected)
            .ok()
            .and_then(|pos| normalized.line_at(pos))
        else {
            tracing::debug!(?hunk, projected, "tree hunk lies outside the normalized tree");
            continue;
        };

        let low = line.saturating_sub(radius);
        let high = line.saturating_add(radius).min(last);
        for text in raw_lines.get(low..=high).unwrap_or_default() {
            for value in profile.extractor.extract(text) {
                match profile.unit {
                    PositionUnit::Line => {
                        lines.insert(value);
                    }
                    PositionUnit::ByteOffset => {
                        offsets.insert(value);
                    }
                }
            }
        }
        tracing::debug!(?hunk, tree_line = line, low, high, "correlated tree hunk");
    }

    for offset in offsets {
        match source.line_at(offset) {
            Some(idx) => {
                lines.insert(u32::try_from(idx + 1).unwrap_or(u32::MAX));
            }
            None => tracing::debug!(offset, "byte offset past end of source"),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::textdiff::{diff_text, patch_hunks, PATCH_MARGIN};
    use sdt_langs::{golang, javascript, python};

    const BEFORE: &str = "\
Module(
  body=[
    Assign(
      targets=[
        Name(id='x', ctx=Store(), lineno=1, col_offset=0, end_lineno=1, end_col_offset=1)],
      value=Constant(value=1, lineno=1, col_offset=4, end_lineno=1, end_col_offset=5),
      lineno=1,
      col_offset=0,
      end_lineno=1,
      end_col_offset=5),
    Assign(
      targets=[
        Name(id='y', ctx=Store(), lineno=5, col_offset=0, end_lineno=5, end_col_offset=1)],
      value=Constant(value=2, lineno=5, col_offset=4, end_lineno=5, end_col_offset=5),
      lineno=5,
      col_offset=0,
      end_lineno=5,
      end_col_offset=5)],
  type_ignores=[])
";

    fn lines_for(before: &str, after: &str, profile: &LanguageProfile, source: &str) -> SemanticLineSet {
        let left = normalize(before.as_bytes(), profile);
        let right = normalize(after.as_bytes(), profile);
        let hunks = patch_hunks(&diff_text(&left, &right));
        correlate(
            &hunks,
            before,
            &LineOffsetTable::build(&left),
            profile,
            &LineOffsetTable::build(source),
        )
    }

    #[test]
    fn projection_subtracts_earlier_growth() {
        let hunks = [
            PatchHunk { old_start: 16, old_count: 8, new_start: 16, new_count: 18 },
            PatchHunk { old_start: 56, old_count: 10, new_start: 56, new_count: 8 },
            PatchHunk { old_start: 90, old_count: 5, new_start: 90, new_count: 5 },
        ];
        let projected = project(&hunks);
        assert_eq!(projected[0], 16);
        assert_eq!(projected[1], 56 + (8 - 18));
        assert_eq!(projected[2], 90 + (8 - 18) + (10 - 8));
    }

    #[test]
    fn drift_correction_lands_on_original_position() {
        let before = format!("{}\n{}\nold\n{}\n", "a".repeat(40), "b".repeat(40), "c".repeat(40));
        let after = format!("{}0123456789\n{}\nnew\n{}\n", "a".repeat(40), "b".repeat(40), "c".repeat(40));
        let hunks = patch_hunks(&diff_text(&before, &after));
        assert_eq!(hunks.len(), 2);
        let projected = project(&hunks);
        let grow = i64::from(hunks[0].old_count) - i64::from(hunks[0].new_count);
        assert_eq!(grow, -10);
        assert_eq!(projected[1], i64::from(hunks[1].old_start) + grow);

        let old_at = i64::try_from(before.find("old").expect("marker")).expect("fits");
        let margin = i64::try_from(PATCH_MARGIN).expect("fits");
        assert_eq!(projected[1], old_at - margin);
    }

    #[test]
    fn python_change_maps_to_its_source_line() {
        let profile = python::profile().expect("python");
        let after = BEFORE.replace("value=2", "value=3");
        let lines = lines_for(BEFORE, &after, &profile, "");
        assert!(lines.contains(5));
        assert!(!lines.contains(1));
    }

    #[test]
    fn identical_trees_yield_no_lines() {
        let profile = python::profile().expect("python");
        assert!(lines_for(BEFORE, BEFORE, &profile, "").is_empty());
    }

    #[test]
    fn prefix_profile_reads_only_the_hunk_line() {
        let profile = golang::profile().expect("go");
        let before = "SrcLn | Node\n00001 | *ast.File\n00002 | *ast.Ident x\n00009 | *ast.BasicLit 1\n";
        let after = "SrcLn | Node\n00001 | *ast.File\n00002 | *ast.Ident x\n00009 | *ast.BasicLit 7\n";
        let lines = lines_for(before, after, &profile, "");
        assert_eq!(lines.iter().collect::<Vec<_>>(), vec![9]);
    }

    #[test]
    fn byte_offsets_resolve_against_source() {
        let profile = javascript::profile().expect("javascript");
        let source = "let a = 1;\nlet b = 2;\n";
        let before = "{\n  \"type\": \"Literal\",\n  \"start\": 19,\n  \"end\": 20,\n  \"value\": 2\n}\n";
        let after = before.replace("\"value\": 2", "\"value\": 5");
        let lines = lines_for(before, &after, &profile, source);
        assert_eq!(lines.iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn hunks_past_the_tree_are_ignored() {
        let profile = python::profile().expect("python");
        let hunks = [PatchHunk { old_start: 10_000, old_count: 1, new_start: 10_000, new_count: 1 }];
        let normalized = normalize(BEFORE.as_bytes(), &profile);
        let lines = correlate(
            &hunks,
            BEFORE,
            &LineOffsetTable::build(&normalized),
            &profile,
            &LineOffsetTable::default(),
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn intersects_checks_inclusive_bounds() {
        let set: SemanticLineSet = [4, 10].into_iter().collect();
        assert!(set.intersects(1, 4));
        assert!(set.intersects(10, 12));
        assert!(!set.intersects(5, 9));
        assert!(!set.intersects(9, 5));
    }
}
