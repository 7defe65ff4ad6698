use serde::{Deserialize, Serialize};

/// A contiguous change region of a source-level unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDiffHunk {
    /// The `@@ -a,b +c,d @@` header exactly as it appeared in the diff.
    pub header: String,
    /// Parsed line ranges of the header.
    pub range: HunkRange,
    /// Body lines following the header, up to the next hunk.
    #[serde(default)]
    pub lines: Vec<DiffLine>,
}

impl SourceDiffHunk {
    /// Inclusive source line span a hunk is considered to cover.
    ///
    /// The span starts at the smaller of the two start lines and ends at the
    /// larger of the two end positions, so a hunk matches whenever either
    /// side's lines were touched.
    #[must_use]
    pub fn covered_lines(&self) -> (u32, u32) {
        let range = self.range;
        let low = range.base_start.min(range.head_start);
        let high = range
            .base_start
            .saturating_add(range.base_lines)
            .max(range.head_start.saturating_add(range.head_lines));
        (low, high)
    }
}

/// The line number ranges referenced by a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkRange {
    /// Starting line number for the base side.
    pub base_start: u32,
    /// Number of lines covered on the base side.
    pub base_lines: u32,
    /// Starting line number for the head side.
    pub head_start: u32,
    /// Number of lines covered on the head side.
    pub head_lines: u32,
}

impl HunkRange {
    /// Convenience constructor for explicit values.
    #[must_use]
    pub const fn new(base_start: u32, base_lines: u32, head_start: u32, head_lines: u32) -> Self {
        Self {
            base_start,
            base_lines,
            head_start,
            head_lines,
        }
    }
}

/// A single line within a source diff hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    /// The role the line plays in the diff.
    pub kind: DiffLineKind,
    /// Raw text of the line, including its leading marker character.
    pub text: String,
}

impl DiffLine {
    /// Classify a raw hunk body line by its first character.
    #[must_use]
    pub fn from_raw(text: &str) -> Self {
        let kind = match text.as_bytes().first() {
            Some(b'+') => DiffLineKind::Addition,
            Some(b'-') => DiffLineKind::Deletion,
            Some(b'\\') => DiffLineKind::Marker,
            _ => DiffLineKind::Context,
        };
        Self {
            kind,
            text: text.to_owned(),
        }
    }
}

/// Type of a line contained in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    /// Unchanged context line.
    Context,
    /// A newly added line.
    Addition,
    /// A deleted line.
    Deletion,
    /// Annotation such as `\ No newline at end of file`.
    Marker,
}

/// A contiguous change region of the structural (tree) text diff.
///
/// Positions are character offsets into the normalized tree text. Each hunk
/// after the first is expressed against the text as it looks once all earlier
/// hunks have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchHunk {
    /// Start offset on the before side.
    pub old_start: u32,
    /// Length of the region on the before side.
    pub old_count: u32,
    /// Start offset on the after side.
    pub new_start: u32,
    /// Length of the region on the after side.
    pub new_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covered_lines_spans_both_sides() {
        let hunk = SourceDiffHunk {
            header: "@@ -10,3 +12,5 @@".into(),
            range: HunkRange::new(10, 3, 12, 5),
            lines: Vec::new(),
        };
        assert_eq!(hunk.covered_lines(), (10, 17));
    }

    #[test]
    fn raw_lines_are_classified_by_marker() {
        assert_eq!(DiffLine::from_raw("+x").kind, DiffLineKind::Addition);
        assert_eq!(DiffLine::from_raw("-x").kind, DiffLineKind::Deletion);
        assert_eq!(DiffLine::from_raw(" x").kind, DiffLineKind::Context);
        assert_eq!(DiffLine::from_raw("").kind, DiffLineKind::Context);
        assert_eq!(
            DiffLine::from_raw("\\ No newline at end of file").kind,
            DiffLineKind::Marker
        );
    }

    #[test]
    fn hunk_serializes_with_snake_case_kinds() {
        let hunk = SourceDiffHunk {
            header: "@@ -1 +1 @@".into(),
            range: HunkRange::new(1, 1, 1, 1),
            lines: vec![DiffLine::from_raw("-a"), DiffLine::from_raw("+b")],
        };
        let json = serde_json::to_value(&hunk).expect("serialize");
        assert_eq!(json["lines"][0]["kind"], "deletion");
        assert_eq!(json["lines"][1]["kind"], "addition");
        assert_eq!(json["range"]["head_lines"], 1);
    }
}
