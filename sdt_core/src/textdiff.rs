//! Edit scripts and patch hunks over normalized tree text, backed by `similar`.

use std::ops::Range;

use sdt_api::PatchHunk;
use similar::{Algorithm, ChangeTag, TextDiff};

/// Unchanged bytes kept around each change region of a patch hunk.
pub const PATCH_MARGIN: usize = 4;

/// Role of a span in an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTag {
    /// Present on both sides.
    Equal,
    /// Only in the before text.
    Delete,
    /// Only in the after text.
    Insert,
}

/// One span of an edit script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOp {
    /// Role of the span.
    pub tag: DiffTag,
    /// Text of the span.
    pub text: String,
}

/// Character-level edit script turning `before` into `after`.
///
/// Lines are matched first; every replaced block of lines is then refined
/// character by character. Adjacent spans with the same tag are merged.
#[must_use]
pub fn diff_text(before: &str, after: &str) -> Vec<DiffOp> {
    let lines = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(before, after);
    let mut ops = Vec::new();

    for op in lines.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let old_text = joined(lines.old_slices(), old_range);
        let new_text = joined(lines.new_slices(), new_range);
        match tag {
            similar::DiffTag::Equal => push(&mut ops, DiffTag::Equal, &old_text),
            similar::DiffTag::Delete => push(&mut ops, DiffTag::Delete, &old_text),
            similar::DiffTag::Insert => push(&mut ops, DiffTag::Insert, &new_text),
            similar::DiffTag::Replace => refine(&mut ops, &old_text, &new_text),
        }
    }
    ops
}

/// Whether an edit script contains any change.
#[must_use]
pub fn has_changes(ops: &[DiffOp]) -> bool {
    ops.iter().any(|op| op.tag != DiffTag::Equal)
}

/// Group an edit script into patch hunks with [`PATCH_MARGIN`] bytes of context.
///
/// Changes separated by at most twice the margin share a hunk. Hunks use
/// rolling coordinates: the start of each hunk is measured in the before text
/// with every earlier hunk already applied, so its `old_start` is offset from
/// the original before-text position by the net growth of the earlier hunks.
#[must_use]
pub fn patch_hunks(ops: &[DiffOp]) -> Vec<PatchHunk> {
    let mut hunks = Vec::new();
    let mut open: Option<OpenHunk> = None;
    let mut pos_old = 0usize;
    let mut pos_new = 0usize;
    let mut drift = 0i64;
    let mut preceding_equal = 0usize;

    for (idx, op) in ops.iter().enumerate() {
        let len = op.text.len();
        match op.tag {
            DiffTag::Equal => {
                if let Some(mut hunk) = open.take() {
                    let last = idx + 1 == ops.len();
                    if len <= 2 * PATCH_MARGIN && !last {
                        hunk.old_len += len;
                        hunk.new_len += len;
                        open = Some(hunk);
                    } else {
                        let context = len.min(PATCH_MARGIN);
                        hunk.old_len += context;
                        hunk.new_len += context;
                        hunks.push(hunk.close(&mut drift));
                    }
                }
                pos_old += len;
                pos_new += len;
                preceding_equal = len;
            }
            DiffTag::Delete | DiffTag::Insert => {
                let hunk = open.get_or_insert_with(|| {
                    let context = preceding_equal.min(PATCH_MARGIN);
                    OpenHunk {
                        old_start: pos_old - context,
                        old_len: context,
                        new_start: pos_new - context,
                        new_len: context,
                    }
                });
                if op.tag == DiffTag::Delete {
                    hunk.old_len += len;
                    pos_old += len;
                } else {
                    hunk.new_len += len;
                    pos_new += len;
                }
                preceding_equal = 0;
            }
        }
    }
    if let Some(hunk) = open {
        hunks.push(hunk.close(&mut drift));
    }
    hunks
}

struct OpenHunk {
    old_start: usize,
    old_len: usize,
    new_start: usize,
    new_len: usize,
}

impl OpenHunk {
    fn close(self, drift: &mut i64) -> PatchHunk {
        let rolling = to_i64(self.old_start).saturating_add(*drift);
        *drift += to_i64(self.new_len) - to_i64(self.old_len);
        PatchHunk {
            old_start: u32::try_from(rolling.max(0)).unwrap_or(u32::MAX),
            old_count: to_u32(self.old_len),
            new_start: to_u32(self.new_start),
            new_count: to_u32(self.new_len),
        }
    }
}

fn refine(ops: &mut Vec<DiffOp>, old: &str, new: &str) {
    let chars = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(old, new);
    for change in chars.iter_all_changes() {
        let tag = match change.tag() {
            ChangeTag::Equal => DiffTag::Equal,
            ChangeTag::Delete => DiffTag::Delete,
            ChangeTag::Insert => DiffTag::Insert,
        };
        push(ops, tag, change.value());
    }
}

fn push(ops: &mut Vec<DiffOp>, tag: DiffTag, text: &str) {
    if text.is_empty() {
        return;
    }
    match ops.last_mut() {
        Some(last) if last.tag == tag => last.text.push_str(text),
        _ => ops.push(DiffOp {
            tag,
            text: text.to_owned(),
        }),
    }
}

fn joined(slices: &[&str], range: Range<usize>) -> String {
    slices.get(range).map(<[&str]>::concat).unwrap_or_default()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
