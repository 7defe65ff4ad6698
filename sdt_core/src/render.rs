//! Report rendering: source hunk filtering and full tree diffs.

use sdt_api::{
    DiffLineKind, Markup, RenderStyle, SourceDiffHunk, NO_SEMANTIC_DIFFERENCES, SEMANTIC_BANNER,
    TREE_BANNER,
};
use sdt_lang_api::LanguageProfile;

use crate::correlate::SemanticLineSet;
use crate::normalize::for_display;
use crate::textdiff::{has_changes, DiffOp, DiffTag};

/// Hunks whose covered line span intersects `lines`, in input order.
#[must_use]
pub fn filter_hunks<'h>(
    hunks: &'h [SourceDiffHunk],
    lines: &SemanticLineSet,
) -> Vec<&'h SourceDiffHunk> {
    hunks
        .iter()
        .filter(|hunk| {
            let (low, high) = hunk.covered_lines();
            lines.intersects(low, high)
        })
        .collect()
}

/// Render the source hunks touched by `lines` as a semantic report.
///
/// Returns [`NO_SEMANTIC_DIFFERENCES`] when no hunk is retained.
#[must_use]
pub fn filter_and_render(
    hunks: &[SourceDiffHunk],
    lines: &SemanticLineSet,
    style: RenderStyle,
    minimal: bool,
) -> String {
    let kept = filter_hunks(hunks, lines);
    if kept.is_empty() {
        return NO_SEMANTIC_DIFFERENCES.to_owned();
    }
    tracing::debug!(total = hunks.len(), kept = kept.len(), "filtered source hunks");

    let markup = style.markup();
    let mut rows = vec![Row::kept(markup.wrap(markup.header, SEMANTIC_BANNER))];
    for hunk in kept {
        rows.push(Row::kept(markup.wrap(markup.info, &hunk.header)));
        for line in &hunk.lines {
            rows.push(match line.kind {
                DiffLineKind::Addition => Row::kept(markup.wrap(markup.add, &line.text)),
                DiffLineKind::Deletion => Row::kept(markup.wrap(markup.del, &line.text)),
                DiffLineKind::Context | DiffLineKind::Marker => Row::context(line.text.clone()),
            });
        }
    }
    finish(rows, style, minimal, true)
}

/// Render a whole tree or canonical text diff, marking every changed span.
///
/// Display rules of `profile` are applied to each span before markup. A line
/// counts as changed for minimal output when an inserted or deleted span on
/// it holds more than whitespace, whatever the markup of `style`.
/// Returns [`NO_SEMANTIC_DIFFERENCES`] when the script has no change.
#[must_use]
pub fn render_tree_diff(
    ops: &[DiffOp],
    profile: &LanguageProfile,
    style: RenderStyle,
    minimal: bool,
) -> String {
    if !has_changes(ops) {
        return NO_SEMANTIC_DIFFERENCES.to_owned();
    }
    let markup = style.markup();
    let mut rows = vec![
        Row::kept(markup.wrap(markup.header, TREE_BANNER)),
        Row::context(String::new()),
    ];
    for op in ops {
        let text = for_display(&op.text, profile);
        let open = match op.tag {
            DiffTag::Equal => None,
            DiffTag::Insert => Some(markup.add),
            DiffTag::Delete => Some(markup.del),
        };
        for (index, piece) in text.split('\n').enumerate() {
            if index > 0 {
                rows.push(Row::context(String::new()));
            }
            let Some(row) = rows.last_mut() else { continue };
            match open {
                _ if piece.is_empty() => {}
                None => row.text.push_str(piece),
                Some(open) => {
                    row.text.push_str(&markup.wrap(open, piece));
                    row.change |= !piece.trim().is_empty();
                }
            }
        }
    }
    if rows.len() > 2 && rows.last().is_some_and(|row| row.text.is_empty()) {
        rows.pop();
    }
    finish(rows, style, minimal, false)
}

/// One report line and whether minimal output keeps it.
#[derive(Debug)]
struct Row {
    text: String,
    change: bool,
}

impl Row {
    const fn kept(text: String) -> Self {
        Self { text, change: true }
    }

    const fn context(text: String) -> Self {
        Self { text, change: false }
    }
}

fn finish(rows: Vec<Row>, style: RenderStyle, minimal: bool, color_gutter: bool) -> String {
    let markup = style.markup();
    let gutter = if color_gutter {
        format!("{} ", markup.wrap(markup.header, "|"))
    } else {
        "| ".to_owned()
    };

    rows.into_iter()
        .filter(|row| !minimal || row.change)
        .map(|row| {
            if style == RenderStyle::Dumbterm {
                format!("{gutter}{}", collapse_blank_markers(&row.text, &markup))
            } else {
                format!("{gutter}{}", row.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace `{{+   }}` and `{{-   }}` spans that only hold whitespace by the
/// whitespace itself.
fn collapse_blank_markers(text: &str, markup: &Markup) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let next = [markup.add, markup.del]
            .iter()
            .filter_map(|open| rest.find(open).map(|idx| (idx, open.len())))
            .min();
        let Some((idx, open_len)) = next else {
            out.push_str(rest);
            return out;
        };
        let inner = &rest[idx + open_len..];
        let blank = inner.len() - inner.trim_start().len();
        if blank > 0 && inner[blank..].starts_with(markup.clear) {
            out.push_str(&rest[..idx]);
            out.push_str(&inner[..blank]);
            rest = &inner[blank + markup.clear.len()..];
        } else {
            out.push_str(&rest[..idx + open_len]);
            rest = inner;
        }
    }
}
