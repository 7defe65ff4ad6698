//! Parsing of source-level unified diff text into [`SourceDiffHunk`]s.

use sdt_api::{DiffLine, DiffLineKind, HunkRange, SourceDiffHunk};

/// A hunk header that does not parse as `@@ -a[,b] +c[,d] @@`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed hunk header: {header}")]
pub struct HunkHeaderError {
    /// The offending header line.
    pub header: String,
}

/// Parse every hunk of a unified diff.
///
/// File headers and anything outside a hunk body are ignored. Hunks whose
/// header is malformed are skipped along with their body lines.
#[must_use]
pub fn parse_unified(diff: &str) -> Vec<SourceDiffHunk> {
    let mut hunks = Vec::new();
    let mut current: Option<Body> = None;

    for line in diff.lines() {
        if let Some(body) = current.as_mut() {
            if body.accepts(line) {
                body.push(line);
                continue;
            }
        }
        if let Some(body) = current.take() {
            if let Some(hunk) = body.finish() {
                hunks.push(hunk);
            }
        }
        if !line.starts_with("@@") {
            continue;
        }
        current = Some(match parse_hunk_header(line) {
            Ok(range) => Body::open(line, range),
            Err(err) => {
                tracing::debug!(%err, "skipping hunk");
                Body::skipped()
            }
        });
    }
    if let Some(hunk) = current.and_then(Body::finish) {
        hunks.push(hunk);
    }
    hunks
}

/// Parse the four integers of a hunk header. An omitted count means one line.
///
/// # Errors
///
/// Returns [`HunkHeaderError`] if the header is not of the form
/// `@@ -a[,b] +c[,d] @@`.
pub fn parse_hunk_header(line: &str) -> Result<HunkRange, HunkHeaderError> {
    let malformed = || HunkHeaderError {
        header: line.to_owned(),
    };
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|rest| rest.split_once(" @@"))
        .map(|(ranges, _)| ranges)
        .ok_or_else(malformed)?;
    let (old, new) = inner.split_once(' ').ok_or_else(malformed)?;
    let (base_start, base_lines) = old
        .strip_prefix('-')
        .and_then(parse_span)
        .ok_or_else(malformed)?;
    let (head_start, head_lines) = new
        .strip_prefix('+')
        .and_then(parse_span)
        .ok_or_else(malformed)?;
    Ok(HunkRange::new(base_start, base_lines, head_start, head_lines))
}

fn parse_span(span: &str) -> Option<(u32, u32)> {
    match span.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((span.parse().ok()?, 1)),
    }
}

struct Body {
    hunk: Option<SourceDiffHunk>,
    old_left: u32,
    new_left: u32,
}

impl Body {
    fn open(header: &str, range: HunkRange) -> Self {
        Self {
            hunk: Some(SourceDiffHunk {
                header: header.to_owned(),
                range,
                lines: Vec::new(),
            }),
            old_left: range.base_lines,
            new_left: range.head_lines,
        }
    }

    const fn skipped() -> Self {
        Self {
            hunk: None,
            old_left: u32::MAX,
            new_left: u32::MAX,
        }
    }

    fn accepts(&self, line: &str) -> bool {
        if line.starts_with('\\') {
            return true;
        }
        if line.starts_with("@@") {
            return false;
        }
        match line.as_bytes().first() {
            Some(b'-') => self.old_left > 0,
            Some(b'+') => self.new_left > 0,
            _ => self.old_left > 0 && self.new_left > 0,
        }
    }

    fn push(&mut self, line: &str) {
        let parsed = DiffLine::from_raw(line);
        match parsed.kind {
            DiffLineKind::Deletion => self.old_left = self.old_left.saturating_sub(1),
            DiffLineKind::Addition => self.new_left = self.new_left.saturating_sub(1),
            DiffLineKind::Context => {
                self.old_left = self.old_left.saturating_sub(1);
                self.new_left = self.new_left.saturating_sub(1);
            }
            DiffLineKind::Marker => {}
        }
        if let Some(hunk) = self.hunk.as_mut() {
            hunk.lines.push(parsed);
        }
    }

    fn finish(self) -> Option<SourceDiffHunk> {
        self.hunk
    }
}
