//! Byte-range to line-number index over a text blob.

/// One line of an indexed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// Byte offset of the first character of the line.
    pub start: u32,
    /// Byte offset just past the line feed that ends the line.
    ///
    /// The last line is treated as if it were terminated as well, so
    /// `end == start + text.len() + 1` for every record.
    pub end: u32,
    /// Line content without its line feed.
    pub text: String,
}

/// Sorted, gapless table of the lines of a text.
///
/// Only `\n` separates lines; a `\r` stays part of the line it ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineOffsetTable {
    records: Vec<LineRecord>,
    len: u32,
}

impl LineOffsetTable {
    /// Index a string.
    #[must_use]
    pub fn build(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Index raw bytes; line text is decoded lossily.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut records = Vec::new();
        let mut start: u32 = 0;
        for line in bytes.split(|b| *b == b'\n') {
            let end = start.saturating_add(to_u32(line.len())).saturating_add(1);
            records.push(LineRecord {
                start,
                end,
                text: String::from_utf8_lossy(line).into_owned(),
            });
            start = end;
        }
        Self {
            records,
            len: to_u32(bytes.len()),
        }
    }

    /// 0-based index of the line containing byte `pos`, or `None` when `pos`
    /// is at or past the end of the text.
    #[must_use]
    pub fn line_at(&self, pos: u32) -> Option<usize> {
        if pos >= self.len {
            return None;
        }
        let idx = self.records.partition_point(|record| record.end <= pos);
        self.records
            .get(idx)
            .filter(|record| record.start <= pos)
            .map(|_| idx)
    }

    /// All records, in order.
    #[must_use]
    pub fn records(&self) -> &[LineRecord] {
        &self.records
    }

    /// Number of lines, counting a trailing partial (possibly empty) line.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Length in bytes of the indexed text.
    #[must_use]
    pub const fn text_len(&self) -> u32 {
        self.len
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Mary had a little lamb
Its fleece as white as snow
And everywhere that Mary went
The lamb was sure to go";

    #[test]
    fn records_cover_every_line() {
        let table = LineOffsetTable::build(SAMPLE);
        let starts: Vec<u32> = table.records().iter().map(|r| r.start).collect();
        let ends: Vec<u32> = table.records().iter().map(|r| r.end).collect();
        assert_eq!(table.len(), 4);
        assert_eq!(starts, vec![0, 23, 51, 81]);
        assert_eq!(ends, vec![23, 51, 81, 105]);
        assert_eq!(table.records()[3].text, "The lamb was sure to go");
    }

    #[test]
    fn bytes_and_strings_index_identically() {
        assert_eq!(
            LineOffsetTable::build(SAMPLE),
            LineOffsetTable::from_bytes(SAMPLE.as_bytes())
        );
    }

    #[test]
    fn positions_resolve_to_lines() {
        let table = LineOffsetTable::build(SAMPLE);
        let found: Vec<Option<usize>> = [3, 25, 26, 70, 90, 999]
            .into_iter()
            .map(|pos| table.line_at(pos))
            .collect();
        assert_eq!(
            found,
            vec![Some(0), Some(1), Some(1), Some(2), Some(3), None]
        );
    }

    #[test]
    fn end_of_text_is_not_found() {
        let table = LineOffsetTable::build(SAMPLE);
        assert_eq!(table.line_at(103), Some(3));
        assert_eq!(table.line_at(104), None);
        assert_eq!(LineOffsetTable::build("").line_at(0), None);
    }

    #[test]
    fn every_position_lands_inside_its_record() {
        let text = "a\r\n\nbc\n\nlast";
        let table = LineOffsetTable::build(text);
        for pos in 0..table.text_len() {
            let idx = table.line_at(pos).expect("in range");
            let record = &table.records()[idx];
            assert!(record.start <= pos && pos < record.end, "pos {pos}");
        }
        assert_eq!(table.records()[0].text, "a\r");
        let gapless = table
            .records()
            .windows(2)
            .all(|pair| pair[0].end == pair[1].start);
        assert!(gapless);
    }

    #[test]
    fn trailing_newline_adds_empty_record() {
        let table = LineOffsetTable::build("x\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].text, "");
        assert_eq!(table.line_at(1), Some(0));
        assert_eq!(table.line_at(2), None);
    }
}
