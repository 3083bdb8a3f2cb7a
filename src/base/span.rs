//! Source text positions and ranges.

use std::fmt;

pub use text_size::TextRange;
pub use text_size::TextSize;

/// A location in source text.
///
/// `line` and `column` are 1-indexed (as displayed to users); `offset` is the
/// 0-indexed byte offset into the source. Columns count UTF-8 bytes.
#[derive(Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed column (in UTF-8 bytes, not characters)
    pub column: u32,
    /// 0-indexed byte offset
    pub offset: TextSize,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self {
            line,
            column,
            offset: TextSize::from(offset),
        }
    }

    /// Create a position from line/column only, for cursor lookups where the
    /// byte offset is unknown. Comparisons never look at the offset.
    #[inline]
    pub fn at(line: u32, column: u32) -> Self {
        Self::new(line, column, 0)
    }

    /// `(line, column)` key used for ordering.
    #[inline]
    pub fn line_col(self) -> (u32, u32) {
        (self.line, self.column)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

// Equality and ordering use (line, column) only.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.line_col() == other.line_col()
    }
}

impl Eq for Position {}

impl std::hash::Hash for Position {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.line_col().hash(state);
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line_col().cmp(&other.line_col())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span of source text. `start <= end` by (line, column).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range. Arguments are swapped if given out of order.
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// A zero-width range at `pos`.
    pub fn empty(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }

    /// Smallest range covering both `self` and `other`.
    pub fn cover(self, other: Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `pos` lies inside this range, inclusive at both ends.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether `other` lies entirely inside this range.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Byte range for slicing the source text.
    pub fn text_range(&self) -> TextRange {
        TextRange::new(self.start.offset, self.end.offset.max(self.start.offset))
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:?}", self.start, self.end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Index for converting byte offsets into [`Position`]s.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self { line_starts }
    }

    /// Convert a byte offset to a position.
    pub fn position(&self, offset: TextSize) -> Position {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let line_start = self.line_starts[line];
        let col: u32 = (offset - line_start).into();

        Position {
            line: line as u32 + 1,
            column: col + 1,
            offset,
        }
    }

    /// Convert a 1-indexed line/column back to a byte offset.
    pub fn offset(&self, line: u32, column: u32) -> Option<TextSize> {
        let line_start = self.line_starts.get(line.checked_sub(1)? as usize)?;
        Some(*line_start + TextSize::from(column.checked_sub(1)?))
    }

    /// Get the number of lines.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    /// Check if there are no lines (never true, an empty text has one line).
    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(format!("{}", Position::at(1, 1)), "1:1");
        assert_eq!(format!("{}", Position::at(6, 11)), "6:11");
    }

    #[test]
    fn test_position_ordering_ignores_offset() {
        assert!(Position::new(1, 5, 99) < Position::new(2, 1, 0));
        assert_eq!(Position::new(3, 2, 10), Position::at(3, 2));
    }

    #[test]
    fn test_range_contains_inclusive() {
        let range = Range::new(Position::at(1, 5), Position::at(1, 8));
        assert!(range.contains(Position::at(1, 5)));
        assert!(range.contains(Position::at(1, 8)));
        assert!(!range.contains(Position::at(1, 9)));
        assert!(!range.contains(Position::at(2, 5)));
    }

    #[test]
    fn test_range_new_orders_endpoints() {
        let range = Range::new(Position::at(4, 1), Position::at(2, 3));
        assert_eq!(range.start.line, 2);
        assert_eq!(range.end.line, 4);
    }

    #[test]
    fn test_line_index_single_line() {
        let index = LineIndex::new("hello world");

        assert_eq!(index.position(TextSize::from(0)).line_col(), (1, 1));
        assert_eq!(index.position(TextSize::from(5)).line_col(), (1, 6));
    }

    #[test]
    fn test_line_index_multi_line() {
        let index = LineIndex::new("hello\nworld\n!");

        assert_eq!(index.position(TextSize::from(5)).line_col(), (1, 6));
        assert_eq!(index.position(TextSize::from(6)).line_col(), (2, 1));
        assert_eq!(index.position(TextSize::from(11)).line_col(), (2, 6));
        assert_eq!(index.position(TextSize::from(12)).line_col(), (3, 1));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_line_index_offset() {
        let index = LineIndex::new("hello\nworld");

        assert_eq!(index.offset(1, 1), Some(TextSize::from(0)));
        assert_eq!(index.offset(2, 1), Some(TextSize::from(6)));
        assert_eq!(index.offset(2, 4), Some(TextSize::from(9)));
        assert_eq!(index.offset(0, 1), None);
    }
}
