//! # Coordinate Mapper
//!
//! Converts between a flat character offset and a `(row, column)` position
//! over a list of lines. The flat space treats the document as one string in
//! which every line break counts as exactly one character.
//!
//! Offsets and columns count Unicode scalar values (chars), never bytes.
//! Both conversions take the lines explicitly: callers must pass the lines
//! of the document state they are describing, never a cached copy.

use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

/// A `(row, column)` coordinate in the editor's line space, both 0-indexed.
///
/// Ordering is lexicographic: row first, then column.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub const ZERO: Self = Self { row: 0, column: 0 };

    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Position reached after typing `text` (canonical `\n` breaks) at `self`.
    pub fn advanced_by(self, text: &str) -> Self {
        match text.rfind('\n') {
            None => Self::new(self.row, self.column + char_len(text)),
            Some(last_break) => {
                let breaks = text.matches('\n').count();
                Self::new(self.row + breaks, char_len(&text[last_break + 1..]))
            }
        }
    }
}

/// A range between two positions, always stored with `start <= end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionRange {
    pub start: Position,
    pub end: Position,
}

impl PositionRange {
    /// Build a range from two arbitrary endpoints, swapping them if the
    /// selection was made backwards.
    pub fn ordered(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub const fn caret(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of char `column` in `line`, clamped to the end of the line.
pub(crate) fn byte_index(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map_or(line.len(), |(index, _)| index)
}

/// Convert a flat offset into a position.
///
/// Walks the lines subtracting `length(line) + 1` until the remainder fits in
/// the current line. An offset past the end of the document lands on the last
/// row with the remainder as its column, so the result still converts back to
/// the same offset.
pub fn position_from_offset<L: AsRef<str>>(offset: usize, lines: &[L]) -> Position {
    let last_row = lines.len().saturating_sub(1);
    let mut remainder = offset;

    for (row, line) in lines.iter().enumerate() {
        let len = char_len(line.as_ref());
        if remainder <= len || row == last_row {
            return Position::new(row, remainder);
        }
        remainder -= len + 1;
    }

    Position::new(0, remainder)
}

/// Convert a position into a flat offset: the lengths (plus one break) of
/// every line above `position.row`, plus the column.
pub fn offset_from_position<L: AsRef<str>>(
    position: Position,
    lines: &[L],
) -> Result<usize, CoordinateError> {
    if position.row >= lines.len() {
        return Err(CoordinateError::RowOutOfRange {
            row: position.row,
            rows: lines.len(),
        });
    }

    let above: usize = lines[..position.row]
        .iter()
        .map(|line| char_len(line.as_ref()) + 1)
        .sum();

    Ok(above + position.column)
}
