//! # Document Snapshot
//!
//! The line-buffer view the coordinate mapper operates on. Joining the lines
//! with a single `\n` reproduces the document exactly, and there is always at
//! least one (possibly empty) line.
//!
//! The adapter keeps one snapshot describing the document as of the last
//! processed edit. It is retaken from the host after every applied operation
//! and advanced by each translated local change, so it is never reused across
//! an edit boundary.

use crate::change::{ChangeAction, ChangeEvent};
use crate::coords::{
    Position, PositionRange, byte_index, char_len, offset_from_position, position_from_offset,
};
use crate::error::CoordinateError;
use crate::host::EditorHost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    lines: Vec<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }
}

impl Snapshot {
    /// Split canonical text (single `\n` breaks) into a snapshot.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(String::from).collect(),
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        if lines.is_empty() {
            return Self::default();
        }
        Self { lines }
    }

    /// Take the current line contents of the editor.
    pub fn capture<H: EditorHost + ?Sized>(host: &H) -> Self {
        Self::from_lines(host.lines())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The document as one string with canonical breaks.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Document length in chars, breaks included.
    pub fn len(&self) -> usize {
        document_len(&self.lines)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position_from_offset(&self, offset: usize) -> Position {
        position_from_offset(offset, &self.lines)
    }

    pub fn offset_from_position(&self, position: Position) -> Result<usize, CoordinateError> {
        offset_from_position(position, &self.lines)
    }

    /// Insert canonical text at `at`, splitting lines on `\n`.
    pub fn insert(&mut self, at: Position, text: &str) {
        let row = at.row.min(self.lines.len() - 1);
        let line = &self.lines[row];
        let split = byte_index(line, at.column);
        let head = &line[..split];
        let tail = line[split..].to_string();

        let mut pieces = text.split('\n');
        let first = pieces.next().unwrap_or_default();
        let mut replacement = vec![format!("{head}{first}")];
        replacement.extend(pieces.map(String::from));
        if let Some(last) = replacement.last_mut() {
            last.push_str(&tail);
        }

        self.lines.splice(row..=row, replacement);
    }

    /// Remove the text spanned by `range`, joining the boundary lines.
    pub fn remove(&mut self, range: PositionRange) {
        let last_row = self.lines.len() - 1;
        let start_row = range.start.row.min(last_row);
        let end_row = range.end.row.min(last_row);

        let start_line = &self.lines[start_row];
        let head = &start_line[..byte_index(start_line, range.start.column)];
        let end_line = &self.lines[end_row];
        let tail = &end_line[byte_index(end_line, range.end.column)..];
        let joined = format!("{head}{tail}");

        self.lines.splice(start_row..=end_row, std::iter::once(joined));
    }

    /// Advance the snapshot past a change the editor has already made.
    pub fn apply_change(&mut self, change: &ChangeEvent, newline: &str) {
        let text = change.canonical_text(newline);
        let start = change.start();
        match change.action() {
            ChangeAction::Insert => self.insert(start, &text),
            ChangeAction::Remove => {
                self.remove(PositionRange::ordered(start, start.advanced_by(&text)));
            }
        }
    }

    /// Position range covering the flat span `start..end`.
    pub fn range_from_offsets(&self, start: usize, end: usize) -> PositionRange {
        PositionRange::ordered(
            self.position_from_offset(start),
            self.position_from_offset(end),
        )
    }
}

impl From<&str> for Snapshot {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

/// Char length of the canonical text of `lines`.
pub fn document_len<L: AsRef<str>>(lines: &[L]) -> usize {
    let chars: usize = lines.iter().map(|line| char_len(line.as_ref())).sum();
    chars + lines.len().saturating_sub(1)
}
