//! # Change Translator
//!
//! Turns a native change event into a pair of operations in flat offset
//! space: the change the editor just made, and its exact inverse.
//!
//! ## Payload shapes
//!
//! Widgets report edits in one of three shapes:
//!
//! - **`Lines`**: whole lines inserted or removed. The affected text is the
//!   lines joined with `\n` plus one trailing `\n`.
//! - **`Text`**: text inserted or removed inside a range. The text carries the
//!   widget's native line break, which is normalized to `\n`.
//! - **`Span`**: a range change reported as a list of lines. The affected
//!   text is the lines joined with `\n`, with no trailing break.
//!
//! ## Snapshot contract
//!
//! The start position is converted against the snapshot taken *before* the
//! change. With `s` the start offset, `T` the affected text and `L` the
//! pre-change length:
//!
//! ```text
//! rest    = L - s            (minus len(T) for a removal)
//! insert  = Retain(s) + Insert(T) + Retain(rest)
//! delete  = Retain(s) + Delete(T) + Retain(rest)
//! ```
//!
//! An insertion yields `(insert, delete)`, a removal `(delete, insert)`.

use serde::{Deserialize, Serialize};

use crate::coords::{Position, PositionRange, char_len};
use crate::error::CoordinateError;
use crate::operation::Operation;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Insert,
    Remove,
}

/// A change the editor has already applied to its buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Lines {
        action: ChangeAction,
        start: Position,
        lines: Vec<String>,
    },
    Text {
        action: ChangeAction,
        range: PositionRange,
        text: String,
    },
    Span {
        action: ChangeAction,
        start: Position,
        lines: Vec<String>,
    },
}

impl ChangeEvent {
    pub fn action(&self) -> ChangeAction {
        match self {
            ChangeEvent::Lines { action, .. }
            | ChangeEvent::Text { action, .. }
            | ChangeEvent::Span { action, .. } => *action,
        }
    }

    pub fn start(&self) -> Position {
        match self {
            ChangeEvent::Lines { start, .. } | ChangeEvent::Span { start, .. } => *start,
            ChangeEvent::Text { range, .. } => range.start,
        }
    }

    /// The affected text with `\n` as the only line break.
    pub fn canonical_text(&self, newline: &str) -> String {
        match self {
            ChangeEvent::Lines { lines, .. } => {
                let mut text = lines.join("\n");
                text.push('\n');
                text
            }
            ChangeEvent::Text { text, .. } if newline == "\n" || newline.is_empty() => {
                text.clone()
            }
            ChangeEvent::Text { text, .. } => text.replace(newline, "\n"),
            ChangeEvent::Span { lines, .. } => lines.join("\n"),
        }
    }
}

/// Translate `change` into `(matching, inverse)` operations.
///
/// `before` must describe the document as it was immediately before the
/// change; `newline` is the widget's native line break.
pub fn operations_from_change<O: Operation>(
    change: &ChangeEvent,
    before: &Snapshot,
    newline: &str,
) -> Result<(O, O), CoordinateError> {
    let text = change.canonical_text(newline);
    let start = before.offset_from_position(change.start())?;

    let mut rest = before.len().saturating_sub(start);
    if change.action() == ChangeAction::Remove {
        rest = rest.saturating_sub(char_len(&text));
    }

    let insert = O::default().retain(start).insert(&text).retain(rest);
    let delete = O::default().retain(start).delete(&text).retain(rest);

    Ok(match change.action() {
        ChangeAction::Insert => (insert, delete),
        ChangeAction::Remove => (delete, insert),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Op, TextOperation};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn text_change(action: ChangeAction, start: Position, text: &str) -> ChangeEvent {
        ChangeEvent::Text {
            action,
            range: PositionRange::ordered(start, start.advanced_by(text)),
            text: text.to_string(),
        }
    }

    fn translate(change: &ChangeEvent, before: &str) -> (TextOperation, TextOperation) {
        operations_from_change(change, &Snapshot::from_text(before), "\n").unwrap()
    }

    #[test]
    fn test_insert_within_line() {
        let change = text_change(ChangeAction::Insert, Position::new(0, 3), "X");

        let (operation, inverse) = translate(&change, "hello\nworld");

        assert_eq!(
            operation.ops(),
            [
                Op::Retain(3),
                Op::Insert("X".to_string()),
                Op::Retain(8)
            ]
        );
        assert_eq!(
            inverse.ops(),
            [
                Op::Retain(3),
                Op::Delete("X".to_string()),
                Op::Retain(8)
            ]
        );
    }

    #[test]
    fn test_remove_whole_first_line() {
        let change = ChangeEvent::Lines {
            action: ChangeAction::Remove,
            start: Position::new(0, 0),
            lines: vec!["hello".to_string()],
        };

        let (operation, inverse) = translate(&change, "hello\nworld");

        assert_eq!(
            operation.ops(),
            [Op::Delete("hello\n".to_string()), Op::Retain(5)]
        );
        assert_eq!(
            inverse.ops(),
            [Op::Insert("hello\n".to_string()), Op::Retain(5)]
        );
    }

    #[test]
    fn test_native_line_breaks_are_normalized() {
        let change = ChangeEvent::Text {
            action: ChangeAction::Insert,
            range: PositionRange::ordered(Position::new(1, 0), Position::new(3, 0)),
            text: "a\r\nb\r\n".to_string(),
        };

        let (operation, _) =
            operations_from_change::<TextOperation>(&change, &"x\ny".into(), "\r\n").unwrap();

        assert_eq!(
            operation.ops(),
            [
                Op::Retain(2),
                Op::Insert("a\nb\n".to_string()),
                Op::Retain(1)
            ]
        );
    }

    #[test]
    fn test_span_lines_have_no_trailing_break() {
        let change = ChangeEvent::Span {
            action: ChangeAction::Insert,
            start: Position::new(0, 5),
            lines: vec![String::new(), "new".to_string()],
        };

        let (operation, _) = translate(&change, "hello");

        assert_eq!(
            operation.ops(),
            [Op::Retain(5), Op::Insert("\nnew".to_string())]
        );
    }

    #[test]
    fn test_start_outside_snapshot_is_an_error() {
        let change = text_change(ChangeAction::Insert, Position::new(4, 0), "X");

        let result =
            operations_from_change::<TextOperation>(&change, &Snapshot::from_text("a\nb"), "\n");

        assert_eq!(
            result.unwrap_err(),
            CoordinateError::RowOutOfRange { row: 4, rows: 2 }
        );
    }

    /// Applying the first operation to the pre-change text yields the
    /// post-change text; the second brings it back.
    #[rstest]
    #[case("hello\nworld", ChangeAction::Insert, Position::new(1, 5), "!")]
    #[case("hello\nworld", ChangeAction::Insert, Position::new(0, 0), "first\n")]
    #[case("hello\nworld", ChangeAction::Remove, Position::new(0, 2), "llo\nwo")]
    #[case("hello\nworld", ChangeAction::Remove, Position::new(1, 0), "world")]
    #[case("", ChangeAction::Insert, Position::new(0, 0), "a\n\nb")]
    #[case("añb\nç", ChangeAction::Remove, Position::new(0, 1), "ñb\n")]
    fn test_pair_round_trips(
        #[case] before: &str,
        #[case] action: ChangeAction,
        #[case] start: Position,
        #[case] text: &str,
    ) {
        let change = text_change(action, start, text);
        let mut after = Snapshot::from_text(before);
        after.apply_change(&change, "\n");

        let (operation, inverse) = translate(&change, before);

        assert_eq!(operation.apply(before).unwrap(), after.text());
        assert_eq!(inverse.apply(&after.text()).unwrap(), before);
    }
}
