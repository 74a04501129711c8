use serde::{Deserialize, Serialize};

use crate::operation::{Op, Operation};

/// A caret or selection in flat offset space.
///
/// `position` is where the selection started and `selection_end` where it
/// ends, so `position > selection_end` for a backward selection. A caret has
/// both equal. Serialized as `{"position": .., "selectionEnd": ..}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub position: usize,
    pub selection_end: usize,
}

impl Cursor {
    pub const fn new(position: usize, selection_end: usize) -> Self {
        Self {
            position,
            selection_end,
        }
    }

    pub const fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_caret(&self) -> bool {
        self.position == self.selection_end
    }

    /// `(start, end)` with `start <= end` whatever the selection direction.
    pub fn ordered(&self) -> (usize, usize) {
        if self.position <= self.selection_end {
            (self.position, self.selection_end)
        } else {
            (self.selection_end, self.position)
        }
    }

    /// The same span with `position <= selection_end`.
    pub fn normalized(&self) -> Self {
        let (start, end) = self.ordered();
        Self::new(start, end)
    }

    /// Move the cursor through an operation applied to the document it
    /// points into. Text inserted at the cursor pushes it forward; deleted
    /// text containing it collapses it onto the deletion point.
    pub fn transform<O: Operation>(&self, operation: &O) -> Self {
        Self::new(
            transform_index(self.position, operation.ops()),
            transform_index(self.selection_end, operation.ops()),
        )
    }
}

fn transform_index(index: usize, ops: &[Op]) -> usize {
    let mut remaining = index;
    let mut moved = index;

    for op in ops {
        match op {
            Op::Retain(count) => {
                if *count > remaining {
                    break;
                }
                remaining -= count;
            }
            Op::Insert(_) => moved += op.len(),
            Op::Delete(_) => {
                let len = op.len();
                moved -= remaining.min(len);
                if len > remaining {
                    break;
                }
                remaining -= len;
            }
        }
    }

    moved
}
