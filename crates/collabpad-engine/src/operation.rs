//! # Operation capability
//!
//! The adapter never composes or transforms operations itself. It only needs
//! to build `retain`/`insert`/`delete` sequences, walk them, test for a no-op
//! and invert them against a document. [`Operation`] is that seam; the
//! collaboration engine plugs its own type in.
//!
//! [`TextOperation`] is a plain implementation of the seam, used by default
//! and in tests. It also knows how to [`apply`](TextOperation::apply) itself
//! to a string so round trips can be checked without an editor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::char_len;
use crate::error::OperationError;

/// One instruction of an operation. Lengths are counted in chars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Retain(usize),
    Insert(String),
    Delete(String),
}

impl Op {
    pub fn is_retain(&self) -> bool {
        matches!(self, Op::Retain(_))
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Op::Insert(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Op::Delete(_))
    }

    /// Chars retained, inserted or deleted.
    pub fn len(&self) -> usize {
        match self {
            Op::Retain(count) => *count,
            Op::Insert(text) | Op::Delete(text) => char_len(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the adapter needs from an operation type.
pub trait Operation: Clone + Default + fmt::Debug {
    fn retain(self, count: usize) -> Self;
    fn insert(self, text: &str) -> Self;
    fn delete(self, text: &str) -> Self;

    /// The ordered instructions.
    fn ops(&self) -> &[Op];

    /// True when applying the operation changes nothing.
    fn is_noop(&self) -> bool;

    /// The operation that undoes `self` once it has been applied to `document`.
    fn invert(&self, document: &str) -> Self;

    /// Length of the document the operation applies to (retains + deletes).
    fn base_len(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| !op.is_insert())
            .map(Op::len)
            .sum()
    }

    /// Length of the document the operation produces (retains + inserts).
    fn target_len(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| !op.is_delete())
            .map(Op::len)
            .sum()
    }
}

/// Sequence of ops with adjacent ops of the same kind merged, zero-length ops
/// dropped, and an insert always placed before a delete at the same spot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Op>", into = "Vec<Op>")]
pub struct TextOperation {
    ops: Vec<Op>,
}

impl TextOperation {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, op: Op) {
        if op.is_empty() {
            return;
        }

        match op {
            Op::Retain(count) => {
                if let Some(Op::Retain(last)) = self.ops.last_mut() {
                    *last += count;
                } else {
                    self.ops.push(Op::Retain(count));
                }
            }
            Op::Delete(text) => {
                if let Some(Op::Delete(last)) = self.ops.last_mut() {
                    last.push_str(&text);
                } else {
                    self.ops.push(Op::Delete(text));
                }
            }
            Op::Insert(text) => self.push_insert(text),
        }
    }

    fn push_insert(&mut self, text: String) {
        match self.ops.as_mut_slice() {
            [.., Op::Insert(last)] => last.push_str(&text),
            [.., Op::Insert(previous), Op::Delete(_)] => previous.push_str(&text),
            [.., Op::Delete(_)] => {
                let delete_at = self.ops.len() - 1;
                self.ops.insert(delete_at, Op::Insert(text));
            }
            _ => self.ops.push(Op::Insert(text)),
        }
    }

    /// Apply the operation to `document`, checking that it fits.
    pub fn apply(&self, document: &str) -> Result<String, OperationError> {
        let actual = char_len(document);
        let expected = self.base_len();
        if actual != expected {
            return Err(OperationError::BaseLengthMismatch { expected, actual });
        }

        let mut chars = document.chars();
        let mut offset = 0;
        let mut result = String::with_capacity(document.len());

        for op in &self.ops {
            match op {
                Op::Retain(count) => {
                    result.extend(chars.by_ref().take(*count));
                    offset += count;
                }
                Op::Insert(text) => result.push_str(text),
                Op::Delete(text) => {
                    let found: String = chars.by_ref().take(char_len(text)).collect();
                    if found != *text {
                        return Err(OperationError::DeleteMismatch {
                            offset,
                            expected: text.clone(),
                            found,
                        });
                    }
                    offset += char_len(text);
                }
            }
        }

        Ok(result)
    }
}

impl Operation for TextOperation {
    fn retain(mut self, count: usize) -> Self {
        self.push(Op::Retain(count));
        self
    }

    fn insert(mut self, text: &str) -> Self {
        self.push(Op::Insert(text.to_string()));
        self
    }

    fn delete(mut self, text: &str) -> Self {
        self.push(Op::Delete(text.to_string()));
        self
    }

    fn ops(&self) -> &[Op] {
        &self.ops
    }

    fn is_noop(&self) -> bool {
        matches!(self.ops.as_slice(), [] | [Op::Retain(_)])
    }

    fn invert(&self, document: &str) -> Self {
        let mut chars = document.chars();
        let mut inverse = TextOperation::new();

        for op in &self.ops {
            inverse = match op {
                Op::Retain(count) => {
                    chars.by_ref().take(*count).for_each(drop);
                    inverse.retain(*count)
                }
                Op::Insert(text) => inverse.delete(text),
                Op::Delete(text) => {
                    let removed: String = chars.by_ref().take(char_len(text)).collect();
                    inverse.insert(&removed)
                }
            };
        }

        inverse
    }
}

impl From<Vec<Op>> for TextOperation {
    fn from(ops: Vec<Op>) -> Self {
        ops.into_iter().collect()
    }
}

impl From<TextOperation> for Vec<Op> {
    fn from(operation: TextOperation) -> Self {
        operation.ops
    }
}

impl FromIterator<Op> for TextOperation {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        let mut operation = TextOperation::new();
        for op in iter {
            operation.push(op);
        }
        operation
    }
}

impl fmt::Display for TextOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return write!(f, "noop");
        }
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            match op {
                Op::Retain(count) => write!(f, "Retain({count})")?,
                Op::Insert(text) => write!(f, "Insert({text:?})")?,
                Op::Delete(text) => write!(f, "Delete({text:?})")?,
            }
        }
        Ok(())
    }
}
