use thiserror::Error;

use crate::host::AnchorId;

/// Coordinate conversion against a snapshot that cannot hold the position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("row {row} is outside a document of {rows} lines")]
    RowOutOfRange { row: usize, rows: usize },
}

/// An operation that does not fit the document it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("operation expects a document of {expected} chars, got {actual}")]
    BaseLengthMismatch { expected: usize, actual: usize },

    #[error("delete at offset {offset} expected {expected:?} but found {found:?}")]
    DeleteMismatch {
        offset: usize,
        expected: String,
        found: String,
    },
}

/// Failed reads from the editor host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("the editor selection is not available")]
    SelectionUnavailable,

    #[error("anchor {0:?} is not attached to the document")]
    UnknownAnchor(AnchorId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("Coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),

    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}
