pub mod adapter;
pub mod apply;
pub mod change;
pub mod color;
pub mod coords;
pub mod cursor;
pub mod error;
pub mod host;
pub mod memory;
pub mod operation;
pub mod remote;
pub mod snapshot;

// Re-export key types for easier usage
pub use adapter::{AdapterEvent, EditorAdapter, Lifecycle, Mode, RemoteCursor};
pub use change::{ChangeAction, ChangeEvent, operations_from_change};
pub use color::color_from_user_id;
pub use coords::{Position, PositionRange, offset_from_position, position_from_offset};
pub use cursor::Cursor;
pub use error::*;
pub use host::*;
pub use memory::{RopeEditor, StyleSheet};
pub use operation::{Op, Operation, TextOperation};
pub use remote::{CursorDisposer, CursorStyle, CursorUpdate, MarkerMode};
pub use snapshot::Snapshot;
