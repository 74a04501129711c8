//! # Operation Applier
//!
//! Replays an operation's ops onto an editor host, in order, keeping a
//! running flat `index`:
//!
//! - `Retain(n)` moves the index forward without touching the editor.
//! - `Insert(text)` inserts at the index, then moves past the text.
//! - `Delete(text)` removes `index..index + len(text)`; the index stays.
//!
//! Each op's positions are computed against the document as it is right after
//! the previous op. Guarding against re-translation of the resulting change
//! events is the caller's job (see [`EditorAdapter`](crate::EditorAdapter)).

use crate::coords::char_len;
use crate::host::EditorHost;
use crate::operation::{Op, Operation};
use crate::snapshot::Snapshot;

/// Apply `operation` to `host` and return the resulting snapshot.
pub fn apply_to_host<H, O>(host: &mut H, operation: &O) -> Snapshot
where
    H: EditorHost + ?Sized,
    O: Operation,
{
    let mut working = Snapshot::capture(host);
    let mut index = 0;

    for op in operation.ops() {
        match op {
            Op::Retain(count) => index += count,
            Op::Insert(text) => {
                let at = working.position_from_offset(index);
                host.insert(at, text);
                working.insert(at, text);
                index += char_len(text);
            }
            Op::Delete(text) => {
                let range = working.range_from_offsets(index, index + char_len(text));
                host.remove(range);
                working.remove(range);
            }
        }
    }

    Snapshot::capture(host)
}
