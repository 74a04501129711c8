//! # Editor host contract
//!
//! Everything the adapter needs from a concrete text widget. The widget owns
//! the buffer, the selection, anchors and markers; the adapter only drives
//! it through this trait.
//!
//! ## Events
//!
//! The host queues a [`NativeEvent`] for every subscribed kind, in the order
//! things happen. The adapter drains the queue with
//! [`EditorHost::take_events`]. A change event always describes an edit the
//! buffer has already applied, with positions relative to the buffer as it
//! was just before that edit.
//!
//! ## Anchors and markers
//!
//! Anchors are positions the host keeps correct across later edits: text
//! inserted before an anchor shifts it forward, a deletion spanning it
//! collapses it onto the deletion point. Markers are rendered overlays bound
//! to a pair of anchors.

use crate::change::ChangeEvent;
use crate::coords::{Position, PositionRange};
use crate::error::HostError;

/// Host-maintained position reference.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// Host-rendered overlay between two anchors.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    Focus,
    Blur,
    SelectionChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    Change(ChangeEvent),
    Focus,
    Blur,
    SelectionChange,
}

impl NativeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NativeEvent::Change(_) => EventKind::Change,
            NativeEvent::Focus => EventKind::Focus,
            NativeEvent::Blur => EventKind::Blur,
            NativeEvent::SelectionChange => EventKind::SelectionChange,
        }
    }
}

/// Line break convention of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `\n`, the canonical break of the flat offset space.
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl LineEnding {
    pub const fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }

    /// First line break found in `text`, `Lf` when there is none.
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        for (i, byte) in bytes.iter().enumerate() {
            match byte {
                b'\n' => return LineEnding::Lf,
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => return LineEnding::CrLf,
                b'\r' => return LineEnding::Cr,
                _ => {}
            }
        }
        LineEnding::Lf
    }
}

pub type Callback = Box<dyn FnMut()>;

/// The contract a text widget exposes to the adapter.
pub trait EditorHost {
    /// Current line contents, without line breaks.
    fn lines(&self) -> Vec<String>;

    /// Whole document joined with the native line break.
    fn value(&self) -> String;

    /// Replace the whole document. Reported as ordinary change events.
    fn set_value(&mut self, text: &str);

    fn line_ending(&self) -> LineEnding;
    fn set_line_ending(&mut self, ending: LineEnding);

    /// Insert text (`\n` breaks) at a position.
    fn insert(&mut self, at: Position, text: &str);

    /// Remove the text spanned by a range.
    fn remove(&mut self, range: PositionRange);

    /// The live selection, ordered start to end.
    fn selection(&self) -> Result<PositionRange, HostError>;
    fn set_selection(&mut self, range: PositionRange);
    fn selection_is_empty(&self) -> bool;

    fn subscribe(&mut self, kind: EventKind);
    fn unsubscribe(&mut self, kind: EventKind);

    /// Drain queued events, oldest first.
    fn take_events(&mut self) -> Vec<NativeEvent>;

    fn create_anchor(&mut self, at: Position) -> AnchorId;
    fn anchor_position(&self, anchor: AnchorId) -> Result<Position, HostError>;
    /// Stop tracking an anchor. Detaching twice is harmless.
    fn detach_anchor(&mut self, anchor: AnchorId);

    fn add_marker(&mut self, start: AnchorId, end: AnchorId, class: &str) -> MarkerId;
    /// Remove a marker. Removing twice is harmless.
    fn remove_marker(&mut self, marker: MarkerId);

    /// Route the widget's undo/redo commands to these callbacks.
    fn set_undo_handler(&mut self, handler: Callback);
    fn set_redo_handler(&mut self, handler: Callback);
}

/// Destination for injected style rules, e.g. the first style sheet of a
/// page head.
pub trait StyleTarget {
    fn insert_rule(&mut self, css: &str);
}
