//! # In-memory editor host
//!
//! [`RopeEditor`] is a headless text widget implementing [`EditorHost`] on
//! top of an `xi_rope::Rope`. It is what the CLI and the tests drive, and a
//! reference for what a real widget binding has to provide.
//!
//! - The buffer always holds `\n` breaks; the configured [`LineEnding`] only
//!   affects [`EditorHost::value`] and the text carried by change events.
//! - Every edit is built as an xi-rope `Delta`. Anchors and the selection are
//!   byte offsets pushed through the same delta with a `Transformer`, so an
//!   insertion at an anchor moves it forward and a deletion spanning it
//!   collapses it.
//! - Insertions and removals of whole lines are reported in the `Lines`
//!   shape, everything else in the `Text` shape.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;

use xi_rope::Rope;
use xi_rope::delta::{Builder, Transformer};

use crate::change::{ChangeAction, ChangeEvent};
use crate::coords::{Position, PositionRange, byte_index, char_len};
use crate::error::HostError;
use crate::host::{
    AnchorId, Callback, EditorHost, EventKind, LineEnding, MarkerId, NativeEvent, StyleTarget,
};

/// A marker registered on the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub start: AnchorId,
    pub end: AnchorId,
    pub class: String,
}

pub struct RopeEditor {
    buffer: Rope,
    line_ending: LineEnding,
    /// Selection as byte offsets; `anchor` is where it started.
    selection_anchor: usize,
    selection_head: usize,
    subscribed: HashSet<EventKind>,
    events: Vec<NativeEvent>,
    anchors: HashMap<AnchorId, usize>,
    markers: BTreeMap<MarkerId, Marker>,
    next_id: u64,
    undo: Option<Callback>,
    redo: Option<Callback>,
}

impl RopeEditor {
    /// Create an editor holding `text`. The line ending is detected from the
    /// text and the buffer is normalized to `\n`.
    pub fn new(text: &str) -> Self {
        let line_ending = LineEnding::detect(text);
        Self {
            buffer: Rope::from(normalize_breaks(text).as_str()),
            line_ending,
            selection_anchor: 0,
            selection_head: 0,
            subscribed: HashSet::new(),
            events: Vec::new(),
            anchors: HashMap::new(),
            markers: BTreeMap::new(),
            next_id: 0,
            undo: None,
            redo: None,
        }
    }

    /// Canonical document text.
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Select from `anchor` to `head`; a backward selection has `head` first.
    pub fn select(&mut self, anchor: Position, head: Position) {
        self.selection_anchor = self.offset_of(anchor);
        self.selection_head = self.offset_of(head);
        self.emit(NativeEvent::SelectionChange);
    }

    /// Type `text` the way a user would: replace the selection and leave the
    /// caret after the new text.
    pub fn type_text(&mut self, text: &str) {
        let range = self.selection_range();
        if !range.is_empty() {
            self.remove(range);
        }
        let caret = self.position_of(self.selection_head);
        self.insert(caret, text);
        self.selection_anchor = self.selection_head;
        self.emit(NativeEvent::SelectionChange);
    }

    pub fn focus(&mut self) {
        self.emit(NativeEvent::Focus);
    }

    pub fn blur(&mut self) {
        self.emit(NativeEvent::Blur);
    }

    /// Run the registered undo callback. Returns false when none is set.
    pub fn undo(&mut self) -> bool {
        match self.undo.as_mut() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// Run the registered redo callback. Returns false when none is set.
    pub fn redo(&mut self) -> bool {
        match self.redo.as_mut() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.subscribed.contains(&kind)
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &Marker)> {
        self.markers.iter().map(|(id, marker)| (*id, marker))
    }

    /// Current span of a marker, read from its anchors.
    pub fn marker_range(&self, marker: MarkerId) -> Option<PositionRange> {
        let marker = self.markers.get(&marker)?;
        let start = self.anchor_position(marker.start).ok()?;
        let end = self.anchor_position(marker.end).ok()?;
        Some(PositionRange::ordered(start, end))
    }

    fn last_row(&self) -> usize {
        self.buffer.line_of_offset(self.buffer.len())
    }

    fn line_bounds(&self, row: usize) -> Range<usize> {
        let start = self.buffer.offset_of_line(row);
        let end = if row < self.last_row() {
            self.buffer.offset_of_line(row + 1) - 1
        } else {
            self.buffer.len()
        };
        start..end
    }

    /// Byte offset of a position, clamped into the document.
    fn offset_of(&self, at: Position) -> usize {
        let bounds = self.line_bounds(at.row.min(self.last_row()));
        let line = self.buffer.slice_to_cow(bounds.clone());
        bounds.start + byte_index(&line, at.column)
    }

    fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.buffer.len());
        let row = self.buffer.line_of_offset(offset);
        let line_start = self.buffer.offset_of_line(row);
        let column = char_len(&self.buffer.slice_to_cow(line_start..offset));
        Position::new(row, column)
    }

    fn clamp(&self, at: Position) -> Position {
        self.position_of(self.offset_of(at))
    }

    fn selection_range(&self) -> PositionRange {
        PositionRange::ordered(
            self.position_of(self.selection_anchor),
            self.position_of(self.selection_head),
        )
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn emit(&mut self, event: NativeEvent) {
        if self.subscribed.contains(&event.kind()) {
            self.events.push(event);
        }
    }

    /// Replace `range` (bytes) with canonical `text`, carrying anchors and the
    /// selection through the edit.
    fn edit(&mut self, range: Range<usize>, text: &str) {
        let mut builder = Builder::new(self.buffer.len());
        if text.is_empty() {
            builder.delete(range);
        } else {
            builder.replace(range, Rope::from(text));
        }
        let delta = builder.build();

        self.buffer = delta.apply(&self.buffer);

        let mut transformer = Transformer::new(&delta);
        for offset in self.anchors.values_mut() {
            *offset = transformer.transform(*offset, true);
        }
        self.selection_anchor = transformer.transform(self.selection_anchor, true);
        self.selection_head = transformer.transform(self.selection_head, true);
    }

    fn change_event(&self, action: ChangeAction, start: Position, text: &str) -> ChangeEvent {
        if start.column == 0
            && let Some(body) = text.strip_suffix('\n')
        {
            return ChangeEvent::Lines {
                action,
                start,
                lines: body.split('\n').map(String::from).collect(),
            };
        }

        ChangeEvent::Text {
            action,
            range: PositionRange::ordered(start, start.advanced_by(text)),
            text: text.replace('\n', self.line_ending.as_str()),
        }
    }
}

impl Default for RopeEditor {
    fn default() -> Self {
        Self::new("")
    }
}

impl EditorHost for RopeEditor {
    fn lines(&self) -> Vec<String> {
        self.text().split('\n').map(String::from).collect()
    }

    fn value(&self) -> String {
        let text = self.text();
        match self.line_ending {
            LineEnding::Lf => text,
            ending => text.replace('\n', ending.as_str()),
        }
    }

    fn set_value(&mut self, text: &str) {
        let end = self.position_of(self.buffer.len());
        self.remove(PositionRange::ordered(Position::ZERO, end));
        self.insert(Position::ZERO, text);
    }

    fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    fn set_line_ending(&mut self, ending: LineEnding) {
        self.line_ending = ending;
    }

    fn insert(&mut self, at: Position, text: &str) {
        let text = normalize_breaks(text);
        if text.is_empty() {
            return;
        }
        let at = self.clamp(at);
        let offset = self.offset_of(at);

        self.edit(offset..offset, &text);

        let change = self.change_event(ChangeAction::Insert, at, &text);
        self.emit(NativeEvent::Change(change));
    }

    fn remove(&mut self, range: PositionRange) {
        let start = self.offset_of(range.start);
        let end = self.offset_of(range.end);
        if start >= end {
            return;
        }
        let at = self.position_of(start);
        let removed = self.buffer.slice_to_cow(start..end).into_owned();

        self.edit(start..end, "");

        let change = self.change_event(ChangeAction::Remove, at, &removed);
        self.emit(NativeEvent::Change(change));
    }

    fn selection(&self) -> Result<PositionRange, HostError> {
        Ok(self.selection_range())
    }

    fn set_selection(&mut self, range: PositionRange) {
        self.select(range.start, range.end);
    }

    fn selection_is_empty(&self) -> bool {
        self.selection_anchor == self.selection_head
    }

    fn subscribe(&mut self, kind: EventKind) {
        self.subscribed.insert(kind);
    }

    fn unsubscribe(&mut self, kind: EventKind) {
        self.subscribed.remove(&kind);
        self.events.retain(|event| event.kind() != kind);
    }

    fn take_events(&mut self) -> Vec<NativeEvent> {
        std::mem::take(&mut self.events)
    }

    fn create_anchor(&mut self, at: Position) -> AnchorId {
        let id = AnchorId(self.next_id());
        let offset = self.offset_of(at);
        self.anchors.insert(id, offset);
        id
    }

    fn anchor_position(&self, anchor: AnchorId) -> Result<Position, HostError> {
        self.anchors
            .get(&anchor)
            .map(|offset| self.position_of(*offset))
            .ok_or(HostError::UnknownAnchor(anchor))
    }

    fn detach_anchor(&mut self, anchor: AnchorId) {
        self.anchors.remove(&anchor);
    }

    fn add_marker(&mut self, start: AnchorId, end: AnchorId, class: &str) -> MarkerId {
        let id = MarkerId(self.next_id());
        self.markers.insert(
            id,
            Marker {
                start,
                end,
                class: class.to_string(),
            },
        );
        id
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }

    fn set_undo_handler(&mut self, handler: Callback) {
        self.undo = Some(handler);
    }

    fn set_redo_handler(&mut self, handler: Callback) {
        self.redo = Some(handler);
    }
}

/// `\r\n` and lone `\r` become `\n`.
fn normalize_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Style rules collected in memory, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    rules: Vec<String>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}

impl StyleTarget for StyleSheet {
    fn insert_rule(&mut self, css: &str) {
        self.rules.insert(0, css.to_string());
    }
}
