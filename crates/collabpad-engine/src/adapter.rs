//! # Editor Adapter
//!
//! Bridges an [`EditorHost`] to an operation-based collaboration engine.
//!
//! ## Event flow
//!
//! 1. The user edits the widget; the host queues native events.
//! 2. [`EditorAdapter::pump`] drains them in order. Each change is translated
//!    against the snapshot of the document just before it, delivered as
//!    [`AdapterEvent::Change`], and the snapshot is advanced past it.
//! 3. The orchestrator later hands back a transformed remote operation to
//!    [`EditorAdapter::apply_operation`], which replays it in
//!    [`Mode::Applying`] so the changes it causes are never translated back
//!    into outgoing operations.
//!
//! Selection changes are delivered as [`AdapterEvent::CursorActivity`] after
//! the synchronous events of the same pump, never while the selection is
//! still being updated.
//!
//! ## Lifecycle
//!
//! `Attached -> Detached`, one way, via [`detach`](EditorAdapter::detach) or
//! [`dispose`](EditorAdapter::dispose). Disposing does not release remote
//! cursor markers: whoever called
//! [`set_other_cursor`](EditorAdapter::set_other_cursor) owns the returned
//! [`CursorDisposer`] and must dispose it.

use std::collections::VecDeque;

use crate::apply::apply_to_host;
use crate::change::operations_from_change;
use crate::coords::{PositionRange, offset_from_position};
use crate::cursor::Cursor;
use crate::error::{AdapterError, HostError, OperationError};
use crate::host::{AnchorId, EditorHost, EventKind, LineEnding, NativeEvent, StyleTarget};
use crate::memory::StyleSheet;
use crate::operation::{Operation, TextOperation};
use crate::remote::{CursorDisposer, CursorStyle, CursorUpdate, RemoteCursors};
use crate::snapshot::Snapshot;

const LISTENED: [EventKind; 4] = [
    EventKind::Change,
    EventKind::Blur,
    EventKind::Focus,
    EventKind::SelectionChange,
];

/// Notifications delivered to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent<O> {
    /// The user changed the document. `operation` is what the editor did,
    /// `inverse` undoes it.
    Change { operation: O, inverse: O },
    /// Focus left the editor with nothing selected.
    Blur,
    Focus,
    CursorActivity,
}

/// Whether the adapter is currently replaying an operation onto the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Applying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Attached,
    Detached,
}

/// A remote participant's marker as currently tracked by the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCursor {
    pub cursor: Cursor,
    pub class: String,
    pub name: Option<String>,
}

type Handler<O> = Box<dyn FnMut(AdapterEvent<O>)>;

pub struct EditorAdapter<H: EditorHost, S: StyleTarget = StyleSheet, O: Operation = TextOperation>
{
    host: H,
    styles: S,
    snapshot: Snapshot,
    last_selection: Option<PositionRange>,
    mode: Mode,
    lifecycle: Lifecycle,
    handler: Option<Handler<O>>,
    deferred: VecDeque<AdapterEvent<O>>,
    remote: RemoteCursors,
}

impl<H: EditorHost, S: StyleTarget, O: Operation> EditorAdapter<H, S, O> {
    pub fn new(host: H, styles: S) -> Self {
        Self::with_style(host, styles, CursorStyle::default())
    }

    /// Attach to `host`: switch it to `\n` line breaks, take the initial
    /// snapshot and subscribe to change, blur, focus and selection events.
    pub fn with_style(mut host: H, styles: S, style: CursorStyle) -> Self {
        host.set_line_ending(LineEnding::Lf);
        for kind in LISTENED {
            host.subscribe(kind);
        }

        let snapshot = Snapshot::capture(&host);
        let last_selection = host.selection().ok();
        log::info!(
            "Editor adapter attached ({} lines, {} chars)",
            snapshot.line_count(),
            snapshot.len()
        );

        Self {
            host,
            styles,
            snapshot,
            last_selection,
            mode: Mode::Idle,
            lifecycle: Lifecycle::Attached,
            handler: None,
            deferred: VecDeque::new(),
            remote: RemoteCursors::new(style),
        }
    }

    /// Route adapter events to `handler`, replacing any previous one.
    pub fn register_callbacks(&mut self, handler: impl FnMut(AdapterEvent<O>) + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Stop listening to the editor. Calling it again does nothing.
    pub fn detach(&mut self) {
        if self.lifecycle == Lifecycle::Detached {
            return;
        }
        for kind in LISTENED {
            self.host.unsubscribe(kind);
        }
        self.deferred.clear();
        self.lifecycle = Lifecycle::Detached;
        log::info!("Editor adapter detached");
    }

    /// Detach from the editor. Live remote cursor markers stay until their
    /// disposers are used.
    pub fn dispose(&mut self) {
        if !self.remote.is_empty() {
            log::debug!(
                "Disposing adapter with {} remote cursor markers still live",
                self.remote.len()
            );
        }
        self.detach();
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_attached(&self) -> bool {
        self.lifecycle == Lifecycle::Attached
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Process every queued native event, then run deferred notifications.
    pub fn pump(&mut self) -> Result<(), AdapterError> {
        let events = self.host.take_events();
        if !self.is_attached() {
            self.grab_document_state();
            return Ok(());
        }

        let mut events = events.into_iter();
        while let Some(event) = events.next() {
            if let Err(error) = self.handle(event) {
                log::error!("Failed to translate editor change: {error}");
                self.grab_document_state();
                self.skip_changes(events);
                self.run_deferred();
                return Err(error);
            }
        }

        self.run_deferred();
        Ok(())
    }

    /// Handle what is left of a batch after the snapshot was resynced from
    /// the host. The remaining changes are already part of the new snapshot
    /// and cannot be translated any more.
    fn skip_changes(&mut self, events: impl Iterator<Item = NativeEvent>) {
        let mut dropped = 0;
        for event in events {
            if event.kind() == EventKind::Change {
                dropped += 1;
                continue;
            }
            // Only change events can fail.
            let _ = self.handle(event);
        }
        if dropped > 0 {
            log::warn!("Discarded {dropped} editor changes queued after the failed one");
        }
    }

    /// Deliver notifications postponed from earlier events.
    pub fn run_deferred(&mut self) {
        while let Some(event) = self.deferred.pop_front() {
            self.trigger(event);
        }
    }

    fn handle(&mut self, event: NativeEvent) -> Result<(), AdapterError> {
        match event {
            NativeEvent::Change(change) => {
                if self.mode == Mode::Applying {
                    return Ok(());
                }
                let newline = self.host.line_ending().as_str();
                let (operation, inverse) =
                    operations_from_change::<O>(&change, &self.snapshot, newline)?;
                log::debug!("Local change {:?}", operation.ops());

                self.snapshot.apply_change(&change, newline);
                self.last_selection = self.host.selection().ok();
                self.trigger(AdapterEvent::Change { operation, inverse });
            }
            NativeEvent::Blur => {
                if self.host.selection_is_empty() {
                    self.trigger(AdapterEvent::Blur);
                }
            }
            NativeEvent::Focus => self.trigger(AdapterEvent::Focus),
            NativeEvent::SelectionChange => {
                self.deferred.push_back(AdapterEvent::CursorActivity);
            }
        }
        Ok(())
    }

    fn trigger(&mut self, event: AdapterEvent<O>) {
        if let Some(handler) = self.handler.as_mut() {
            handler(event);
        }
    }

    fn grab_document_state(&mut self) {
        self.snapshot = Snapshot::capture(&self.host);
        self.last_selection = self.host.selection().ok();
    }

    pub fn get_value(&self) -> String {
        self.host.value()
    }

    pub fn get_text(&self) -> String {
        self.get_value()
    }

    /// Replace the whole document. The resulting edits are reported like any
    /// user edit on the next pump.
    pub fn set_text(&mut self, text: &str) {
        self.host.set_value(text);
    }

    /// The local selection in offset space, `position <= selection_end`.
    ///
    /// Falls back to the selection cached with the last snapshot, then to
    /// `0:0`, logging each failure.
    pub fn get_cursor(&self) -> Cursor {
        match self.live_cursor() {
            Ok(cursor) => cursor,
            Err(error) => {
                log::warn!("Live selection unavailable ({error}), using the last known range");
                match self.cached_cursor() {
                    Ok(cursor) => cursor,
                    Err(error) => {
                        log::warn!(
                            "Couldn't figure out the cursor range: {error} -- setting it to 0:0"
                        );
                        Cursor::default()
                    }
                }
            }
        }
    }

    fn live_cursor(&self) -> Result<Cursor, AdapterError> {
        let range = self.host.selection()?;
        let lines = self.host.lines();
        let start = offset_from_position(range.start, &lines)?;
        let end = offset_from_position(range.end, &lines)?;
        Ok(Cursor::new(start, end).normalized())
    }

    fn cached_cursor(&self) -> Result<Cursor, AdapterError> {
        let range = self.last_selection.ok_or(HostError::SelectionUnavailable)?;
        let start = self.snapshot.offset_from_position(range.start)?;
        let end = self.snapshot.offset_from_position(range.end)?;
        Ok(Cursor::new(start, end).normalized())
    }

    /// Select `cursor` in the editor. A backward cursor is selected forward.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        let (start, end) = cursor.ordered();
        let range = Snapshot::capture(&self.host).range_from_offsets(start, end);
        self.host.set_selection(range);
    }

    /// Show another participant's cursor, replacing its previous marker.
    pub fn set_other_cursor(
        &mut self,
        participant: &str,
        cursor: Cursor,
        color: &str,
        name: Option<&str>,
    ) -> CursorDisposer {
        let snapshot = Snapshot::capture(&self.host);
        let update = CursorUpdate {
            participant,
            cursor,
            color,
            name,
        };
        self.remote
            .set(&mut self.host, &mut self.styles, &snapshot, update)
    }

    /// Remove the marker behind `disposer` and its anchors.
    pub fn dispose_other_cursor(&mut self, disposer: CursorDisposer) {
        self.remote.dispose(&mut self.host, disposer);
    }

    /// Where a participant's marker currently sits, following local edits.
    pub fn other_cursor(&self, participant: &str) -> Option<RemoteCursor> {
        let entry = self.remote.get(participant)?;
        let lines = self.host.lines();
        let offset = |anchor: AnchorId| -> Result<usize, AdapterError> {
            let position = self.host.anchor_position(anchor)?;
            Ok(offset_from_position(position, &lines)?)
        };

        match (offset(entry.start()), offset(entry.end())) {
            (Ok(start), Ok(end)) => Some(RemoteCursor {
                cursor: Cursor::new(start, end),
                class: entry.class().to_string(),
                name: entry.name().map(String::from),
            }),
            (Err(error), _) | (_, Err(error)) => {
                log::warn!("Remote cursor of {participant} lost its anchors: {error}");
                None
            }
        }
    }

    pub fn remote_cursors(&self) -> &RemoteCursors {
        &self.remote
    }

    /// Replay `operation` onto the editor without reporting it back.
    ///
    /// Pending user events are processed first so they are translated against
    /// the document they were made on. The snapshot is retaken once at the
    /// end.
    pub fn apply_operation(&mut self, operation: &O) -> Result<(), AdapterError> {
        self.pump()?;

        if !operation.is_noop() && operation.base_len() != self.snapshot.len() {
            return Err(OperationError::BaseLengthMismatch {
                expected: operation.base_len(),
                actual: self.snapshot.len(),
            }
            .into());
        }

        self.mode = Mode::Applying;
        log::debug!("Applying remote operation {:?}", operation.ops());
        let snapshot = apply_to_host(&mut self.host, operation);

        let mut result = Ok(());
        for event in self.host.take_events() {
            if let Err(error) = self.handle(event) {
                result = Err(error);
            }
        }

        self.mode = Mode::Idle;
        self.snapshot = snapshot;
        self.last_selection = self.host.selection().ok();
        result
    }

    /// The operation that undoes `operation` against the current document.
    pub fn invert_operation(&self, operation: &O) -> O {
        operation.invert(&self.get_value())
    }

    pub fn register_undo(&mut self, undo: impl FnMut() + 'static) {
        self.host.set_undo_handler(Box::new(undo));
    }

    pub fn register_redo(&mut self, redo: impl FnMut() + 'static) {
        self.host.set_redo_handler(Box::new(redo));
    }

    /// The snapshot of the document as of the last processed edit.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// The editor widget, for driving it as the local user would.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn styles(&self) -> &S {
        &self.styles
    }
}
