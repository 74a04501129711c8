//! # Remote Cursor Renderer
//!
//! One live marker per remote participant, bound to two host anchors so it
//! follows later local edits without being recomputed.
//!
//! Markers are styled with generated classes of the form
//! `other-client-{cursor|selection}-<color without leading '#'>`. Each class
//! rule is injected into the style target at most once per renderer.
//!
//! Replacing a participant's entry releases the previous anchors and marker
//! before the new ones are created, so a fast-typing participant never leaves
//! two markers behind.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::cursor::Cursor;
use crate::host::{AnchorId, EditorHost, MarkerId, StyleTarget};
use crate::snapshot::Snapshot;

/// Caret or range rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerMode {
    Cursor,
    Selection,
}

impl MarkerMode {
    pub fn for_cursor(cursor: &Cursor) -> Self {
        if cursor.is_caret() {
            MarkerMode::Cursor
        } else {
            MarkerMode::Selection
        }
    }
}

impl fmt::Display for MarkerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerMode::Cursor => write!(f, "cursor"),
            MarkerMode::Selection => write!(f, "selection"),
        }
    }
}

/// Look of remote markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorStyle {
    /// Width of the left border drawn in the participant's color.
    pub border_width_px: u32,
    /// Fill opacity of selections, `1.0` for a solid fill.
    pub selection_opacity: f32,
}

impl Default for CursorStyle {
    fn default() -> Self {
        Self {
            border_width_px: 2,
            selection_opacity: 1.0,
        }
    }
}

/// `other-client-{mode}-{color}` with a leading `#` stripped from the color.
pub fn class_name(color: &str, mode: MarkerMode) -> String {
    let color = color.strip_prefix('#').unwrap_or(color);
    format!("other-client-{mode}-{color}")
}

/// The rule for a marker class. Carets never get a filled background.
pub fn css_rule(class: &str, color: &str, mode: MarkerMode, style: &CursorStyle) -> String {
    let background = match mode {
        MarkerMode::Cursor => "transparent".to_string(),
        MarkerMode::Selection => fill_color(color, style.selection_opacity),
    };
    format!(
        ".{class} {{\n  position: absolute;\n  background-color: {background};\n  border-left: {}px solid {color};\n}}",
        style.border_width_px
    )
}

/// `#rrggbb` colors get an alpha channel when the fill is translucent. Other
/// color syntaxes are used as given.
fn fill_color(color: &str, opacity: f32) -> String {
    if opacity >= 1.0 {
        return color.to_string();
    }
    match color.strip_prefix('#') {
        Some(hex) if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("#{hex}{alpha:02x}")
        }
        _ => color.to_string(),
    }
}

/// Classes whose rule has already been injected.
#[derive(Debug, Default)]
pub struct StyleRules {
    injected: HashSet<String>,
}

impl StyleRules {
    /// Inject the rule for `class` unless it already was. Returns whether a
    /// rule was written.
    pub fn ensure(&mut self, target: &mut dyn StyleTarget, class: &str, css: &str) -> bool {
        if self.injected.contains(class) {
            return false;
        }
        log::debug!("Injecting style rule for {class}");
        target.insert_rule(css);
        self.injected.insert(class.to_string());
        true
    }

    pub fn contains(&self, class: &str) -> bool {
        self.injected.contains(class)
    }

    pub fn len(&self) -> usize {
        self.injected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.injected.is_empty()
    }
}

/// Releases one marker and its anchors. Invoking it after the entry has been
/// replaced is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorDisposer {
    start: AnchorId,
    end: AnchorId,
    marker: MarkerId,
}

impl CursorDisposer {
    pub fn marker(&self) -> MarkerId {
        self.marker
    }

    fn release<H: EditorHost + ?Sized>(&self, host: &mut H) {
        host.detach_anchor(self.start);
        host.detach_anchor(self.end);
        host.remove_marker(self.marker);
    }
}

/// A participant's new cursor as received from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorUpdate<'a> {
    pub participant: &'a str,
    pub cursor: Cursor,
    pub color: &'a str,
    pub name: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    handles: CursorDisposer,
    class: String,
    name: Option<String>,
}

impl RemoteEntry {
    pub fn start(&self) -> AnchorId {
        self.handles.start
    }

    pub fn end(&self) -> AnchorId {
        self.handles.end
    }

    pub fn marker(&self) -> MarkerId {
        self.handles.marker
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct RemoteCursors {
    entries: HashMap<String, RemoteEntry>,
    rules: StyleRules,
    style: CursorStyle,
}

impl RemoteCursors {
    pub fn new(style: CursorStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Show `update.cursor` for `update.participant`, replacing any marker it
    /// already has.
    ///
    /// `snapshot` must describe the document the cursor offsets point into.
    pub fn set<H: EditorHost + ?Sized>(
        &mut self,
        host: &mut H,
        styles: &mut dyn StyleTarget,
        snapshot: &Snapshot,
        update: CursorUpdate<'_>,
    ) -> CursorDisposer {
        let CursorUpdate {
            participant,
            cursor,
            color,
            name,
        } = update;

        if let Some(previous) = self.entries.remove(participant) {
            log::debug!("Replacing marker {:?} of {participant}", previous.marker());
            previous.handles.release(host);
        }

        let (start, end) = cursor.ordered();
        let mode = MarkerMode::for_cursor(&cursor);
        let class = class_name(color, mode);
        let css = css_rule(&class, color, mode, &self.style);
        self.rules.ensure(styles, &class, &css);

        let range = snapshot.range_from_offsets(start, end);
        let start = host.create_anchor(range.start);
        let end = host.create_anchor(range.end);
        let marker = host.add_marker(start, end, &class);

        let handles = CursorDisposer { start, end, marker };
        self.entries.insert(
            participant.to_string(),
            RemoteEntry {
                handles,
                class,
                name: name.map(String::from),
            },
        );
        handles
    }

    /// Release the marker behind `disposer`, forgetting its entry if it is
    /// still the live one.
    pub fn dispose<H: EditorHost + ?Sized>(&mut self, host: &mut H, disposer: CursorDisposer) {
        disposer.release(host);
        self.entries.retain(|_, entry| entry.handles != disposer);
    }

    pub fn get(&self, participant: &str) -> Option<&RemoteEntry> {
        self.entries.get(participant)
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rules(&self) -> &StyleRules {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("#ff0000", MarkerMode::Cursor, "other-client-cursor-ff0000")]
    #[case("#ff0000", MarkerMode::Selection, "other-client-selection-ff0000")]
    #[case("teal", MarkerMode::Cursor, "other-client-cursor-teal")]
    fn test_class_name(#[case] color: &str, #[case] mode: MarkerMode, #[case] expected: &str) {
        assert_eq!(class_name(color, mode), expected);
    }

    #[test]
    fn test_caret_rule_has_no_fill() {
        let css = css_rule(
            "other-client-cursor-ff0000",
            "#ff0000",
            MarkerMode::Cursor,
            &CursorStyle::default(),
        );

        insta::assert_snapshot!(css, @r"
        .other-client-cursor-ff0000 {
          position: absolute;
          background-color: transparent;
          border-left: 2px solid #ff0000;
        }
        ");
    }

    #[test]
    fn test_selection_rule_is_filled() {
        let css = css_rule(
            "other-client-selection-ff0000",
            "#ff0000",
            MarkerMode::Selection,
            &CursorStyle::default(),
        );

        assert!(css.contains("background-color: #ff0000;"));
        assert!(css.contains("border-left: 2px solid #ff0000;"));
    }

    #[rstest]
    #[case("#336699", 0.5, "#33669980")]
    #[case("#336699", 1.0, "#336699")]
    #[case("#369", 0.5, "#369")]
    #[case("rebeccapurple", 0.25, "rebeccapurple")]
    fn test_fill_color(#[case] color: &str, #[case] opacity: f32, #[case] expected: &str) {
        assert_eq!(fill_color(color, opacity), expected);
    }

    #[test]
    fn test_mode_follows_cursor_shape() {
        assert_eq!(MarkerMode::for_cursor(&Cursor::caret(4)), MarkerMode::Cursor);
        assert_eq!(
            MarkerMode::for_cursor(&Cursor::new(7, 2)),
            MarkerMode::Selection
        );
    }
}
