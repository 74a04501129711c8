use anyhow::{Context, Result};
use collabpad_config::Config;
use collabpad_engine::{
    AdapterEvent, Cursor, CursorStyle, EditorAdapter, Position, RopeEditor, StyleSheet,
    TextOperation, color_from_user_id,
};
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::{env, fs, process};

/// A recorded editing session: a starting document and the steps replayed
/// against it.
#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    text: String,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    /// The local user types `text` at `at`.
    LocalInsert { at: Position, text: String },
    /// The local user deletes `start..end`.
    LocalRemove { start: Position, end: Position },
    /// The local user moves the selection.
    Select { anchor: Position, head: Position },
    /// An operation arrives from the server.
    Remote { operation: TextOperation },
    /// Another participant's cursor moves.
    RemoteCursor {
        participant: String,
        position: usize,
        selection_end: Option<usize>,
        color: Option<String>,
        name: Option<String>,
    },
    /// The local user presses undo.
    Undo,
}

/// Who the local participant is, with unset config fields filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity {
    id: String,
    name: String,
    color: String,
}

impl Identity {
    fn from_config(config: &Config) -> Self {
        let id = config
            .user
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let color = config
            .user
            .color
            .clone()
            .unwrap_or_else(|| color_from_user_id(&id));
        let name = config.user.name.clone().unwrap_or_else(|| id.clone());
        Self { id, name, color }
    }
}

/// What a replayed session produced.
#[derive(Debug, Default, PartialEq)]
struct Report {
    log: Vec<String>,
    text: String,
    cursor: Cursor,
    others: Vec<String>,
    css: Vec<String>,
}

struct Session {
    adapter: EditorAdapter<RopeEditor>,
    events: Rc<RefCell<Vec<AdapterEvent<TextOperation>>>>,
    undo_requests: Rc<Cell<usize>>,
    history: Vec<TextOperation>,
    log: Vec<String>,
}

impl Session {
    fn new(text: &str, style: CursorStyle) -> Self {
        let mut adapter: EditorAdapter<RopeEditor> =
            EditorAdapter::with_style(RopeEditor::new(text), StyleSheet::new(), style);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        adapter.register_callbacks(move |event| sink.borrow_mut().push(event));

        let undo_requests = Rc::new(Cell::new(0));
        let requests = Rc::clone(&undo_requests);
        adapter.register_undo(move || requests.set(requests.get() + 1));

        Self {
            adapter,
            events,
            undo_requests,
            history: Vec::new(),
            log: Vec::new(),
        }
    }

    fn run(&mut self, step: Step) -> Result<()> {
        match step {
            Step::LocalInsert { at, text } => {
                self.adapter.host_mut().select(at, at);
                self.adapter.host_mut().type_text(&text);
            }
            Step::LocalRemove { start, end } => {
                self.adapter.host_mut().select(start, end);
                self.adapter.host_mut().type_text("");
            }
            Step::Select { anchor, head } => self.adapter.host_mut().select(anchor, head),
            Step::Remote { operation } => {
                self.flush()?;
                self.log.push(format!("remote  {operation}"));
                self.adapter
                    .apply_operation(&operation)
                    .with_context(|| format!("Failed to apply remote operation {operation}"))?;
                // Local inverses no longer line up with the document.
                self.history.clear();
            }
            Step::RemoteCursor {
                participant,
                position,
                selection_end,
                color,
                name,
            } => {
                self.flush()?;
                let cursor = Cursor::new(position, selection_end.unwrap_or(position));
                let color = color.unwrap_or_else(|| color_from_user_id(&participant));
                self.adapter
                    .set_other_cursor(&participant, cursor, &color, name.as_deref());
            }
            Step::Undo => {
                self.flush()?;
                self.adapter.host_mut().undo();
                self.undo()?;
            }
        }
        self.flush()
    }

    /// Process queued editor events and record what the adapter reported.
    fn flush(&mut self) -> Result<()> {
        self.adapter.pump()?;
        for event in self.events.borrow_mut().drain(..) {
            match event {
                AdapterEvent::Change { operation, inverse } => {
                    self.log.push(format!("change  {operation}"));
                    self.log.push(format!("inverse {inverse}"));
                    self.history.push(inverse);
                }
                AdapterEvent::Blur => self.log.push("blur".to_string()),
                AdapterEvent::Focus => self.log.push("focus".to_string()),
                AdapterEvent::CursorActivity => {
                    let cursor = self.adapter.get_cursor();
                    self.log.push(format!(
                        "cursor  {}..{}",
                        cursor.position, cursor.selection_end
                    ));
                }
            }
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        while self.undo_requests.get() > 0 {
            self.undo_requests.set(self.undo_requests.get() - 1);
            let Some(inverse) = self.history.pop() else {
                log::warn!("Nothing to undo");
                continue;
            };
            self.log.push(format!("undo    {inverse}"));
            self.adapter.apply_operation(&inverse)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Report> {
        self.flush()?;

        let mut participants: Vec<String> = self
            .adapter
            .remote_cursors()
            .participants()
            .map(String::from)
            .collect();
        participants.sort();
        let others = participants
            .iter()
            .filter_map(|participant| {
                let remote = self.adapter.other_cursor(participant)?;
                let label = remote.name.unwrap_or_else(|| participant.clone());
                Some(format!(
                    "{label}: {}..{} ({})",
                    remote.cursor.position, remote.cursor.selection_end, remote.class
                ))
            })
            .collect();

        let report = Report {
            log: self.log,
            text: self.adapter.get_text(),
            cursor: self.adapter.get_cursor(),
            others,
            css: self.adapter.styles().rules().to_vec(),
        };
        self.adapter.dispose();
        Ok(report)
    }
}

fn replay(script: Script, style: CursorStyle) -> Result<Report> {
    let mut session = Session::new(&script.text, style);
    for (index, step) in script.steps.into_iter().enumerate() {
        session
            .run(step)
            .with_context(|| format!("Step {} failed", index + 1))?;
    }
    session.finish()
}

fn print_report(identity: &Identity, report: &Report) {
    println!("# session of {} ({}, {})", identity.name, identity.id, identity.color);
    for line in &report.log {
        println!("{line}");
    }
    println!();
    println!("# text");
    println!("{}", report.text);
    println!();
    println!(
        "# local cursor {}..{}",
        report.cursor.position, report.cursor.selection_end
    );
    for other in &report.others {
        println!("# remote {other}");
    }
    if !report.css.is_empty() {
        println!();
        println!("# css");
        for rule in &report.css {
            println!("{rule}");
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <session-script.toml>", args[0]);
        process::exit(1);
    }

    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", Config::config_path().display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    let identity = Identity::from_config(&config);
    let style = CursorStyle {
        border_width_px: config.cursors.border_width_px,
        selection_opacity: config.cursors.selection_opacity,
    };

    let script_path = PathBuf::from(&args[1]);
    let script_path = Config::expand_path(&script_path).unwrap_or(script_path);
    let content = fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read session script {}", script_path.display()))?;
    let script: Script = toml::from_str(&content)
        .with_context(|| format!("Failed to parse session script {}", script_path.display()))?;

    log::info!(
        "Replaying {} steps as {}",
        script.steps.len(),
        identity.name
    );
    let report = replay(script, style)?;
    print_report(&identity, &report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabpad_config::UserConfig;
    use pretty_assertions::assert_eq;

    fn parse(script: &str) -> Script {
        toml::from_str(script).unwrap()
    }

    #[test]
    fn test_local_edits_are_reported_as_changes() {
        let script = parse(
            r#"
text = "hello\nworld"

[[steps]]
action = "local_insert"
at = { row = 0, column = 3 }
text = "X"
"#,
        );

        let report = replay(script, CursorStyle::default()).unwrap();

        assert_eq!(report.text, "helXlo\nworld");
        assert_eq!(
            report.log[..2],
            [
                r#"change  Retain(3) + Insert("X") + Retain(8)"#,
                r#"inverse Retain(3) + Delete("X") + Retain(8)"#,
            ]
        );
        assert_eq!(report.cursor, Cursor::caret(4));
    }

    #[test]
    fn test_remote_operation_is_not_echoed() {
        let script = parse(
            r#"
text = "hello"

[[steps]]
action = "remote"
operation = [{ retain = 5 }, { insert = " world" }]
"#,
        );

        let report = replay(script, CursorStyle::default()).unwrap();

        assert_eq!(report.text, "hello world");
        assert_eq!(report.log, [r#"remote  Retain(5) + Insert(" world")"#]);
    }

    #[test]
    fn test_undo_applies_last_inverse() {
        let script = parse(
            r#"
text = "keep"

[[steps]]
action = "local_insert"
at = { row = 0, column = 4 }
text = " going"

[[steps]]
action = "undo"
"#,
        );

        let report = replay(script, CursorStyle::default()).unwrap();

        assert_eq!(report.text, "keep");
        assert!(
            report
                .log
                .contains(&r#"undo    Retain(4) + Delete(" going")"#.to_string())
        );
    }

    #[test]
    fn test_undo_with_empty_history_changes_nothing() {
        let script = parse(
            r#"
text = "keep"

[[steps]]
action = "undo"
"#,
        );

        let report = replay(script, CursorStyle::default()).unwrap();

        assert_eq!(report.text, "keep");
        assert!(report.log.is_empty());
    }

    #[test]
    fn test_remote_cursor_follows_local_typing() {
        let script = parse(
            r##"
text = "hello world"

[[steps]]
action = "remote_cursor"
participant = "bob"
name = "Bob"
color = "#336699"
position = 6
selection_end = 11

[[steps]]
action = "local_insert"
at = { row = 0, column = 0 }
text = ">> "
"##,
        );

        let report = replay(script, CursorStyle::default()).unwrap();

        assert_eq!(
            report.others,
            ["Bob: 9..14 (other-client-selection-336699)"]
        );
        assert_eq!(report.css.len(), 1);
        assert!(report.css[0].starts_with(".other-client-selection-336699 {"));
    }

    #[test]
    fn test_local_remove_and_select() {
        let script = parse(
            r#"
text = "one\ntwo\nthree"

[[steps]]
action = "local_remove"
start = { row = 0, column = 0 }
end = { row = 1, column = 0 }

[[steps]]
action = "select"
anchor = { row = 1, column = 5 }
head = { row = 1, column = 0 }
"#,
        );

        let report = replay(script, CursorStyle::default()).unwrap();

        assert_eq!(report.text, "two\nthree");
        assert_eq!(report.log[0], r#"change  Delete("one\n") + Retain(9)"#);
        assert_eq!(report.cursor, Cursor::new(4, 9));
    }

    #[test]
    fn test_mismatched_remote_operation_fails_with_step_number() {
        let script = parse(
            r#"
text = "abc"

[[steps]]
action = "select"
anchor = { row = 0, column = 1 }
head = { row = 0, column = 1 }

[[steps]]
action = "remote"
operation = [{ retain = 10 }, { insert = "x" }]
"#,
        );

        let error = replay(script, CursorStyle::default()).unwrap_err();

        assert!(format!("{error:#}").contains("Step 2 failed"));
    }

    #[test]
    fn test_identity_defaults() {
        let identity = Identity::from_config(&Config::default());

        assert_eq!(identity.name, identity.id);
        assert_eq!(identity.color, color_from_user_id(&identity.id));
        assert!(uuid::Uuid::parse_str(&identity.id).is_ok());
    }

    #[test]
    fn test_identity_from_config() {
        let config = Config {
            user: UserConfig {
                id: Some("alice".to_string()),
                name: None,
                color: Some("#e91e63".to_string()),
            },
            ..Config::default()
        };

        assert_eq!(
            Identity::from_config(&config),
            Identity {
                id: "alice".to_string(),
                name: "alice".to_string(),
                color: "#e91e63".to_string(),
            }
        );
    }
}
