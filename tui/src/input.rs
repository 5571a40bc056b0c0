//! Input handling for the PSCode TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;

use pscode_engine::{App, CaretMotion};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking thread and feeds them to the frame
/// loop over a bounded channel.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close the receiver first so the input thread unblocks if it is
        // currently backpressured on a send.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    // Bounded queue: apply backpressure instead of dropping
                    // events, so multi-line pastes arrive intact.
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        tracing::debug!("Input channel closed, stopping pump");
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain up to one frame's worth of queued events into the app.
/// Returns true when the app should exit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if apply_event(app, ev) {
            return Ok(true);
        }
        processed += 1;
    }
    Ok(app.should_quit())
}

fn apply_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) => {
            // Handle press + repeat events (ignore releases)
            if matches!(key.kind, KeyEventKind::Release) {
                return app.should_quit();
            }

            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('c') => {
                        app.request_quit();
                        return true;
                    }
                    KeyCode::Char('r') => {
                        app.run_script();
                        return app.should_quit();
                    }
                    _ => return app.should_quit(),
                }
            }

            if app.current_dialog().is_some() {
                handle_dialog_key(app, key);
            } else {
                handle_editor_key(app, key);
            }
        }
        Event::Paste(text) => {
            if app.current_dialog().is_none() {
                for c in normalize_line_endings(&text).chars() {
                    app.type_char(c);
                }
            }
        }
        _ => {}
    }
    app.should_quit()
}

/// An open dialog is modal: only dismissal keys do anything.
fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
        app.dismiss_dialog();
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    // Popup navigation takes priority over buffer edits.
    if app.completion().is_some() {
        match key.code {
            KeyCode::Up => {
                app.completion_move_up();
                return;
            }
            KeyCode::Down => {
                app.completion_move_down();
                return;
            }
            // Enter commits without inserting a newline.
            KeyCode::Enter | KeyCode::Tab => {
                app.commit_completion();
                return;
            }
            KeyCode::Esc => {
                app.close_completion();
                return;
            }
            _ => {}
        }
    }

    if app.overload().is_some() {
        match key.code {
            KeyCode::Up | KeyCode::Down => {
                app.overload_cycle();
                return;
            }
            KeyCode::Esc => {
                app.close_popups();
                return;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Char(c) => app.type_char(c),
        KeyCode::Enter => app.type_char('\n'),
        KeyCode::Tab => app.type_char('\t'),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete_forward(),
        KeyCode::Left => app.move_caret(CaretMotion::Left),
        KeyCode::Right => app.move_caret(CaretMotion::Right),
        KeyCode::Up => app.move_caret(CaretMotion::Up),
        KeyCode::Down => app.move_caret(CaretMotion::Down),
        KeyCode::Home => app.move_caret(CaretMotion::LineStart),
        KeyCode::End => app.move_caret(CaretMotion::LineEnd),
        KeyCode::Esc => app.close_popups(),
        KeyCode::F(5) => app.run_script(),
        _ => {}
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pscode_engine::{EngineError, ParseOutcome, ScriptEngine};
    use pscode_types::{CompletionCandidate, CompletionKind, InvokeOutcome};

    struct NullEngine {
        candidates: Vec<CompletionCandidate>,
    }

    impl ScriptEngine for NullEngine {
        fn parse(&mut self, _text: &str) -> Result<ParseOutcome, EngineError> {
            Ok(ParseOutcome {
                tokens: Vec::new(),
                errors: Vec::new(),
            })
        }

        fn complete(
            &mut self,
            _text: &str,
            _caret: usize,
        ) -> Result<Vec<CompletionCandidate>, EngineError> {
            Ok(self.candidates.clone())
        }

        fn invoke(&mut self, _script: &str) -> Result<InvokeOutcome, EngineError> {
            Ok(InvokeOutcome::new(String::new(), vec!["boom".to_string()]))
        }
    }

    fn test_app() -> App {
        App::new(Box::new(NullEngine {
            candidates: vec![CompletionCandidate::new(
                "Get-ChildItem".to_string(),
                "Get-ChildItem".to_string(),
                CompletionKind::Command,
                String::new(),
            )],
        }))
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[test]
    fn test_ctrl_q_quits() {
        let mut app = test_app();
        assert!(apply_event(&mut app, ctrl('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_enter_commits_popup_without_newline() {
        let mut app = test_app();
        apply_event(&mut app, press(KeyCode::Char('$')));
        assert!(app.completion().is_some());

        let lines_before = app.buffer().line_count();
        apply_event(&mut app, press(KeyCode::Enter));
        assert!(app.completion().is_none());
        assert_eq!(app.buffer().line_count(), lines_before);
        assert!(app.buffer().text().ends_with("Get-ChildItem"));
    }

    #[test]
    fn test_enter_inserts_newline_without_popup() {
        let mut app = test_app();
        let lines_before = app.buffer().line_count();
        apply_event(&mut app, press(KeyCode::Enter));
        assert_eq!(app.buffer().line_count(), lines_before + 1);
    }

    #[test]
    fn test_dialog_swallows_editing_keys() {
        let mut app = test_app();
        apply_event(&mut app, press(KeyCode::F(5)));
        assert!(app.current_dialog().is_some());

        let text_before = app.buffer().text().to_string();
        apply_event(&mut app, press(KeyCode::Char('x')));
        apply_event(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.buffer().text(), text_before);

        apply_event(&mut app, press(KeyCode::Enter));
        assert!(app.current_dialog().is_none());
    }

    #[test]
    fn test_escape_closes_completion_popup() {
        let mut app = test_app();
        apply_event(&mut app, press(KeyCode::Char('$')));
        assert!(app.completion().is_some());
        apply_event(&mut app, press(KeyCode::Esc));
        assert!(app.completion().is_none());
    }

    #[test]
    fn test_paste_normalizes_line_endings() {
        let mut app = test_app();
        let before = app.buffer().text().to_string();
        apply_event(&mut app, Event::Paste("a\r\nb".to_string()));
        assert_eq!(app.buffer().text(), format!("{before}a\nb"));
    }
}
