//! Application state for the editor shell.
//!
//! Mirrors the widget wiring of the desktop shell: every text-entry event
//! re-parses the whole buffer from scratch, clears all markers, and
//! recreates one per parse error; trigger characters open the completion
//! popup synchronously; `(` opens the static overload hints.

use std::collections::VecDeque;

use pscode_types::{CompletionCandidate, ParseErrorInfo, PsToken};

use crate::buffer::Buffer;
use crate::engine::ScriptEngine;

/// Initial buffer contents.
pub const WELCOME_TEXT: &str = "# Welcome to PSCode\n";

/// Characters whose insertion requests completion candidates.
pub const COMPLETION_TRIGGERS: [char; 4] = ['-', '$', '.', ':'];

/// Static overload-hint demonstration data shown on `(`.
const OVERLOAD_DEMO: [(&str, &str); 3] = [
    ("Method1(int, string)", "Method1 description"),
    ("Method2(int)", "Method2 description"),
    ("Method3(string)", "Method3 description"),
];

/// Open completion popup.
///
/// The anchor is the caret offset at open time; committing replaces the
/// completion segment `[anchor, caret)`. Letters/digits typed while open
/// narrow the list by prefix filter.
#[derive(Debug)]
pub struct CompletionPopup {
    anchor: usize,
    items: Vec<CompletionCandidate>,
    filter: String,
    selected: usize,
}

impl CompletionPopup {
    fn new(anchor: usize, trigger: char, candidates: Vec<CompletionCandidate>) -> Self {
        // The dash trigger completes parameter-style names: insert only the
        // segment after the last dash of the candidate's completion text.
        let items = if trigger == '-' {
            candidates
                .into_iter()
                .map(|c| {
                    let insert = c
                        .completion_text()
                        .rsplit('-')
                        .next()
                        .unwrap_or(c.completion_text())
                        .to_string();
                    CompletionCandidate::new(
                        c.list_text().to_string(),
                        insert,
                        c.kind(),
                        c.tooltip().to_string(),
                    )
                })
                .collect()
        } else {
            candidates
        };

        Self {
            anchor,
            items,
            filter: String::new(),
            selected: 0,
        }
    }

    #[must_use]
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// Candidates matching the current filter, in engine order.
    #[must_use]
    pub fn visible_items(&self) -> Vec<&CompletionCandidate> {
        self.items
            .iter()
            .filter(|c| {
                c.list_text()
                    .to_ascii_lowercase()
                    .starts_with(&self.filter.to_ascii_lowercase())
            })
            .collect()
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected_item(&self) -> Option<&CompletionCandidate> {
        self.visible_items().get(self.selected).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible_items().is_empty()
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let max = self.visible_items().len().saturating_sub(1);
        self.selected = (self.selected + 1).min(max);
    }

    fn push_filter(&mut self, c: char) {
        self.filter.push(c);
        self.selected = 0;
    }

    fn pop_filter(&mut self) -> bool {
        let popped = self.filter.pop().is_some();
        self.selected = 0;
        popped
    }
}

/// Overload-hint popup (static demonstration data).
#[derive(Debug)]
pub struct OverloadPopup {
    selected: usize,
}

impl OverloadPopup {
    fn demo() -> Self {
        Self { selected: 0 }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        OVERLOAD_DEMO.len()
    }

    #[must_use]
    pub fn current(&self) -> (&'static str, &'static str) {
        OVERLOAD_DEMO[self.selected]
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn cycle(&mut self) {
        self.selected = (self.selected + 1) % OVERLOAD_DEMO.len();
    }
}

/// One modal error dialog. Dialogs queue and are dismissed one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDialog {
    pub title: String,
    pub message: String,
}

pub struct App {
    buffer: Buffer,
    engine: Box<dyn ScriptEngine>,
    tokens: Vec<PsToken>,
    markers: Vec<ParseErrorInfo>,
    completion: Option<CompletionPopup>,
    overload: Option<OverloadPopup>,
    dialogs: VecDeque<ErrorDialog>,
    last_output: String,
    should_quit: bool,
}

impl App {
    pub fn new(engine: Box<dyn ScriptEngine>) -> Self {
        Self::with_welcome(engine, WELCOME_TEXT)
    }

    pub fn with_welcome(engine: Box<dyn ScriptEngine>, welcome: &str) -> Self {
        let mut app = Self {
            buffer: Buffer::new(welcome),
            engine,
            tokens: Vec::new(),
            markers: Vec::new(),
            completion: None,
            overload: None,
            dialogs: VecDeque::new(),
            last_output: String::new(),
            should_quit: false,
        };
        app.reparse();
        app
    }

    // ── accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    #[must_use]
    pub fn tokens(&self) -> &[PsToken] {
        &self.tokens
    }

    /// Diagnostic markers, one per parse error in the current buffer.
    #[must_use]
    pub fn markers(&self) -> &[ParseErrorInfo] {
        &self.markers
    }

    #[must_use]
    pub fn completion(&self) -> Option<&CompletionPopup> {
        self.completion.as_ref()
    }

    #[must_use]
    pub fn overload(&self) -> Option<&OverloadPopup> {
        self.overload.as_ref()
    }

    #[must_use]
    pub fn current_dialog(&self) -> Option<&ErrorDialog> {
        self.dialogs.front()
    }

    #[must_use]
    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    // ── text entry ──────────────────────────────────────────────────────

    /// Handle one typed character: commit-on-non-letter, insert, full
    /// re-parse, then trigger handling.
    pub fn type_char(&mut self, c: char) {
        if self.current_dialog().is_some() {
            return;
        }

        // Entering phase: a non-letter/digit typed while the popup is open
        // commits the highlighted candidate before the char is inserted.
        if self.completion.is_some() && !c.is_alphanumeric() {
            self.commit_completion();
        }
        self.overload = None;

        self.buffer.insert_char(c);
        self.reparse();

        // Entered phase: trigger handling.
        if COMPLETION_TRIGGERS.contains(&c) {
            self.open_completion(c);
        } else if c == '(' {
            self.overload = Some(OverloadPopup::demo());
        } else if c.is_alphanumeric()
            && let Some(popup) = self.completion.as_mut()
        {
            popup.push_filter(c);
            if popup.is_empty() {
                self.completion = None;
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.current_dialog().is_some() {
            return;
        }
        self.overload = None;

        if let Some(popup) = self.completion.as_mut() {
            if !popup.pop_filter() {
                self.completion = None;
            }
        }
        if self.buffer.backspace() {
            self.reparse();
        }
        // Deleting back past the anchor invalidates the completion segment.
        if let Some(popup) = &self.completion
            && self.buffer.caret() <= popup.anchor()
        {
            self.completion = None;
        }
    }

    pub fn delete_forward(&mut self) {
        if self.current_dialog().is_some() {
            return;
        }
        self.close_popups();
        if self.buffer.delete_forward() {
            self.reparse();
        }
    }

    /// Caret motion closes both popups.
    pub fn move_caret(&mut self, motion: CaretMotion) {
        if self.current_dialog().is_some() {
            return;
        }
        self.close_popups();
        match motion {
            CaretMotion::Left => self.buffer.move_left(),
            CaretMotion::Right => self.buffer.move_right(),
            CaretMotion::Up => self.buffer.move_up(),
            CaretMotion::Down => self.buffer.move_down(),
            CaretMotion::LineStart => self.buffer.move_line_start(),
            CaretMotion::LineEnd => self.buffer.move_line_end(),
        }
    }

    // ── completion popup ────────────────────────────────────────────────

    fn open_completion(&mut self, trigger: char) {
        let anchor = self.buffer.caret();
        match self.engine.complete(self.buffer.text(), anchor) {
            Ok(candidates) => {
                self.completion = Some(CompletionPopup::new(anchor, trigger, candidates));
            }
            Err(e) => {
                tracing::warn!("Completion request failed: {e}");
                self.completion = None;
            }
        }
    }

    /// Commit the highlighted candidate, replacing the completion segment.
    ///
    /// Takes the popup out of the `Option` — once closed, nothing routes to
    /// it again.
    pub fn commit_completion(&mut self) {
        let Some(popup) = self.completion.take() else {
            return;
        };
        let Some(item) = popup.selected_item() else {
            return;
        };
        let insert = item.completion_text().to_string();
        self.buffer
            .replace_range(popup.anchor(), self.buffer.caret(), &insert);
        self.reparse();
    }

    pub fn close_completion(&mut self) {
        self.completion = None;
    }

    pub fn completion_move_up(&mut self) {
        if let Some(popup) = self.completion.as_mut() {
            popup.move_up();
        }
    }

    pub fn completion_move_down(&mut self) {
        if let Some(popup) = self.completion.as_mut() {
            popup.move_down();
        }
    }

    pub fn close_popups(&mut self) {
        self.completion = None;
        self.overload = None;
    }

    pub fn overload_cycle(&mut self) {
        if let Some(popup) = self.overload.as_mut() {
            popup.cycle();
        }
    }

    // ── parsing ─────────────────────────────────────────────────────────

    /// Full re-parse: clear all markers, recreate one per parse error.
    fn reparse(&mut self) {
        match self.engine.parse(self.buffer.text()) {
            Ok(outcome) => {
                self.tokens = outcome.tokens;
                self.markers = outcome.errors;
            }
            Err(e) => {
                tracing::warn!("Parse request failed: {e}");
                self.tokens.clear();
                self.markers.clear();
            }
        }
    }

    // ── execution ───────────────────────────────────────────────────────

    /// Submit the full buffer to the engine session.
    ///
    /// Every error record becomes its own dialog; an engine-level failure
    /// becomes exactly one.
    pub fn run_script(&mut self) {
        if self.current_dialog().is_some() {
            return;
        }
        self.close_popups();

        match self.engine.invoke(self.buffer.text()) {
            Ok(outcome) => {
                self.last_output = outcome.output().to_string();
                for message in outcome.errors() {
                    self.dialogs.push_back(ErrorDialog {
                        title: "Error".to_string(),
                        message: message.clone(),
                    });
                }
            }
            Err(e) => {
                self.dialogs.push_back(ErrorDialog {
                    title: "Error".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    pub fn dismiss_dialog(&mut self) {
        self.dialogs.pop_front();
    }
}

/// Caret motions forwarded from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretMotion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
}
