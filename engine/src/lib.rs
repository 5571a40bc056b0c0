//! Editor shell state for PSCode.
//!
//! [`App`] owns the document buffer, the diagnostic markers, the completion
//! and overload popups, and the error-dialog queue. All engine calls happen
//! synchronously on the caller's (UI) thread; a long-running script blocks
//! the interface by design of this shell.

pub mod buffer;
pub mod config;
pub mod engine;

mod app;

pub use app::{App, CaretMotion, CompletionPopup, ErrorDialog, OverloadPopup, WELCOME_TEXT};
pub use buffer::Buffer;
pub use config::{ConfigError, EditorConfig, HostConfig, PsCodeConfig};
pub use engine::{EngineError, ParseOutcome, PwshEngine, ScriptEngine};
