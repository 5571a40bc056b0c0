//! Terminal rendering and input handling for the PSCode editor shell.

pub mod editor;
pub mod input;
pub mod theme;

pub use editor::{DrawOptions, draw};
pub use input::{InputPump, handle_events};
pub use theme::Palette;
