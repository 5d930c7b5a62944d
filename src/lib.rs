//! # Weft
//!
//! A terminal UI toolkit that owns the controlling terminal, parses the raw
//! input byte stream into high-level events, and renders an immediate-mode
//! widget tree through a double-buffered cell grid with minimal escape-sequence
//! diffs.
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **Diff rendering** | Back/front cell grids; only changed cells reach the terminal |
//! | **Own input pipeline** | Raw-mode tty, poll-driven reader thread, incremental escape parser |
//! | **Kitty protocols** | Keyboard progressive enhancement, graphics placements, release events |
//! | **Surface tree** | Widgets draw into composable surfaces with z-ordered children |
//! | **Focus & mouse routing** | Capture/target/bubble dispatch, hit testing, enter/leave diffs |
//! | **Unicode text** | Grapheme-aware soft wrapping and a gap-buffer text field |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weft::prelude::*;
//!
//! fn main() -> weft::Result<()> {
//!     let field = TextField::new();
//!     let root: WidgetRef = widget_ref(field);
//!
//!     let mut app = App::new()?;
//!     app.run(root)
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`app`] | Frame loop: timers, event routing, command dispatch, rendering |
//! | [`cell`] | Styled grapheme cells, cursor and mouse pointer shapes |
//! | [`event`] | Input events, escape-sequence parser, bounded event queue, reader thread |
//! | [`render`] | Escape-sequence serializer and the back/front diff walk |
//! | [`screen`] | The cell grids, cursor state and image placements |
//! | [`text`] | Line splitting, grapheme-aware soft wrap, width measurement |
//! | [`tty`] | Controlling-terminal ownership, raw mode, poll + wakeup pipe |
//! | [`widget`] | The `Widget` trait, surfaces, and the built-in widgets |

#![warn(missing_docs)]

// Internal logging macros - no-op when the tracing feature is disabled
#[cfg(feature = "tracing")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! log_debug {
    ($($arg:tt)*) => { { let _ = ($($arg)*,); } }
}
pub(crate) use log_debug;

#[cfg(feature = "tracing")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! log_warn {
    ($($arg:tt)*) => { { let _ = ($($arg)*,); } }
}
pub(crate) use log_warn;

#[cfg(feature = "tracing")]
macro_rules! log_error {
    ($($arg:tt)*) => { tracing::error!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! log_error {
    ($($arg:tt)*) => { { let _ = ($($arg)*,); } }
}
pub(crate) use log_error;

#[cfg(unix)]
pub mod app;
pub mod caps;
pub mod cell;
pub mod event;
pub mod image;
pub mod layout;
pub mod render;
pub mod screen;
pub mod style;
pub mod text;
#[cfg(unix)]
pub mod tty;
pub mod utils;
pub mod widget;

/// Error type for Weft operations.
///
/// Covers terminal I/O failures, render failures, and general runtime
/// errors. Parser-level invalid sequences are not errors; they are
/// discarded and parsing continues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    ///
    /// Occurs reading or writing the controlling terminal. The frame loop
    /// aborts on these and restores the terminal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal setup or teardown error.
    ///
    /// Occurs when the controlling terminal cannot be opened or switched
    /// into (or out of) raw mode.
    #[error("terminal error: {0}")]
    Terminal(String),

    /// Rendering error.
    ///
    /// Occurs during diff emission when the output stream misbehaves in a
    /// way that is not a plain I/O error.
    #[error("render error: {0}")]
    Render(String),

    /// Generic error with custom message.
    ///
    /// Preserves the underlying error source for better debugging.
    #[error("unexpected error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Weft operations.
///
/// Shorthand for `std::result::Result<T, weft::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use weft::prelude::*;
/// ```
pub mod prelude {
    #[cfg(unix)]
    pub use crate::app::{App, AppConfig};
    pub use crate::caps::Capabilities;
    pub use crate::cell::{Cell, CursorShape, MouseShape};
    pub use crate::event::{
        Event, Key, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind,
    };
    pub use crate::layout::{MaxSize, Point, Rect, Size};
    pub use crate::screen::Screen;
    pub use crate::style::{Color, Style, UnderlineStyle};
    pub use crate::widget::{
        widget_ref, Button, Command, DrawContext, EventContext, FlexColumn, FlexItem, FlexRow,
        ListView, Spinner, SubSurface, Surface, Text, TextField, Widget, WidgetRef,
    };
    pub use crate::Result;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_io_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no tty");
        let error: Error = io_err.into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn test_error_display_formatting() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error = Error::Io(io_err);
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("access denied"));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("generic error");
        let error: Error = anyhow_err.into();
        assert!(matches!(error, Error::Other(_)));
    }

    #[test]
    fn test_result_question_mark_propagates_io_error() {
        fn fallible_io() -> Result<()> {
            let _file = std::fs::read_to_string("/nonexistent/file/that/does/not/exist")?;
            Ok(())
        }
        assert!(fallible_io().is_err());
    }
}
