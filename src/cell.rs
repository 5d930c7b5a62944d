//! Terminal cell representation

use crate::style::Style;
use std::sync::Arc;

/// A single cell in a terminal grid
///
/// Holds one grapheme cluster, its display width, and its style. A cell
/// whose `default` flag is set renders as "empty / terminal default" and
/// participates in diffing as a blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// The grapheme cluster displayed in this cell
    pub grapheme: Arc<str>,
    /// Display width in columns (0, 1, or 2)
    ///
    /// Width 0 marks the continuation half of a wide grapheme.
    pub width: u8,
    /// Visual style
    pub style: Style,
    /// Whether this cell is "empty / same as terminal default"
    pub default: bool,
    /// Whether a write to this cell soft-wrapped onto the next row
    pub wrapped: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            grapheme: Arc::from(" "),
            width: 1,
            style: Style::default(),
            default: true,
            wrapped: false,
        }
    }
}

impl Cell {
    /// Create a cell from a grapheme cluster and its measured width
    pub fn new(grapheme: impl Into<Arc<str>>, width: u8) -> Self {
        Self {
            grapheme: grapheme.into(),
            width,
            style: Style::default(),
            default: false,
            wrapped: false,
        }
    }

    /// Create a cell from a single character of width 1
    pub fn from_char(ch: char) -> Self {
        Self::new(ch.to_string(), 1)
    }

    /// The zero-width companion written after a width-2 cell
    pub fn continuation() -> Self {
        Self {
            grapheme: Arc::from(""),
            width: 0,
            style: Style::default(),
            default: false,
            wrapped: false,
        }
    }

    /// Whether this is the continuation half of a wide grapheme
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Set the style
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Mark the cell as having wrapped to the next row
    pub fn wrapped(mut self) -> Self {
        self.wrapped = true;
        self
    }

    /// Reset the cell to the default blank
    pub fn reset(&mut self) {
        *self = Cell::default();
    }
}

/// Terminal cursor shape (DECSCUSR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    /// Terminal-configured default
    #[default]
    Default,
    /// Blinking block
    BlockBlink,
    /// Steady block
    Block,
    /// Blinking underline
    UnderlineBlink,
    /// Steady underline
    Underline,
    /// Blinking bar
    BeamBlink,
    /// Steady bar
    Beam,
}

impl CursorShape {
    /// The DECSCUSR parameter for this shape
    pub fn param(&self) -> u8 {
        match self {
            CursorShape::Default => 0,
            CursorShape::BlockBlink => 1,
            CursorShape::Block => 2,
            CursorShape::UnderlineBlink => 3,
            CursorShape::Underline => 4,
            CursorShape::BeamBlink => 5,
            CursorShape::Beam => 6,
        }
    }
}

/// Mouse pointer shape (OSC 22)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseShape {
    /// Terminal default pointer
    #[default]
    Default,
    /// Text selection beam
    Text,
    /// Clickable pointer (hand)
    Pointer,
    /// Help cursor
    Help,
    /// Busy-but-interactive
    Progress,
    /// Busy
    Wait,
    /// Horizontal resize
    EwResize,
    /// Vertical resize
    NsResize,
    /// Cell selection cross
    Cell,
}

impl MouseShape {
    /// The OSC 22 shape name
    pub fn name(&self) -> &'static str {
        match self {
            MouseShape::Default => "default",
            MouseShape::Text => "text",
            MouseShape::Pointer => "pointer",
            MouseShape::Help => "help",
            MouseShape::Progress => "progress",
            MouseShape::Wait => "wait",
            MouseShape::EwResize => "ew-resize",
            MouseShape::NsResize => "ns-resize",
            MouseShape::Cell => "cell",
        }
    }
}
