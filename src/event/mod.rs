//! Input events, the escape-sequence parser, and the event queue

pub mod cache;
pub mod focus;
pub mod mouse;
pub mod parser;
pub mod queue;
#[cfg(unix)]
pub mod reader;

pub use cache::GraphemeCache;
pub use focus::FocusHandler;
pub use mouse::MouseHandler;
pub use parser::Parser;
pub use queue::EventQueue;
#[cfg(unix)]
pub use reader::EventReader;

use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Keyboard modifier flags, Kitty keyboard protocol layout
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        /// Shift
        const SHIFT = 0b0000_0001;
        /// Alt / Option
        const ALT = 0b0000_0010;
        /// Control
        const CTRL = 0b0000_0100;
        /// Super / Windows / Command
        const SUPER = 0b0000_1000;
        /// Hyper
        const HYPER = 0b0001_0000;
        /// Meta
        const META = 0b0010_0000;
        /// Caps Lock was active
        const CAPS_LOCK = 0b0100_0000;
        /// Num Lock was active
        const NUM_LOCK = 0b1000_0000;
    }
}

/// Named key codepoints
///
/// Printable keys use their Unicode scalar value; functional keys use the
/// Kitty keyboard protocol's private-use assignments so both legacy and
/// Kitty sequences decode to the same values.
pub struct Key;

#[allow(missing_docs)]
impl Key {
    pub const TAB: u32 = 9;
    pub const ENTER: u32 = 13;
    pub const ESCAPE: u32 = 27;
    pub const SPACE: u32 = 32;
    pub const BACKSPACE: u32 = 127;

    pub const INSERT: u32 = 57348;
    pub const DELETE: u32 = 57349;
    pub const LEFT: u32 = 57350;
    pub const RIGHT: u32 = 57351;
    pub const UP: u32 = 57352;
    pub const DOWN: u32 = 57353;
    pub const PAGE_UP: u32 = 57354;
    pub const PAGE_DOWN: u32 = 57355;
    pub const HOME: u32 = 57356;
    pub const END: u32 = 57357;
    pub const CAPS_LOCK: u32 = 57358;

    pub const F1: u32 = 57364;
    pub const F2: u32 = 57365;
    pub const F3: u32 = 57366;
    pub const F4: u32 = 57367;
    pub const F5: u32 = 57368;
    pub const F6: u32 = 57369;
    pub const F7: u32 = 57370;
    pub const F8: u32 = 57371;
    pub const F9: u32 = 57372;
    pub const F10: u32 = 57373;
    pub const F11: u32 = 57374;
    pub const F12: u32 = 57375;
}

/// A key press or release
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    /// The key's codepoint as delivered (layout-shifted)
    pub codepoint: u32,
    /// Held modifiers
    pub modifiers: Modifiers,
    /// The key's base-layout codepoint when it differs
    pub base_codepoint: Option<u32>,
    /// The shifted codepoint when shift changes it
    pub shifted_codepoint: Option<u32>,
    /// The text this key produces, if any (a single grapheme)
    pub text: Option<Arc<str>>,
}

impl KeyEvent {
    /// A plain key press for a codepoint
    pub fn new(codepoint: u32) -> Self {
        Self {
            codepoint,
            ..Default::default()
        }
    }

    /// A key press from a character, carrying its text
    pub fn from_char(ch: char, cache: &mut GraphemeCache) -> Self {
        let mut buf = [0u8; 4];
        let text = cache.intern(ch.encode_utf8(&mut buf));
        Self {
            codepoint: ch as u32,
            text: Some(text),
            ..Default::default()
        }
    }

    /// Attach modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this event is exactly `codepoint` with exactly `modifiers`
    /// (lock modifiers ignored)
    pub fn matches(&self, codepoint: u32, modifiers: Modifiers) -> bool {
        let held = self.modifiers - (Modifiers::CAPS_LOCK | Modifiers::NUM_LOCK);
        self.codepoint == codepoint && held == modifiers
    }

    /// The key as a character, when it is a printable scalar value
    pub fn char(&self) -> Option<char> {
        char::from_u32(self.codepoint).filter(|ch| !ch.is_control() && self.codepoint < 57344)
    }
}

/// Mouse buttons, including wheels and extended buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    /// Motion without a button
    #[default]
    None,
    /// Left button
    Left,
    /// Middle button
    Middle,
    /// Right button
    Right,
    /// Wheel up
    WheelUp,
    /// Wheel down
    WheelDown,
    /// Wheel tilt left
    WheelLeft,
    /// Wheel tilt right
    WheelRight,
    /// Extended button 8 (often "back")
    Button8,
    /// Extended button 9 (often "forward")
    Button9,
    /// Extended button 10
    Button10,
    /// Extended button 11
    Button11,
}

/// What the mouse did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    /// Button pressed
    Press,
    /// Button released
    Release,
    /// Motion with no button held
    Motion,
    /// Motion with a button held
    Drag,
}

/// A mouse event in cell (and optionally pixel) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// Column
    pub col: u16,
    /// Row
    pub row: u16,
    /// Pixel x, when the terminal reports pixels (mode 1016), else 0
    pub pixel_x: u16,
    /// Pixel y, when the terminal reports pixels (mode 1016), else 0
    pub pixel_y: u16,
    /// The button involved
    pub button: MouseButton,
    /// Held modifiers
    pub modifiers: Modifiers,
    /// Press, release, motion, or drag
    pub kind: MouseEventKind,
}

/// Terminal dimensions in cells and pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Winsize {
    /// Columns
    pub cols: u16,
    /// Rows
    pub rows: u16,
    /// Width in pixels (0 when unreported)
    pub pixel_width: u16,
    /// Height in pixels (0 when unreported)
    pub pixel_height: u16,
}

/// Which terminal color a report refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    /// OSC 10
    Foreground,
    /// OSC 11
    Background,
    /// OSC 12
    Cursor,
}

/// A color reported by the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorReport {
    /// Which slot was reported
    pub kind: ColorKind,
    /// The reported 24-bit value
    pub rgb: (u8, u8, u8),
}

/// An application-level input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Posted once when the loop starts, before the first frame
    Init,
    /// A key was pressed (or repeated)
    Key(KeyEvent),
    /// A key was released (Kitty keyboard protocol terminals only)
    KeyRelease(KeyEvent),
    /// A mouse event
    Mouse(MouseEvent),
    /// The terminal gained focus
    FocusIn,
    /// The terminal lost focus
    FocusOut,
    /// A bracketed paste began; subsequent keys are paste content
    PasteStart,
    /// The bracketed paste ended
    PasteEnd,
    /// The terminal was resized
    Winsize(Winsize),
    /// The terminal speaks the Kitty keyboard protocol
    CapKittyKeyboard,
    /// The terminal speaks the Kitty graphics protocol
    CapKittyGraphics,
    /// The terminal reported 24-bit color support
    CapRgb,
    /// The terminal measures by grapheme cluster
    CapUnicodeWidth,
    /// The DA1 reply arrived; the startup query batch is complete
    CapDa1,
    /// A queried terminal color arrived
    ColorReport(ColorReport),
    /// A timer tick (posted by the frame loop, never by the reader)
    Tick,
    /// An application-defined event
    User(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_event_matches_ignores_locks() {
        let ev = KeyEvent::new('a' as u32)
            .with_modifiers(Modifiers::CTRL | Modifiers::CAPS_LOCK);
        assert!(ev.matches('a' as u32, Modifiers::CTRL));
        assert!(!ev.matches('a' as u32, Modifiers::empty()));
    }

    #[test]
    fn test_key_event_char() {
        assert_eq!(KeyEvent::new('x' as u32).char(), Some('x'));
        assert_eq!(KeyEvent::new(Key::ENTER).char(), None);
        assert_eq!(KeyEvent::new(Key::LEFT).char(), None);
    }

    #[test]
    fn test_from_char_interns_text() {
        let mut cache = GraphemeCache::new();
        let ev = KeyEvent::from_char('é', &mut cache);
        assert_eq!(ev.codepoint, 'é' as u32);
        assert_eq!(ev.text.as_deref(), Some("é"));
    }

    #[test]
    fn test_functional_keys_outside_printable_range() {
        for key in [Key::LEFT, Key::F1, Key::HOME, Key::DELETE] {
            assert!(key >= 57344);
        }
    }
}
