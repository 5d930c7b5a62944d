//! Escape-sequence serialization
//!
//! Thin writers for the control sequences the toolkit emits: SGR style
//! deltas, cursor movement, terminal mode brackets, OSC strings, and the
//! startup capability queries. The diff walk in [`super`] decides *what*
//! to emit; this module only knows *how* the bytes look.

use crate::cell::{CursorShape, MouseShape};
use crate::style::{AttrFlags, Color, Style, UnderlineStyle};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::io::{self, Write};

// ─────────────────────────────────────────────────────────────────────────
// Cursor
// ─────────────────────────────────────────────────────────────────────────

/// Absolute cursor move (1-based on the wire)
pub fn cursor_position(writer: &mut impl Write, col: u16, row: u16) -> io::Result<()> {
    write!(writer, "\x1b[{};{}H", row + 1, col + 1)
}

/// Relative cursor move within the same row
pub fn cursor_forward(writer: &mut impl Write, n: u16) -> io::Result<()> {
    match n {
        0 => Ok(()),
        1 => write!(writer, "\x1b[C"),
        _ => write!(writer, "\x1b[{}C", n),
    }
}

/// Hide the cursor
pub fn hide_cursor(writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "\x1b[?25l")
}

/// Show the cursor
pub fn show_cursor(writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "\x1b[?25h")
}

/// Set the cursor shape (DECSCUSR)
pub fn cursor_shape(writer: &mut impl Write, shape: CursorShape) -> io::Result<()> {
    write!(writer, "\x1b[{} q", shape.param())
}

// ─────────────────────────────────────────────────────────────────────────
// Styles
// ─────────────────────────────────────────────────────────────────────────

/// Reset all attributes
pub fn sgr_reset(writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "\x1b[0m")
}

/// Map a 24-bit color onto the 256-color cube for terminals without RGB
fn rgb_to_indexed(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        // Grayscale ramp, indices 232..=255
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return 232 + ((r as u16 - 8) / 10) as u8;
    }
    let scale = |c: u8| -> u16 { (c as u16 * 5 + 127) / 255 };
    (16 + 36 * scale(r) + 6 * scale(g) + scale(b)) as u8
}

fn push_color(params: &mut Vec<String>, base: u8, color: Color, rgb_ok: bool) {
    match color {
        Color::Default => params.push(format!("{}", base + 1)), // 39/49/59
        Color::Indexed(i) => params.push(format!("{};5;{}", base, i)),
        Color::Rgb(r, g, b) => {
            if rgb_ok {
                params.push(format!("{};2;{};{};{}", base, r, g, b));
            } else {
                params.push(format!("{};5;{}", base, rgb_to_indexed(r, g, b)));
            }
        }
    }
}

fn underline_param(style: UnderlineStyle) -> &'static str {
    match style {
        UnderlineStyle::Off => "24",
        UnderlineStyle::Single => "4",
        UnderlineStyle::Double => "4:2",
        UnderlineStyle::Curly => "4:3",
        UnderlineStyle::Dotted => "4:4",
        UnderlineStyle::Dashed => "4:5",
    }
}

/// Emit only the SGR parameters that differ between `prev` and `next`
///
/// Bold and dim share the `22` reset; when either is removed both are
/// reset and the survivor re-applied.
pub fn sgr_delta(
    writer: &mut impl Write,
    prev: &Style,
    next: &Style,
    rgb_ok: bool,
) -> io::Result<()> {
    let mut params: Vec<String> = Vec::new();

    let added = next.attrs - prev.attrs;
    let removed = prev.attrs - next.attrs;

    if removed.intersects(AttrFlags::BOLD | AttrFlags::DIM) {
        params.push("22".into());
        if next.attrs.contains(AttrFlags::BOLD) {
            params.push("1".into());
        }
        if next.attrs.contains(AttrFlags::DIM) {
            params.push("2".into());
        }
    } else {
        if added.contains(AttrFlags::BOLD) {
            params.push("1".into());
        }
        if added.contains(AttrFlags::DIM) {
            params.push("2".into());
        }
    }
    if added.contains(AttrFlags::ITALIC) {
        params.push("3".into());
    }
    if removed.contains(AttrFlags::ITALIC) {
        params.push("23".into());
    }
    if added.contains(AttrFlags::BLINK) {
        params.push("5".into());
    }
    if removed.contains(AttrFlags::BLINK) {
        params.push("25".into());
    }
    if added.contains(AttrFlags::REVERSE) {
        params.push("7".into());
    }
    if removed.contains(AttrFlags::REVERSE) {
        params.push("27".into());
    }
    if added.contains(AttrFlags::INVISIBLE) {
        params.push("8".into());
    }
    if removed.contains(AttrFlags::INVISIBLE) {
        params.push("28".into());
    }
    if added.contains(AttrFlags::STRIKETHROUGH) {
        params.push("9".into());
    }
    if removed.contains(AttrFlags::STRIKETHROUGH) {
        params.push("29".into());
    }

    if next.ul_style != prev.ul_style {
        params.push(underline_param(next.ul_style).into());
    }
    if next.fg != prev.fg {
        push_color(&mut params, 38, next.fg, rgb_ok);
    }
    if next.bg != prev.bg {
        push_color(&mut params, 48, next.bg, rgb_ok);
    }
    if next.ul != prev.ul {
        push_color(&mut params, 58, next.ul, rgb_ok);
    }

    if params.is_empty() {
        return Ok(());
    }
    write!(writer, "\x1b[{}m", params.join(";"))
}

// ─────────────────────────────────────────────────────────────────────────
// OSC strings
// ─────────────────────────────────────────────────────────────────────────

/// Open an OSC 8 hyperlink
pub fn hyperlink_open(writer: &mut impl Write, uri: &str, id: Option<&str>) -> io::Result<()> {
    match id {
        Some(id) => write!(writer, "\x1b]8;id={};{}\x1b\\", id, uri),
        None => write!(writer, "\x1b]8;;{}\x1b\\", uri),
    }
}

/// Close the current OSC 8 hyperlink
pub fn hyperlink_close(writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "\x1b]8;;\x1b\\")
}

/// Set the window title (OSC 2)
pub fn set_title(writer: &mut impl Write, title: &str) -> io::Result<()> {
    write!(writer, "\x1b]2;{}\x1b\\", title)
}

/// Copy to the system clipboard (OSC 52)
///
/// Terminals without OSC 52 ignore this; the command fails silently by
/// design of the protocol.
pub fn copy_to_clipboard(writer: &mut impl Write, data: &[u8]) -> io::Result<()> {
    write!(writer, "\x1b]52;c;{}\x1b\\", BASE64.encode(data))
}

/// Post a desktop notification (OSC 9 / OSC 777)
pub fn notify(writer: &mut impl Write, title: Option<&str>, body: &str) -> io::Result<()> {
    match title {
        Some(title) => write!(writer, "\x1b]777;notify;{};{}\x1b\\", title, body),
        None => write!(writer, "\x1b]9;{}\x1b\\", body),
    }
}

/// Set the mouse pointer shape (OSC 22)
pub fn mouse_shape(writer: &mut impl Write, shape: MouseShape) -> io::Result<()> {
    write!(writer, "\x1b]22;{}\x1b\\", shape.name())
}

/// Query a terminal color (OSC 10 foreground / 11 background)
pub fn query_color(writer: &mut impl Write, kind: u8) -> io::Result<()> {
    write!(writer, "\x1b]{};?\x1b\\", kind)
}

// ─────────────────────────────────────────────────────────────────────────
// Synchronized updates
// ─────────────────────────────────────────────────────────────────────────

/// Begin a synchronized update (BSU)
pub fn sync_begin(writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "\x1b[?2026h")
}

/// End a synchronized update (ESU)
pub fn sync_end(writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "\x1b[?2026l")
}

// ─────────────────────────────────────────────────────────────────────────
// Mode bracket
// ─────────────────────────────────────────────────────────────────────────

/// Enter TUI mode: alt screen, modes, capability queries
///
/// Emitted once at startup. The queries at the end prompt the capability
/// replies the input parser recognizes.
pub fn enter_modes(writer: &mut impl Write) -> io::Result<()> {
    // Alt screen, clear
    write!(writer, "\x1b[?1049h\x1b[2J")?;
    // Bracketed paste, focus reporting
    write!(writer, "\x1b[?2004h\x1b[?1004h")?;
    // Button-event mouse + SGR encoding
    write!(writer, "\x1b[?1002h\x1b[?1003h\x1b[?1006h")?;
    // Kitty keyboard: push disambiguate|report-event-types|report-alternates
    write!(writer, "\x1b[>11u")?;
    // Queries: kitty keyboard support, DA1 terminates the batch
    write!(writer, "\x1b[?u\x1b[c")?;
    writer.flush()
}

/// Leave TUI mode, undoing everything `enter_modes` set
pub fn exit_modes(writer: &mut impl Write) -> io::Result<()> {
    // Kitty keyboard pop
    write!(writer, "\x1b[<u")?;
    write!(writer, "\x1b[?1006l\x1b[?1003l\x1b[?1002l")?;
    write!(writer, "\x1b[?1004l\x1b[?2004l")?;
    sgr_reset(writer)?;
    show_cursor(writer)?;
    write!(writer, "\x1b[?1049l")?;
    writer.flush()
}

/// Enable pixel-precision mouse reporting (mode 1016)
pub fn enable_sgr_pixels(writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "\x1b[?1016h")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(f: impl Fn(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cursor_position_is_one_based() {
        assert_eq!(emit(|w| cursor_position(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(emit(|w| cursor_position(w, 5, 2)), "\x1b[3;6H");
    }

    #[test]
    fn test_sgr_delta_no_change_emits_nothing() {
        let style = Style::new().fg(Color::RED).bold();
        assert_eq!(emit(|w| sgr_delta(w, &style, &style, true)), "");
    }

    #[test]
    fn test_sgr_delta_adds_only_changes() {
        let prev = Style::new().fg(Color::RED);
        let next = Style::new().fg(Color::RED).bold();
        assert_eq!(emit(|w| sgr_delta(w, &prev, &next, true)), "\x1b[1m");
    }

    #[test]
    fn test_sgr_delta_bold_dim_share_reset() {
        let prev = Style::new().bold().dim();
        let next = Style::new().dim();
        // Bold removed: reset both, re-add dim
        assert_eq!(emit(|w| sgr_delta(w, &prev, &next, true)), "\x1b[22;2m");
    }

    #[test]
    fn test_sgr_delta_rgb_downgrade() {
        let prev = Style::default();
        let next = Style::new().fg(Color::Rgb(255, 0, 0));
        let s = emit(|w| sgr_delta(w, &prev, &next, false));
        assert!(s.starts_with("\x1b[38;5;"), "got {:?}", s);
    }

    #[test]
    fn test_sgr_delta_color_to_default() {
        let prev = Style::new().fg(Color::RED);
        let next = Style::default();
        assert_eq!(emit(|w| sgr_delta(w, &prev, &next, true)), "\x1b[39m");
    }

    #[test]
    fn test_rgb_to_indexed_grayscale() {
        assert_eq!(rgb_to_indexed(0, 0, 0), 16);
        assert_eq!(rgb_to_indexed(255, 255, 255), 231);
        let mid = rgb_to_indexed(128, 128, 128);
        assert!((232..=255).contains(&mid));
    }

    #[test]
    fn test_hyperlink_sequences() {
        assert_eq!(
            emit(|w| hyperlink_open(w, "https://example.com", None)),
            "\x1b]8;;https://example.com\x1b\\"
        );
        assert_eq!(
            emit(|w| hyperlink_open(w, "https://example.com", Some("7"))),
            "\x1b]8;id=7;https://example.com\x1b\\"
        );
        assert_eq!(emit(hyperlink_close), "\x1b]8;;\x1b\\");
    }

    #[test]
    fn test_clipboard_is_base64() {
        assert_eq!(
            emit(|w| copy_to_clipboard(w, b"hi")),
            "\x1b]52;c;aGk=\x1b\\"
        );
    }

    #[test]
    fn test_mode_bracket_symmetry() {
        let enter = emit(|w| enter_modes(w));
        let exit = emit(|w| exit_modes(w));
        for mode in ["1049", "2004", "1004", "1002", "1003", "1006"] {
            assert!(enter.contains(&format!("\x1b[?{}h", mode)), "{}", mode);
            assert!(exit.contains(&format!("\x1b[?{}l", mode)), "{}", mode);
        }
        assert!(enter.contains("\x1b[>11u"));
        assert!(exit.contains("\x1b[<u"));
    }
}
