//! The diff renderer
//!
//! Walks the back buffer against the front buffer in row-major order and
//! emits the minimal escape stream that brings the terminal (assumed to
//! match the front buffer) up to date. On success the front buffer becomes
//! a copy of the back buffer; on any write error the front buffer is left
//! untouched so the next render re-emits everything still pending.

pub mod ansi;

use crate::caps::Capabilities;
use crate::screen::Screen;
use crate::style::{Hyperlink, Style};
use std::io::{self, Write};

/// Relative cursor moves shorter than this stay relative; longer jumps use
/// an absolute position
const RELATIVE_MOVE_MAX: u16 = 4;

/// Emit the back/front diff to `writer` and promote the back buffer
pub fn render<W: Write>(
    screen: &mut Screen,
    writer: &mut W,
    caps: &Capabilities,
) -> io::Result<()> {
    if !screen.is_dirty() {
        return Ok(());
    }

    let sync = caps.has_synchronized_output();
    let rgb = caps.has_rgb();
    let cols = screen.cols();

    if sync {
        ansi::sync_begin(writer)?;
    }
    ansi::hide_cursor(writer)?;
    ansi::sgr_reset(writer)?;

    let refresh = screen.refresh;
    if refresh {
        // Full refresh: wipe the terminal so the walk below re-emits every
        // non-default cell against a blank front
        write!(writer, "\x1b[2J")?;
    }

    let mut last_style = Style::default();
    let mut last_link: Option<Hyperlink> = None;
    let mut last_pos: Option<(u16, u16)> = None;

    for i in 0..screen.back.len() {
        let col = (i % cols as usize) as u16;
        let row = (i / cols as usize) as u16;
        let cell = &screen.back[i];

        if !refresh && *cell == screen.front[i] {
            continue;
        }
        if cell.is_continuation() {
            // The wide cell before it already advanced the column
            continue;
        }
        if refresh && cell.default {
            continue;
        }

        match last_pos {
            Some((lc, lr)) if lr == row && col >= lc && col - lc <= RELATIVE_MOVE_MAX => {
                ansi::cursor_forward(writer, col - lc)?;
            }
            _ => ansi::cursor_position(writer, col, row)?,
        }

        ansi::sgr_delta(writer, &last_style, &cell.style, rgb)?;
        if cell.style.link != last_link {
            if last_link.is_some() {
                ansi::hyperlink_close(writer)?;
            }
            if let Some(link) = &cell.style.link {
                ansi::hyperlink_open(writer, &link.uri, link.id.as_deref())?;
            }
            last_link = cell.style.link.clone();
        }
        writer.write_all(cell.grapheme.as_bytes())?;

        last_style = cell.style.clone();
        last_pos = Some((col + cell.width.max(1) as u16, row));
    }

    if last_link.is_some() {
        ansi::hyperlink_close(writer)?;
    }

    render_placements(screen, writer)?;

    let cursor = screen.cursor;
    if cursor.visible {
        ansi::cursor_position(writer, cursor.col, cursor.row)?;
        ansi::cursor_shape(writer, screen.cursor_shape)?;
        ansi::show_cursor(writer)?;
    }

    ansi::sgr_reset(writer)?;
    if sync {
        ansi::sync_end(writer)?;
    }
    writer.flush()?;

    // The whole walk completed: the terminal now matches the back buffer
    screen.front.clone_from(&screen.back);
    screen.front_placements = screen.placements.clone();
    screen.dirty = false;
    screen.refresh = false;
    Ok(())
}

/// Emit image placement changes after the text diff
fn render_placements<W: Write>(screen: &Screen, writer: &mut W) -> io::Result<()> {
    let current = &screen.placements;
    let previous = &screen.front_placements;
    if current == previous && !screen.refresh {
        return Ok(());
    }

    for old in previous {
        if !current.contains(old) {
            old.delete(writer)?;
        }
    }
    for new in current {
        let carried = previous.contains(new) && !screen.refresh;
        if !carried {
            new.image.transmit(writer)?;
            ansi::cursor_position(writer, new.col, new.row)?;
            new.place(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::style::Color;
    use crate::text::WidthMethod;

    fn screen(cols: u16, rows: u16) -> Screen {
        let mut s = Screen::new(WidthMethod::Wcwidth);
        s.resize(cols, rows, 0, 0);
        s
    }

    fn render_to_string(s: &mut Screen) -> String {
        let mut out = Vec::new();
        render(s, &mut out, &Capabilities::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_render_promotes_back_to_front() {
        let mut s = screen(10, 3);
        s.write_cell(1, 1, Cell::from_char('x'));
        render_to_string(&mut s);
        assert!(!s.is_dirty());
        assert_eq!(s.front, s.back);
    }

    #[test]
    fn test_render_clean_screen_emits_nothing() {
        let mut s = screen(10, 3);
        s.write_cell(0, 0, Cell::from_char('x'));
        render_to_string(&mut s);
        let mut out = Vec::new();
        render(&mut s, &mut out, &Capabilities::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_cell_change_emits_one_move_and_grapheme() {
        let mut s = screen(80, 24);
        s.write_cell(0, 0, Cell::from_char('H'));
        s.write_cell(1, 0, Cell::from_char('e'));
        render_to_string(&mut s);

        // Change one cell; the second frame should reference only it
        s.write_cell(2, 0, Cell::from_char('a'));
        let frame = render_to_string(&mut s);
        assert_eq!(frame.matches('a').count(), 1);
        assert!(!frame.contains('H'));
        assert!(!frame.contains('e'));
        assert!(frame.contains("\x1b[1;3H"));
    }

    #[test]
    fn test_adjacent_cells_use_relative_motion() {
        let mut s = screen(80, 24);
        s.write_cell(0, 0, Cell::from_char('a'));
        s.write_cell(1, 0, Cell::from_char('b'));
        let frame = render_to_string(&mut s);
        // One absolute move for the first cell, no second absolute move
        assert_eq!(frame.matches("H").count(), 1);
        assert!(frame.contains("ab"));
    }

    #[test]
    fn test_distant_cells_use_absolute_motion() {
        let mut s = screen(80, 24);
        s.write_cell(0, 0, Cell::from_char('a'));
        s.write_cell(40, 0, Cell::from_char('b'));
        let frame = render_to_string(&mut s);
        assert!(frame.contains("\x1b[1;1H"));
        assert!(frame.contains("\x1b[1;41H"));
    }

    #[test]
    fn test_style_delta_emitted_once_per_run() {
        let mut s = screen(80, 24);
        let style = Style::new().fg(Color::RED);
        s.write_cell(0, 0, Cell::from_char('a').style(style.clone()));
        s.write_cell(1, 0, Cell::from_char('b').style(style));
        let frame = render_to_string(&mut s);
        // 38;5;1 appears once; run shares the style
        assert_eq!(frame.matches("38;5;1").count(), 1);
    }

    #[test]
    fn test_wide_cell_continuation_emits_nothing() {
        let mut s = screen(80, 24);
        s.write_cell(0, 0, Cell::new("漢", 2));
        s.write_cell(2, 0, Cell::from_char('x'));
        let frame = render_to_string(&mut s);
        assert!(frame.contains("漢x"), "got {:?}", frame);
    }

    #[test]
    fn test_sync_bracket_when_capable() {
        let caps = Capabilities::default();
        caps.synchronized_output
            .store(true, std::sync::atomic::Ordering::Relaxed);
        let mut s = screen(10, 3);
        s.write_cell(0, 0, Cell::from_char('x'));
        let mut out = Vec::new();
        render(&mut s, &mut out, &caps).unwrap();
        let frame = String::from_utf8(out).unwrap();
        assert!(frame.starts_with("\x1b[?2026h"));
        assert!(frame.ends_with("\x1b[?2026l"));
    }

    #[test]
    fn test_refresh_clears_and_reemits() {
        let mut s = screen(10, 3);
        s.write_cell(0, 0, Cell::from_char('x'));
        render_to_string(&mut s);

        s.queue_refresh();
        let frame = render_to_string(&mut s);
        assert!(frame.contains("\x1b[2J"));
        assert!(frame.contains('x'));
    }

    #[test]
    fn test_cursor_reapplied_when_visible() {
        let mut s = screen(10, 3);
        s.write_cell(0, 0, Cell::from_char('x'));
        s.show_cursor(4, 2);
        let frame = render_to_string(&mut s);
        assert!(frame.contains("\x1b[3;5H"));
        assert!(frame.ends_with("\x1b[?25h\x1b[0m") || frame.contains("\x1b[?25h"));
    }

    #[test]
    fn test_failed_write_leaves_front_unchanged() {
        struct FailingWriter;
        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut s = screen(10, 3);
        s.write_cell(0, 0, Cell::from_char('x'));
        let front_before = s.front.clone();
        let result = render(&mut s, &mut FailingWriter, &Capabilities::default());
        assert!(result.is_err());
        assert!(s.is_dirty());
        assert_eq!(s.front, front_before);
    }
}
