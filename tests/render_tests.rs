//! Renderer contract tests: the emitted stream converges the front buffer
//! onto the back buffer, and state deltas (styles, hyperlinks) are emitted
//! once per run rather than once per cell.

use proptest::prelude::*;
use weft::caps::Capabilities;
use weft::cell::Cell;
use weft::render;
use weft::screen::Screen;
use weft::style::{Color, Hyperlink, Style};
use weft::text::WidthMethod;

fn screen(cols: u16, rows: u16) -> Screen {
    let mut s = Screen::new(WidthMethod::Wcwidth);
    s.resize(cols, rows, 0, 0);
    s
}

fn render_to_string(s: &mut Screen) -> String {
    let mut out = Vec::new();
    render::render(s, &mut out, &Capabilities::default()).expect("render");
    String::from_utf8(out).expect("utf8")
}

#[test]
fn test_hyperlink_opened_once_per_run() {
    let mut s = screen(20, 2);
    let link = Hyperlink::new("https://example.com");
    let style = Style::new().hyperlink(link);
    s.write_cell(0, 0, Cell::from_char('a').style(style.clone()));
    s.write_cell(1, 0, Cell::from_char('b').style(style));
    s.write_cell(2, 0, Cell::from_char('c'));

    let frame = render_to_string(&mut s);
    assert_eq!(frame.matches("\x1b]8;;https://example.com\x1b\\").count(), 1);
    // One close between the link run and the plain cell (the frame-end
    // close never runs because the link already closed)
    assert_eq!(frame.matches("\x1b]8;;\x1b\\").count(), 1);
}

#[test]
fn test_link_change_closes_and_reopens() {
    let mut s = screen(20, 1);
    let a = Style::new().hyperlink(Hyperlink::new("https://a.example"));
    let b = Style::new().hyperlink(Hyperlink::new("https://b.example"));
    s.write_cell(0, 0, Cell::from_char('a').style(a));
    s.write_cell(1, 0, Cell::from_char('b').style(b));

    let frame = render_to_string(&mut s);
    assert!(frame.contains("https://a.example"));
    assert!(frame.contains("https://b.example"));
    let a_pos = frame.find("https://a.example").unwrap();
    let b_pos = frame.find("https://b.example").unwrap();
    assert!(a_pos < b_pos);
}

#[test]
fn test_queue_refresh_reemits_everything() {
    let mut s = screen(10, 2);
    s.write_cell(0, 0, Cell::from_char('x').style(Style::new().fg(Color::RED)));
    render_to_string(&mut s);

    // Nothing changed: an ordinary render emits nothing
    let quiet = render_to_string(&mut s);
    assert!(quiet.is_empty());

    s.queue_refresh();
    let full = render_to_string(&mut s);
    assert!(full.contains("\x1b[2J"));
    assert!(full.contains('x'));
}

proptest! {
    /// After a successful render the front buffer equals the back buffer,
    /// the dirty flag clears, and an immediate second render is empty
    #[test]
    fn prop_render_converges(writes in prop::collection::vec((0u16..12, 0u16..6, any::<u8>()), 1..60)) {
        let mut s = screen(12, 6);
        for (col, row, byte) in writes {
            let printable = (byte % 94 + 33) as char;
            s.write_cell(col, row, Cell::from_char(printable));
        }
        render_to_string(&mut s);
        prop_assert!(!s.is_dirty());

        let mut out = Vec::new();
        render::render(&mut s, &mut out, &Capabilities::default()).expect("render");
        prop_assert!(out.is_empty());
    }

    /// Every in-range write reads back; out-of-range writes vanish
    #[test]
    fn prop_write_read_roundtrip(col in 0u16..20, row in 0u16..20) {
        let mut s = screen(10, 5);
        let cell = Cell::from_char('z');
        s.write_cell(col, row, cell.clone());
        match s.read_cell(col, row) {
            Some(read) if col < 10 && row < 5 => prop_assert_eq!(read, &cell),
            Some(_) => prop_assert!(false, "read past bounds"),
            None => prop_assert!(col >= 10 || row >= 5),
        }
    }
}
