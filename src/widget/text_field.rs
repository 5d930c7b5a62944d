//! Single-line text field over a byte gap buffer
//!
//! The gap sits exactly at the cursor, and every public operation leaves
//! the cursor on a grapheme-cluster boundary: insertion goes grapheme by
//! grapheme, deletion removes whole clusters, and horizontal motion steps
//! over clusters rather than bytes.

use super::{CursorHint, DrawContext, EventContext, Surface, Widget, WidgetEvent};
use crate::cell::{Cell, CursorShape};
use crate::event::{Key, Modifiers};
use crate::layout::Size;
use crate::style::Style;
use crate::text::{grapheme_width, string_width, WidthMethod};
use crate::utils::GapBuffer;
use unicode_segmentation::UnicodeSegmentation;

/// The editing buffer: UTF-8 bytes with the gap at the cursor
#[derive(Debug, Clone, Default)]
pub struct TextFieldBuffer {
    buf: GapBuffer<u8>,
}

impl TextFieldBuffer {
    /// An empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer initialized with text, cursor at the end
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.insert_slice_at_cursor(text);
        buffer
    }

    /// Cursor position as a byte offset
    pub fn cursor(&self) -> usize {
        self.buf.gap_start()
    }

    /// Total byte length
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The text before the cursor
    pub fn text_before_cursor(&self) -> &str {
        // Invariant: the gap lies on a grapheme (hence char) boundary
        std::str::from_utf8(self.buf.prefix()).unwrap_or("")
    }

    /// The text after the cursor
    pub fn text_after_cursor(&self) -> &str {
        std::str::from_utf8(self.buf.suffix()).unwrap_or("")
    }

    /// The whole content as an owned string
    pub fn to_owned_string(&self) -> String {
        let mut out = String::with_capacity(self.len());
        out.push_str(self.text_before_cursor());
        out.push_str(self.text_after_cursor());
        out
    }

    /// Insert text at the cursor, grapheme by grapheme
    pub fn insert_slice_at_cursor(&mut self, text: &str) {
        for grapheme in text.graphemes(true) {
            for byte in grapheme.bytes() {
                self.buf.append_before_gap(byte);
            }
        }
    }

    /// Move left by one grapheme; no-op at the start
    pub fn cursor_left(&mut self) {
        let Some(grapheme) = self.text_before_cursor().graphemes(true).next_back() else {
            return;
        };
        let target = self.cursor() - grapheme.len();
        self.buf.move_gap(target);
    }

    /// Move right by one grapheme; no-op at the end
    pub fn cursor_right(&mut self) {
        let Some(grapheme) = self.text_after_cursor().graphemes(true).next() else {
            return;
        };
        let target = self.cursor() + grapheme.len();
        self.buf.move_gap(target);
    }

    /// Move to the start of the text
    pub fn cursor_to_start(&mut self) {
        self.buf.move_gap(0);
    }

    /// Move to the end of the text
    pub fn cursor_to_end(&mut self) {
        self.buf.move_gap(self.buf.len());
    }

    /// Delete the grapheme before the cursor
    pub fn delete_before_cursor(&mut self) {
        let Some(grapheme) = self.text_before_cursor().graphemes(true).next_back() else {
            return;
        };
        for _ in 0..grapheme.len() {
            self.buf.pop_before_gap();
        }
    }

    /// Delete the grapheme after the cursor
    pub fn delete_after_cursor(&mut self) {
        let Some(grapheme) = self.text_after_cursor().graphemes(true).next() else {
            return;
        };
        for _ in 0..grapheme.len() {
            self.buf.pop_after_gap();
        }
    }

    /// Delete everything before the cursor
    pub fn delete_to_start(&mut self) {
        while self.buf.pop_before_gap().is_some() {}
    }

    /// Delete everything after the cursor
    pub fn delete_to_end(&mut self) {
        while self.buf.pop_after_gap().is_some() {}
    }

    /// Byte offset of the previous word boundary
    ///
    /// Skips whitespace immediately left of the cursor, then the word
    /// itself.
    fn previous_word_offset(&self) -> usize {
        let before = self.text_before_cursor();
        let trimmed = before.trim_end_matches(char::is_whitespace);
        match trimmed.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
            Some((idx, c)) => idx + c.len_utf8(),
            None => 0,
        }
    }

    /// Byte offset of the next word boundary (cursor-relative)
    fn next_word_len(&self) -> usize {
        let after = self.text_after_cursor();
        let leading_ws = after.len() - after.trim_start_matches(char::is_whitespace).len();
        let rest = &after[leading_ws..];
        let word_len = rest
            .split_whitespace()
            .next()
            .map(|w| w.len())
            .unwrap_or(0);
        leading_ws + word_len
    }

    /// Move to the previous whitespace boundary
    pub fn move_backward_wordwise(&mut self) {
        let target = self.previous_word_offset();
        self.buf.move_gap(target);
    }

    /// Move to the next whitespace boundary
    pub fn move_forward_wordwise(&mut self) {
        let target = self.cursor() + self.next_word_len();
        self.buf.move_gap(target);
    }

    /// Delete back to the previous word boundary
    pub fn delete_word_before(&mut self) {
        let target = self.previous_word_offset();
        while self.cursor() > target {
            self.buf.pop_before_gap();
        }
    }

    /// Delete forward to the next word boundary
    pub fn delete_word_after(&mut self) {
        for _ in 0..self.next_word_len() {
            self.buf.pop_after_gap();
        }
    }

    /// Remove all content
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Display width of the text before the cursor
    pub fn width_to_cursor(&self, method: WidthMethod) -> u16 {
        string_width(self.text_before_cursor(), method) as u16
    }
}

/// A single-line editable text widget
pub struct TextField {
    /// The editing buffer
    pub buffer: TextFieldBuffer,
    style: Style,
    /// Horizontal scroll, in columns
    draw_offset: u16,
    on_submit: Option<Box<dyn FnMut(&mut EventContext, &str)>>,
    on_change: Option<Box<dyn FnMut(&mut EventContext, &str)>>,
}

impl TextField {
    /// An empty text field
    pub fn new() -> Self {
        Self {
            buffer: TextFieldBuffer::new(),
            style: Style::default(),
            draw_offset: 0,
            on_submit: None,
            on_change: None,
        }
    }

    /// A field pre-filled with text
    pub fn with_text(text: &str) -> Self {
        let mut field = Self::new();
        field.buffer = TextFieldBuffer::from_text(text);
        field
    }

    /// Set the cell style
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Called with the content when Enter is pressed
    pub fn on_submit(mut self, f: impl FnMut(&mut EventContext, &str) + 'static) -> Self {
        self.on_submit = Some(Box::new(f));
        self
    }

    /// Called with the content after every edit
    pub fn on_change(mut self, f: impl FnMut(&mut EventContext, &str) + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    /// The current content
    pub fn text(&self) -> String {
        self.buffer.to_owned_string()
    }

    fn changed(&mut self, ctx: &mut EventContext) {
        ctx.redraw();
        ctx.consume_event();
        if let Some(on_change) = &mut self.on_change {
            let text = self.buffer.to_owned_string();
            on_change(ctx, &text);
        }
    }

    fn handle_key(&mut self, ctx: &mut EventContext, key: &crate::event::KeyEvent) {
        const NONE: Modifiers = Modifiers::empty();
        const CTRL: Modifiers = Modifiers::CTRL;
        const ALT: Modifiers = Modifiers::ALT;

        if key.matches(Key::ENTER, NONE) {
            if let Some(on_submit) = &mut self.on_submit {
                let text = self.buffer.to_owned_string();
                on_submit(ctx, &text);
            }
            ctx.consume_event();
        } else if key.matches(Key::LEFT, NONE) || key.matches('b' as u32, CTRL) {
            self.buffer.cursor_left();
            self.changed(ctx);
        } else if key.matches(Key::RIGHT, NONE) || key.matches('f' as u32, CTRL) {
            self.buffer.cursor_right();
            self.changed(ctx);
        } else if key.matches(Key::HOME, NONE) || key.matches('a' as u32, CTRL) {
            self.buffer.cursor_to_start();
            self.changed(ctx);
        } else if key.matches(Key::END, NONE) || key.matches('e' as u32, CTRL) {
            self.buffer.cursor_to_end();
            self.changed(ctx);
        } else if key.matches(Key::BACKSPACE, NONE) {
            self.buffer.delete_before_cursor();
            self.changed(ctx);
        } else if key.matches(Key::DELETE, NONE) || key.matches('d' as u32, CTRL) {
            self.buffer.delete_after_cursor();
            self.changed(ctx);
        } else if key.matches('k' as u32, CTRL) {
            self.buffer.delete_to_end();
            self.changed(ctx);
        } else if key.matches('u' as u32, CTRL) {
            self.buffer.delete_to_start();
            self.changed(ctx);
        } else if key.matches('w' as u32, CTRL) || key.matches(Key::BACKSPACE, ALT) {
            self.buffer.delete_word_before();
            self.changed(ctx);
        } else if key.matches('d' as u32, ALT) {
            self.buffer.delete_word_after();
            self.changed(ctx);
        } else if key.matches('b' as u32, ALT) || key.matches(Key::LEFT, CTRL) {
            self.buffer.move_backward_wordwise();
            self.changed(ctx);
        } else if key.matches('f' as u32, ALT) || key.matches(Key::RIGHT, CTRL) {
            self.buffer.move_forward_wordwise();
            self.changed(ctx);
        } else if let Some(text) = &key.text {
            if !key
                .modifiers
                .intersects(Modifiers::CTRL | Modifiers::SUPER | Modifiers::HYPER | Modifiers::META)
            {
                self.buffer.insert_slice_at_cursor(text);
                self.changed(ctx);
            }
        }
    }
}

impl Default for TextField {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for TextField {
    fn draw(&mut self, ctx: &DrawContext) -> Surface {
        let width = ctx
            .max
            .width
            .unwrap_or_else(|| ctx.string_width(&self.text()) as u16 + 1)
            .max(ctx.min.width);
        if width == 0 {
            return Surface::transparent(Size::new(0, 0));
        }
        let mut surface = Surface::new(Size::new(width, 1));

        // Keep the cursor inside the viewport
        let cursor_col = self.buffer.width_to_cursor(ctx.width_method);
        if cursor_col < self.draw_offset {
            self.draw_offset = cursor_col;
        } else if cursor_col >= self.draw_offset + width {
            self.draw_offset = cursor_col - width + 1;
        }

        let text = self.text();
        let mut col: i32 = -(self.draw_offset as i32);
        for grapheme in text.graphemes(true) {
            let gw = grapheme_width(grapheme, ctx.width_method) as i32;
            if gw == 0 {
                continue;
            }
            if col >= 0 && col + gw <= width as i32 {
                surface.write_cell(
                    col as u16,
                    0,
                    Cell::new(grapheme.to_string(), gw as u8).style(self.style.clone()),
                );
            }
            col += gw;
            if col >= width as i32 {
                break;
            }
        }

        // Scrolled content is marked with a leading ellipsis cell
        if self.draw_offset > 0 {
            surface.write_cell(0, 0, Cell::new("…", 1).style(self.style.clone()));
        }

        surface.cursor = Some(CursorHint {
            col: cursor_col - self.draw_offset,
            row: 0,
            shape: CursorShape::Default,
        });
        surface
    }

    fn handle_event(&mut self, ctx: &mut EventContext, event: &WidgetEvent) {
        if let WidgetEvent::Key(key) = event {
            self.handle_key(ctx, key);
        }
    }
}
