//! A vertically scrolling list of widgets

use super::{draw_widget, DrawContext, EventContext, Surface, Widget, WidgetEvent, WidgetRef};
use crate::event::{Key, Modifiers, MouseButton, MouseEventKind};
use crate::layout::{MaxSize, Point, Size};

/// The scroll position: which item is at the top and how many of its rows
/// are scrolled off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scroll {
    /// Index of the first (partially) visible item
    pub top: usize,
    /// Rows of the top item hidden above the viewport
    pub offset: u16,
}

/// A scrolling column of child widgets
pub struct ListView {
    children: Vec<WidgetRef>,
    scroll: Scroll,
    /// Absolute scroll position in rows; clamped when heights are known
    lines: usize,
    /// Rows scrolled per wheel event
    wheel_scroll: u16,
}

impl ListView {
    /// An empty list
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            scroll: Scroll::default(),
            lines: 0,
            wheel_scroll: 1,
        }
    }

    /// Append a child
    pub fn child(mut self, widget: WidgetRef) -> Self {
        self.children.push(widget);
        self
    }

    /// Append a child at runtime
    pub fn push(&mut self, widget: WidgetRef) {
        self.children.push(widget);
    }

    /// Rows scrolled per wheel event (default 1)
    pub fn wheel_scroll(mut self, rows: u16) -> Self {
        self.wheel_scroll = rows;
        self
    }

    /// The scroll position as of the last draw
    pub fn scroll(&self) -> Scroll {
        self.scroll
    }

    /// Scroll down by a number of rows
    pub fn scroll_down(&mut self, rows: u16) {
        self.lines = self.lines.saturating_add(rows as usize);
    }

    /// Scroll up by a number of rows
    pub fn scroll_up(&mut self, rows: u16) {
        self.lines = self.lines.saturating_sub(rows as usize);
    }
}

impl Default for ListView {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ListView {
    fn draw(&mut self, ctx: &DrawContext) -> Surface {
        if self.children.is_empty() {
            let size = Size::new(
                ctx.max.width.unwrap_or(0).max(ctx.min.width),
                ctx.max.height.unwrap_or(0).max(ctx.min.height),
            );
            self.scroll = Scroll::default();
            return Surface::transparent(size);
        }

        // Children lay out at full width, unbounded height
        let child_ctx = ctx.with_constraints(
            Size::new(0, 0),
            MaxSize {
                width: ctx.max.width,
                height: None,
            },
        );
        let surfaces: Vec<Surface> = self
            .children
            .iter()
            .map(|widget| draw_widget(widget, &child_ctx))
            .collect();

        let total_height: usize = surfaces.iter().map(|s| s.size.height as usize).sum();
        let width = ctx
            .max
            .width
            .unwrap_or_else(|| surfaces.iter().map(|s| s.size.width).max().unwrap_or(0))
            .max(ctx.min.width);
        let viewport = ctx
            .max
            .height
            .map(|h| h as usize)
            .unwrap_or(total_height)
            .max(ctx.min.height as usize);

        // Clamp so the last page exactly fills the viewport
        let max_scroll = total_height.saturating_sub(viewport);
        self.lines = self.lines.min(max_scroll);

        // Derive (top, offset) from the absolute position
        let mut remaining = self.lines;
        let mut top = 0usize;
        for surface in &surfaces {
            let h = surface.size.height as usize;
            if remaining < h {
                break;
            }
            remaining -= h;
            top += 1;
        }
        self.scroll = Scroll {
            top,
            offset: remaining as u16,
        };

        let mut list = Surface::transparent(Size::new(width, viewport as u16));
        let mut row: i32 = -(self.scroll.offset as i32);
        for surface in surfaces.into_iter().skip(top) {
            if row >= viewport as i32 {
                break;
            }
            let height = surface.size.height as i32;
            list.add_child(Point::new(0, row), 0, surface);
            row += height;
        }
        list
    }

    fn handle_event(&mut self, ctx: &mut EventContext, event: &WidgetEvent) {
        match event {
            WidgetEvent::Mouse(mouse) if mouse.kind == MouseEventKind::Press => {
                match mouse.button {
                    MouseButton::WheelDown => {
                        self.scroll_down(self.wheel_scroll);
                        ctx.redraw();
                        ctx.consume_event();
                    }
                    MouseButton::WheelUp => {
                        self.scroll_up(self.wheel_scroll);
                        ctx.redraw();
                        ctx.consume_event();
                    }
                    _ => {}
                }
            }
            WidgetEvent::Key(key) => {
                if key.matches(Key::DOWN, Modifiers::empty()) {
                    self.scroll_down(1);
                    ctx.redraw();
                    ctx.consume_event();
                } else if key.matches(Key::UP, Modifiers::empty()) {
                    self.scroll_up(1);
                    ctx.redraw();
                    ctx.consume_event();
                }
            }
            _ => {}
        }
    }
}
