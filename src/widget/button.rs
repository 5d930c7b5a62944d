//! A clickable button

use super::{DrawContext, EventContext, Surface, Widget, WidgetEvent};
use crate::cell::MouseShape;
use crate::event::{Key, Modifiers, MouseButton, MouseEventKind};
use crate::layout::Size;
use crate::style::Style;

/// A focusable button that fires on click or Enter/Space
///
/// A click is a press followed by a release inside the button; pressing
/// and dragging away does not fire.
pub struct Button {
    label: String,
    style: Style,
    /// Whether a press started inside and has not been released
    pub mouse_down: bool,
    on_click: Box<dyn FnMut(&mut EventContext)>,
}

impl Button {
    /// Create a button with a label and click handler
    pub fn new(label: impl Into<String>, on_click: impl FnMut(&mut EventContext) + 'static) -> Self {
        Self {
            label: label.into(),
            style: Style::default(),
            mouse_down: false,
            on_click: Box::new(on_click),
        }
    }

    /// Set the label style
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// The label text
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Widget for Button {
    fn draw(&mut self, ctx: &DrawContext) -> Surface {
        let label_width = ctx.string_width(&self.label) as u16;
        let width = (label_width + 2)
            .max(ctx.min.width)
            .min(ctx.max.width.unwrap_or(u16::MAX));
        let height = 1.max(ctx.min.height).min(ctx.max.height.unwrap_or(u16::MAX));
        let mut surface = Surface::new(Size::new(width, height));

        let style = if self.mouse_down {
            self.style.clone().reverse()
        } else {
            self.style.clone()
        };
        let col = (width.saturating_sub(label_width)) / 2;
        let row = height / 2;
        surface.write_text(col, row, &self.label, &style, ctx.width_method);
        surface
    }

    fn handle_event(&mut self, ctx: &mut EventContext, event: &WidgetEvent) {
        match event {
            WidgetEvent::Mouse(mouse) => match (mouse.kind, mouse.button) {
                (MouseEventKind::Press, MouseButton::Left) => {
                    self.mouse_down = true;
                    ctx.redraw();
                    ctx.consume_event();
                }
                (MouseEventKind::Release, MouseButton::Left) => {
                    if self.mouse_down {
                        self.mouse_down = false;
                        (self.on_click)(ctx);
                        ctx.redraw();
                        ctx.consume_event();
                    }
                }
                _ => {}
            },
            WidgetEvent::MouseEnter => {
                ctx.set_mouse_shape(MouseShape::Pointer);
            }
            WidgetEvent::MouseLeave => {
                self.mouse_down = false;
                ctx.set_mouse_shape(MouseShape::Default);
            }
            WidgetEvent::Key(key) => {
                if key.matches(Key::ENTER, Modifiers::empty())
                    || key.matches(Key::SPACE, Modifiers::empty())
                {
                    (self.on_click)(ctx);
                    ctx.redraw();
                    ctx.consume_event();
                }
            }
            _ => {}
        }
    }
}
