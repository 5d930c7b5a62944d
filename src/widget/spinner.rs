//! An animated activity spinner

use super::{DrawContext, EventContext, Surface, Widget, WidgetEvent};
use crate::cell::Cell;
use crate::layout::Size;
use crate::style::Style;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Braille spinner frames
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame period
const INTERVAL: Duration = Duration::from_millis(80);

/// A spinner that advances on its own tick commands
///
/// The frame counter is an atomic shared handle: background threads may
/// advance it directly (e.g. per unit of work) and the draw pass reads it
/// exactly once per frame.
pub struct Spinner {
    frame: Arc<AtomicUsize>,
    style: Style,
    spinning: bool,
    self_ref: Weak<RefCell<Spinner>>,
}

impl Spinner {
    /// Create a stopped spinner
    ///
    /// Returns the shared handle; coerce it to a
    /// [`WidgetRef`](crate::widget::WidgetRef) to place it in a tree.
    pub fn new() -> Rc<RefCell<Spinner>> {
        Rc::new_cyclic(|weak| {
            RefCell::new(Spinner {
                frame: Arc::new(AtomicUsize::new(0)),
                style: Style::default(),
                spinning: false,
                self_ref: weak.clone(),
            })
        })
    }

    /// Set the style
    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    /// The shared frame counter; safe to advance from any thread
    pub fn frame_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.frame)
    }

    /// Whether the spinner is animating
    pub fn is_spinning(&self) -> bool {
        self.spinning
    }

    /// Start animating; schedules the first tick
    pub fn start(&mut self, ctx: &mut EventContext) {
        if self.spinning {
            return;
        }
        self.spinning = true;
        self.schedule(ctx);
        ctx.redraw();
    }

    /// Stop animating; pending ticks become no-ops
    pub fn stop(&mut self) {
        self.spinning = false;
    }

    fn schedule(&self, ctx: &mut EventContext) {
        if let Some(me) = self.self_ref.upgrade() {
            ctx.tick(Instant::now() + INTERVAL, me);
        }
    }
}

impl Widget for Spinner {
    fn draw(&mut self, _ctx: &DrawContext) -> Surface {
        let mut surface = Surface::new(Size::new(1, 1));
        if self.spinning {
            // One atomic read per frame
            let frame = self.frame.load(Ordering::Relaxed);
            let glyph = FRAMES[frame % FRAMES.len()];
            surface.write_cell(0, 0, Cell::new(glyph, 1).style(self.style.clone()));
        }
        surface
    }

    fn handle_event(&mut self, ctx: &mut EventContext, event: &WidgetEvent) {
        if matches!(event, WidgetEvent::Tick) && self.spinning {
            self.frame.fetch_add(1, Ordering::Relaxed);
            ctx.redraw();
            self.schedule(ctx);
        }
    }
}
