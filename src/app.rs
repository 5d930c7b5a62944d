//! The frame loop
//!
//! Runs the UI thread: paces frames, delivers expired timers, drains the
//! event queue under one lock, applies focus changes, and redraws. The
//! reader thread feeds the queue; this loop is the sole owner of the
//! screen and the only caller of widget `draw`.
//!
//! Per frame, in order: frame pacing, timer ticks, event drain and
//! routing, pending focus application, quit check, then (only when
//! requested) draw → second mouse pass → render.

use crate::caps::Capabilities;
use crate::event::reader::EventReader;
use crate::event::{ColorKind, Event, FocusHandler, MouseHandler};
use crate::layout::{Point, Rect};
use crate::render::{self, ansi};
use crate::screen::Screen;
use crate::text::WidthMethod;
use crate::tty::Tty;
use crate::widget::{
    draw_widget, Command, DrawContext, EventContext, Phase, Surface, WidgetEvent, WidgetRef,
};
use crate::{log_debug, log_warn, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Frame loop configuration
#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    /// Target frames per second
    pub frame_rate: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { frame_rate: 60 }
    }
}

/// A scheduled tick
struct Timer {
    deadline: Instant,
    widget: WidgetRef,
}

/// Keep timers sorted by deadline descending so the earliest pops last
fn insert_timer(timers: &mut Vec<Timer>, deadline: Instant, widget: WidgetRef) {
    let at = timers.partition_point(|t| t.deadline > deadline);
    timers.insert(at, Timer { deadline, widget });
}

/// The application runtime
pub struct App {
    tty: Arc<Tty>,
    caps: Arc<Capabilities>,
    reader: EventReader,
    screen: Screen,
    focus: FocusHandler,
    mouse: MouseHandler,
    timers: Vec<Timer>,
    last_surface: Option<Surface>,
    last_mouse_pos: Option<Point>,
    config: AppConfig,
}

impl App {
    /// Open the terminal and start the reader thread
    pub fn new() -> Result<Self> {
        Self::with_config(AppConfig::default())
    }

    /// Like [`App::new`] with an explicit configuration
    pub fn with_config(config: AppConfig) -> Result<Self> {
        let tty = Arc::new(Tty::open()?);
        let caps = Arc::new(Capabilities::from_env());
        let reader = EventReader::start(Arc::clone(&tty), Arc::clone(&caps))?;
        let width_method = if caps.has_unicode_width() {
            WidthMethod::Unicode
        } else {
            WidthMethod::Wcwidth
        };
        Ok(Self {
            tty,
            caps,
            reader,
            screen: Screen::new(width_method),
            focus: FocusHandler::new(),
            mouse: MouseHandler::new(),
            timers: Vec::new(),
            last_surface: None,
            last_mouse_pos: None,
            config,
        })
    }

    /// Post an application-generated event
    pub fn post_event(&self, event: Event) {
        self.reader.post(event);
    }

    /// The shared capability flags
    pub fn capabilities(&self) -> &Arc<Capabilities> {
        &self.caps
    }

    /// Run the frame loop until a widget requests quit or the tty fails
    ///
    /// The terminal is restored on every exit path, including errors.
    pub fn run(&mut self, root: WidgetRef) -> Result<()> {
        ansi::enter_modes(&mut &*self.tty)?;
        let result = self.run_inner(&root);
        if let Err(e) = ansi::exit_modes(&mut &*self.tty) {
            log_warn!("failed to leave TUI modes: {}", e);
        }
        self.reader.stop();
        self.tty.restore();
        result
    }

    fn run_inner(&mut self, root: &WidgetRef) -> Result<()> {
        let ws = self.tty.winsize()?;
        self.screen
            .resize(ws.cols, ws.rows, ws.pixel_width, ws.pixel_height);
        self.reader.post(Event::Init);

        let tick_period = Duration::from_micros(1_000_000 / self.config.frame_rate.max(1) as u64);
        let mut next_frame = Instant::now();
        let mut redraw = true;
        let mut quit = false;
        let mut pending_focus: Option<WidgetRef> = None;

        loop {
            // 1. Frame pacing
            let now = Instant::now();
            if now >= next_frame {
                next_frame = now + tick_period;
            } else {
                std::thread::sleep(next_frame - now);
                next_frame += tick_period;
            }

            let mut ctx = EventContext::new();

            // 2. Expired timers
            let now = Instant::now();
            while self.timers.last().is_some_and(|t| t.deadline <= now) {
                // Sorted descending, so the last element is the earliest
                let Some(timer) = self.timers.pop() else {
                    break;
                };
                ctx.phase = Phase::Target;
                timer
                    .widget
                    .borrow_mut()
                    .handle_event(&mut ctx, &WidgetEvent::Tick);
                self.execute_commands(&mut ctx, &mut pending_focus);
                ctx.reset_for_event();
            }

            // 3. Drain the queue under one lock acquisition
            let events: Vec<Event> = self.reader.drain().collect();
            for event in events {
                self.route_event(&mut ctx, event, &mut redraw);
                self.execute_commands(&mut ctx, &mut pending_focus);
                ctx.reset_for_event();
            }

            // 4. Apply a requested focus change
            if let Some(target) = pending_focus.take() {
                self.focus
                    .focus_widget(&mut ctx, target, self.last_surface.as_ref());
                self.execute_commands(&mut ctx, &mut pending_focus);
            }

            redraw |= ctx.wants_redraw();
            quit |= ctx.wants_quit();

            // 5. Quit check
            if quit {
                return Ok(());
            }

            // 6. Redraw when requested
            if redraw {
                redraw = false;
                self.draw_frame(root, &mut pending_focus)?;
            }
        }
    }

    fn route_event(&mut self, ctx: &mut EventContext, event: Event, redraw: &mut bool) {
        match event {
            Event::Key(key) => self.focus.route_event(ctx, &WidgetEvent::Key(key)),
            Event::KeyRelease(key) => self.focus.route_event(ctx, &WidgetEvent::KeyRelease(key)),
            Event::Init => self.focus.route_event(ctx, &WidgetEvent::Init),
            Event::FocusIn => self.focus.route_event(ctx, &WidgetEvent::FocusIn),
            Event::FocusOut => {
                self.focus.route_event(ctx, &WidgetEvent::FocusOut);
                self.mouse.clear_hover(ctx);
            }
            Event::PasteStart => self.focus.route_event(ctx, &WidgetEvent::PasteStart),
            Event::PasteEnd => self.focus.route_event(ctx, &WidgetEvent::PasteEnd),
            Event::User(id) => self.focus.route_event(ctx, &WidgetEvent::User(id)),
            Event::Mouse(mouse) => {
                self.last_mouse_pos = Some(Point::new(mouse.col as i32, mouse.row as i32));
                // Events refer to the last-painted tree
                if let Some(surface) = &self.last_surface {
                    self.mouse.handle(ctx, surface, mouse);
                }
            }
            Event::Winsize(ws) => {
                self.screen
                    .resize(ws.cols, ws.rows, ws.pixel_width, ws.pixel_height);
                *redraw = true;
            }
            Event::CapUnicodeWidth => {
                self.screen.set_width_method(WidthMethod::Unicode);
                *redraw = true;
            }
            Event::CapKittyKeyboard
            | Event::CapKittyGraphics
            | Event::CapRgb
            | Event::CapDa1 => {
                // Flags were recorded by the reader; rendering picks them
                // up on the next frame
                log_debug!("capability event: {:?}", event);
            }
            Event::ColorReport(report) => {
                log_debug!("color report: {:?}", report);
            }
            Event::Tick => {}
        }
    }

    fn draw_frame(&mut self, root: &WidgetRef, pending_focus: &mut Option<WidgetRef>) -> Result<()> {
        let dctx = DrawContext::root(
            self.screen.size(),
            self.screen.cell_pixel_size(),
            self.screen.width_method(),
        );
        let mut surface = draw_widget(root, &dctx);
        self.focus.rebuild(&surface);

        // Second mouse pass over the new tree: hover enter/leave deltas
        let mut ctx = EventContext::new();
        if let Some(point) = self.last_mouse_pos {
            self.mouse.update_hover(&mut ctx, &surface, point);
            if ctx.wants_redraw() {
                // A hover handler changed state; lay out once more
                surface = draw_widget(root, &dctx);
                self.focus.rebuild(&surface);
            }
        }
        self.execute_commands(&mut ctx, pending_focus);

        self.screen.clear();
        let clip = Rect::new(0, 0, self.screen.cols(), self.screen.rows());
        surface.render_into(&mut self.screen, Point::new(0, 0), clip);

        // Reflect the focused widget's cursor hint
        let cursor = self
            .focus
            .focused()
            .and_then(|focused| surface.find_cursor(focused));
        match cursor {
            Some((origin, hint)) => {
                let col = origin.col + hint.col as i32;
                let row = origin.row + hint.row as i32;
                if (0..self.screen.cols() as i32).contains(&col)
                    && (0..self.screen.rows() as i32).contains(&row)
                {
                    self.screen.set_cursor_shape(hint.shape);
                    self.screen.show_cursor(col as u16, row as u16);
                } else {
                    self.screen.hide_cursor();
                }
            }
            None => self.screen.hide_cursor(),
        }

        self.last_surface = Some(surface);
        render::render(&mut self.screen, &mut &*self.tty, &self.caps)?;
        Ok(())
    }

    fn execute_commands(&mut self, ctx: &mut EventContext, pending_focus: &mut Option<WidgetRef>) {
        for command in ctx.take_commands() {
            match command {
                Command::Tick { deadline, widget } => {
                    insert_timer(&mut self.timers, deadline, widget);
                }
                Command::SetMouseShape(shape) => {
                    if let Err(e) = ansi::mouse_shape(&mut &*self.tty, shape) {
                        log_warn!("set_mouse_shape failed: {}", e);
                    }
                }
                Command::RequestFocus(widget) => {
                    *pending_focus = Some(widget);
                }
                Command::CopyToClipboard(data) => {
                    // Fails silently on terminals without OSC 52
                    if let Err(e) = ansi::copy_to_clipboard(&mut &*self.tty, &data) {
                        log_debug!("clipboard write dropped: {}", e);
                    }
                }
                Command::SetTitle(title) => {
                    if let Err(e) = ansi::set_title(&mut &*self.tty, &title) {
                        log_warn!("set_title failed: {}", e);
                    }
                }
                Command::QueueRefresh => {
                    self.screen.queue_refresh();
                }
                Command::Notify { title, body } => {
                    if let Err(e) = ansi::notify(&mut &*self.tty, title.as_deref(), &body) {
                        log_warn!("notify failed: {}", e);
                    }
                }
                Command::QueryColor(kind) => {
                    let code = match kind {
                        ColorKind::Foreground => 10,
                        ColorKind::Background => 11,
                        ColorKind::Cursor => 12,
                    };
                    if let Err(e) = ansi::query_color(&mut &*self.tty, code) {
                        log_warn!("query_color failed: {}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Size;
    use crate::widget::{widget_ref, Widget};

    struct Probe;
    impl Widget for Probe {
        fn draw(&mut self, _ctx: &DrawContext) -> Surface {
            Surface::new(Size::new(1, 1))
        }
    }

    #[test]
    fn test_insert_timer_keeps_earliest_last() {
        let mut timers = Vec::new();
        let base = Instant::now();
        let w = widget_ref(Probe);
        insert_timer(&mut timers, base + Duration::from_millis(30), w.clone());
        insert_timer(&mut timers, base + Duration::from_millis(10), w.clone());
        insert_timer(&mut timers, base + Duration::from_millis(20), w);

        let deadlines: Vec<Duration> = timers.iter().map(|t| t.deadline - base).collect();
        assert_eq!(
            deadlines,
            vec![
                Duration::from_millis(30),
                Duration::from_millis(20),
                Duration::from_millis(10),
            ]
        );
    }

    #[test]
    fn test_app_config_default() {
        assert_eq!(AppConfig::default().frame_rate, 60);
    }
}
