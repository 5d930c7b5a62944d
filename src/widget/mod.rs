//! The widget runtime: trait, contexts, commands, built-in widgets
//!
//! Widgets are immediate-mode: every frame the loop calls `draw` on the
//! root and gets back a fresh [`Surface`] tree. Event handlers are
//! optional capabilities with default no-ops; identity is the shared
//! handle itself, so the same widget found in two consecutive trees
//! compares equal.

pub mod button;
pub mod flex;
pub mod list_view;
pub mod spinner;
pub mod surface;
pub mod text;
pub mod text_field;

pub use button::Button;
pub use flex::{FlexColumn, FlexItem, FlexRow};
pub use list_view::ListView;
pub use spinner::Spinner;
pub use surface::{CursorHint, SubSurface, Surface};
pub use text::{Text, WidthBasis};
pub use text_field::TextField;

use crate::cell::MouseShape;
use crate::event::{ColorKind, KeyEvent, MouseEvent};
use crate::layout::{MaxSize, Size};
use crate::text::{self as text_engine, WidthMethod};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// A shared, mutable handle to a widget
///
/// The handle doubles as the widget's identity: surfaces, the focus path,
/// and hit lists all hold clones of it.
pub type WidgetRef = Rc<RefCell<dyn Widget>>;

/// Wrap a widget into a shared handle
pub fn widget_ref<W: Widget + 'static>(widget: W) -> WidgetRef {
    Rc::new(RefCell::new(widget))
}

/// Whether two handles refer to the same widget
///
/// Compares the data pointer only; vtable pointers are not stable across
/// codegen units.
pub fn same_widget(a: &WidgetRef, b: &WidgetRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const u8, Rc::as_ptr(b) as *const u8)
}

/// Layout constraints and measurement state handed to `draw`
#[derive(Debug, Clone, Copy)]
pub struct DrawContext {
    /// Minimum size the returned surface must have
    pub min: Size,
    /// Maximum size; unbounded axes are `None`
    pub max: MaxSize,
    /// One cell's size in pixels (zero when unreported)
    pub cell_size: Size,
    /// The process-wide width-measurement method
    pub width_method: WidthMethod,
}

impl DrawContext {
    /// A root context for a given screen size
    pub fn root(size: Size, cell_size: Size, width_method: WidthMethod) -> Self {
        Self {
            min: Size::new(0, 0),
            max: MaxSize::from_size(size),
            cell_size,
            width_method,
        }
    }

    /// Derive a context for a child with new constraints
    pub fn with_constraints(&self, min: Size, max: MaxSize) -> Self {
        Self {
            min,
            max,
            ..*self
        }
    }

    /// Display width of a single grapheme under the active method
    pub fn grapheme_width(&self, grapheme: &str) -> u8 {
        text_engine::grapheme_width(grapheme, self.width_method)
    }

    /// Display width of a string under the active method
    pub fn string_width(&self, s: &str) -> usize {
        text_engine::string_width(s, self.width_method)
    }
}

/// The event-routing phase a handler is being called in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Root-to-target descent, `capture_event` handlers
    Capture,
    /// The deepest widget on the path
    Target,
    /// Target-to-root ascent, `handle_event` handlers
    Bubble,
}

/// An event as delivered to a widget
///
/// Mouse coordinates are local to the receiving widget's surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The application is starting; delivered before the first frame
    Init,
    /// A key was pressed
    Key(KeyEvent),
    /// A key was released
    KeyRelease(KeyEvent),
    /// A mouse event inside this widget
    Mouse(MouseEvent),
    /// The pointer entered this widget
    MouseEnter,
    /// The pointer left this widget
    MouseLeave,
    /// This widget gained focus
    FocusIn,
    /// This widget lost focus
    FocusOut,
    /// A bracketed paste began
    PasteStart,
    /// The bracketed paste ended
    PasteEnd,
    /// A timer this widget scheduled fired
    Tick,
    /// An application-defined event
    User(u64),
}

/// Commands a widget may issue while handling an event
///
/// The frame loop is the sole executor; the set is closed.
pub enum Command {
    /// Deliver a `Tick` to `widget` at (or after) `deadline`
    Tick {
        /// When the tick is due
        deadline: Instant,
        /// The widget to tick
        widget: WidgetRef,
    },
    /// Change the mouse pointer shape
    SetMouseShape(MouseShape),
    /// Move focus to a widget
    RequestFocus(WidgetRef),
    /// Copy bytes to the system clipboard (silently dropped without OSC 52)
    CopyToClipboard(Vec<u8>),
    /// Set the terminal window title
    SetTitle(String),
    /// Force a full re-emit on the next render
    QueueRefresh,
    /// Post a desktop notification
    Notify {
        /// Optional notification title
        title: Option<String>,
        /// Notification body
        body: String,
    },
    /// Ask the terminal for one of its colors
    QueryColor(ColorKind),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Tick { deadline, .. } => {
                f.debug_struct("Tick").field("deadline", deadline).finish()
            }
            Command::SetMouseShape(shape) => f.debug_tuple("SetMouseShape").field(shape).finish(),
            Command::RequestFocus(_) => f.write_str("RequestFocus(..)"),
            Command::CopyToClipboard(data) => {
                f.debug_tuple("CopyToClipboard").field(&data.len()).finish()
            }
            Command::SetTitle(title) => f.debug_tuple("SetTitle").field(title).finish(),
            Command::QueueRefresh => f.write_str("QueueRefresh"),
            Command::Notify { title, body } => f
                .debug_struct("Notify")
                .field("title", title)
                .field("body", body)
                .finish(),
            Command::QueryColor(kind) => f.debug_tuple("QueryColor").field(kind).finish(),
        }
    }
}

/// Mutable per-event state widgets interact with
#[derive(Debug)]
pub struct EventContext {
    /// The phase the current handler runs in
    pub phase: Phase,
    consume: bool,
    redraw: bool,
    quit: bool,
    commands: Vec<Command>,
}

impl EventContext {
    /// A fresh context for one event
    pub fn new() -> Self {
        Self {
            phase: Phase::Target,
            consume: false,
            redraw: false,
            quit: false,
            commands: Vec::new(),
        }
    }

    /// Stop propagation after the current handler
    pub fn consume_event(&mut self) {
        self.consume = true;
    }

    /// Whether propagation was stopped
    pub fn is_consumed(&self) -> bool {
        self.consume
    }

    /// Request a redraw this frame
    pub fn redraw(&mut self) {
        self.redraw = true;
    }

    /// Whether a redraw was requested
    pub fn wants_redraw(&self) -> bool {
        self.redraw
    }

    /// Ask the frame loop to exit
    pub fn quit(&mut self) {
        self.quit = true;
    }

    /// Whether an exit was requested
    pub fn wants_quit(&self) -> bool {
        self.quit
    }

    /// Schedule a `Tick` for `widget`
    pub fn tick(&mut self, deadline: Instant, widget: WidgetRef) {
        self.commands.push(Command::Tick { deadline, widget });
    }

    /// Change the mouse pointer shape
    pub fn set_mouse_shape(&mut self, shape: MouseShape) {
        self.commands.push(Command::SetMouseShape(shape));
    }

    /// Move focus to `widget`
    pub fn request_focus(&mut self, widget: WidgetRef) {
        self.commands.push(Command::RequestFocus(widget));
    }

    /// Copy bytes to the clipboard
    pub fn copy_to_clipboard(&mut self, data: Vec<u8>) {
        self.commands.push(Command::CopyToClipboard(data));
    }

    /// Set the terminal title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    /// Force a full re-emit next frame
    pub fn queue_refresh(&mut self) {
        self.commands.push(Command::QueueRefresh);
    }

    /// Post a desktop notification
    pub fn notify(&mut self, title: Option<String>, body: impl Into<String>) {
        self.commands.push(Command::Notify {
            title,
            body: body.into(),
        });
    }

    /// Query a terminal color
    pub fn query_color(&mut self, kind: ColorKind) {
        self.commands.push(Command::QueryColor(kind));
    }

    /// Drain the buffered commands (frame loop only)
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Reset the per-event flags, keeping accumulated redraw/quit requests
    /// out of the next event's way
    pub fn reset_for_event(&mut self) {
        self.consume = false;
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self::new()
    }
}

/// An immediate-mode widget
///
/// `draw` is mandatory; the event handlers are optional capabilities and
/// default to no-ops.
pub trait Widget {
    /// Produce this widget's surface for the current frame
    fn draw(&mut self, ctx: &DrawContext) -> Surface;

    /// Handle an event in the target or bubble phase
    fn handle_event(&mut self, ctx: &mut EventContext, event: &WidgetEvent) {
        let _ = (ctx, event);
    }

    /// Observe an event on the way down (capture phase)
    fn capture_event(&mut self, ctx: &mut EventContext, event: &WidgetEvent) {
        let _ = (ctx, event);
    }
}

/// Draw a widget through its handle, stamping the handle on the returned
/// surface so hit-testing and focus can find it
pub fn draw_widget(widget: &WidgetRef, ctx: &DrawContext) -> Surface {
    let mut surface = widget.borrow_mut().draw(ctx);
    surface.widget = Some(widget.clone());
    surface
}
