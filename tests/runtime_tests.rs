//! End-to-end runtime flows: typing into a focused field, resize, and
//! mouse-driven clicks, exercised through the same handler/render path
//! the frame loop uses.

use weft::caps::Capabilities;
use weft::event::{FocusHandler, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind, MouseHandler};
use weft::layout::{Point, Rect, Size};
use weft::render;
use weft::screen::Screen;
use weft::text::WidthMethod;
use weft::widget::{
    draw_widget, widget_ref, Button, DrawContext, EventContext, Surface, TextField, Widget,
    WidgetEvent, WidgetRef,
};

use std::cell::Cell as StdCell;
use std::rc::Rc;

fn draw_and_render(
    root: &WidgetRef,
    screen: &mut Screen,
    focus: &mut FocusHandler,
    caps: &Capabilities,
) -> (Surface, String) {
    let ctx = DrawContext::root(screen.size(), screen.cell_pixel_size(), screen.width_method());
    let surface = draw_widget(root, &ctx);
    focus.rebuild(&surface);

    screen.clear();
    let clip = Rect::new(0, 0, screen.cols(), screen.rows());
    surface.render_into(screen, Point::new(0, 0), clip);

    if let Some((origin, hint)) = focus
        .focused()
        .and_then(|focused| surface.find_cursor(focused))
    {
        screen.show_cursor((origin.col + hint.col as i32) as u16, (origin.row + hint.row as i32) as u16);
    } else {
        screen.hide_cursor();
    }

    let mut out = Vec::new();
    render::render(screen, &mut out, caps).expect("render");
    (surface, String::from_utf8(out).expect("utf8 frame"))
}

#[test]
fn test_keypress_on_focused_field_renders_minimal_diff() {
    let field = widget_ref(TextField::with_text("He"));
    let mut screen = Screen::new(WidthMethod::Wcwidth);
    screen.resize(80, 24, 0, 0);
    let mut focus = FocusHandler::new();
    let caps = Capabilities::default();

    // First frame: the field paints "He", cursor at column 2
    let (_surface, first) = draw_and_render(&field, &mut screen, &mut focus, &caps);
    assert!(first.contains("He"));

    // Press 'a' through the focus router
    let mut ctx = EventContext::new();
    let key = KeyEvent {
        codepoint: 'a' as u32,
        text: Some("a".into()),
        ..Default::default()
    };
    focus.route_event(&mut ctx, &WidgetEvent::Key(key));
    assert!(ctx.wants_redraw());

    // Second frame: the diff touches the new cell, not the unchanged ones
    let (_surface, second) = draw_and_render(&field, &mut screen, &mut focus, &caps);
    assert_eq!(second.matches('a').count(), 1, "one cell written: {:?}", second);
    assert!(!second.contains('e'), "unchanged cells re-emitted: {:?}", second);
    // The written cell sits at column 2, the cursor lands on column 3
    assert!(second.contains("\x1b[1;3H"));
    assert!(second.contains("\x1b[1;4H"));
    assert!(second.contains("\x1b[?25h"));
}

#[test]
fn test_field_state_after_keypress() {
    let mut field = TextField::with_text("He");
    let mut ctx = EventContext::new();
    let key = KeyEvent {
        codepoint: 'a' as u32,
        text: Some("a".into()),
        ..Default::default()
    };
    field.handle_event(&mut ctx, &WidgetEvent::Key(key));
    assert_eq!(field.text(), "Hea");
    assert_eq!(field.buffer.cursor(), 3);
    assert!(ctx.wants_redraw());
}

#[test]
fn test_resize_relayouts_with_new_bounds() {
    let field = widget_ref(TextField::new());
    let mut screen = Screen::new(WidthMethod::Wcwidth);
    screen.resize(80, 24, 0, 0);

    // The winsize event path: resize, then the next frame's root context
    // carries the new bounds
    screen.resize(40, 12, 0, 0);
    assert!(screen.is_dirty());
    let ctx = DrawContext::root(screen.size(), screen.cell_pixel_size(), screen.width_method());
    assert_eq!(ctx.max.width, Some(40));
    assert_eq!(ctx.max.height, Some(12));

    let surface = draw_widget(&field, &ctx);
    assert_eq!(surface.size.width, 40);
}

#[test]
fn test_button_click_through_hit_test() {
    let clicks = Rc::new(StdCell::new(0u32));
    let counter = Rc::clone(&clicks);
    let button = widget_ref(Button::new("OK", move |ctx| {
        counter.set(counter.get() + 1);
        ctx.consume_event();
    }));

    // Button surface spans (0,0)-(10,3) inside the root
    let mut root = Surface::transparent(Size::new(20, 10));
    let ctx = DrawContext {
        min: Size::new(10, 3),
        max: weft::layout::MaxSize::bounded(10, 3),
        cell_size: Size::new(0, 0),
        width_method: WidthMethod::Wcwidth,
    };
    root.add_child(Point::new(0, 0), 0, draw_widget(&button, &ctx));

    let mut mouse = MouseHandler::new();
    let press = MouseEvent {
        col: 2,
        row: 2,
        pixel_x: 0,
        pixel_y: 0,
        button: MouseButton::Left,
        modifiers: Modifiers::empty(),
        kind: MouseEventKind::Press,
    };

    let mut ectx = EventContext::new();
    mouse.handle(&mut ectx, &root, press);
    // Press alone arms the button without firing
    assert_eq!(clicks.get(), 0);

    let release = MouseEvent {
        kind: MouseEventKind::Release,
        ..press
    };
    let mut ectx = EventContext::new();
    mouse.handle(&mut ectx, &root, release);
    assert_eq!(clicks.get(), 1);
    assert!(ectx.is_consumed());
}

#[test]
fn test_mouse_outside_button_does_not_click() {
    let clicks = Rc::new(StdCell::new(0u32));
    let counter = Rc::clone(&clicks);
    let button = widget_ref(Button::new("OK", move |_| {
        counter.set(counter.get() + 1);
    }));

    let mut root = Surface::transparent(Size::new(20, 10));
    let ctx = DrawContext::root(Size::new(10, 3), Size::new(0, 0), WidthMethod::Wcwidth);
    root.add_child(Point::new(0, 0), 0, draw_widget(&button, &ctx));

    let mut mouse = MouseHandler::new();
    let far_press = MouseEvent {
        col: 15,
        row: 8,
        pixel_x: 0,
        pixel_y: 0,
        button: MouseButton::Left,
        modifiers: Modifiers::empty(),
        kind: MouseEventKind::Press,
    };
    let mut ectx = EventContext::new();
    mouse.handle(&mut ectx, &root, far_press);
    let far_release = MouseEvent {
        kind: MouseEventKind::Release,
        ..far_press
    };
    let mut ectx = EventContext::new();
    mouse.handle(&mut ectx, &root, far_release);
    assert_eq!(clicks.get(), 0);
}

#[test]
fn test_focus_fallback_after_tree_change() {
    let stable = widget_ref(TextField::new());
    let transient = widget_ref(TextField::new());

    let ctx = DrawContext::root(Size::new(20, 5), Size::new(0, 0), WidthMethod::Wcwidth);
    let mut root = Surface::transparent(Size::new(20, 5));
    root.widget = Some(stable.clone());
    root.add_child(Point::new(0, 0), 0, draw_widget(&transient, &ctx));

    let mut focus = FocusHandler::new();
    let mut ectx = EventContext::new();
    focus.focus_widget(&mut ectx, transient.clone(), Some(&root));
    assert_eq!(focus.path().len(), 2);

    // Next frame: the transient widget is gone; focus falls back to root
    let mut new_root = Surface::transparent(Size::new(20, 5));
    new_root.widget = Some(stable.clone());
    focus.rebuild(&new_root);
    assert!(weft::widget::same_widget(focus.focused().unwrap(), &stable));
}
