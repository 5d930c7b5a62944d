//! Mouse hit-testing, enter/leave transitions, and dispatch
//!
//! Events arrive between frames and refer to positions in the
//! last-painted tree, so the frame loop keeps the previous frame's
//! surface alive and hit-tests against it. Children are visited in list
//! order; z-index only affects paint order (overlap resolves by
//! write-over), which is the documented convention.

use super::MouseEvent;
use crate::layout::Point;
use crate::widget::{same_widget, EventContext, Phase, Surface, WidgetEvent, WidgetRef};

/// One entry of a hit list: a widget and the hit position in its local
/// coordinates
pub struct Hit {
    /// The widget containing the point
    pub widget: WidgetRef,
    /// The point, local to that widget's surface
    pub local: Point,
}

/// Collect the ordered hit list for a point (root first, deepest last)
pub fn hit_test(surface: &Surface, point: Point) -> Vec<Hit> {
    let mut hits = Vec::new();
    hit_test_inner(surface, point, &mut hits);
    hits
}

fn hit_test_inner(surface: &Surface, point: Point, hits: &mut Vec<Hit>) {
    if !surface.contains_point(point) {
        return;
    }
    if let Some(widget) = &surface.widget {
        hits.push(Hit {
            widget: widget.clone(),
            local: point,
        });
    }
    for child in &surface.children {
        let local = Point::new(point.col - child.origin.col, point.row - child.origin.row);
        hit_test_inner(&child.surface, local, hits);
    }
}

/// Hover state and mouse event dispatch
#[derive(Default)]
pub struct MouseHandler {
    /// Widgets under the pointer after the last dispatch
    hover: Vec<WidgetRef>,
}

impl MouseHandler {
    /// A handler with an empty hover set
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a mouse event against a surface tree
    ///
    /// Emits enter/leave transitions for the hover diff, then routes the
    /// event capture → target → bubble along the hit list with
    /// widget-local coordinates.
    pub fn handle(&mut self, ctx: &mut EventContext, surface: &Surface, mouse: MouseEvent) {
        let point = Point::new(mouse.col as i32, mouse.row as i32);
        let hits = hit_test(surface, point);
        self.transition(ctx, &hits);

        let Some((target, ancestors)) = hits.split_last() else {
            self.hover = Vec::new();
            return;
        };

        ctx.phase = Phase::Capture;
        for hit in ancestors {
            let event = WidgetEvent::Mouse(localize(mouse, hit.local));
            hit.widget.borrow_mut().capture_event(ctx, &event);
            if ctx.is_consumed() {
                self.store_hover(&hits);
                return;
            }
        }

        ctx.phase = Phase::Target;
        let event = WidgetEvent::Mouse(localize(mouse, target.local));
        target.widget.borrow_mut().handle_event(ctx, &event);
        if ctx.is_consumed() {
            self.store_hover(&hits);
            return;
        }

        ctx.phase = Phase::Bubble;
        for hit in ancestors.iter().rev() {
            let event = WidgetEvent::Mouse(localize(mouse, hit.local));
            hit.widget.borrow_mut().handle_event(ctx, &event);
            if ctx.is_consumed() {
                break;
            }
        }
        self.store_hover(&hits);
    }

    /// Recompute hover against a new tree without dispatching an event
    ///
    /// Run after each redraw so widgets that moved out from under (or
    /// under) the pointer get their leave/enter transitions.
    pub fn update_hover(&mut self, ctx: &mut EventContext, surface: &Surface, point: Point) {
        let hits = hit_test(surface, point);
        self.transition(ctx, &hits);
        self.store_hover(&hits);
    }

    /// Forget the hover set (pointer left the terminal)
    pub fn clear_hover(&mut self, ctx: &mut EventContext) {
        ctx.phase = Phase::Target;
        for widget in self.hover.drain(..) {
            widget.borrow_mut().handle_event(ctx, &WidgetEvent::MouseLeave);
        }
    }

    /// Deliver `mouse_leave` to A∖B and `mouse_enter` to B∖A
    fn transition(&mut self, ctx: &mut EventContext, hits: &[Hit]) {
        ctx.phase = Phase::Target;
        for old in &self.hover {
            if !hits.iter().any(|hit| same_widget(&hit.widget, old)) {
                old.borrow_mut().handle_event(ctx, &WidgetEvent::MouseLeave);
            }
        }
        for hit in hits {
            if !self.hover.iter().any(|old| same_widget(old, &hit.widget)) {
                hit.widget
                    .borrow_mut()
                    .handle_event(ctx, &WidgetEvent::MouseEnter);
            }
        }
    }

    fn store_hover(&mut self, hits: &[Hit]) {
        self.hover = hits.iter().map(|hit| hit.widget.clone()).collect();
    }
}

fn localize(mut mouse: MouseEvent, local: Point) -> MouseEvent {
    mouse.col = local.col.max(0) as u16;
    mouse.row = local.row.max(0) as u16;
    mouse
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Modifiers, MouseButton, MouseEventKind};
    use crate::layout::Size;
    use crate::widget::{widget_ref, DrawContext, Widget};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Widget for Recorder {
        fn draw(&mut self, _ctx: &DrawContext) -> Surface {
            Surface::new(Size::new(1, 1))
        }

        fn handle_event(&mut self, _ctx: &mut EventContext, event: &WidgetEvent) {
            let entry = match event {
                WidgetEvent::Mouse(m) => format!("{}:mouse@{},{}", self.name, m.col, m.row),
                WidgetEvent::MouseEnter => format!("{}:enter", self.name),
                WidgetEvent::MouseLeave => format!("{}:leave", self.name),
                _ => format!("{}:other", self.name),
            };
            self.log.borrow_mut().push(entry);
        }
    }

    fn press(col: u16, row: u16) -> MouseEvent {
        MouseEvent {
            col,
            row,
            pixel_x: 0,
            pixel_y: 0,
            button: MouseButton::Left,
            modifiers: Modifiers::empty(),
            kind: MouseEventKind::Press,
        }
    }

    /// root (10x4) with button at (2,1)..(8,3)
    fn tree(log: &Rc<RefCell<Vec<String>>>) -> (Surface, WidgetRef, WidgetRef) {
        let root_w = widget_ref(Recorder {
            name: "root",
            log: Rc::clone(log),
        });
        let button_w = widget_ref(Recorder {
            name: "button",
            log: Rc::clone(log),
        });

        let mut button = Surface::new(Size::new(6, 2));
        button.widget = Some(button_w.clone());
        let mut root = Surface::transparent(Size::new(10, 4));
        root.widget = Some(root_w.clone());
        root.add_child(Point::new(2, 1), 0, button);
        (root, root_w, button_w)
    }

    #[test]
    fn test_hit_list_root_first_deepest_last() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (root, root_w, button_w) = tree(&log);
        let hits = hit_test(&root, Point::new(3, 2));
        assert_eq!(hits.len(), 2);
        assert!(same_widget(&hits[0].widget, &root_w));
        assert!(same_widget(&hits[1].widget, &button_w));
        // Local coordinates are parent-relative at each level
        assert_eq!(hits[0].local, Point::new(3, 2));
        assert_eq!(hits[1].local, Point::new(1, 1));
    }

    #[test]
    fn test_hit_outside_child_misses_it() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (root, _, _) = tree(&log);
        let hits = hit_test(&root, Point::new(0, 0));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_hit_outside_root_is_empty() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (root, _, _) = tree(&log);
        assert!(hit_test(&root, Point::new(20, 2)).is_empty());
    }

    #[test]
    fn test_dispatch_localizes_coordinates() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (root, _, _) = tree(&log);
        let mut handler = MouseHandler::new();
        let mut ctx = EventContext::new();
        handler.handle(&mut ctx, &root, press(3, 2));
        let entries = log.borrow();
        // Enter transitions first, then target (button) and bubble (root)
        assert_eq!(
            *entries,
            vec![
                "root:enter",
                "button:enter",
                "button:mouse@1,1",
                "root:mouse@3,2",
            ]
        );
    }

    #[test]
    fn test_enter_leave_symmetric_difference() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (root, _, _) = tree(&log);
        let mut handler = MouseHandler::new();

        let mut ctx = EventContext::new();
        handler.handle(&mut ctx, &root, press(3, 2));
        log.borrow_mut().clear();

        // Move off the button but stay inside root: button leaves, root
        // neither enters nor leaves
        let mut ctx = EventContext::new();
        handler.handle(&mut ctx, &root, press(0, 0));
        assert_eq!(*log.borrow(), vec!["button:leave", "root:mouse@0,0"]);
    }

    #[test]
    fn test_update_hover_emits_transitions_only() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (root, _, _) = tree(&log);
        let mut handler = MouseHandler::new();
        let mut ctx = EventContext::new();
        handler.update_hover(&mut ctx, &root, Point::new(3, 2));
        assert_eq!(*log.borrow(), vec!["root:enter", "button:enter"]);

        // A new tree without the button under the same point
        log.borrow_mut().clear();
        let empty_root = {
            let mut s = Surface::transparent(Size::new(10, 4));
            s.widget = root.widget.clone();
            s
        };
        let mut ctx = EventContext::new();
        handler.update_hover(&mut ctx, &empty_root, Point::new(3, 2));
        assert_eq!(*log.borrow(), vec!["button:leave"]);
    }

    #[test]
    fn test_clear_hover_delivers_leave_to_all() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (root, _, _) = tree(&log);
        let mut handler = MouseHandler::new();
        let mut ctx = EventContext::new();
        handler.handle(&mut ctx, &root, press(3, 2));
        log.borrow_mut().clear();

        let mut ctx = EventContext::new();
        handler.clear_hover(&mut ctx);
        let entries = log.borrow();
        assert!(entries.contains(&"root:leave".to_string()));
        assert!(entries.contains(&"button:leave".to_string()));
    }
}
