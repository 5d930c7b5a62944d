//! Focus tree and three-phase event routing
//!
//! The handler keeps the path from the root widget to the focused widget,
//! rebuilt from each frame's new surface tree (no back-pointers survive a
//! frame). Events route capture (root → parent of target), target, then
//! bubble (parent of target → root); any handler may consume the event to
//! stop the walk.

use crate::widget::{same_widget, EventContext, Phase, Surface, WidgetEvent, WidgetRef};

/// Keyboard-focus state and routing
#[derive(Default)]
pub struct FocusHandler {
    /// Root-to-focused widget handles, target last
    path_to_focused: Vec<WidgetRef>,
    focused: Option<WidgetRef>,
    root: Option<WidgetRef>,
}

impl FocusHandler {
    /// An empty handler; focus lands on the root at the first rebuild
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently focused widget
    pub fn focused(&self) -> Option<&WidgetRef> {
        self.focused.as_ref()
    }

    /// The current root-to-focused path
    pub fn path(&self) -> &[WidgetRef] {
        &self.path_to_focused
    }

    /// Recompute the path from a freshly drawn surface tree
    ///
    /// A focused widget that left the tree falls back to the root.
    pub fn rebuild(&mut self, surface: &Surface) {
        self.root = surface.widget.clone();

        let path = self
            .focused
            .as_ref()
            .and_then(|target| surface.path_to(target));
        match path {
            Some(path) => self.path_to_focused = path,
            None => {
                self.focused = self.root.clone();
                self.path_to_focused = match &self.root {
                    Some(root) => vec![root.clone()],
                    None => Vec::new(),
                };
            }
        }

        debug_assert!(
            match (self.path_to_focused.last(), &self.focused) {
                (Some(last), Some(focused)) => same_widget(last, focused),
                (None, None) => true,
                _ => false,
            },
            "focus path end does not match the focused widget"
        );
    }

    /// Route an event along the focus path through all three phases
    pub fn route_event(&self, ctx: &mut EventContext, event: &WidgetEvent) {
        let Some((target, ancestors)) = self.path_to_focused.split_last() else {
            return;
        };

        ctx.phase = Phase::Capture;
        for widget in ancestors {
            widget.borrow_mut().capture_event(ctx, event);
            if ctx.is_consumed() {
                return;
            }
        }

        ctx.phase = Phase::Target;
        target.borrow_mut().handle_event(ctx, event);
        if ctx.is_consumed() {
            return;
        }

        ctx.phase = Phase::Bubble;
        for widget in ancestors.iter().rev() {
            widget.borrow_mut().handle_event(ctx, event);
            if ctx.is_consumed() {
                return;
            }
        }
    }

    /// Move focus to `target`, delivering `focus_out` then `focus_in`
    ///
    /// Requesting focus on the already-focused widget is a no-op. The path
    /// is refreshed immediately when the current surface is available.
    pub fn focus_widget(
        &mut self,
        ctx: &mut EventContext,
        target: WidgetRef,
        surface: Option<&Surface>,
    ) {
        if let Some(current) = &self.focused {
            if same_widget(current, &target) {
                return;
            }
        }

        ctx.phase = Phase::Target;
        if let Some(old) = self.focused.take() {
            old.borrow_mut().handle_event(ctx, &WidgetEvent::FocusOut);
        }
        target.borrow_mut().handle_event(ctx, &WidgetEvent::FocusIn);
        self.focused = Some(target);
        ctx.redraw();

        if let Some(surface) = surface {
            self.rebuild(surface);
        }
    }
}
