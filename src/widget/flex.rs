//! Flex layout containers
//!
//! Children are measured at their inherent size first; the remaining main
//! axis space is then divided among the flexible children in proportion
//! to their flex factors, with the trailing flexible child absorbing the
//! integer-division remainder.

use super::{draw_widget, DrawContext, Surface, Widget, WidgetRef};
use crate::layout::{MaxSize, Point, Size};

/// A child of a flex container
pub struct FlexItem {
    /// The child widget
    pub widget: WidgetRef,
    /// Flex factor; zero keeps the inherent size
    pub flex: u8,
}

/// Lays out children horizontally
#[derive(Default)]
pub struct FlexRow {
    children: Vec<FlexItem>,
}

impl FlexRow {
    /// An empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child with a flex factor
    pub fn child(mut self, widget: WidgetRef, flex: u8) -> Self {
        self.children.push(FlexItem { widget, flex });
        self
    }

    /// Append a child at runtime
    pub fn push(&mut self, widget: WidgetRef, flex: u8) {
        self.children.push(FlexItem { widget, flex });
    }
}

impl Widget for FlexRow {
    fn draw(&mut self, ctx: &DrawContext) -> Surface {
        if self.children.is_empty() {
            return Surface::transparent(Size::new(0, 0));
        }

        // Inherent-size pass
        let measure = ctx.with_constraints(Size::new(0, 0), ctx.max);
        let mut surfaces: Vec<Surface> = self
            .children
            .iter()
            .map(|item| draw_widget(&item.widget, &measure))
            .collect();

        let fixed_width: u16 = self
            .children
            .iter()
            .zip(&surfaces)
            .filter(|(item, _)| item.flex == 0)
            .map(|(_, s)| s.size.width)
            .sum();
        let total_flex: u32 = self.children.iter().map(|item| item.flex as u32).sum();

        let container_width = ctx
            .max
            .width
            .unwrap_or_else(|| surfaces.iter().map(|s| s.size.width).sum());

        // Distribution pass: flexible children get exact widths
        if total_flex > 0 {
            let remaining = container_width.saturating_sub(fixed_width);
            let last_flex = self
                .children
                .iter()
                .rposition(|item| item.flex > 0)
                .unwrap_or(0);
            let mut distributed: u16 = 0;
            for (i, item) in self.children.iter().enumerate() {
                if item.flex == 0 {
                    continue;
                }
                let alloc = if i == last_flex {
                    remaining.saturating_sub(distributed)
                } else {
                    (remaining as u32 * item.flex as u32 / total_flex) as u16
                };
                distributed += alloc;
                let child_ctx = ctx.with_constraints(
                    Size::new(alloc, 0),
                    MaxSize {
                        width: Some(alloc),
                        height: ctx.max.height,
                    },
                );
                surfaces[i] = draw_widget(&item.widget, &child_ctx);
            }
        }

        let height = surfaces
            .iter()
            .map(|s| s.size.height)
            .max()
            .unwrap_or(0)
            .max(ctx.min.height);

        let mut row = Surface::transparent(Size::new(container_width, height));
        let mut col: i32 = 0;
        for surface in surfaces {
            let width = surface.size.width;
            row.add_child(Point::new(col, 0), 0, surface);
            col += width as i32;
        }
        row
    }
}

/// Lays out children vertically
#[derive(Default)]
pub struct FlexColumn {
    children: Vec<FlexItem>,
}

impl FlexColumn {
    /// An empty column
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child with a flex factor
    pub fn child(mut self, widget: WidgetRef, flex: u8) -> Self {
        self.children.push(FlexItem { widget, flex });
        self
    }

    /// Append a child at runtime
    pub fn push(&mut self, widget: WidgetRef, flex: u8) {
        self.children.push(FlexItem { widget, flex });
    }
}

impl Widget for FlexColumn {
    fn draw(&mut self, ctx: &DrawContext) -> Surface {
        if self.children.is_empty() {
            return Surface::transparent(Size::new(0, 0));
        }

        let measure = ctx.with_constraints(Size::new(0, 0), ctx.max);
        let mut surfaces: Vec<Surface> = self
            .children
            .iter()
            .map(|item| draw_widget(&item.widget, &measure))
            .collect();

        let fixed_height: u16 = self
            .children
            .iter()
            .zip(&surfaces)
            .filter(|(item, _)| item.flex == 0)
            .map(|(_, s)| s.size.height)
            .sum();
        let total_flex: u32 = self.children.iter().map(|item| item.flex as u32).sum();

        let container_height = ctx
            .max
            .height
            .unwrap_or_else(|| surfaces.iter().map(|s| s.size.height).sum());

        if total_flex > 0 {
            let remaining = container_height.saturating_sub(fixed_height);
            let last_flex = self
                .children
                .iter()
                .rposition(|item| item.flex > 0)
                .unwrap_or(0);
            let mut distributed: u16 = 0;
            for (i, item) in self.children.iter().enumerate() {
                if item.flex == 0 {
                    continue;
                }
                let alloc = if i == last_flex {
                    remaining.saturating_sub(distributed)
                } else {
                    (remaining as u32 * item.flex as u32 / total_flex) as u16
                };
                distributed += alloc;
                let child_ctx = ctx.with_constraints(
                    Size::new(0, alloc),
                    MaxSize {
                        width: ctx.max.width,
                        height: Some(alloc),
                    },
                );
                surfaces[i] = draw_widget(&item.widget, &child_ctx);
            }
        }

        let width = surfaces
            .iter()
            .map(|s| s.size.width)
            .max()
            .unwrap_or(0)
            .max(ctx.min.width);

        let mut column = Surface::transparent(Size::new(width, container_height));
        let mut row: i32 = 0;
        for surface in surfaces {
            let height = surface.size.height;
            column.add_child(Point::new(0, row), 0, surface);
            row += height as i32;
        }
        column
    }
}
