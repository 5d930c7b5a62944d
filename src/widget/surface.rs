//! Surfaces: what widgets draw into
//!
//! A widget's `draw` returns a [`Surface`]: an optional owned cell buffer
//! (empty means transparent), an ordered list of child surfaces with
//! signed origins and z-indices, and an optional cursor hint. The frame
//! loop renders the root surface into the screen's back buffer, clipping
//! children to their parents; the previous frame's tree is kept alive for
//! mouse hit-testing.

use super::{same_widget, WidgetRef};
use crate::cell::{Cell, CursorShape};
use crate::layout::{Point, Rect, Size};
use crate::screen::Screen;
use crate::style::Style;
use crate::text::{grapheme_width, WidthMethod};
use unicode_segmentation::UnicodeSegmentation;

/// Where a focused widget wants the terminal cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorHint {
    /// Column, surface-local
    pub col: u16,
    /// Row, surface-local
    pub row: u16,
    /// Requested shape
    pub shape: CursorShape,
}

/// A child surface positioned inside its parent
pub struct SubSurface {
    /// Parent-local origin; negative or out-of-bounds origins clip
    pub origin: Point,
    /// Paint order among siblings (higher paints later, on top)
    pub z_index: i32,
    /// The child surface
    pub surface: Surface,
}

/// One widget's rendered output
pub struct Surface {
    /// The surface extent
    pub size: Size,
    /// The widget this surface belongs to, for hit-testing and focus
    pub widget: Option<WidgetRef>,
    /// Cursor request, honored while this widget holds focus
    pub cursor: Option<CursorHint>,
    /// Owned cells; empty means fully transparent
    pub buffer: Vec<Cell>,
    /// Child surfaces in insertion order
    pub children: Vec<SubSurface>,
}

impl Surface {
    /// A surface with an allocated buffer of default cells
    pub fn new(size: Size) -> Self {
        Self {
            size,
            widget: None,
            cursor: None,
            buffer: vec![Cell::default(); size.area()],
            children: Vec::new(),
        }
    }

    /// A surface with no buffer of its own (container)
    pub fn transparent(size: Size) -> Self {
        Self {
            size,
            widget: None,
            cursor: None,
            buffer: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Whether this surface has no cells of its own
    pub fn is_transparent(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Write a cell; the buffer is allocated on first write to a
    /// transparent surface
    ///
    /// Out-of-range writes are no-ops; a width-2 cell that would cross the
    /// right edge is clipped.
    pub fn write_cell(&mut self, col: u16, row: u16, cell: Cell) {
        if col >= self.size.width || row >= self.size.height {
            return;
        }
        let wide = cell.width == 2;
        if wide && col + 1 >= self.size.width {
            return;
        }
        if self.buffer.is_empty() {
            self.buffer = vec![Cell::default(); self.size.area()];
        }
        let idx = (row as usize) * (self.size.width as usize) + (col as usize);
        self.buffer[idx] = cell;
        if wide {
            self.buffer[idx + 1] = Cell::continuation();
        }
    }

    /// Read a cell back (`None` when transparent or out of range)
    pub fn read_cell(&self, col: u16, row: u16) -> Option<&Cell> {
        if col >= self.size.width || row >= self.size.height || self.buffer.is_empty() {
            return None;
        }
        self.buffer
            .get((row as usize) * (self.size.width as usize) + (col as usize))
    }

    /// Write a string starting at a position, one grapheme per cell run;
    /// returns the total width written
    pub fn write_text(
        &mut self,
        col: u16,
        row: u16,
        text: &str,
        style: &Style,
        method: WidthMethod,
    ) -> u16 {
        let mut offset = 0u16;
        for grapheme in text.graphemes(true) {
            let width = grapheme_width(grapheme, method);
            if width == 0 {
                continue;
            }
            let cell = Cell::new(grapheme.to_string(), width).style(style.clone());
            self.write_cell(col + offset, row, cell);
            offset += width as u16;
            if col + offset >= self.size.width {
                break;
            }
        }
        offset
    }

    /// Append a child surface
    pub fn add_child(&mut self, origin: Point, z_index: i32, surface: Surface) {
        self.children.push(SubSurface {
            origin,
            z_index,
            surface,
        });
    }

    /// Whether a parent-local point lies inside this surface
    pub fn contains_point(&self, point: Point) -> bool {
        point.col >= 0
            && point.row >= 0
            && (point.col as u32) < self.size.width as u32
            && (point.row as u32) < self.size.height as u32
    }

    /// Path of widget handles from this surface down to `target`
    ///
    /// Only surfaces carrying a widget handle contribute path nodes.
    pub fn path_to(&self, target: &WidgetRef) -> Option<Vec<WidgetRef>> {
        let mut path = Vec::new();
        if self.collect_path(target, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn collect_path(&self, target: &WidgetRef, path: &mut Vec<WidgetRef>) -> bool {
        let popped = if let Some(widget) = &self.widget {
            path.push(widget.clone());
            if same_widget(widget, target) {
                return true;
            }
            true
        } else {
            false
        };

        for child in &self.children {
            if child.surface.collect_path(target, path) {
                return true;
            }
        }

        if popped {
            path.pop();
        }
        false
    }

    /// Absolute origin and cursor hint of `target`'s surface, if present
    pub fn find_cursor(&self, target: &WidgetRef) -> Option<(Point, CursorHint)> {
        self.find_cursor_inner(target, Point::new(0, 0))
    }

    fn find_cursor_inner(&self, target: &WidgetRef, origin: Point) -> Option<(Point, CursorHint)> {
        if let Some(widget) = &self.widget {
            if same_widget(widget, target) {
                return self.cursor.map(|hint| (origin, hint));
            }
        }
        for child in &self.children {
            let child_origin = origin.offset(child.origin);
            if let Some(found) = child.surface.find_cursor_inner(target, child_origin) {
                return Some(found);
            }
        }
        None
    }

    /// Render this surface tree into the screen's back buffer
    ///
    /// `origin` is in screen coordinates; `clip` bounds every write.
    /// Children paint in z order (stable within equal z), later writes
    /// overwriting earlier ones.
    pub fn render_into(&self, screen: &mut Screen, origin: Point, clip: Rect) {
        for row in 0..self.size.height {
            for col in 0..self.size.width {
                let Some(cell) = self.read_cell(col, row) else {
                    continue;
                };
                if cell.is_continuation() {
                    continue;
                }
                let abs_col = origin.col + col as i32;
                let abs_row = origin.row + row as i32;
                if abs_col < 0 || abs_row < 0 {
                    continue;
                }
                let (abs_col, abs_row) = (abs_col as u16, abs_row as u16);
                if !clip.contains(abs_col, abs_row) {
                    continue;
                }
                // A wide cell whose companion would fall outside the clip
                // degrades to the clipped half being dropped entirely
                if cell.width == 2 && !clip.contains(abs_col.saturating_add(1), abs_row) {
                    continue;
                }
                screen.write_cell(abs_col, abs_row, cell.clone());
            }
        }

        let child_clip = clip.intersection(clamp_rect(origin, self.size));
        let mut order: Vec<usize> = (0..self.children.len()).collect();
        order.sort_by_key(|&i| self.children[i].z_index);
        for i in order {
            let child = &self.children[i];
            child
                .surface
                .render_into(screen, origin.offset(child.origin), child_clip);
        }
    }
}

/// The screen-space rectangle a surface at `origin` covers
fn clamp_rect(origin: Point, size: Size) -> Rect {
    let x0 = origin.col.max(0);
    let y0 = origin.row.max(0);
    let x1 = (origin.col + size.width as i32).clamp(0, u16::MAX as i32);
    let y1 = (origin.row + size.height as i32).clamp(0, u16::MAX as i32);
    Rect {
        x: x0.min(u16::MAX as i32) as u16,
        y: y0.min(u16::MAX as i32) as u16,
        width: (x1 - x0.min(x1)).max(0) as u16,
        height: (y1 - y0.min(y1)).max(0) as u16,
    }
}
