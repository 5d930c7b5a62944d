//! The double-buffered cell grid
//!
//! Widgets render into the back buffer; [`crate::render`] diffs it against
//! the front buffer (what the terminal currently shows) and emits the
//! minimal escape stream. Both grids always hold exactly `cols × rows`
//! cells.

use crate::cell::{Cell, CursorShape};
use crate::image::{Image, Placement, Scale};
use crate::layout::Size;
use crate::text::WidthMethod;

/// Cursor position and visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    /// Cursor column
    pub col: u16,
    /// Cursor row
    pub row: u16,
    /// Whether the cursor is shown
    pub visible: bool,
}

/// The terminal cell grids and per-frame render state
#[derive(Debug)]
pub struct Screen {
    pub(crate) back: Vec<Cell>,
    pub(crate) front: Vec<Cell>,
    cols: u16,
    rows: u16,
    pixel_width: u16,
    pixel_height: u16,
    pub(crate) cursor: CursorState,
    pub(crate) cursor_shape: CursorShape,
    pub(crate) placements: Vec<Placement>,
    /// Placements currently known to the terminal
    pub(crate) front_placements: Vec<Placement>,
    pub(crate) dirty: bool,
    /// When set, the next render clears the front buffer first
    pub(crate) refresh: bool,
    width_method: WidthMethod,
}

impl Screen {
    /// Create an empty screen; the first `resize` allocates the grids
    pub fn new(width_method: WidthMethod) -> Self {
        Self {
            back: Vec::new(),
            front: Vec::new(),
            cols: 0,
            rows: 0,
            pixel_width: 0,
            pixel_height: 0,
            cursor: CursorState::default(),
            cursor_shape: CursorShape::default(),
            placements: Vec::new(),
            front_placements: Vec::new(),
            dirty: false,
            refresh: false,
            width_method,
        }
    }

    /// Grid width in columns
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Grid height in rows
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Grid size
    pub fn size(&self) -> Size {
        Size::new(self.cols, self.rows)
    }

    /// The active width-measurement method
    pub fn width_method(&self) -> WidthMethod {
        self.width_method
    }

    /// Replace the width-measurement method (capability reply received)
    pub fn set_width_method(&mut self, method: WidthMethod) {
        self.width_method = method;
    }

    /// Size of one cell in pixels, zero when the terminal did not report
    /// pixel dimensions
    pub fn cell_pixel_size(&self) -> Size {
        if self.cols == 0 || self.rows == 0 {
            return Size::default();
        }
        Size::new(self.pixel_width / self.cols, self.pixel_height / self.rows)
    }

    /// Whether anything was written since the last render
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force the next render to re-emit every non-default cell
    pub fn queue_refresh(&mut self) {
        self.refresh = true;
        self.dirty = true;
    }

    /// Reallocate both grids for a new terminal size
    ///
    /// Previous contents are discarded and the screen is marked dirty.
    pub fn resize(&mut self, cols: u16, rows: u16, pixel_width: u16, pixel_height: u16) {
        let len = (cols as usize) * (rows as usize);
        self.back = vec![Cell::default(); len];
        self.front = vec![Cell::default(); len];
        self.cols = cols;
        self.rows = rows;
        self.pixel_width = pixel_width;
        self.pixel_height = pixel_height;
        self.dirty = true;
        // The terminal clears on resize; what it shows no longer matches the
        // old front buffer either way
        self.refresh = true;
    }

    #[inline]
    fn index(&self, col: u16, row: u16) -> Option<usize> {
        if col < self.cols && row < self.rows {
            Some((row as usize) * (self.cols as usize) + (col as usize))
        } else {
            None
        }
    }

    /// Write a cell into the back buffer
    ///
    /// Out-of-range writes are no-ops. A width-2 cell writes a zero-width
    /// companion at `col + 1`; if the companion would fall past the right
    /// edge the write is clipped entirely.
    pub fn write_cell(&mut self, col: u16, row: u16, cell: Cell) {
        let wide = cell.width == 2;
        if wide && col.checked_add(1).map_or(true, |c| c >= self.cols) {
            return;
        }
        let Some(idx) = self.index(col, row) else {
            return;
        };
        self.back[idx] = cell;
        self.dirty = true;
        if wide {
            // Companion always exists here; the guard above clipped the
            // edge case
            let companion = idx + 1;
            self.back[companion] = Cell::continuation();
        }
    }

    /// Write a cell, wrapping to the start of the next row when it would
    /// cross the right edge
    pub fn write_cell_wrapping(&mut self, col: u16, row: u16, cell: Cell) {
        let width = cell.width.max(1) as u16;
        if col.saturating_add(width) > self.cols && row.saturating_add(1) < self.rows {
            let mut cell = cell;
            cell.wrapped = true;
            self.write_cell(0, row + 1, cell);
        } else {
            self.write_cell(col, row, cell);
        }
    }

    /// Read a cell from the back buffer
    pub fn read_cell(&self, col: u16, row: u16) -> Option<&Cell> {
        self.index(col, row).map(|idx| &self.back[idx])
    }

    /// Clear the back buffer to default cells
    pub fn clear(&mut self) {
        self.back.fill(Cell::default());
        self.dirty = true;
    }

    /// Show the cursor at a position
    pub fn show_cursor(&mut self, col: u16, row: u16) {
        self.cursor = CursorState {
            col,
            row,
            visible: true,
        };
    }

    /// Hide the cursor
    pub fn hide_cursor(&mut self) {
        self.cursor.visible = false;
    }

    /// Current cursor state
    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    /// Set the cursor shape
    pub fn set_cursor_shape(&mut self, shape: CursorShape) {
        self.cursor_shape = shape;
    }

    /// Insert an image placement
    ///
    /// Placements are kept ordered by z-index; the renderer emits them
    /// after the text diff.
    pub fn insert_image_placement(&mut self, image: Image, col: u16, row: u16, z: i32, scale: Scale) {
        let placement = Placement {
            image,
            col,
            row,
            z,
            scale,
        };
        let at = self
            .placements
            .partition_point(|existing| existing.z <= placement.z);
        self.placements.insert(at, placement);
        self.dirty = true;
    }

    /// Drop all image placements
    pub fn clear_image_placements(&mut self) {
        if !self.placements.is_empty() {
            self.dirty = true;
        }
        self.placements.clear();
    }
}
