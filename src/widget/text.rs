//! Soft-wrapping text widget

use super::{DrawContext, Surface, Widget};
use crate::cell::Cell;
use crate::layout::Size;
use crate::style::Style;
use crate::text::SoftwrapIterator;

/// How the surface width is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidthBasis {
    /// As wide as the longest laid-out line
    #[default]
    LongestLine,
    /// As wide as the parent allows
    Parent,
}

/// How over-long lines are handled when soft wrap is off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Cut at the last column
    #[default]
    Clip,
    /// Replace the last column with `…`
    Ellipsis,
}

/// A block of styled text
///
/// Soft wrap is on by default and breaks at whitespace; see
/// [`crate::text::SoftwrapIterator`] for the wrapping rules.
pub struct Text {
    text: String,
    style: Style,
    softwrap: bool,
    overflow: Overflow,
    width_basis: WidthBasis,
}

impl Text {
    /// Create a text widget
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default(),
            softwrap: true,
            overflow: Overflow::default(),
            width_basis: WidthBasis::default(),
        }
    }

    /// Set the style applied to every cell
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Enable or disable soft wrapping
    pub fn softwrap(mut self, softwrap: bool) -> Self {
        self.softwrap = softwrap;
        self
    }

    /// Set the non-wrapped overflow policy
    pub fn overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set the width basis
    pub fn width_basis(mut self, basis: WidthBasis) -> Self {
        self.width_basis = basis;
        self
    }

    /// Replace the text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// The current text
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Widget for Text {
    fn draw(&mut self, ctx: &DrawContext) -> Surface {
        if ctx.max.width == Some(0) || ctx.max.height == Some(0) {
            return Surface::transparent(Size::new(0, 0));
        }

        let wrap_width = if self.softwrap { ctx.max.width } else { None };

        // Pre-pass: container width is the widest laid-out line
        let mut widest = ctx.min.width;
        let mut line_count: u16 = 0;
        for line in SoftwrapIterator::new(&self.text, wrap_width, ctx.width_method) {
            widest = widest.max(line.width.min(ctx.max.width.unwrap_or(line.width)));
            line_count = line_count.saturating_add(1);
        }

        let width = match self.width_basis {
            WidthBasis::LongestLine => widest,
            WidthBasis::Parent => ctx.max.width.unwrap_or(widest).max(ctx.min.width),
        };
        let height = line_count
            .max(ctx.min.height)
            .min(ctx.max.height.unwrap_or(u16::MAX));

        let mut surface = Surface::new(Size::new(width, height));
        for (row, line) in SoftwrapIterator::new(&self.text, wrap_width, ctx.width_method)
            .take(height as usize)
            .enumerate()
        {
            let mut col: u16 = 0;
            let truncate = !self.softwrap && line.width > width;
            for cell in &line.cells {
                if truncate
                    && self.overflow == Overflow::Ellipsis
                    && col + cell.width as u16 >= width
                {
                    surface.write_cell(width - 1, row as u16, Cell::new("…", 1).style(self.style.clone()));
                    break;
                }
                if col + cell.width as u16 > width {
                    break;
                }
                surface.write_cell(
                    col,
                    row as u16,
                    Cell::new(cell.grapheme.to_string(), cell.width).style(self.style.clone()),
                );
                col += cell.width as u16;
            }
        }
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MaxSize;
    use crate::text::WidthMethod;

    fn ctx(max: MaxSize) -> DrawContext {
        DrawContext {
            min: Size::new(0, 0),
            max,
            cell_size: Size::new(0, 0),
            width_method: WidthMethod::Wcwidth,
        }
    }

    fn row_string(surface: &Surface, row: u16) -> String {
        let mut out = String::new();
        for col in 0..surface.size.width {
            if let Some(cell) = surface.read_cell(col, row) {
                if !cell.is_continuation() {
                    out.push_str(&cell.grapheme);
                }
            }
        }
        out.trim_end().to_string()
    }

    #[test]
    fn test_hello_world_wraps_at_six() {
        let mut text = Text::new("Hello, world");
        let surface = text.draw(&ctx(MaxSize::bounded(6, 16)));
        assert_eq!(surface.size, Size::new(6, 2));
        assert_eq!(row_string(&surface, 0), "Hello,");
        assert_eq!(row_string(&surface, 1), "world");
    }

    #[test]
    fn test_zero_width_yields_zero_surface() {
        let mut text = Text::new("hi");
        let surface = text.draw(&ctx(MaxSize::bounded(0, 5)));
        assert_eq!(surface.size, Size::new(0, 0));
        assert!(surface.is_transparent());
    }

    #[test]
    fn test_unbounded_single_line() {
        let mut text = Text::new("one two three");
        let surface = text.draw(&ctx(MaxSize::unbounded()));
        assert_eq!(surface.size.height, 1);
        assert_eq!(surface.size.width, 13);
    }

    #[test]
    fn test_vertical_truncation_by_max_height() {
        let mut text = Text::new("a\nb\nc\nd");
        let surface = text.draw(&ctx(MaxSize::bounded(10, 2)));
        assert_eq!(surface.size.height, 2);
        assert_eq!(row_string(&surface, 0), "a");
        assert_eq!(row_string(&surface, 1), "b");
    }

    #[test]
    fn test_nowrap_clip() {
        let mut text = Text::new("abcdefgh").softwrap(false);
        let surface = text.draw(&ctx(MaxSize::bounded(4, 1)));
        // Longest-line basis is capped by nothing, but cells past the
        // surface width simply clip
        assert_eq!(row_string(&surface, 0)[..4].to_string(), "abcd");
    }

    #[test]
    fn test_nowrap_ellipsis() {
        let mut text = Text::new("abcdefgh")
            .softwrap(false)
            .overflow(Overflow::Ellipsis)
            .width_basis(WidthBasis::Parent);
        let surface = text.draw(&ctx(MaxSize::bounded(4, 1)));
        assert_eq!(surface.size.width, 4);
        assert_eq!(row_string(&surface, 0), "abc…");
    }

    #[test]
    fn test_parent_width_basis() {
        let mut text = Text::new("hi").width_basis(WidthBasis::Parent);
        let surface = text.draw(&ctx(MaxSize::bounded(20, 4)));
        assert_eq!(surface.size.width, 20);
    }

    #[test]
    fn test_long_word_splits_at_exact_column() {
        let mut text = Text::new("abcdefghijkl");
        let surface = text.draw(&ctx(MaxSize::bounded(8, 4)));
        assert_eq!(row_string(&surface, 0), "abcdefgh");
        assert_eq!(row_string(&surface, 1), "ijkl");
    }
}
