//! Cell styling: colors, attributes, underlines, hyperlinks

use bitflags::bitflags;
use std::sync::Arc;

/// A terminal color
///
/// Either the terminal's configured default, one of the 256 indexed
/// palette entries, or a 24-bit value (emitted only when the terminal
/// reported RGB support).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// The terminal default foreground/background
    #[default]
    Default,
    /// An 8-bit palette index
    Indexed(u8),
    /// A 24-bit RGB color
    Rgb(u8, u8, u8),
}

impl Color {
    /// Palette black (index 0)
    pub const BLACK: Color = Color::Indexed(0);
    /// Palette red (index 1)
    pub const RED: Color = Color::Indexed(1);
    /// Palette green (index 2)
    pub const GREEN: Color = Color::Indexed(2);
    /// Palette yellow (index 3)
    pub const YELLOW: Color = Color::Indexed(3);
    /// Palette blue (index 4)
    pub const BLUE: Color = Color::Indexed(4);
    /// Palette magenta (index 5)
    pub const MAGENTA: Color = Color::Indexed(5);
    /// Palette cyan (index 6)
    pub const CYAN: Color = Color::Indexed(6);
    /// Palette white (index 7)
    pub const WHITE: Color = Color::Indexed(7);

    /// Create a 24-bit color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(r, g, b)
    }
}

/// Underline rendering kind (SGR 4:n)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderlineStyle {
    /// No underline
    #[default]
    Off,
    /// Single straight underline
    Single,
    /// Double underline
    Double,
    /// Curly (undercurl) underline
    Curly,
    /// Dotted underline
    Dotted,
    /// Dashed underline
    Dashed,
}

bitflags! {
    /// Text attribute flags
    ///
    /// Uses bitflags for compact storage. Multiple attributes can be combined.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AttrFlags: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
        /// Dimmed/faint text
        const DIM = 0b0000_0010;
        /// Italic text
        const ITALIC = 0b0000_0100;
        /// Blinking text
        const BLINK = 0b0000_1000;
        /// Swapped foreground/background
        const REVERSE = 0b0001_0000;
        /// Invisible (concealed) text
        const INVISIBLE = 0b0010_0000;
        /// Strikethrough text
        const STRIKETHROUGH = 0b0100_0000;
    }
}

/// An OSC 8 hyperlink attached to a run of cells
///
/// The optional `id` groups visually separated cells into one logical
/// link so terminals can highlight them together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    /// The link target
    pub uri: Arc<str>,
    /// Optional `id=` parameter
    pub id: Option<Arc<str>>,
}

impl Hyperlink {
    /// Create a hyperlink without an explicit id
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self {
            uri: uri.into(),
            id: None,
        }
    }

    /// Set the `id=` parameter
    pub fn with_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The full visual style of a cell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Underline color (`Default` means "same as foreground")
    pub ul: Color,
    /// Underline kind
    pub ul_style: UnderlineStyle,
    /// Attribute flags
    pub attrs: AttrFlags,
    /// Hyperlink, if any
    pub link: Option<Hyperlink>,
}

impl Style {
    /// A fully default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set foreground color
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = color;
        self
    }

    /// Set background color
    pub fn bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    /// Set the underline kind
    pub fn underline(mut self, style: UnderlineStyle) -> Self {
        self.ul_style = style;
        self
    }

    /// Set the underline color
    pub fn underline_color(mut self, color: Color) -> Self {
        self.ul = color;
        self
    }

    /// Add bold
    pub fn bold(mut self) -> Self {
        self.attrs |= AttrFlags::BOLD;
        self
    }

    /// Add dim
    pub fn dim(mut self) -> Self {
        self.attrs |= AttrFlags::DIM;
        self
    }

    /// Add italic
    pub fn italic(mut self) -> Self {
        self.attrs |= AttrFlags::ITALIC;
        self
    }

    /// Add reverse video
    pub fn reverse(mut self) -> Self {
        self.attrs |= AttrFlags::REVERSE;
        self
    }

    /// Add strikethrough
    pub fn strikethrough(mut self) -> Self {
        self.attrs |= AttrFlags::STRIKETHROUGH;
        self
    }

    /// Attach a hyperlink
    pub fn hyperlink(mut self, link: Hyperlink) -> Self {
        self.link = Some(link);
        self
    }
}
