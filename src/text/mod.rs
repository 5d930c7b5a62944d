//! Text layout: line splitting, width measurement, soft wrapping

pub mod width;
pub mod wrap;

pub use width::{grapheme_width, string_width, WidthMethod};
pub use wrap::{LineIterator, SoftwrapIterator, WrapCell, WrappedLine};
