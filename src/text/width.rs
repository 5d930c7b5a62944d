//! Grapheme and string width measurement
//!
//! Two width methods exist because terminals disagree: legacy terminals
//! measure codepoint-by-codepoint (wcwidth), modern ones measure whole
//! grapheme clusters (mode 2027). The method is chosen once per process
//! from capability detection and carried through `DrawContext`.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// How display widths are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidthMethod {
    /// Sum of per-codepoint widths, the wcwidth(3) convention
    #[default]
    Wcwidth,
    /// Width of the whole grapheme cluster (Unicode 15 tables)
    Unicode,
}

/// Display width of a single grapheme cluster, clamped to 0..=2
pub fn grapheme_width(grapheme: &str, method: WidthMethod) -> u8 {
    let w = match method {
        WidthMethod::Wcwidth => grapheme
            .chars()
            .map(|ch| ch.width().unwrap_or(0))
            .sum::<usize>(),
        WidthMethod::Unicode => grapheme.width(),
    };
    w.min(2) as u8
}

/// Display width of a string, grapheme by grapheme
///
/// Tabs are *not* expanded here; the soft-wrap iterator owns tab policy.
pub fn string_width(s: &str, method: WidthMethod) -> usize {
    s.graphemes(true)
        .map(|g| grapheme_width(g, method) as usize)
        .sum()
}
