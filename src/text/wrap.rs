//! Hard-line splitting and grapheme-aware soft wrapping

use super::width::{grapheme_width, WidthMethod};
use unicode_segmentation::UnicodeSegmentation;

/// Number of space cells a tab expands to
pub const TAB_WIDTH: usize = 8;

/// Iterator over hard lines, splitting on `\n`, `\r`, or `\r\n`
///
/// A trailing terminator does not produce a trailing empty line, matching
/// [`str::lines`]. Finite and non-restartable.
#[derive(Debug, Clone)]
pub struct LineIterator<'a> {
    rest: Option<&'a str>,
}

impl<'a> LineIterator<'a> {
    /// Create an iterator over the hard lines of `text`
    pub fn new(text: &'a str) -> Self {
        Self { rest: Some(text) }
    }
}

impl<'a> Iterator for LineIterator<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.find(['\r', '\n']) {
            Some(idx) => {
                let line = &rest[..idx];
                let after = &rest[idx..];
                let skip = if after.starts_with("\r\n") { 2 } else { 1 };
                let remainder = &after[skip..];
                // A terminator at end-of-input closes the last line without
                // opening an empty one
                self.rest = if remainder.is_empty() {
                    None
                } else {
                    Some(remainder)
                };
                Some(line)
            }
            None => {
                self.rest = None;
                if rest.is_empty() {
                    None
                } else {
                    Some(rest)
                }
            }
        }
    }
}

/// One display cell produced by the wrap iterator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapCell<'a> {
    /// The grapheme cluster (a single space for expanded tabs)
    pub grapheme: &'a str,
    /// Display width in columns
    pub width: u8,
}

/// One soft-wrapped output line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrappedLine<'a> {
    /// The cells of the line, trailing whitespace already trimmed
    pub cells: Vec<WrapCell<'a>>,
    /// Total display width of the line
    pub width: u16,
}

impl WrappedLine<'_> {
    fn trim_trailing_whitespace(&mut self) {
        while let Some(last) = self.cells.last() {
            if is_space(last.grapheme) {
                self.width -= last.width as u16;
                self.cells.pop();
            } else {
                break;
            }
        }
    }
}

fn is_space(grapheme: &str) -> bool {
    grapheme.chars().all(char::is_whitespace) && !grapheme.is_empty()
}

/// Grapheme-aware soft-wrap iterator
///
/// Breaks preferentially at whitespace; words wider than the wrap width
/// are split at the exact cell that would overflow. Tabs expand to eight
/// space cells. With an unbounded width every hard line yields exactly
/// one output line (trailing whitespace still trimmed).
pub struct SoftwrapIterator<'a> {
    lines: LineIterator<'a>,
    max_width: Option<u16>,
    method: WidthMethod,
    /// Cells of the current hard line, tab-expanded
    cells: Vec<WrapCell<'a>>,
    /// Next unconsumed cell of `cells`
    index: usize,
    /// Whether `cells` currently holds an unfinished hard line
    mid_line: bool,
}

impl<'a> SoftwrapIterator<'a> {
    /// Create a wrap iterator over `text`
    ///
    /// `max_width` of `None` disables soft wrapping.
    pub fn new(text: &'a str, max_width: Option<u16>, method: WidthMethod) -> Self {
        Self {
            lines: LineIterator::new(text),
            max_width,
            method,
            cells: Vec::new(),
            index: 0,
            mid_line: false,
        }
    }

    fn load_next_hard_line(&mut self) -> bool {
        let Some(line) = self.lines.next() else {
            return false;
        };
        self.cells.clear();
        self.index = 0;
        for grapheme in line.graphemes(true) {
            if grapheme == "\t" {
                for _ in 0..TAB_WIDTH {
                    self.cells.push(WrapCell {
                        grapheme: " ",
                        width: 1,
                    });
                }
            } else {
                self.cells.push(WrapCell {
                    grapheme,
                    width: grapheme_width(grapheme, self.method),
                });
            }
        }
        self.mid_line = true;
        true
    }

    /// Width of the whitespace-delimited word starting at `from`,
    /// together with its end index (exclusive)
    fn next_word(&self, from: usize) -> (usize, u16) {
        let mut end = from;
        let mut width = 0u16;
        while end < self.cells.len() && !is_space(self.cells[end].grapheme) {
            width += self.cells[end].width as u16;
            end += 1;
        }
        (end, width)
    }
}

impl<'a> Iterator for SoftwrapIterator<'a> {
    type Item = WrappedLine<'a>;

    fn next(&mut self) -> Option<WrappedLine<'a>> {
        if !self.mid_line && !self.load_next_hard_line() {
            return None;
        }

        let mut out = WrappedLine::default();

        let Some(max_width) = self.max_width else {
            // Unbounded: the whole hard line is one output line
            for cell in &self.cells[self.index..] {
                out.width += cell.width as u16;
                out.cells.push(*cell);
            }
            out.trim_trailing_whitespace();
            self.mid_line = false;
            return Some(out);
        };

        while self.index < self.cells.len() {
            let cell = self.cells[self.index];
            if is_space(cell.grapheme) {
                // Whitespace joins the line; it counts toward the width and
                // is trimmed if the line ends here
                if out.width + cell.width as u16 > max_width {
                    self.index += 1;
                    continue;
                }
                out.cells.push(cell);
                out.width += cell.width as u16;
                self.index += 1;
                continue;
            }

            let (word_end, word_width) = self.next_word(self.index);
            if out.width + word_width > max_width {
                if word_width > max_width {
                    // The word alone cannot fit: split it at the exact
                    // overflow cell
                    out.trim_trailing_whitespace();
                    while self.index < word_end {
                        let c = self.cells[self.index];
                        if out.width + c.width as u16 > max_width {
                            // A cell wider than the whole line still has to
                            // go somewhere; overflow rather than stall
                            if out.cells.is_empty() {
                                out.cells.push(c);
                                out.width += c.width as u16;
                                self.index += 1;
                            }
                            break;
                        }
                        out.cells.push(c);
                        out.width += c.width as u16;
                        self.index += 1;
                    }
                    return Some(out);
                }
                // Emit what we have; the word opens the next line
                out.trim_trailing_whitespace();
                return Some(out);
            }

            for c in &self.cells[self.index..word_end] {
                out.cells.push(*c);
                out.width += c.width as u16;
            }
            self.index = word_end;
        }

        out.trim_trailing_whitespace();
        self.mid_line = false;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wrap(text: &str, max: u16) -> Vec<String> {
        SoftwrapIterator::new(text, Some(max), WidthMethod::Wcwidth)
            .map(|line| line.cells.iter().map(|c| c.grapheme).collect())
            .collect()
    }

    #[test]
    fn test_line_iterator_mixed_terminators() {
        let lines: Vec<&str> = LineIterator::new("a\nb\r\nc\rd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_line_iterator_trailing_newline() {
        let lines: Vec<&str> = LineIterator::new("a\n").collect();
        assert_eq!(lines, vec!["a"]);
    }

    #[test]
    fn test_line_iterator_interior_empty_lines() {
        let lines: Vec<&str> = LineIterator::new("a\n\nb").collect();
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_softwrap_hello_world() {
        // "Hello, world" at 6: "Hello," (6) and "world" (5)
        assert_eq!(wrap("Hello, world", 6), vec!["Hello,", "world"]);
    }

    #[test]
    fn test_softwrap_unbounded_one_line_per_hard_line() {
        let lines: Vec<WrappedLine> =
            SoftwrapIterator::new("one two\nthree", None, WidthMethod::Wcwidth).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].width, 7);
        assert_eq!(lines[1].width, 5);
    }

    #[test]
    fn test_softwrap_long_word_splits_at_exact_column() {
        let lines = wrap("abcdefghijkl", 8);
        assert_eq!(lines, vec!["abcdefgh", "ijkl"]);
    }

    #[test]
    fn test_softwrap_long_word_after_short_word() {
        let lines = wrap("hi abcdefghijkl", 8);
        assert_eq!(lines, vec!["hi", "abcdefgh", "ijkl"]);
    }

    #[test]
    fn test_softwrap_trailing_whitespace_trimmed() {
        let lines = wrap("hi   ", 8);
        assert_eq!(lines, vec!["hi"]);
    }

    #[test]
    fn test_softwrap_wide_grapheme_does_not_straddle() {
        // Three CJK cells at width 5: two fit (4 cols), third starts line 2
        let lines = wrap("漢漢漢", 5);
        assert_eq!(lines, vec!["漢漢", "漢"]);
    }

    #[test]
    fn test_softwrap_tab_expands_to_eight() {
        let lines: Vec<WrappedLine> =
            SoftwrapIterator::new("a\tb", None, WidthMethod::Wcwidth).collect();
        assert_eq!(lines[0].width, 10);
        assert_eq!(lines[0].cells.len(), 10);
    }

    #[test]
    fn test_softwrap_roundtrip_property() {
        // Concatenating the emitted cells with inter-line whitespace removed
        // equals the input with per-hard-line trailing whitespace trimmed
        let input = "the quick brown fox jumps over the lazy dog";
        let rejoined: String = wrap(input, 10)
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, input);
    }

    #[test]
    fn test_softwrap_zero_width_still_terminates() {
        // No cell fits in zero columns; each overflows its own line rather
        // than stalling the iterator. The text widget guards this case and
        // renders nothing.
        let lines = wrap("hi", 0);
        assert_eq!(lines, vec!["h", "i"]);
    }

    #[test]
    fn test_softwrap_wide_cell_in_one_column() {
        let lines = wrap("漢", 1);
        assert_eq!(lines, vec!["漢"]);
    }
}
