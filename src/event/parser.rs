//! Incremental escape-sequence parser
//!
//! Consumes arbitrary byte fragments from the tty reader (reads may split
//! or coalesce sequences) and produces at most one event per call. The
//! caller feeds the same buffer repeatedly, advancing by the consumed
//! count, until it is drained or the parser reports an incomplete tail
//! (`consumed == 0` with no event), which the reader carries into the
//! next read.
//!
//! Lone-ESC policy: a buffer that is exactly one `0x1B` is deferred while
//! `more` is true (the read may have been split mid-sequence) and is
//! returned as a literal Escape key press once the caller marks the
//! buffer drained.

use super::cache::GraphemeCache;
use super::{ColorKind, ColorReport, Event, Key, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind};
use crate::log_debug;
use unicode_segmentation::UnicodeSegmentation;

/// Result of one `parse` call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseResult {
    /// Bytes consumed from the front of the input
    ///
    /// Zero with no event means the input ends mid-sequence; feed the same
    /// bytes again with more appended.
    pub consumed: usize,
    /// The recognized event, if the consumed bytes produced one
    pub event: Option<Event>,
}

impl ParseResult {
    fn incomplete() -> Self {
        Self::default()
    }

    fn skip(consumed: usize) -> Self {
        Self {
            consumed,
            event: None,
        }
    }

    fn emit(consumed: usize, event: Event) -> Self {
        Self {
            consumed,
            event: Some(event),
        }
    }
}

/// The byte-stream state machine
#[derive(Debug, Default)]
pub struct Parser {
    /// Inside a bracketed paste; ESC is literal except for the end marker
    in_paste: bool,
    /// Mouse coordinates arrive as pixels (mode 1016)
    pub sgr_pixels: bool,
}

impl Parser {
    /// Create a parser in its ground state
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume bytes from the front of `input`
    ///
    /// `more` signals that the read that produced this buffer may have
    /// been truncated mid-sequence (it filled the scratch buffer); only
    /// the lone-ESC disambiguation consults it.
    pub fn parse(&mut self, input: &[u8], more: bool, cache: &mut GraphemeCache) -> ParseResult {
        if input.is_empty() {
            return ParseResult::incomplete();
        }

        match input[0] {
            0x1b => self.parse_escape(input, more, cache),
            0x00..=0x1f | 0x7f => ParseResult::emit(1, Event::Key(control_key(input[0]))),
            _ => self.parse_text(input, cache),
        }
    }

    fn parse_escape(&mut self, input: &[u8], more: bool, cache: &mut GraphemeCache) -> ParseResult {
        if input.len() == 1 {
            return if more {
                ParseResult::incomplete()
            } else {
                ParseResult::emit(1, Event::Key(KeyEvent::new(Key::ESCAPE)))
            };
        }

        if self.in_paste && !input.starts_with(b"\x1b[201~") {
            // Pasted literal ESC bytes must not start sequence recognition
            if input.len() < 6 && b"\x1b[201~".starts_with(input) {
                return ParseResult::incomplete();
            }
            return ParseResult::emit(1, Event::Key(KeyEvent::new(Key::ESCAPE)));
        }

        match input[1] {
            b'[' => self.parse_csi(input),
            b'O' => parse_ss3(input),
            b']' => parse_osc(input),
            // DCS: recognized and skipped whole
            b'P' => match find_st(input, 2) {
                Some(end) => ParseResult::skip(end),
                None => ParseResult::incomplete(),
            },
            b'_' => parse_apc(input),
            b'\x1b' => ParseResult::emit(1, Event::Key(KeyEvent::new(Key::ESCAPE))),
            b'\\' => ParseResult::skip(2),
            0x00..=0x1f | 0x7f => {
                let key = control_key(input[1]);
                let key = KeyEvent {
                    modifiers: key.modifiers | Modifiers::ALT,
                    ..key
                };
                ParseResult::emit(2, Event::Key(key))
            }
            _ => {
                // Alt-modified text key
                let mut inner = self.parse_text(&input[1..], cache);
                match inner.event.take() {
                    Some(Event::Key(key)) => {
                        let key = KeyEvent {
                            modifiers: key.modifiers | Modifiers::ALT,
                            ..key
                        };
                        ParseResult::emit(inner.consumed + 1, Event::Key(key))
                    }
                    _ if inner.consumed == 0 => ParseResult::incomplete(),
                    _ => ParseResult::skip(inner.consumed + 1),
                }
            }
        }
    }

    fn parse_csi(&mut self, input: &[u8]) -> ParseResult {
        // Legacy X10 mouse: CSI M Cb Cx Cy
        if input.get(2) == Some(&b'M') {
            if input.len() < 6 {
                return ParseResult::incomplete();
            }
            return ParseResult::emit(6, legacy_mouse(input[3], input[4], input[5]));
        }

        let mut i = 2;
        let private = match input.get(i) {
            Some(&b) if (0x3c..=0x3f).contains(&b) => {
                i += 1;
                Some(b)
            }
            _ => None,
        };
        let params_start = i;
        let mut params_end = None;
        while let Some(&b) = input.get(i) {
            match b {
                0x30..=0x3b if params_end.is_none() => i += 1,
                0x20..=0x2f => {
                    params_end.get_or_insert(i);
                    i += 1;
                }
                0x40..=0x7e => {
                    let params = &input[params_start..params_end.unwrap_or(i)];
                    let consumed = i + 1;
                    return self.dispatch_csi(private, params, b, consumed);
                }
                _ => {
                    // Not a CSI byte: the sequence is malformed; drop it
                    log_debug!("discarding malformed CSI at byte {:#x}", b);
                    return ParseResult::skip(i + 1);
                }
            }
        }
        ParseResult::incomplete()
    }

    fn dispatch_csi(
        &mut self,
        private: Option<u8>,
        params: &[u8],
        final_byte: u8,
        consumed: usize,
    ) -> ParseResult {
        match (private, final_byte) {
            (None, b'A') => named_key(Key::UP, params, consumed),
            (None, b'B') => named_key(Key::DOWN, params, consumed),
            (None, b'C') => named_key(Key::RIGHT, params, consumed),
            (None, b'D') => named_key(Key::LEFT, params, consumed),
            (None, b'H') => named_key(Key::HOME, params, consumed),
            (None, b'F') => named_key(Key::END, params, consumed),
            (None, b'Z') => ParseResult::emit(
                consumed,
                Event::Key(KeyEvent::new(Key::TAB).with_modifiers(Modifiers::SHIFT)),
            ),
            (None, b'I') => ParseResult::emit(consumed, Event::FocusIn),
            (None, b'O') => ParseResult::emit(consumed, Event::FocusOut),
            (None, b'~') => self.tilde_key(params, consumed),
            (None, b'u') => kitty_key(params, consumed),
            (Some(b'?'), b'u') => ParseResult::emit(consumed, Event::CapKittyKeyboard),
            (Some(b'<'), b'M') => self.sgr_mouse(params, true, consumed),
            (Some(b'<'), b'm') => self.sgr_mouse(params, false, consumed),
            (Some(b'?'), b'c') => ParseResult::emit(consumed, Event::CapDa1),
            // DECRPM: mode 2027 set/permanently-set means grapheme widths
            (Some(b'?'), b'y') => {
                let groups = split_params(params);
                if number(&groups, 0, 0) == Some(2027)
                    && matches!(number(&groups, 1, 0), Some(1) | Some(2))
                {
                    ParseResult::emit(consumed, Event::CapUnicodeWidth)
                } else {
                    ParseResult::skip(consumed)
                }
            }
            // DA2 and other private replies: recognized, no event
            (Some(_), _) => ParseResult::skip(consumed),
            (None, _) => {
                log_debug!("discarding unrecognized CSI final {:?}", final_byte as char);
                ParseResult::skip(consumed)
            }
        }
    }

    fn tilde_key(&mut self, params: &[u8], consumed: usize) -> ParseResult {
        let groups = split_params(params);
        let code = number(&groups, 0, 0).unwrap_or(0);
        let modifiers = modifier_param(&groups, 1);
        let key = match code {
            1 | 7 => Key::HOME,
            2 => Key::INSERT,
            3 => Key::DELETE,
            4 | 8 => Key::END,
            5 => Key::PAGE_UP,
            6 => Key::PAGE_DOWN,
            11..=15 => Key::F1 + (code - 11),
            17..=21 => Key::F6 + (code - 17),
            23 => Key::F11,
            24 => Key::F12,
            200 => {
                self.in_paste = true;
                return ParseResult::emit(consumed, Event::PasteStart);
            }
            201 => {
                self.in_paste = false;
                return ParseResult::emit(consumed, Event::PasteEnd);
            }
            _ => return ParseResult::skip(consumed),
        };
        ParseResult::emit(
            consumed,
            Event::Key(KeyEvent::new(key).with_modifiers(modifiers)),
        )
    }

    fn sgr_mouse(&mut self, params: &[u8], press: bool, consumed: usize) -> ParseResult {
        let groups = split_params(params);
        let (Some(btn), Some(x), Some(y)) = (
            number(&groups, 0, 0),
            number(&groups, 1, 0),
            number(&groups, 2, 0),
        ) else {
            return ParseResult::skip(consumed);
        };

        let motion = btn & 32 != 0;
        let button = decode_button(btn);
        let kind = if motion {
            if button == MouseButton::None {
                MouseEventKind::Motion
            } else {
                MouseEventKind::Drag
            }
        } else if press {
            MouseEventKind::Press
        } else {
            MouseEventKind::Release
        };

        let mut modifiers = Modifiers::empty();
        if btn & 4 != 0 {
            modifiers |= Modifiers::SHIFT;
        }
        if btn & 8 != 0 {
            modifiers |= Modifiers::ALT;
        }
        if btn & 16 != 0 {
            modifiers |= Modifiers::CTRL;
        }

        let x = x.saturating_sub(1) as u16;
        let y = y.saturating_sub(1) as u16;
        let event = if self.sgr_pixels {
            // The reader converts pixels to cells with the current winsize
            MouseEvent {
                col: 0,
                row: 0,
                pixel_x: x,
                pixel_y: y,
                button,
                modifiers,
                kind,
            }
        } else {
            MouseEvent {
                col: x,
                row: y,
                pixel_x: 0,
                pixel_y: 0,
                button,
                modifiers,
                kind,
            }
        };
        ParseResult::emit(consumed, Event::Mouse(event))
    }

    fn parse_text(&mut self, input: &[u8], cache: &mut GraphemeCache) -> ParseResult {
        let len = match utf8_len(input[0]) {
            Some(len) => len,
            None => {
                // Invalid leading byte: replacement character, keep going
                return ParseResult::emit(
                    1,
                    Event::Key(KeyEvent {
                        codepoint: char::REPLACEMENT_CHARACTER as u32,
                        text: Some(cache.intern("\u{FFFD}")),
                        ..Default::default()
                    }),
                );
            }
        };
        if input.len() < len {
            return ParseResult::incomplete();
        }

        // Decode the longest valid prefix (bounded; a cluster is short) and
        // take its first grapheme so combining sequences stay together
        let window = &input[..input.len().min(64)];
        let valid = match std::str::from_utf8(window) {
            Ok(s) => s,
            Err(e) if e.valid_up_to() > 0 => {
                // valid_up_to is a char boundary by construction
                std::str::from_utf8(&window[..e.valid_up_to()]).unwrap_or_default()
            }
            Err(e) => {
                // The first char itself is malformed; replace exactly the
                // offending bytes and continue
                let bad = e.error_len().unwrap_or(window.len());
                return ParseResult::emit(
                    bad,
                    Event::Key(KeyEvent {
                        codepoint: char::REPLACEMENT_CHARACTER as u32,
                        text: Some(cache.intern("\u{FFFD}")),
                        ..Default::default()
                    }),
                );
            }
        };

        let grapheme = match valid.graphemes(true).next() {
            Some(g) => g,
            None => return ParseResult::incomplete(),
        };
        let codepoint = grapheme.chars().next().map(|c| c as u32).unwrap_or(0);
        ParseResult::emit(
            grapheme.len(),
            Event::Key(KeyEvent {
                codepoint,
                text: Some(cache.intern(grapheme)),
                ..Default::default()
            }),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Sequence families
// ─────────────────────────────────────────────────────────────────────────

fn parse_ss3(input: &[u8]) -> ParseResult {
    let Some(&b) = input.get(2) else {
        return ParseResult::incomplete();
    };
    let key = match b {
        b'A' => Key::UP,
        b'B' => Key::DOWN,
        b'C' => Key::RIGHT,
        b'D' => Key::LEFT,
        b'H' => Key::HOME,
        b'F' => Key::END,
        b'P' => Key::F1,
        b'Q' => Key::F2,
        b'R' => Key::F3,
        b'S' => Key::F4,
        _ => return ParseResult::skip(3),
    };
    ParseResult::emit(3, Event::Key(KeyEvent::new(key)))
}

fn parse_osc(input: &[u8]) -> ParseResult {
    let Some((end, body_end)) = find_osc_end(input) else {
        return ParseResult::incomplete();
    };
    let body = &input[2..body_end];
    let Ok(body) = std::str::from_utf8(body) else {
        return ParseResult::skip(end);
    };

    let mut parts = body.splitn(2, ';');
    let kind = match parts.next() {
        Some("10") => ColorKind::Foreground,
        Some("11") => ColorKind::Background,
        Some("12") => ColorKind::Cursor,
        _ => return ParseResult::skip(end),
    };
    let Some(rgb) = parts.next().and_then(parse_x11_color) else {
        return ParseResult::skip(end);
    };
    ParseResult::emit(end, Event::ColorReport(ColorReport { kind, rgb }))
}

fn parse_apc(input: &[u8]) -> ParseResult {
    let Some(end) = find_st(input, 2) else {
        return ParseResult::incomplete();
    };
    // Any graphics reply proves the protocol is spoken
    if input.get(2) == Some(&b'G') {
        return ParseResult::emit(end, Event::CapKittyGraphics);
    }
    ParseResult::skip(end)
}

/// Kitty keyboard event: CSI codepoint[:shifted[:base]] ; mods[:event] [; text] u
fn kitty_key(params: &[u8], consumed: usize) -> ParseResult {
    let groups = split_params(params);
    let Some(codepoint) = number(&groups, 0, 0) else {
        return ParseResult::skip(consumed);
    };
    let shifted_codepoint = number(&groups, 0, 1);
    let base_codepoint = number(&groups, 0, 2);
    let modifiers = modifier_param(&groups, 1);
    let event_type = number(&groups, 1, 1).unwrap_or(1);

    let mut text = None;
    if let Some(group) = groups.get(2) {
        let mut s = String::new();
        for part in group.split(|&b| b == b':') {
            if let Some(cp) = ascii_number(part).and_then(char::from_u32) {
                s.push(cp);
            }
        }
        if !s.is_empty() {
            text = Some(s);
        }
    }

    // Synthesize text for plain printable presses the terminal did not
    // spell out
    if text.is_none()
        && event_type != 3
        && !modifiers.intersects(
            Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER | Modifiers::HYPER | Modifiers::META,
        )
    {
        let cp = if modifiers.contains(Modifiers::SHIFT) {
            shifted_codepoint.unwrap_or(codepoint)
        } else {
            codepoint
        };
        if cp < 57344 {
            if let Some(ch) = char::from_u32(cp).filter(|c| !c.is_control()) {
                text = Some(ch.to_string());
            }
        }
    }

    let key = KeyEvent {
        codepoint,
        modifiers,
        base_codepoint,
        shifted_codepoint,
        text: text.map(Into::into),
    };
    let event = if event_type == 3 {
        Event::KeyRelease(key)
    } else {
        Event::Key(key)
    };
    ParseResult::emit(consumed, event)
}

fn legacy_mouse(cb: u8, cx: u8, cy: u8) -> Event {
    let btn = cb.wrapping_sub(32) as u32;
    let motion = btn & 32 != 0;
    let button = decode_button(btn);
    let kind = if motion {
        if button == MouseButton::None {
            MouseEventKind::Motion
        } else {
            MouseEventKind::Drag
        }
    } else if btn & 0b11 == 3 {
        MouseEventKind::Release
    } else {
        MouseEventKind::Press
    };

    let mut modifiers = Modifiers::empty();
    if btn & 4 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if btn & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if btn & 16 != 0 {
        modifiers |= Modifiers::CTRL;
    }

    Event::Mouse(MouseEvent {
        col: cx.saturating_sub(33) as u16,
        row: cy.saturating_sub(33) as u16,
        pixel_x: 0,
        pixel_y: 0,
        button,
        modifiers,
        kind,
    })
}

fn decode_button(btn: u32) -> MouseButton {
    if btn & 64 != 0 {
        return match btn & 0b11 {
            0 => MouseButton::WheelUp,
            1 => MouseButton::WheelDown,
            2 => MouseButton::WheelLeft,
            _ => MouseButton::WheelRight,
        };
    }
    if btn & 128 != 0 {
        return match btn & 0b11 {
            0 => MouseButton::Button8,
            1 => MouseButton::Button9,
            2 => MouseButton::Button10,
            _ => MouseButton::Button11,
        };
    }
    match btn & 0b11 {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::None,
    }
}

fn control_key(byte: u8) -> KeyEvent {
    match byte {
        0x00 => KeyEvent::new(Key::SPACE).with_modifiers(Modifiers::CTRL),
        0x09 => KeyEvent::new(Key::TAB),
        0x0d => KeyEvent::new(Key::ENTER),
        0x7f => KeyEvent::new(Key::BACKSPACE),
        0x01..=0x1a => {
            KeyEvent::new((byte + 0x60) as u32).with_modifiers(Modifiers::CTRL)
        }
        0x1c..=0x1f => {
            KeyEvent::new((byte + 0x40) as u32).with_modifiers(Modifiers::CTRL)
        }
        _ => KeyEvent::new(byte as u32),
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Lexing helpers
// ─────────────────────────────────────────────────────────────────────────

fn named_key(key: u32, params: &[u8], consumed: usize) -> ParseResult {
    let groups = split_params(params);
    let modifiers = modifier_param(&groups, 1);
    ParseResult::emit(
        consumed,
        Event::Key(KeyEvent::new(key).with_modifiers(modifiers)),
    )
}

fn split_params(params: &[u8]) -> Vec<&[u8]> {
    if params.is_empty() {
        return Vec::new();
    }
    params.split(|&b| b == b';').collect()
}

/// Parse subparam `sub` of group `idx` as a decimal number
fn number(groups: &[&[u8]], idx: usize, sub: usize) -> Option<u32> {
    let group = groups.get(idx)?;
    let part = group.split(|&b| b == b':').nth(sub)?;
    ascii_number(part)
}

fn ascii_number(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as u32)?;
    }
    Some(value)
}

/// Kitty-style modifier parameter: `1 + bits`
fn modifier_param(groups: &[&[u8]], idx: usize) -> Modifiers {
    match number(groups, idx, 0) {
        Some(v) if v > 0 => Modifiers::from_bits_truncate((v - 1).min(255) as u8),
        _ => Modifiers::empty(),
    }
}

/// Index one past the terminator of a string sequence starting at `from`
/// (ESC \ or, for OSC compatibility, BEL)
fn find_st(input: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < input.len() {
        match input[i] {
            0x07 => return Some(i + 1),
            0x1b if input.get(i + 1) == Some(&b'\\') => return Some(i + 2),
            _ => i += 1,
        }
    }
    None
}

/// OSC end: (one past terminator, body end)
fn find_osc_end(input: &[u8]) -> Option<(usize, usize)> {
    let mut i = 2;
    while i < input.len() {
        match input[i] {
            0x07 => return Some((i + 1, i)),
            0x1b if input.get(i + 1) == Some(&b'\\') => return Some((i + 2, i)),
            0x1b => return Some((i, i)),
            _ => i += 1,
        }
    }
    None
}

/// X11 color spec: `rgb:RRRR/GGGG/BBBB` with 1-4 hex digits per channel
fn parse_x11_color(spec: &str) -> Option<(u8, u8, u8)> {
    let spec = spec.strip_prefix("rgb:")?;
    let mut channels = spec.split('/');
    let mut out = [0u8; 3];
    for slot in &mut out {
        let chan = channels.next()?;
        if chan.is_empty() || chan.len() > 4 {
            return None;
        }
        let value = u16::from_str_radix(chan, 16).ok()?;
        // Scale to 8 bits from however many digits were given
        let max = (1u32 << (4 * chan.len() as u32)) - 1;
        *slot = ((value as u32 * 255 + max / 2) / max) as u8;
    }
    Some((out[0], out[1], out[2]))
}

fn utf8_len(first: u8) -> Option<usize> {
    match first {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}
