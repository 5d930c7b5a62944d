//! Terminal capability flags
//!
//! Seeded from the environment at startup, then overridden by capability
//! reports the input parser discovers (DA1/DA2, Kitty keyboard and
//! graphics probes, mode 2027 width reports). The flags are written by
//! the reader task and read by the UI thread; reads are advisory, so
//! relaxed atomics are sufficient.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

/// Discovered terminal capabilities
#[derive(Debug, Default)]
pub struct Capabilities {
    /// Kitty keyboard protocol (CSI u with progressive enhancement)
    pub kitty_keyboard: AtomicBool,
    /// Kitty graphics protocol
    pub kitty_graphics: AtomicBool,
    /// 24-bit color SGR sequences
    pub rgb: AtomicBool,
    /// Grapheme-cluster width handling (mode 2027 style)
    pub unicode_width: AtomicBool,
    /// SGR-pixels mouse reporting (mode 1016)
    pub sgr_pixels: AtomicBool,
    /// Synchronized update bracket (mode 2026)
    pub synchronized_output: AtomicBool,
}

impl Capabilities {
    /// Seed capabilities from `TERM` and `COLORTERM`
    ///
    /// Capability reports received later always win over these seeds.
    pub fn from_env() -> Self {
        let caps = Self::default();

        if let Ok(colorterm) = env::var("COLORTERM") {
            if colorterm == "truecolor" || colorterm == "24bit" {
                caps.rgb.store(true, Ordering::Relaxed);
            }
        }

        if let Ok(term) = env::var("TERM") {
            // Terminals that implement the full protocol family even before
            // their responses arrive
            if term.contains("kitty") || term.contains("ghostty") {
                caps.rgb.store(true, Ordering::Relaxed);
                caps.synchronized_output.store(true, Ordering::Relaxed);
            }
            if term.contains("wezterm") || term.contains("foot") {
                caps.rgb.store(true, Ordering::Relaxed);
            }
        }

        caps
    }

    /// Whether the terminal speaks the Kitty keyboard protocol
    pub fn has_kitty_keyboard(&self) -> bool {
        self.kitty_keyboard.load(Ordering::Relaxed)
    }

    /// Whether the terminal speaks the Kitty graphics protocol
    pub fn has_kitty_graphics(&self) -> bool {
        self.kitty_graphics.load(Ordering::Relaxed)
    }

    /// Whether 24-bit SGR colors may be emitted
    pub fn has_rgb(&self) -> bool {
        self.rgb.load(Ordering::Relaxed)
    }

    /// Whether the terminal measures by grapheme cluster
    pub fn has_unicode_width(&self) -> bool {
        self.unicode_width.load(Ordering::Relaxed)
    }

    /// Whether pixel-precision SGR mouse mode is available
    pub fn has_sgr_pixels(&self) -> bool {
        self.sgr_pixels.load(Ordering::Relaxed)
    }

    /// Whether the synchronized update bracket is understood
    pub fn has_synchronized_output(&self) -> bool {
        self.synchronized_output.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caps_all_off() {
        let caps = Capabilities::default();
        assert!(!caps.has_kitty_keyboard());
        assert!(!caps.has_kitty_graphics());
        assert!(!caps.has_rgb());
        assert!(!caps.has_unicode_width());
        assert!(!caps.has_sgr_pixels());
        assert!(!caps.has_synchronized_output());
    }

    #[test]
    fn test_parser_discovery_overrides() {
        let caps = Capabilities::default();
        caps.kitty_keyboard.store(true, Ordering::Relaxed);
        caps.rgb.store(true, Ordering::Relaxed);
        assert!(caps.has_kitty_keyboard());
        assert!(caps.has_rgb());
    }
}
