// Report colours
//
// Values are cyan, secondary values faint cyan, pass/fail glyphs green/red.
// Only the `enabled` flag decides whether escape sequences are written;
// terminal detection and NO_COLOR are the caller's business.

use colored::Color;

/// SGR parameter for faint text
const FAINT: &str = "2";
const RESET: &str = "\u{1b}[0m";

/// Styling applied to report fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Palette that never emits escape sequences
    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Primary value
    pub fn value(&self, text: &str) -> String {
        self.paint(text, Color::Cyan, false)
    }

    /// Secondary value, e.g. rates next to totals
    pub fn muted(&self, text: &str) -> String {
        self.paint(text, Color::Cyan, true)
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, Color::Green, false)
    }

    pub fn failure(&self, text: &str) -> String {
        self.paint(text, Color::Red, false)
    }

    /// `✓` in the success colour or `✗` in the failure colour
    pub fn glyph(&self, passed: bool) -> String {
        if passed {
            self.success("✓")
        } else {
            self.failure("✗")
        }
    }

    fn paint(&self, text: &str, color: Color, faint: bool) -> String {
        if !self.enabled {
            return text.to_string();
        }
        if faint {
            format!("\u{1b}[{FAINT};{}m{text}{RESET}", color.to_fg_str())
        } else {
            format!("\u{1b}[{}m{text}{RESET}", color.to_fg_str())
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::plain()
    }
}
