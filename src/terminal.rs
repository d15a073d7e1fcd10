//! Terminal capability detection and utilities

use owo_colors::{OwoColorize, colors::css};

/// Widest delimiter line drawn between batch entries.
pub const MAX_DELIMITER_WIDTH: usize = 72;

/// Detects whether colored output should be enabled
#[must_use]
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Detects terminal width, returning None if not available
#[must_use]
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Width of delimiter lines: the terminal width, capped at
/// [`MAX_DELIMITER_WIDTH`].
#[must_use]
pub fn delimiter_width() -> usize {
    terminal_width().map_or(MAX_DELIMITER_WIDTH, |w| {
        usize::from(w).min(MAX_DELIMITER_WIDTH)
    })
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as error (red)
    fn error(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        self.fg::<css::Green>().to_string()
    }

    fn warning(&self) -> String {
        self.fg::<css::Orange>().to_string()
    }

    fn error(&self) -> String {
        self.fg::<css::Red>().to_string()
    }

    fn dim(&self) -> String {
        self.dimmed().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_never_exceeds_cap() {
        assert!(delimiter_width() <= MAX_DELIMITER_WIDTH);
    }

    #[test]
    fn colorize_keeps_text() {
        assert!("done".success().contains("done"));
        assert!("careful".warning().contains("careful"));
        assert!("broken".error().contains("broken"));
        assert!("quiet".dim().contains("quiet"));
    }
}
