//! Terminal output for the command-line browser.
//!
//! Colors are used only on a TTY and when `NO_COLOR` is unset.

use std::io::{self, IsTerminal};

/// ANSI styles used by the CLI.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Styled printer for menus, game lists and game records.
#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Detects color support from the environment.
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();

        Self { colors_enabled }
    }

    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Wraps text in ANSI codes if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// Bracketed label like `[INFO]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        format!("[{}]", self.style(label, &[color, Style::Bold]))
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", self.label("INFO", Style::Blue), message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.label("OK", Style::Green), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    /// Error messages go to stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.label("ERROR", Style::Red), message);
    }

    /// Header of a menu category or a game record.
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", self.style(title, &[Style::Magenta, Style::Bold]));
    }

    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    pub fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }

    /// Prints an indented entry: a highlighted name followed by muted details.
    pub fn entry(&self, name: &str, details: &str) {
        if details.is_empty() {
            println!("  {}", self.style(name, &[Style::Bold]));
        } else {
            println!("  {} {}", self.style(name, &[Style::Bold]), self.muted(details));
        }
    }

    /// Prints a `key: value` line of a record.
    pub fn field(&self, key: &str, value: &str) {
        println!("  {} {}", self.style(&format!("{}:", key), &[Style::Cyan]), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_disabled() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("Mega Man 2", &[Style::Red]), "Mega Man 2");
    }

    #[test]
    fn test_style_enabled() {
        let console = Console::with_colors(true);
        let styled = console.style("Mega Man 2", &[Style::Bold, Style::Red]);
        assert_eq!(styled, "\x1b[1;31mMega Man 2\x1b[0m");
    }

    #[test]
    fn test_muted_and_count() {
        let console = Console::with_colors(false);
        assert_eq!(console.muted("(nes)"), "(nes)");
        assert_eq!(console.count(42), "42");

        let console = Console::with_colors(true);
        assert!(console.count(42).contains("32;1"));
    }

    #[test]
    fn test_label() {
        let console = Console::with_colors(false);
        assert_eq!(console.label("OK", Style::Green), "[OK]");
    }
}
