use std::fmt;
use std::io::{self, IsTerminal, Write};

/// Color of the text cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorColor {
    /// Whatever the terminal uses when no color was set
    TerminalDefault,
    /// A named or `#rrggbb` color
    Named(String),
}

impl fmt::Display for CursorColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorColor::TerminalDefault => write!(f, "default"),
            CursorColor::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Reads and changes the cursor color
pub trait CursorPainter {
    fn current_color(&self) -> CursorColor;

    fn set_color(&mut self, color: &CursorColor);
}

/// Cursor color via OSC 12 (set) and OSC 112 (reset) escape sequences
/// Terminals cannot be queried portably, so the current color is the
/// last one this painter applied
pub struct TerminalCursor {
    current: CursorColor,
}

impl TerminalCursor {
    pub fn new() -> Self {
        TerminalCursor {
            current: CursorColor::TerminalDefault,
        }
    }

    fn escape_for(color: &CursorColor) -> String {
        match color {
            CursorColor::TerminalDefault => "\x1b]112\x07".to_string(),
            CursorColor::Named(name) => format!("\x1b]12;{}\x07", name),
        }
    }
}

impl Default for TerminalCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorPainter for TerminalCursor {
    fn current_color(&self) -> CursorColor {
        self.current.clone()
    }

    fn set_color(&mut self, color: &CursorColor) {
        let stderr = io::stderr();
        if stderr.is_terminal() {
            let mut err = stderr.lock();
            let _ = err.write_all(Self::escape_for(color).as_bytes());
            let _ = err.flush();
        } else {
            log::trace!("stderr is not a terminal, cursor color {} not sent", color);
        }
        self.current = color.clone();
    }
}
