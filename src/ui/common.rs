use crossterm::style::Color;
use std::io::IsTerminal;

/// Kind of console line, which decides its color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Banner,
    Separator,
    Header,
    Success,
    Error,
    Notice,
}

// Helper function to get color for a line kind
pub fn get_line_color(kind: LineKind) -> Color {
    match kind {
        LineKind::Banner | LineKind::Separator => Color::Cyan,
        LineKind::Header => Color::Yellow,
        LineKind::Success => Color::Green,
        LineKind::Error => Color::Red,
        LineKind::Notice => Color::Yellow,
    }
}

/// Console styling decided once at startup and handed to the renderer
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub color: bool,
}

impl RenderContext {
    /// Colors only when stdout is an interactive terminal
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() {
            Self { color: true }
        } else {
            Self::plain()
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }
}
