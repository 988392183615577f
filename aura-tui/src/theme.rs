//! Chrome colors for the terminal UI, derived from the visualizer theme

use aura_render::{Color as RgbaColor, ThemeState};
use ratatui::style::{Color, Modifier, Style};

/// Convert a visualizer color to a terminal color (alpha ignored)
pub fn to_terminal(color: RgbaColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Theme configuration for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary foreground color (text)
    pub fg: Color,
    /// Dimmed foreground (secondary text)
    pub fg_dim: Color,
    /// Background color
    pub bg: Color,
    /// Highlight color (active elements)
    pub highlight: Color,
    /// Accent color (values, command line)
    pub accent: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Theme {
    /// Chrome that matches the palette the visualizer is drawing with
    pub fn from_state(state: &ThemeState) -> Self {
        let fg = state.palette.get(0);
        Self {
            fg: to_terminal(fg),
            fg_dim: to_terminal(state.background.lerp(fg, 0.5)),
            bg: to_terminal(state.background),
            highlight: to_terminal(state.palette.get(2)),
            accent: to_terminal(state.palette.get(1)),
            warning: Color::Rgb(255, 255, 0),
            danger: Color::Rgb(255, 50, 50),
        }
    }

    /// Get style for normal text
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Get style for dimmed text
    pub fn dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    /// Get style for highlighted items
    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent).bg(self.bg)
    }

    /// Get title style
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_state(&ThemeState::default())
    }
}
