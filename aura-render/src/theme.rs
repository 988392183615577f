//! Visual themes: palette, background, render mode and pacing

use std::fmt;

use crate::color::{Color, Palette};
use crate::error::ThemeError;

/// The four rendering algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisualizerMode {
    #[default]
    Bars,
    Wave,
    Circular,
    Particles,
}

impl VisualizerMode {
    pub const ALL: [VisualizerMode; 4] = [
        VisualizerMode::Bars,
        VisualizerMode::Wave,
        VisualizerMode::Circular,
        VisualizerMode::Particles,
    ];

    /// Parse an external mode name (`BARS`, `WAVE`, `CIRCLE`, `PARTICLES`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "BARS" => Some(VisualizerMode::Bars),
            "WAVE" => Some(VisualizerMode::Wave),
            "CIRCLE" | "CIRCULAR" => Some(VisualizerMode::Circular),
            "PARTICLES" => Some(VisualizerMode::Particles),
            _ => None,
        }
    }

    /// External name of the mode
    pub fn name(&self) -> &'static str {
        match self {
            VisualizerMode::Bars => "BARS",
            VisualizerMode::Wave => "WAVE",
            VisualizerMode::Circular => "CIRCLE",
            VisualizerMode::Particles => "PARTICLES",
        }
    }
}

impl fmt::Display for VisualizerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Allowed range of the pacing scalar
pub const SPEED_RANGE: (f32, f32) = (0.5, 2.0);

/// Palette, background, mode and pacing the renderer reads every frame
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeState {
    pub name: String,
    pub palette: Palette,
    pub background: Color,
    /// Location of a background image; when set the frame is drawn over it
    pub background_image: Option<String>,
    pub mode: VisualizerMode,
    speed: f32,
}

impl ThemeState {
    pub fn new(
        name: impl Into<String>,
        palette: Palette,
        background: Color,
        mode: VisualizerMode,
        speed: f32,
    ) -> Self {
        let mut theme = Self {
            name: name.into(),
            palette,
            background,
            background_image: None,
            mode,
            speed: 1.0,
        };
        theme.set_speed(speed);
        theme
    }

    /// Look up a built-in preset by name (case-insensitive)
    pub fn preset(name: &str) -> Option<Self> {
        presets()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Build a theme from an external suggestion
    ///
    /// The result gets the default background, no image and normal speed.
    /// Unknown mode names fall back to bars.
    pub fn from_suggestion(suggestion: &ThemeSuggestion) -> Result<Self, ThemeError> {
        let palette = Palette::from_hex(&suggestion.palette)?;
        let mode = VisualizerMode::from_name(&suggestion.mode).unwrap_or_else(|| {
            tracing::debug!(mode = %suggestion.mode, "unknown suggested mode, using bars");
            VisualizerMode::Bars
        });
        Ok(Self::new(
            suggestion.name.clone(),
            palette,
            DEFAULT_BACKGROUND,
            mode,
            1.0,
        ))
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Set pacing (clamped to 0.5 - 2.0)
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = if speed.is_nan() {
            1.0
        } else {
            speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1)
        };
    }

    /// Replace one palette entry; the theme becomes a custom theme
    pub fn set_color(&mut self, index: usize, hex: &str) -> Result<(), ThemeError> {
        let color = Color::from_hex(hex)?;
        if !self.palette.set(index, color) {
            return Err(ThemeError::InvalidColor(format!("no palette entry {}", index)));
        }
        self.name = CUSTOM_THEME_NAME.to_string();
        Ok(())
    }
}

impl Default for ThemeState {
    fn default() -> Self {
        cyberpunk_default()
    }
}

/// Name a theme takes after a manual palette edit
pub const CUSTOM_THEME_NAME: &str = "Custom Theme";

/// Background given to suggested themes
pub const DEFAULT_BACKGROUND: Color = Color::rgb(0x05, 0x05, 0x05);

fn palette(hex: [u32; 5]) -> Palette {
    Palette::new(
        hex.iter()
            .map(|&v| Color::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8))
            .collect(),
    )
}

fn cyberpunk_default() -> ThemeState {
    ThemeState::new(
        "Cyberpunk Default",
        palette([0x00f2ff, 0x00c3ff, 0xff00e6, 0x8000ff, 0x290038]),
        DEFAULT_BACKGROUND,
        VisualizerMode::Bars,
        1.0,
    )
}

/// Built-in themes in display order
pub fn presets() -> Vec<ThemeState> {
    vec![
        cyberpunk_default(),
        ThemeState::new(
            "Oceanic Calm",
            palette([0x0077be, 0x0096c7, 0x48cae4, 0x90e0ef, 0xcaf0f8]),
            Color::rgb(0x00, 0x12, 0x19),
            VisualizerMode::Wave,
            0.6,
        ),
        ThemeState::new(
            "Fiery Energy",
            palette([0xff0000, 0xff4d00, 0xff7400, 0xff9a00, 0xffc100]),
            Color::rgb(0x1a, 0x05, 0x00),
            VisualizerMode::Circular,
            1.4,
        ),
    ]
}

/// Theme proposal returned by a suggestion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSuggestion {
    pub name: String,
    /// Five hex colors
    pub palette: Vec<String>,
    /// `BARS`, `WAVE`, `CIRCLE` or `PARTICLES`
    pub mode: String,
    pub vibe_description: String,
}

/// External collaborator that turns a free-text description into a theme
pub trait ThemeProvider {
    fn suggest(&mut self, description: &str) -> Result<ThemeSuggestion, ThemeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let presets = presets();
        assert_eq!(presets.len(), 3);
        assert!(presets.iter().all(|p| p.palette.len() == 5));
        assert_eq!(presets[1].mode, VisualizerMode::Wave);
        assert!((presets[2].speed() - 1.4).abs() < 1e-6);
        assert_eq!(presets[2].background.to_string(), "#1a0500");
    }

    #[test]
    fn test_preset_lookup() {
        let theme = ThemeState::preset("oceanic calm").unwrap();
        assert_eq!(theme.palette.get(0).to_string(), "#0077be");
        assert!(ThemeState::preset("nope").is_none());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(VisualizerMode::from_name("circle"), Some(VisualizerMode::Circular));
        assert_eq!(VisualizerMode::from_name("PARTICLES"), Some(VisualizerMode::Particles));
        assert_eq!(VisualizerMode::from_name("ORB"), None);
        for mode in VisualizerMode::ALL {
            assert_eq!(VisualizerMode::from_name(mode.name()), Some(mode));
        }
    }

    #[test]
    fn test_from_suggestion() {
        let suggestion = ThemeSuggestion {
            name: "Midnight Rain".to_string(),
            palette: vec!["#111111", "#222222", "#333333", "#444444", "#555555"]
                .into_iter()
                .map(String::from)
                .collect(),
            mode: "SPIRAL".to_string(),
            vibe_description: "wet neon".to_string(),
        };
        let theme = ThemeState::from_suggestion(&suggestion).unwrap();
        assert_eq!(theme.name, "Midnight Rain");
        assert_eq!(theme.mode, VisualizerMode::Bars);
        assert_eq!(theme.background, DEFAULT_BACKGROUND);
        assert!(theme.background_image.is_none());
        assert_eq!(theme.speed(), 1.0);
    }

    #[test]
    fn test_suggestion_with_bad_color_rejected() {
        let suggestion = ThemeSuggestion {
            name: "Broken".to_string(),
            palette: vec!["#zzzzzz".to_string()],
            mode: "WAVE".to_string(),
            vibe_description: String::new(),
        };
        assert!(matches!(
            ThemeState::from_suggestion(&suggestion),
            Err(ThemeError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_set_color_renames() {
        let mut theme = ThemeState::default();
        theme.set_color(2, "#abcdef").unwrap();
        assert_eq!(theme.name, CUSTOM_THEME_NAME);
        assert_eq!(theme.palette.get(2), Color::rgb(0xab, 0xcd, 0xef));

        let mut untouched = ThemeState::default();
        assert!(untouched.set_color(9, "#abcdef").is_err());
        assert_eq!(untouched.name, "Cyberpunk Default");
    }

    #[test]
    fn test_speed_clamped() {
        let mut theme = ThemeState::default();
        theme.set_speed(5.0);
        assert_eq!(theme.speed(), 2.0);
        theme.set_speed(0.1);
        assert_eq!(theme.speed(), 0.5);
    }
}
