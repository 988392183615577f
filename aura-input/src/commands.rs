//! Command definitions for Aura

use std::path::PathBuf;

pub use aura_render::VisualizerMode;

/// Input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Command,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Command => "COMMAND",
        }
    }
}

/// Tone control band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Bass,
    Mid,
    Treble,
}

/// Commands that can be dispatched from input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Playback
    TogglePlay,
    NextTrack,
    Seek(f64), // Relative, in seconds

    // Sources
    UseMicrophone,
    AddTrack(PathBuf),

    // Tone and level
    AdjustFilter(Band, f32), // dB step
    ResetFilters,
    AdjustVolume(f32),

    // Theme
    SetMode(VisualizerMode),
    NextPreset,
    SetPreset(String),
    SetColor(usize, String), // palette index, hex
    SetBackgroundImage(Option<String>),
    SetSpeed(f32),

    // Mode changes
    EnterCommandMode,
    EnterNormalMode,

    // Application
    Quit,

    // Command mode line that did not parse
    Unknown(String),
}
