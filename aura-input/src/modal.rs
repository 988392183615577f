//! Modal keyboard handling: single keys in normal mode, `:` command lines

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::commands::{Band, Command, Mode, VisualizerMode};

/// Tone step per key press in dB
const FILTER_STEP_DB: f32 = 1.0;
/// Volume step per key press
const VOLUME_STEP: f32 = 0.05;
/// Seek step for the arrow keys in seconds
const SEEK_STEP_SECS: f64 = 5.0;

/// Handles keyboard input and converts to commands
pub struct InputHandler {
    mode: Mode,
    command_buffer: String,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            command_buffer: String::new(),
        }
    }

    /// Get current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Get current command buffer (for display)
    pub fn command_buffer(&self) -> &str {
        &self.command_buffer
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Command::Quit);
        }
        match self.mode {
            Mode::Normal => self.handle_normal_mode(key),
            Mode::Command => self.handle_command_mode(key),
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.command_buffer.clear();
                Some(Command::EnterCommandMode)
            }
            KeyCode::Esc => Some(Command::Quit),

            // Playback
            KeyCode::Char(' ') => Some(Command::TogglePlay),
            KeyCode::Char('n') => Some(Command::NextTrack),
            KeyCode::Left => Some(Command::Seek(-SEEK_STEP_SECS)),
            KeyCode::Right => Some(Command::Seek(SEEK_STEP_SECS)),
            KeyCode::Char('m') => Some(Command::UseMicrophone),

            // Render modes
            KeyCode::Char('1') => Some(Command::SetMode(VisualizerMode::Bars)),
            KeyCode::Char('2') => Some(Command::SetMode(VisualizerMode::Wave)),
            KeyCode::Char('3') => Some(Command::SetMode(VisualizerMode::Circular)),
            KeyCode::Char('4') => Some(Command::SetMode(VisualizerMode::Particles)),
            KeyCode::Char('t') => Some(Command::NextPreset),

            // Tone controls (upper row raises, home row lowers)
            KeyCode::Char('q') => Some(Command::AdjustFilter(Band::Bass, FILTER_STEP_DB)),
            KeyCode::Char('a') => Some(Command::AdjustFilter(Band::Bass, -FILTER_STEP_DB)),
            KeyCode::Char('w') => Some(Command::AdjustFilter(Band::Mid, FILTER_STEP_DB)),
            KeyCode::Char('s') => Some(Command::AdjustFilter(Band::Mid, -FILTER_STEP_DB)),
            KeyCode::Char('e') => Some(Command::AdjustFilter(Band::Treble, FILTER_STEP_DB)),
            KeyCode::Char('d') => Some(Command::AdjustFilter(Band::Treble, -FILTER_STEP_DB)),
            KeyCode::Char('0') => Some(Command::ResetFilters),

            // Volume
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::AdjustVolume(VOLUME_STEP)),
            KeyCode::Char('-') => Some(Command::AdjustVolume(-VOLUME_STEP)),

            _ => None,
        }
    }

    fn handle_command_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Enter => {
                let cmd = self.parse_command();
                self.mode = Mode::Normal;
                self.command_buffer.clear();
                Some(cmd)
            }
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_buffer.clear();
                Some(Command::EnterNormalMode)
            }
            KeyCode::Backspace => {
                self.command_buffer.pop();
                if self.command_buffer.is_empty() {
                    self.mode = Mode::Normal;
                    Some(Command::EnterNormalMode)
                } else {
                    None
                }
            }
            KeyCode::Char(c) => {
                self.command_buffer.push(c);
                None
            }
            _ => None,
        }
    }

    fn parse_command(&self) -> Command {
        let input = self.command_buffer.trim();
        let (name, rest) = match input.split_once(' ') {
            Some((name, rest)) => (name, rest.trim()),
            None => (input, ""),
        };

        let parsed = match name {
            "q" | "quit" => Some(Command::Quit),
            "mic" => Some(Command::UseMicrophone),
            "next" => Some(Command::NextTrack),
            "open" | "add" if !rest.is_empty() => Some(Command::AddTrack(unquote(rest).into())),
            "preset" if !rest.is_empty() => Some(Command::SetPreset(rest.to_string())),
            "mode" => VisualizerMode::from_name(rest).map(Command::SetMode),
            "color" => rest.split_once(' ').and_then(|(index, hex)| {
                let index = index.parse().ok()?;
                Some(Command::SetColor(index, hex.trim().to_string()))
            }),
            "bg" => match rest {
                "" | "none" => Some(Command::SetBackgroundImage(None)),
                path => Some(Command::SetBackgroundImage(Some(unquote(path).to_string()))),
            },
            "speed" => rest
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Command::SetSpeed),
            "seek" => rest
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Command::Seek),
            _ => None,
        };
        parsed.unwrap_or_else(|| Command::Unknown(input.to_string()))
    }
}

/// Strip one pair of matching quotes
fn unquote(s: &str) -> &str {
    let quoted = s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')));
    if quoted {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
