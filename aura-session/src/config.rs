//! Simple configuration persistence for Aura
//!
//! Stores analyzer, frame rate, volume, theme and particle tunables.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use aura_analysis::AnalyzerConfig;
use aura_render::ParticleConfig;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    /// Frames per second while rendering (1 - 240)
    pub frame_rate: u32,
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
    /// Name of the theme preset to start with
    pub preset: Option<String>,
    pub particle_count: usize,
    pub particle_pump_scale: f32,
    pub particle_bass_bins: usize,
    pub particle_link_distance: f32,
    pub particle_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        let analyzer = AnalyzerConfig::default();
        let particles = ParticleConfig::default();
        Self {
            fft_size: analyzer.fft_size,
            smoothing: analyzer.smoothing,
            min_decibels: analyzer.min_decibels,
            max_decibels: analyzer.max_decibels,
            frame_rate: 60,
            volume: 1.0,
            preset: None,
            particle_count: particles.count,
            particle_pump_scale: particles.pump_scale,
            particle_bass_bins: particles.bass_bins,
            particle_link_distance: particles.link_distance,
            particle_seed: particles.seed,
        }
    }
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aura")
            .join("config.txt")
    }

    /// Analyzer parameters (sanitized)
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            fft_size: self.fft_size,
            smoothing: self.smoothing,
            min_decibels: self.min_decibels,
            max_decibels: self.max_decibels,
        }
        .sanitized()
    }

    pub fn particle_config(&self) -> ParticleConfig {
        ParticleConfig {
            count: self.particle_count,
            pump_scale: self.particle_pump_scale,
            bass_bins: self.particle_bass_bins,
            link_distance: self.particle_link_distance,
            seed: self.particle_seed,
        }
    }

    /// Parse config from simple key=value format
    ///
    /// Unknown keys and unparsable values are ignored, keeping the defaults.
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "fft_size" => set(&mut config.fft_size, value),
                "smoothing" => set(&mut config.smoothing, value),
                "min_decibels" => set(&mut config.min_decibels, value),
                "max_decibels" => set(&mut config.max_decibels, value),
                "frame_rate" => set(&mut config.frame_rate, value),
                "volume" => set(&mut config.volume, value),
                "preset" => {
                    if !value.is_empty() {
                        config.preset = Some(value.to_string());
                    }
                }
                "particle_count" => set(&mut config.particle_count, value),
                "particle_pump_scale" => set(&mut config.particle_pump_scale, value),
                "particle_bass_bins" => set(&mut config.particle_bass_bins, value),
                "particle_link_distance" => set(&mut config.particle_link_distance, value),
                "particle_seed" => set(&mut config.particle_seed, value),
                _ => {} // Ignore unknown keys
            }
        }

        config.frame_rate = config.frame_rate.clamp(1, 240);
        config.volume = config.volume.clamp(0.0, 1.0);
        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        let mut lines = vec![
            "# Aura Configuration".to_string(),
            format!("fft_size={}", self.fft_size),
            format!("smoothing={}", self.smoothing),
            format!("min_decibels={}", self.min_decibels),
            format!("max_decibels={}", self.max_decibels),
            format!("frame_rate={}", self.frame_rate),
            format!("volume={}", self.volume),
        ];
        if let Some(ref preset) = self.preset {
            lines.push(format!("preset={}", preset));
        }
        lines.push(format!("particle_count={}", self.particle_count));
        lines.push(format!("particle_pump_scale={}", self.particle_pump_scale));
        lines.push(format!("particle_bass_bins={}", self.particle_bass_bins));
        lines.push(format!("particle_link_distance={}", self.particle_link_distance));
        lines.push(format!("particle_seed={}", self.particle_seed));

        lines.join("\n")
    }
}

fn set<T: std::str::FromStr>(slot: &mut T, value: &str) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => tracing::warn!(value, "ignoring unparsable config value"),
    }
}
