//! Aura Render - themes, render modes and the frame loop
//!
//! Modes draw through the [`Surface`] trait; [`CommandList`] records a frame
//! for the terminal front end and for tests.

mod color;
mod error;
pub mod modes;
mod render_loop;
mod surface;
mod theme;
mod visualizer;

pub use color::{Color, Palette};
pub use error::ThemeError;
pub use modes::{
    BarsMode, CircularMode, Particle, ParticleConfig, ParticleField, RenderMode, WaveMode,
    Xorshift64,
};
pub use render_loop::{
    FrameHandle, FrameScheduler, IntervalScheduler, LoopState, ManualScheduler, RenderLoop,
};
pub use surface::{CanvasSize, CommandList, DrawCommand, Glow, Paint, Point, Stroke, Surface};
pub use theme::{
    presets, ThemeProvider, ThemeState, ThemeSuggestion, VisualizerMode, CUSTOM_THEME_NAME,
    DEFAULT_BACKGROUND, SPEED_RANGE,
};
pub use visualizer::{ActiveMode, Visualizer, IMAGE_OVERLAY, PARTICLE_TRAIL_ALPHA};
