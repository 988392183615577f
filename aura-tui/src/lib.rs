//! Terminal UI for Aura - visualizer canvas, transport line and status bar

mod app;
mod theme;
pub mod widgets;

pub use app::{App, AppState, MessageType};
pub use theme::{to_terminal, Theme};
pub use widgets::{
    canvas_size, format_time, NowPlaying, Raster, StatusBarWidget, TransportWidget,
    VisualizerWidget,
};
