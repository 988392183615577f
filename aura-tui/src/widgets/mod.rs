//! UI Widgets for Aura

mod canvas;
pub mod status_bar;
mod transport;

pub use canvas::{canvas_size, Raster, RasterCell, VisualizerWidget};
pub use status_bar::StatusBarWidget;
pub use transport::{format_time, NowPlaying, TransportWidget};
