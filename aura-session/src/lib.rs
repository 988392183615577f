//! Aura Session - playlist, source switching and configuration
//!
//! Ties the signal graph, the visualizer and the render loop together behind
//! the calls a front end makes: add tracks, pick a source, play, change theme.

mod config;
mod error;
mod playlist;
mod session;

pub use config::Config;
pub use error::SessionError;
pub use playlist::{Playlist, Track};
pub use session::{Session, SessionEvent};
