//! Modal keyboard input handling for Aura

mod commands;
mod modal;

pub use commands::{Band, Command, Mode};
pub use modal::InputHandler;
