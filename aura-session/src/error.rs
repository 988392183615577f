//! Session error types

use aura_audio::GraphError;
use aura_render::ThemeError;
use thiserror::Error;

/// Errors surfaced to the presentation layer; all are recoverable
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error("no track with id {0}")]
    NoSuchTrack(u64),

    #[error("playlist is empty")]
    EmptyPlaylist,
}
