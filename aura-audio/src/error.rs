//! Error types for the processing graph

use thiserror::Error;

/// Errors surfaced by the signal graph and the audio context
///
/// Every variant is recoverable: the caller retries, picks another source, or
/// waits for the next user gesture.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Capture device access was denied")]
    PermissionDenied,
    #[error("Could not decode source: {0}")]
    DecodeFailed(String),
    #[error("No source is open")]
    GraphUnavailable,
    #[error("Playback was blocked until the next user gesture")]
    PlaybackBlocked,
    #[error("No audio output device found")]
    NoOutputDevice,
    #[error("Audio device error: {0}")]
    Device(String),
}

/// Errors that can occur while decoding a media file
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<DecodeError> for GraphError {
    fn from(err: DecodeError) -> Self {
        GraphError::DecodeFailed(err.to_string())
    }
}
