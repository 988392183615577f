//! Aura Audio - processing graph, audio context and decoding

mod capture;
mod context;
mod decoder;
mod device;
pub mod effects;
mod error;
mod graph;
mod source;

pub use capture::{capture_ring, CaptureProducer, CaptureReader, CAPTURE_RING_CAPACITY};
pub use context::{
    AudioContext, CapturePermission, ContextState, OfflineCapture, OfflineContext, Processor,
    SharedProcessor,
};
pub use decoder::{DecodedAudio, Decoder};
pub use device::{CpalCapture, CpalContext};
pub use error::{DecodeError, GraphError};
pub use graph::{FilterSettings, GraphEvent, NodeId, PlaybackState, SignalGraph};
pub use source::{AudioSource, FilePlayback, MediaFile, SourceKind};
