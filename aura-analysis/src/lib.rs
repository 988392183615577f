//! Audio analysis module for Aura
//!
//! Provides the analyzer tap that sits at the end of the processing chain
//! and the per-frame sampler the render loop reads snapshots through.

mod analyzer;
mod sampler;

pub use analyzer::{Analyzer, AnalyzerConfig, DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING};
pub use sampler::{FrameSampler, SampleBuffer, SampleKind, TIME_DOMAIN_CENTER};
