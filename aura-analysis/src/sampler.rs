//! Per-frame sampling of the analyzer into a reusable buffer

use crate::analyzer::Analyzer;

/// Time-domain byte value of a zero crossing
pub const TIME_DOMAIN_CENTER: u8 = 128;

/// Which snapshot the active render mode needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleKind {
    /// Frequency magnitudes, 0 - 255 per bin
    #[default]
    Frequency,
    /// Time-domain samples centered at 128
    TimeDomain,
}

/// Fixed-length snapshot reused across frames
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    data: Vec<u8>,
    kind: SampleKind,
}

impl SampleBuffer {
    /// Create a zero-filled buffer
    pub fn zeroed(len: usize, kind: SampleKind) -> Self {
        Self {
            data: vec![0; len],
            kind,
        }
    }

    /// Wrap existing samples
    pub fn from_samples(data: Vec<u8>, kind: SampleKind) -> Self {
        Self { data, kind }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Mean of the first `count` samples (0 when empty)
    pub fn mean_of_first(&self, count: usize) -> f32 {
        let n = count.min(self.data.len());
        if n == 0 {
            return 0.0;
        }
        let sum: u32 = self.data[..n].iter().map(|&v| v as u32).sum();
        sum as f32 / n as f32
    }
}

/// Pulls one snapshot per frame from the analyzer
///
/// The buffer is resized only when the analyzer's bin count changes. A second
/// request for the same kind within one frame returns the cached snapshot
/// instead of advancing the analyzer's smoothing again.
pub struct FrameSampler {
    buffer: SampleBuffer,
    frame: u64,
    last_read: Option<(u64, SampleKind)>,
    reallocations: usize,
}

impl FrameSampler {
    /// Create a sampler with an initial buffer length (usually the bin count)
    pub fn new(initial_len: usize) -> Self {
        Self {
            buffer: SampleBuffer::zeroed(initial_len, SampleKind::Frequency),
            frame: 0,
            last_read: None,
            reallocations: 0,
        }
    }

    /// Mark the start of a new animation frame
    pub fn begin_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    /// Current frame counter
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of times the buffer had to be reallocated
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    /// Last snapshot taken
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Fill the reusable buffer from `analyzer`
    ///
    /// With no analyzer the buffer keeps its last-known length and is zeroed;
    /// silence is a normal state, not an error.
    pub fn sample(&mut self, kind: SampleKind, analyzer: Option<&Analyzer>) -> &SampleBuffer {
        if self.last_read == Some((self.frame, kind)) {
            return &self.buffer;
        }
        self.buffer.kind = kind;

        match analyzer {
            Some(analyzer) => {
                let bins = analyzer.frequency_bin_count();
                if self.buffer.data.len() != bins {
                    tracing::debug!(from = self.buffer.data.len(), to = bins, "resizing sample buffer");
                    self.buffer.data = vec![0; bins];
                    self.reallocations += 1;
                }
                match kind {
                    SampleKind::Frequency => analyzer.byte_frequency_data(&mut self.buffer.data),
                    SampleKind::TimeDomain => analyzer.byte_time_domain_data(&mut self.buffer.data),
                }
            }
            None => self.buffer.data.fill(0),
        }

        self.last_read = Some((self.frame, kind));
        &self.buffer
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(crate::analyzer::DEFAULT_FFT_SIZE / 2)
    }
}
