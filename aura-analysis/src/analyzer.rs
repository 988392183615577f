//! FFT analyzer tap for real-time visualization
//!
//! Mirrors the behaviour of a browser analyser node: the audio thread pushes
//! mono samples into a rolling window, readers pull byte-scaled frequency
//! magnitudes or time-domain samples from the most recent `fft_size` frames.

use parking_lot::Mutex;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Default transform size (1024 frequency bins)
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Default smoothing between successive frequency snapshots
pub const DEFAULT_SMOOTHING: f32 = 0.85;

/// Analyzer parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerConfig {
    /// Transform size, power of two (32 - 32768)
    pub fft_size: usize,
    /// Smoothing time constant (0.0 - 1.0)
    pub smoothing: f32,
    /// Magnitude mapped to byte 0
    pub min_decibels: f32,
    /// Magnitude mapped to byte 255
    pub max_decibels: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: DEFAULT_SMOOTHING,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyzerConfig {
    /// Clamp every field into its legal range
    pub fn sanitized(self) -> Self {
        let fft_size = self.fft_size.clamp(32, 32768).next_power_of_two().min(32768);
        let (min_decibels, max_decibels) = if self.min_decibels < self.max_decibels {
            (self.min_decibels, self.max_decibels)
        } else {
            (-100.0, -30.0)
        };
        Self {
            fft_size,
            smoothing: self.smoothing.clamp(0.0, 1.0),
            min_decibels,
            max_decibels,
        }
    }
}

struct AnalyzerCore {
    config: AnalyzerConfig,
    fft: Arc<dyn Fft<f32>>,
    /// Pre-computed Blackman window
    window: Vec<f32>,
    /// Rolling window of the last `fft_size` mono samples
    history: Vec<f32>,
    write_pos: usize,
    /// Smoothed linear magnitudes per bin
    smoothed: Vec<f32>,
    /// Pre-allocated FFT buffers to avoid allocation on read
    fft_buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    detached: bool,
}

impl AnalyzerCore {
    fn new(config: AnalyzerConfig) -> Self {
        let config = config.sanitized();
        let n = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        let scratch_len = fft.get_inplace_scratch_len();

        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();

        Self {
            config,
            fft,
            window,
            history: vec![0.0; n],
            write_pos: 0,
            smoothed: vec![0.0; n / 2],
            fft_buffer: vec![Complex::new(0.0, 0.0); n],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            detached: false,
        }
    }

    fn push(&mut self, samples: &[f32]) {
        let n = self.history.len();
        // Only the tail can survive a burst longer than the window
        let tail = &samples[samples.len().saturating_sub(n)..];
        for &s in tail {
            self.history[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % n;
        }
    }

    /// Iterate the window oldest-first
    fn ordered(&self) -> impl Iterator<Item = f32> + '_ {
        let (newer, older) = self.history.split_at(self.write_pos);
        older.iter().chain(newer.iter()).copied()
    }

    fn update_magnitudes(&mut self) {
        let n = self.config.fft_size;
        let (newer, older) = self.history.split_at(self.write_pos);
        for ((slot, &s), &w) in self
            .fft_buffer
            .iter_mut()
            .zip(older.iter().chain(newer.iter()))
            .zip(self.window.iter())
        {
            *slot = Complex::new(s * w, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        let tau = self.config.smoothing;
        let scale = 1.0 / n as f32;
        for (prev, bin) in self.smoothed.iter_mut().zip(self.fft_buffer.iter()) {
            let magnitude = bin.norm() * scale;
            let next = tau * *prev + (1.0 - tau) * magnitude;
            *prev = if next.is_finite() { next } else { 0.0 };
        }
    }

    fn byte_frequency(&mut self, out: &mut [u8]) {
        if self.detached {
            out.fill(0);
            return;
        }
        self.update_magnitudes();

        let min_db = self.config.min_decibels;
        let range = self.config.max_decibels - min_db;
        let bins = self.smoothed.len();
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = if i < bins {
                let magnitude = self.smoothed[i];
                if magnitude <= 0.0 {
                    0
                } else {
                    let db = 20.0 * magnitude.log10();
                    (255.0 / range * (db - min_db)).clamp(0.0, 255.0) as u8
                }
            } else {
                0
            };
        }
    }

    fn byte_time_domain(&self, out: &mut [u8]) {
        if self.detached {
            out.fill(0);
            return;
        }
        let mut samples = self.ordered();
        for byte in out.iter_mut() {
            *byte = match samples.next() {
                Some(s) => (128.0 * (1.0 + s)).clamp(0.0, 255.0) as u8,
                None => 0,
            };
        }
    }
}

/// Shared handle to an analyzer tap
///
/// Clones point at the same analysis state. The audio thread writes through
/// [`Analyzer::push_samples`], the render tick reads through the byte getters.
#[derive(Clone)]
pub struct Analyzer {
    inner: Arc<Mutex<AnalyzerCore>>,
    fft_size: usize,
}

impl Analyzer {
    /// Create a new analyzer
    pub fn new(config: AnalyzerConfig) -> Self {
        let core = AnalyzerCore::new(config);
        let fft_size = core.config.fft_size;
        Self {
            inner: Arc::new(Mutex::new(core)),
            fft_size,
        }
    }

    /// Transform size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins (half the transform size)
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Push mono samples from the audio thread
    ///
    /// Never blocks: if a reader holds the lock, the block is skipped.
    pub fn push_samples(&self, samples: &[f32]) {
        if let Some(mut core) = self.inner.try_lock() {
            if !core.detached {
                core.push(samples);
            }
        }
    }

    /// Fill `out` with smoothed frequency magnitudes (0 - 255)
    pub fn byte_frequency_data(&self, out: &mut [u8]) {
        self.inner.lock().byte_frequency(out);
    }

    /// Fill `out` with time-domain samples (128 = zero crossing)
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        self.inner.lock().byte_time_domain(out);
    }

    /// Disconnect from the chain; subsequent reads return silence
    pub fn detach(&self) {
        let mut core = self.inner.lock();
        core.detached = true;
        core.history.fill(0.0);
        core.smoothed.fill(0.0);
        core.write_pos = 0;
    }

    /// Whether this analyzer has been torn down
    pub fn is_detached(&self) -> bool {
        self.inner.lock().detached
    }

    /// Whether two handles refer to the same analyzer
    pub fn same_as(&self, other: &Analyzer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
