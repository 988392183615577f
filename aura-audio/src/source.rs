//! Audio sources feeding the head of the chain

use std::path::PathBuf;
use std::sync::Arc;

/// Media that can be opened as a file source
#[derive(Debug, Clone)]
pub enum MediaFile {
    /// Decoded on open
    Path(PathBuf),
    /// Already decoded interleaved samples in any layout
    Decoded {
        name: String,
        samples: Arc<Vec<f32>>,
        sample_rate: u32,
        channels: u16,
    },
}

impl MediaFile {
    /// Display name of the media
    pub fn name(&self) -> String {
        match self {
            MediaFile::Path(path) => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string(),
            MediaFile::Decoded { name, .. } => name.clone(),
        }
    }
}

/// Source the graph is opened with
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Finite, seekable decoded media
    File(MediaFile),
    /// Infinite device capture, never routed to the output
    LiveCapture,
}

impl AudioSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            AudioSource::File(_) => SourceKind::File,
            AudioSource::LiveCapture => SourceKind::LiveCapture,
        }
    }
}

/// Kind of the source currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    LiveCapture,
}

/// Playback cursor over a decoded stereo buffer
pub struct FilePlayback {
    samples: Arc<Vec<f32>>,
    /// Length in samples, rounded down to whole frames
    end: usize,
    position: usize,
    playing: bool,
    /// Element-level volume (0.0 - 1.0)
    volume: f32,
    sample_rate: u32,
}

impl FilePlayback {
    pub fn new(samples: Arc<Vec<f32>>, sample_rate: u32) -> Self {
        let end = samples.len() - samples.len() % 2;
        Self {
            samples,
            end,
            position: 0,
            playing: false,
            volume: 1.0,
            sample_rate,
        }
    }

    /// Start playing; a finished track restarts from the top
    pub fn play(&mut self) {
        if self.position >= self.end {
            self.position = 0;
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Seek to a position in seconds (clamped to the track)
    ///
    /// NaN is ignored; positive infinity lands on the end of the track.
    pub fn seek(&mut self, seconds: f64) {
        if seconds.is_nan() {
            return;
        }
        let seconds = seconds.max(0.0).min(self.duration_secs());
        let frame = (seconds * self.sample_rate as f64) as usize;
        self.position = frame.saturating_mul(2).min(self.end);
    }

    pub fn position_secs(&self) -> f64 {
        (self.position / 2) as f64 / self.sample_rate as f64
    }

    pub fn duration_secs(&self) -> f64 {
        (self.end / 2) as f64 / self.sample_rate as f64
    }

    /// Fill a stereo block; returns true exactly once, on the block the track ends in
    pub fn read(&mut self, out: &mut [f32]) -> bool {
        if !self.playing {
            out.fill(0.0);
            return false;
        }

        let available = self.end - self.position;
        let n = available.min(out.len());
        for (o, &s) in out[..n]
            .iter_mut()
            .zip(&self.samples[self.position..self.position + n])
        {
            *o = s * self.volume;
        }
        out[n..].fill(0.0);
        self.position += n;

        if self.position >= self.end {
            self.playing = false;
            return true;
        }
        false
    }
}
