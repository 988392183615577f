//! Signal graph: Source → Bass → Mid → Treble → Gain → Analyzer → (Destination)
//!
//! The graph is rebuilt from scratch for every source. The hardware context
//! underneath is injected and outlives every chain built on top of it: closing
//! a chain only suspends the context, it never releases it.

use aura_analysis::{Analyzer, AnalyzerConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::capture::CaptureReader;
use crate::context::{AudioContext, Processor, SharedProcessor};
use crate::decoder::Decoder;
use crate::effects::{Effect, Gain, ToneBand, ToneFilter, TONE_GAIN_RANGE_DB};
use crate::error::GraphError;
use crate::source::{AudioSource, FilePlayback, MediaFile, SourceKind};

/// Mono scratch size for the analyzer tap
const TAP_SCRATCH_FRAMES: usize = 4096;

/// Node of the processing chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    Source,
    Bass,
    Mid,
    Treble,
    Gain,
    Analyzer,
    Destination,
}

/// Tone control gains in dB
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterSettings {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

impl FilterSettings {
    pub fn new(bass: f32, mid: f32, treble: f32) -> Self {
        Self { bass, mid, treble }.clamped()
    }

    /// Clamp every band to ±10dB (NaN reads as flat)
    pub fn clamped(self) -> Self {
        let clamp = |v: f32| {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(-TONE_GAIN_RANGE_DB, TONE_GAIN_RANGE_DB)
            }
        };
        Self {
            bass: clamp(self.bass),
            mid: clamp(self.mid),
            treble: clamp(self.treble),
        }
    }
}

/// Playback state as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing open, or a file ran to its end
    #[default]
    Stopped,
    Playing,
    Paused,
    /// Refused by the platform until the next user gesture
    Blocked,
}

/// Notifications from the audio side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A file source played to its end
    Ended,
}

enum SourceNode {
    File(FilePlayback),
    Capture { reader: CaptureReader, active: bool },
}

/// Audio-thread half of a chain
struct GraphCore {
    source: SourceNode,
    bass: ToneFilter,
    mid: ToneFilter,
    treble: ToneFilter,
    gain: Gain,
    analyzer: Analyzer,
    to_destination: bool,
    /// Pre-allocated mono downmix for the analyzer tap
    mono: Vec<f32>,
    events: Sender<(u64, GraphEvent)>,
    generation: u64,
}

impl GraphCore {
    fn apply_filters(&mut self, filters: FilterSettings) {
        self.bass.set_gain_db(filters.bass);
        self.mid.set_gain_db(filters.mid);
        self.treble.set_gain_db(filters.treble);
    }

    fn apply_volume(&mut self, volume: f32) {
        self.gain.set_level(volume);
        if let SourceNode::File(playback) = &mut self.source {
            playback.set_volume(volume);
        }
    }

    /// Jump the file cursor; filter memory from before the jump is dropped
    fn seek(&mut self, seconds: f64) {
        if let SourceNode::File(playback) = &mut self.source {
            playback.seek(seconds);
            self.bass.reset();
            self.mid.reset();
            self.treble.reset();
        }
    }

    fn set_running(&mut self, running: bool) {
        match &mut self.source {
            SourceNode::File(playback) if running => playback.play(),
            SourceNode::File(playback) => playback.pause(),
            SourceNode::Capture { active, .. } => *active = running,
        }
    }
}

impl Processor for GraphCore {
    fn process(&mut self, out: &mut [f32]) {
        let ended = match &mut self.source {
            SourceNode::File(playback) => playback.read(out),
            SourceNode::Capture { reader, active } => {
                if *active {
                    reader.read_stereo(out);
                } else {
                    reader.discard();
                    out.fill(0.0);
                }
                false
            }
        };

        self.bass.process(out);
        self.mid.process(out);
        self.treble.process(out);
        self.gain.process(out);

        for chunk in out.chunks(TAP_SCRATCH_FRAMES * 2) {
            let frames = chunk.len() / 2;
            for (m, frame) in self.mono.iter_mut().zip(chunk.chunks_exact(2)) {
                *m = (frame[0] + frame[1]) * 0.5;
            }
            self.analyzer.push_samples(&self.mono[..frames]);
        }

        if !self.to_destination {
            out.fill(0.0);
        }

        if ended {
            let _ = self.events.try_send((self.generation, GraphEvent::Ended));
        }
    }
}

struct Chain<K> {
    core: Arc<Mutex<GraphCore>>,
    analyzer: Analyzer,
    kind: SourceKind,
    title: String,
    connections: Vec<(NodeId, NodeId)>,
    _capture: Option<K>,
}

/// Builds, owns and tears down the processing chain for one source at a time
pub struct SignalGraph<C: AudioContext> {
    context: C,
    analyzer_config: AnalyzerConfig,
    chain: Option<Chain<C::Capture>>,
    filters: FilterSettings,
    volume: f32,
    state: PlaybackState,
    generation: u64,
    events_tx: Sender<(u64, GraphEvent)>,
    events_rx: Receiver<(u64, GraphEvent)>,
}

impl<C: AudioContext> SignalGraph<C> {
    /// Create a graph on top of a context; nothing is opened yet
    pub fn new(context: C, analyzer_config: AnalyzerConfig) -> Self {
        let (events_tx, events_rx) = bounded(16);
        Self {
            context,
            analyzer_config: analyzer_config.sanitized(),
            chain: None,
            filters: FilterSettings::default(),
            volume: 1.0,
            state: PlaybackState::Stopped,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    /// Tear down any existing chain and build a new one for `source`
    ///
    /// File sources start playing. If the platform refuses playback the chain
    /// stays open in the [`PlaybackState::Blocked`] state and `Ok` is returned.
    pub fn open(&mut self, source: AudioSource) -> Result<(), GraphError> {
        self.teardown();

        let kind = source.kind();
        let (node, title, capture) = match source {
            AudioSource::File(media) => {
                let decoder = Decoder::new(self.context.sample_rate());
                let decoded = match &media {
                    MediaFile::Path(path) => decoder.decode(path),
                    MediaFile::Decoded {
                        name,
                        samples,
                        sample_rate,
                        channels,
                    } => decoder.prepare(samples, *sample_rate, *channels, name.clone()),
                }
                .map_err(|e| {
                    tracing::warn!(media = %media.name(), "decode failed: {}", e);
                    GraphError::from(e)
                })?;
                let playback = FilePlayback::new(decoded.samples, decoded.sample_rate);
                (SourceNode::File(playback), decoded.title, None)
            }
            AudioSource::LiveCapture => {
                let (handle, reader) = self.context.open_capture().map_err(|e| {
                    tracing::warn!("live capture unavailable: {}", e);
                    e
                })?;
                let node = SourceNode::Capture {
                    reader,
                    active: false,
                };
                (node, "Microphone Input".to_string(), Some(handle))
            }
        };

        let resumed = self.context.resume();
        let sample_rate = self.context.sample_rate() as f32;
        let analyzer = Analyzer::new(self.analyzer_config);
        let to_destination = kind == SourceKind::File;

        let mut core = GraphCore {
            source: node,
            bass: ToneFilter::new(ToneBand::Bass, sample_rate),
            mid: ToneFilter::new(ToneBand::Mid, sample_rate),
            treble: ToneFilter::new(ToneBand::Treble, sample_rate),
            gain: Gain::default(),
            analyzer: analyzer.clone(),
            to_destination,
            mono: vec![0.0; TAP_SCRATCH_FRAMES],
            events: self.events_tx.clone(),
            generation: self.generation,
        };
        core.apply_filters(self.filters);
        core.apply_volume(self.volume);
        core.set_running(resumed.is_ok());

        let mut connections = vec![
            (NodeId::Source, NodeId::Bass),
            (NodeId::Bass, NodeId::Mid),
            (NodeId::Mid, NodeId::Treble),
            (NodeId::Treble, NodeId::Gain),
            (NodeId::Gain, NodeId::Analyzer),
        ];
        if to_destination {
            connections.push((NodeId::Analyzer, NodeId::Destination));
        }

        let core = Arc::new(Mutex::new(core));
        let processor: SharedProcessor = core.clone();
        self.context.set_processor(Some(processor));

        self.state = match resumed {
            Ok(()) => PlaybackState::Playing,
            Err(GraphError::PlaybackBlocked) => {
                tracing::warn!("playback blocked until next user gesture");
                PlaybackState::Blocked
            }
            Err(e) => {
                self.context.set_processor(None);
                analyzer.detach();
                tracing::warn!("audio context failed to start: {}", e);
                return Err(e);
            }
        };

        tracing::info!(?kind, title = %title, "signal graph opened");
        self.chain = Some(Chain {
            core,
            analyzer,
            kind,
            title,
            connections,
            _capture: capture,
        });
        Ok(())
    }

    /// Set the three tone gains (each clamped to ±10dB)
    pub fn set_filters(&mut self, bass: f32, mid: f32, treble: f32) -> FilterSettings {
        self.filters = FilterSettings::new(bass, mid, treble);
        if let Some(chain) = &self.chain {
            chain.core.lock().apply_filters(self.filters);
        }
        self.filters
    }

    pub fn filters(&self) -> FilterSettings {
        self.filters
    }

    /// Set master volume (0.0 - 1.0)
    ///
    /// Written to the gain stage and, for files, to the playback level too.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 1.0 } else { volume.clamp(0.0, 1.0) };
        if let Some(chain) = &self.chain {
            chain.core.lock().apply_volume(self.volume);
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Analyzer of the open chain; `None` means no data is available
    pub fn analyzer(&self) -> Option<&Analyzer> {
        self.chain.as_ref().map(|chain| &chain.analyzer)
    }

    /// Start or resume the open source
    ///
    /// Call from a user gesture. A refusal moves to [`PlaybackState::Blocked`].
    pub fn play(&mut self) -> Result<(), GraphError> {
        let Some(chain) = &self.chain else {
            return Err(GraphError::GraphUnavailable);
        };
        if let Err(e) = self.context.resume() {
            if e == GraphError::PlaybackBlocked {
                tracing::warn!("playback blocked until next user gesture");
                self.state = PlaybackState::Blocked;
            }
            return Err(e);
        }
        chain.core.lock().set_running(true);
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub fn pause(&mut self) {
        if let Some(chain) = &self.chain {
            chain.core.lock().set_running(false);
            self.state = PlaybackState::Paused;
        }
    }

    /// Seek within a file source; no-op for live capture
    pub fn seek(&mut self, seconds: f64) {
        if let Some(chain) = &self.chain {
            chain.core.lock().seek(seconds);
        }
    }

    /// Playback position in seconds (files only)
    pub fn position(&self) -> Option<f64> {
        let core = self.chain.as_ref()?.core.lock();
        match &core.source {
            SourceNode::File(playback) => Some(playback.position_secs()),
            SourceNode::Capture { .. } => None,
        }
    }

    /// Track duration in seconds (files only)
    pub fn duration(&self) -> Option<f64> {
        let core = self.chain.as_ref()?.core.lock();
        match &core.source {
            SourceNode::File(playback) => Some(playback.duration_secs()),
            SourceNode::Capture { .. } => None,
        }
    }

    /// Disconnect everything and release the source
    ///
    /// The context is suspended once nothing uses it anymore.
    pub fn close(&mut self) {
        self.teardown();
        if !self.context.in_use() {
            if let Err(e) = self.context.suspend() {
                tracing::warn!("failed to suspend audio context: {}", e);
            }
        }
    }

    fn teardown(&mut self) {
        let Some(chain) = self.chain.take() else {
            return;
        };
        chain.core.lock().set_running(false);
        self.context.set_processor(None);
        chain.analyzer.detach();
        // Events still queued from this chain belong to an older generation
        self.generation = self.generation.wrapping_add(1);
        self.state = PlaybackState::Stopped;
        tracing::info!(kind = ?chain.kind, title = %chain.title, "signal graph closed");
    }

    /// Next notification from the open chain, if any
    pub fn poll_event(&mut self) -> Option<GraphEvent> {
        while let Ok((generation, event)) = self.events_rx.try_recv() {
            if generation != self.generation || self.chain.is_none() {
                continue;
            }
            if event == GraphEvent::Ended {
                self.state = PlaybackState::Stopped;
            }
            return Some(event);
        }
        None
    }

    /// Current node connections, empty when nothing is open
    pub fn connections(&self) -> &[(NodeId, NodeId)] {
        self.chain
            .as_ref()
            .map(|chain| chain.connections.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_connected_to_destination(&self) -> bool {
        self.connections()
            .iter()
            .any(|&(_, to)| to == NodeId::Destination)
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.chain.as_ref().map(|chain| chain.kind)
    }

    pub fn is_open(&self) -> bool {
        self.chain.is_some()
    }

    /// Display title of the open source
    pub fn title(&self) -> Option<&str> {
        self.chain.as_ref().map(|chain| chain.title.as_str())
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CapturePermission, ContextState, OfflineContext};

    const RATE: u32 = 8000;

    fn tone(frames: usize, freq: f32) -> AudioSource {
        let samples: Vec<f32> = (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / RATE as f32).sin() * 0.5)
            .collect();
        AudioSource::File(MediaFile::Decoded {
            name: "tone".to_string(),
            samples: Arc::new(samples),
            sample_rate: RATE,
            channels: 1,
        })
    }

    fn graph() -> SignalGraph<OfflineContext> {
        SignalGraph::new(OfflineContext::new(RATE), AnalyzerConfig::default())
    }

    #[test]
    fn test_file_chain_reaches_destination() {
        let mut graph = graph();
        graph.open(tone(RATE as usize, 440.0)).unwrap();

        assert_eq!(graph.playback_state(), PlaybackState::Playing);
        assert_eq!(graph.connections().len(), 6);
        assert!(graph.is_connected_to_destination());

        let out = graph.context_mut().render_block(256);
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_capture_never_reaches_destination() {
        let mut graph = graph();
        graph
            .context_mut()
            .set_capture_permission(CapturePermission::Granted(vec![0.5; 4096]));
        graph.open(AudioSource::LiveCapture).unwrap();

        assert_eq!(graph.source_kind(), Some(SourceKind::LiveCapture));
        assert!(!graph.is_connected_to_destination());
        assert_eq!(graph.connections().last(), Some(&(NodeId::Gain, NodeId::Analyzer)));

        for _ in 0..2 {
            let out = graph.context_mut().render_block(1024);
            assert!(out.iter().all(|&s| s == 0.0));
        }

        // The analyzer still sees the captured signal
        let mut time = vec![0u8; 1024];
        graph.analyzer().unwrap().byte_time_domain_data(&mut time);
        assert!(time.iter().any(|&v| v > 128));
    }

    #[test]
    fn test_permission_denied_leaves_nothing_open() {
        let mut graph = graph();
        assert_eq!(graph.open(AudioSource::LiveCapture), Err(GraphError::PermissionDenied));
        assert!(graph.analyzer().is_none());
        assert!(graph.connections().is_empty());
        assert!(!graph.context().in_use());
    }

    #[test]
    fn test_decode_failure_is_recoverable() {
        let mut graph = graph();
        let bad = AudioSource::File(MediaFile::Decoded {
            name: "bad".to_string(),
            samples: Arc::new(vec![0.0; 16]),
            sample_rate: RATE,
            channels: 0,
        });
        assert!(matches!(graph.open(bad), Err(GraphError::DecodeFailed(_))));
        assert!(!graph.is_open());

        assert!(graph.open(tone(512, 440.0)).is_ok());
    }

    #[test]
    fn test_filters_clamped_and_read_back() {
        let mut graph = graph();
        let applied = graph.set_filters(12.0, -3.5, -40.0);
        assert_eq!(applied, FilterSettings { bass: 10.0, mid: -3.5, treble: -10.0 });
        assert_eq!(graph.filters(), applied);
    }

    #[test]
    fn test_ended_fires_once() {
        let mut graph = graph();
        graph.open(tone(300, 440.0)).unwrap();

        for _ in 0..4 {
            graph.context_mut().render_block(128);
        }
        assert_eq!(graph.poll_event(), Some(GraphEvent::Ended));
        assert_eq!(graph.poll_event(), None);
        assert_eq!(graph.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_stale_ended_ignored_after_switch() {
        let mut graph = graph();
        graph.open(tone(100, 440.0)).unwrap();
        graph.context_mut().render_block(128);

        graph.open(tone(RATE as usize, 220.0)).unwrap();
        assert_eq!(graph.poll_event(), None);
    }

    #[test]
    fn test_switch_detaches_old_analyzer() {
        let mut graph = graph();
        graph.open(tone(RATE as usize, 440.0)).unwrap();
        let first = graph.analyzer().unwrap().clone();

        graph.open(tone(RATE as usize, 220.0)).unwrap();
        let second = graph.analyzer().unwrap();
        assert!(first.is_detached());
        assert!(!second.same_as(&first));
    }

    #[test]
    fn test_autoplay_block_then_retry() {
        let mut graph = graph();
        graph.context_mut().set_autoplay_allowed(false);
        graph.open(tone(RATE as usize, 440.0)).unwrap();
        assert_eq!(graph.playback_state(), PlaybackState::Blocked);
        assert!(graph.is_open());

        assert_eq!(graph.play(), Err(GraphError::PlaybackBlocked));
        graph.context_mut().set_autoplay_allowed(true);
        graph.play().unwrap();
        assert_eq!(graph.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_play_without_source() {
        let mut graph = graph();
        assert_eq!(graph.play(), Err(GraphError::GraphUnavailable));
    }

    #[test]
    fn test_close_suspends_context() {
        let mut graph = graph();
        graph.open(tone(RATE as usize, 440.0)).unwrap();
        assert_eq!(graph.context().state(), ContextState::Running);

        graph.close();
        assert_eq!(graph.context().state(), ContextState::Suspended);
        assert!(graph.analyzer().is_none());
        assert_eq!(graph.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_close_releases_capture() {
        let mut graph = graph();
        graph
            .context_mut()
            .set_capture_permission(CapturePermission::Granted(Vec::new()));
        graph.open(AudioSource::LiveCapture).unwrap();
        assert!(graph.context().capture_active());

        graph.close();
        assert!(!graph.context().capture_active());
    }

    #[test]
    fn test_volume_zero_mutes_output() {
        let mut graph = graph();
        graph.open(tone(RATE as usize, 440.0)).unwrap();
        graph.set_volume(0.0);
        let out = graph.context_mut().render_block(256);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_seek_and_position() {
        let mut graph = graph();
        graph.open(tone(RATE as usize * 2, 440.0)).unwrap();
        assert!((graph.duration().unwrap() - 2.0).abs() < 1e-6);
        graph.seek(1.0);
        assert!((graph.position().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_seek_ignores_non_finite_targets() {
        let mut graph = graph();
        graph.open(tone(RATE as usize * 2, 440.0)).unwrap();
        graph.seek(0.5);
        graph.seek(f64::NAN);
        assert!((graph.position().unwrap() - 0.5).abs() < 1e-6);
        graph.seek(f64::INFINITY);
        assert!((graph.position().unwrap() - 2.0).abs() < 1e-6);
        graph.seek(1e300);
        assert!((graph.position().unwrap() - 2.0).abs() < 1e-6);
    }
}
