//! Session: one signal graph, one playlist, one render loop
//!
//! Owns every piece the presentation layer talks to. Source switches always
//! stop the render loop and close the old chain before the next one opens, so
//! a frame can never sample a torn-down analyzer.

use aura_analysis::FrameSampler;
use aura_audio::{
    AudioContext, AudioSource, FilterSettings, GraphError, GraphEvent, MediaFile, PlaybackState,
    SignalGraph, SourceKind,
};
use aura_render::{
    presets, CanvasSize, CommandList, FrameHandle, FrameScheduler, RenderLoop, ThemeError,
    ThemeProvider, ThemeState, Visualizer, VisualizerMode,
};

use crate::config::Config;
use crate::error::SessionError;
use crate::playlist::{Playlist, Track};

/// What happened while draining graph notifications
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The track with this id played to its end
    TrackEnded(u64),
    /// Playback moved on to the track with this id
    TrackStarted(u64),
    /// The last track ended; nothing plays anymore
    PlaylistFinished,
    /// Advancing failed; the session is stopped
    Failed(SessionError),
}

pub struct Session<C: AudioContext, S: FrameScheduler> {
    graph: SignalGraph<C>,
    playlist: Playlist,
    visualizer: Visualizer,
    sampler: FrameSampler,
    render_loop: RenderLoop<S>,
    surface: CommandList,
    /// Live capture is the selected source (open or toggled off)
    capture_mode: bool,
}

impl<C: AudioContext, S: FrameScheduler> Session<C, S> {
    /// Create a session; no source is opened and the context is not resumed
    pub fn new(context: C, scheduler: S, config: &Config) -> Self {
        let analyzer_config = config.analyzer_config();
        let mut graph = SignalGraph::new(context, analyzer_config);
        graph.set_volume(config.volume);

        let theme = config
            .preset
            .as_deref()
            .and_then(|name| {
                let preset = ThemeState::preset(name);
                if preset.is_none() {
                    tracing::warn!(preset = name, "unknown theme preset, using default");
                }
                preset
            })
            .unwrap_or_default();

        Self {
            graph,
            playlist: Playlist::new(),
            visualizer: Visualizer::new(theme, config.particle_config()),
            sampler: FrameSampler::new(analyzer_config.fft_size / 2),
            render_loop: RenderLoop::new(scheduler),
            surface: CommandList::new(CanvasSize::default()),
            capture_mode: false,
        }
    }

    // --- Sources ---

    /// Append tracks; if nothing is playing the first added track starts
    ///
    /// The tracks stay in the playlist even when starting the first one fails.
    pub fn add_tracks<I>(&mut self, media: I) -> Result<Vec<u64>, SessionError>
    where
        I: IntoIterator<Item = MediaFile>,
    {
        if self.capture_mode {
            self.stop_source();
            self.capture_mode = false;
        }
        let ids: Vec<u64> = media.into_iter().map(|m| self.playlist.add(m)).collect();
        tracing::info!(count = ids.len(), "tracks added");

        let idle = self.graph.playback_state() == PlaybackState::Stopped;
        if let (true, Some(&first)) = (idle, ids.first()) {
            self.play_track(first)?;
        }
        Ok(ids)
    }

    /// Switch to a playlist track
    pub fn play_track(&mut self, id: u64) -> Result<(), SessionError> {
        let media = self
            .playlist
            .get(id)
            .map(|track| track.media.clone())
            .ok_or(SessionError::NoSuchTrack(id))?;

        self.stop_source();
        self.capture_mode = false;
        self.playlist.set_current(id);
        self.graph.open(AudioSource::File(media))?;
        self.sync_loop();
        Ok(())
    }

    /// Advance to the next track
    ///
    /// Returns false (and stops) when the current track was the last one.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        if self.playlist.is_empty() {
            return Err(SessionError::EmptyPlaylist);
        }
        match self.playlist.next().map(|track| track.id) {
            Some(id) => {
                self.play_track(id)?;
                Ok(true)
            }
            None => {
                self.stop_source();
                Ok(false)
            }
        }
    }

    /// Remove a track; removing the playing track closes the graph
    pub fn remove_track(&mut self, id: u64) -> Result<Track, SessionError> {
        let (track, was_current) = self
            .playlist
            .remove(id)
            .ok_or(SessionError::NoSuchTrack(id))?;
        if was_current {
            self.stop_source();
        }
        Ok(track)
    }

    /// Switch to the microphone; the playlist is cleared
    ///
    /// On a refused permission nothing is left open.
    pub fn use_microphone(&mut self) -> Result<(), SessionError> {
        self.playlist.clear();
        self.capture_mode = true;
        self.open_capture()
    }

    fn open_capture(&mut self) -> Result<(), SessionError> {
        self.stop_source();
        if let Err(e) = self.graph.open(AudioSource::LiveCapture) {
            if e == GraphError::PermissionDenied {
                tracing::warn!("microphone permission denied");
            }
            return Err(e.into());
        }
        self.sync_loop();
        Ok(())
    }

    /// Stop rendering, then close the chain
    fn stop_source(&mut self) {
        self.render_loop.stop();
        if self.graph.is_open() {
            self.graph.close();
        }
    }

    // --- Playback ---

    /// Play/pause
    ///
    /// Live capture has no pause: toggling closes and reopens the capture.
    pub fn toggle_play(&mut self) -> Result<(), SessionError> {
        if self.capture_mode {
            return if self.graph.is_open() {
                self.stop_source();
                Ok(())
            } else {
                self.open_capture()
            };
        }

        if !self.graph.is_open() {
            let id = self
                .playlist
                .current()
                .or_else(|| self.playlist.next())
                .map(|track| track.id)
                .ok_or(SessionError::EmptyPlaylist)?;
            return self.play_track(id);
        }

        match self.graph.playback_state() {
            PlaybackState::Playing => {
                self.graph.pause();
                self.render_loop.stop();
            }
            _ => {
                let result = self.graph.play();
                self.sync_loop();
                result?;
            }
        }
        Ok(())
    }

    /// Retry playback refused by the autoplay policy
    ///
    /// Call on every user interaction; does nothing unless blocked.
    pub fn user_gesture(&mut self) -> Result<(), SessionError> {
        if self.graph.playback_state() != PlaybackState::Blocked {
            return Ok(());
        }
        let result = self.graph.play();
        self.sync_loop();
        if result.is_ok() {
            tracing::info!("blocked playback resumed");
        }
        Ok(result?)
    }

    pub fn seek(&mut self, seconds: f64) {
        self.graph.seek(seconds);
    }

    fn sync_loop(&mut self) {
        if self.graph.playback_state() == PlaybackState::Playing {
            self.render_loop.start();
        } else {
            self.render_loop.stop();
        }
    }

    /// Drain graph notifications; an ended track advances the playlist
    pub fn poll_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.graph.poll_event() {
            match event {
                GraphEvent::Ended => {
                    self.render_loop.stop();
                    if let Some(track) = self.playlist.current() {
                        events.push(SessionEvent::TrackEnded(track.id));
                    }
                    match self.next() {
                        Ok(true) => {
                            if let Some(track) = self.playlist.current() {
                                tracing::info!(track = %track.name, "advanced to next track");
                                events.push(SessionEvent::TrackStarted(track.id));
                            }
                        }
                        Ok(false) => {
                            tracing::info!("playlist finished");
                            events.push(SessionEvent::PlaylistFinished);
                        }
                        Err(e) => {
                            tracing::warn!("failed to advance: {}", e);
                            self.stop_source();
                            events.push(SessionEvent::Failed(e));
                        }
                    }
                }
            }
        }
        events
    }

    // --- Sound ---

    pub fn set_filters(&mut self, bass: f32, mid: f32, treble: f32) -> FilterSettings {
        self.graph.set_filters(bass, mid, treble)
    }

    pub fn filters(&self) -> FilterSettings {
        self.graph.filters()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.graph.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.graph.volume()
    }

    // --- Theme ---

    pub fn theme(&self) -> &ThemeState {
        self.visualizer.theme()
    }

    pub fn apply_theme(&mut self, theme: ThemeState) {
        self.visualizer.apply_theme(theme);
    }

    pub fn set_mode(&mut self, mode: VisualizerMode) {
        self.visualizer.set_mode(mode);
    }

    pub fn mode(&self) -> VisualizerMode {
        self.visualizer.mode()
    }

    /// Draw over an image (or back to a solid background with `None`)
    pub fn set_background_image(&mut self, image: Option<String>) {
        let mut theme = self.theme().clone();
        theme.background_image = image;
        self.apply_theme(theme);
    }

    /// Pacing of the current theme (clamped to 0.5 - 2.0)
    pub fn set_speed(&mut self, speed: f32) {
        let mut theme = self.theme().clone();
        theme.set_speed(speed);
        self.apply_theme(theme);
    }

    /// Switch to a built-in preset by name
    pub fn set_preset(&mut self, name: &str) -> bool {
        match ThemeState::preset(name) {
            Some(theme) => {
                self.apply_theme(theme);
                true
            }
            None => false,
        }
    }

    /// Cycle through the built-in presets
    pub fn next_preset(&mut self) {
        let presets = presets();
        let next = presets
            .iter()
            .position(|p| p.name == self.theme().name)
            .map(|i| (i + 1) % presets.len())
            .unwrap_or(0);
        if let Some(theme) = presets.into_iter().nth(next) {
            self.apply_theme(theme);
        }
    }

    /// Edit one palette entry of the current theme
    pub fn set_color(&mut self, index: usize, hex: &str) -> Result<(), SessionError> {
        let mut theme = self.theme().clone();
        theme.set_color(index, hex)?;
        self.apply_theme(theme);
        Ok(())
    }

    /// Ask an external provider for a theme
    ///
    /// On any failure the current theme is kept.
    pub fn request_theme(
        &mut self,
        provider: &mut dyn ThemeProvider,
        description: &str,
    ) -> Result<(), SessionError> {
        let suggestion = provider.suggest(description).map_err(|e| {
            tracing::warn!("theme suggestion failed: {}", e);
            match e {
                ThemeError::ExternalServiceFailure(_) => e,
                other => ThemeError::ExternalServiceFailure(other.to_string()),
            }
        })?;
        let theme = ThemeState::from_suggestion(&suggestion)?;
        tracing::info!(theme = %theme.name, vibe = %suggestion.vibe_description, "theme suggested");
        self.apply_theme(theme);
        Ok(())
    }

    // --- Frames ---

    /// Track the drawing surface size; does not touch the render loop
    pub fn resize(&mut self, size: CanvasSize) {
        self.visualizer.resize(size);
        self.surface.resize(size);
    }

    /// Deliver a due frame; returns true when a new frame was drawn
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if !self.render_loop.on_frame(handle) {
            return false;
        }
        self.sampler.begin_frame();
        let buffer = self
            .sampler
            .sample(self.visualizer.data_kind(), self.graph.analyzer());
        self.surface.begin(self.visualizer.size());
        self.visualizer.render_frame(buffer, &mut self.surface);
        true
    }

    /// Draw commands of the last rendered frame
    pub fn frame(&self) -> &CommandList {
        &self.surface
    }

    // --- Status ---

    pub fn playback_state(&self) -> PlaybackState {
        self.graph.playback_state()
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.graph.source_kind()
    }

    pub fn is_capture_mode(&self) -> bool {
        self.capture_mode
    }

    pub fn title(&self) -> Option<&str> {
        self.graph.title()
    }

    pub fn position(&self) -> Option<f64> {
        self.graph.position()
    }

    pub fn duration(&self) -> Option<f64> {
        self.graph.duration()
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn graph(&self) -> &SignalGraph<C> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SignalGraph<C> {
        &mut self.graph
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn sampler(&self) -> &FrameSampler {
        &self.sampler
    }

    pub fn render_loop(&self) -> &RenderLoop<S> {
        &self.render_loop
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.render_loop.scheduler_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_audio::OfflineContext;
    use aura_render::{ManualScheduler, ThemeSuggestion, CUSTOM_THEME_NAME};

    struct FixedProvider(Result<ThemeSuggestion, ThemeError>);

    impl ThemeProvider for FixedProvider {
        fn suggest(&mut self, _description: &str) -> Result<ThemeSuggestion, ThemeError> {
            self.0.clone()
        }
    }

    fn session() -> Session<OfflineContext, ManualScheduler> {
        Session::new(OfflineContext::new(48000), ManualScheduler::new(), &Config::default())
    }

    fn suggestion(mode: &str) -> ThemeSuggestion {
        ThemeSuggestion {
            name: "Midnight Rain".to_string(),
            palette: ["#101020", "#203040", "#305060", "#4070a0", "#80c0ff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mode: mode.to_string(),
            vibe_description: "slow and wet".to_string(),
        }
    }

    #[test]
    fn test_preset_from_config() {
        let config = Config {
            preset: Some("fiery energy".to_string()),
            ..Default::default()
        };
        let session = Session::new(OfflineContext::new(48000), ManualScheduler::new(), &config);
        assert_eq!(session.theme().name, "Fiery Energy");
        assert_eq!(session.mode(), VisualizerMode::Circular);
    }

    #[test]
    fn test_next_preset_cycles() {
        let mut session = session();
        let names: Vec<String> = (0..3)
            .map(|_| {
                session.next_preset();
                session.theme().name.clone()
            })
            .collect();
        assert_eq!(names, ["Oceanic Calm", "Fiery Energy", "Cyberpunk Default"]);
    }

    #[test]
    fn test_set_color_makes_custom_theme() {
        let mut session = session();
        session.set_color(2, "#abcdef").unwrap();
        assert_eq!(session.theme().name, CUSTOM_THEME_NAME);
        assert!(session.set_color(1, "nope").is_err());
    }

    #[test]
    fn test_request_theme_applies_suggestion() {
        let mut session = session();
        let mut provider = FixedProvider(Ok(suggestion("CIRCLE")));
        session.request_theme(&mut provider, "rain at night").unwrap();
        assert_eq!(session.theme().name, "Midnight Rain");
        assert_eq!(session.mode(), VisualizerMode::Circular);
        assert_eq!(session.theme().speed(), 1.0);
    }

    #[test]
    fn test_request_theme_failure_keeps_theme() {
        let mut session = session();
        let before = session.theme().clone();

        let mut provider = FixedProvider(Err(ThemeError::ExternalServiceFailure("timeout".into())));
        let err = session.request_theme(&mut provider, "anything").unwrap_err();
        assert!(matches!(err, SessionError::Theme(ThemeError::ExternalServiceFailure(_))));
        assert_eq!(session.theme(), &before);

        let mut bad = suggestion("WAVE");
        bad.palette[0] = "not a color".to_string();
        let mut provider = FixedProvider(Ok(bad));
        assert!(session.request_theme(&mut provider, "anything").is_err());
        assert_eq!(session.theme(), &before);
    }

    #[test]
    fn test_toggle_with_empty_playlist() {
        let mut session = session();
        assert_eq!(session.toggle_play(), Err(SessionError::EmptyPlaylist));
        assert_eq!(session.next(), Err(SessionError::EmptyPlaylist));
        assert_eq!(session.play_track(7), Err(SessionError::NoSuchTrack(7)));
    }
}
