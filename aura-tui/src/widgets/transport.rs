//! Transport line - theme, mode, track, playback state, EQ and volume

use aura_audio::{AudioContext, FilterSettings, PlaybackState, SourceKind};
use aura_render::{FrameScheduler, VisualizerMode};
use aura_session::Session;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::Theme;

/// Snapshot of what the transport line shows
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub theme_name: String,
    pub mode: VisualizerMode,
    pub title: Option<String>,
    pub source: Option<SourceKind>,
    pub state: PlaybackState,
    pub position: Option<f64>,
    pub duration: Option<f64>,
    pub filters: FilterSettings,
    pub volume: f32,
}

impl NowPlaying {
    pub fn from_session<C: AudioContext, S: FrameScheduler>(session: &Session<C, S>) -> Self {
        Self {
            theme_name: session.theme().name.clone(),
            mode: session.mode(),
            title: session.title().map(str::to_string),
            source: session.source_kind(),
            state: session.playback_state(),
            position: session.position(),
            duration: session.duration(),
            filters: session.filters(),
            volume: session.volume(),
        }
    }

    fn state_label(&self) -> &'static str {
        match self.state {
            PlaybackState::Playing => "PLAY",
            PlaybackState::Paused => "PAUSE",
            PlaybackState::Stopped => "STOP",
            PlaybackState::Blocked => "BLOCKED",
        }
    }

    fn time_label(&self) -> String {
        match (self.source, self.position, self.duration) {
            (Some(SourceKind::LiveCapture), _, _) => "LIVE".to_string(),
            (_, Some(position), Some(duration)) => {
                format!("{} / {}", format_time(position), format_time(duration))
            }
            _ => "--:--".to_string(),
        }
    }
}

/// Format seconds as M:SS
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub struct TransportWidget<'a> {
    info: &'a NowPlaying,
    theme: &'a Theme,
}

impl<'a> TransportWidget<'a> {
    pub fn new(info: &'a NowPlaying, theme: &'a Theme) -> Self {
        Self { info, theme }
    }
}

impl Widget for TransportWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }
        let info = self.info;
        let title = info.title.as_deref().unwrap_or("no source");
        let line = Line::from(vec![
            Span::styled(format!(" {} ", info.state_label()), self.theme.highlight()),
            Span::styled(format!(" {} ", title), self.theme.title()),
            Span::styled(info.time_label(), self.theme.dim()),
            Span::styled("  │ ", self.theme.dim()),
            Span::styled(info.mode.name(), self.theme.accent()),
            Span::styled(format!(" · {}", info.theme_name), self.theme.normal()),
            Span::styled("  │ ", self.theme.dim()),
            Span::styled(
                format!(
                    "B{:+.0} M{:+.0} T{:+.0}",
                    info.filters.bass, info.filters.mid, info.filters.treble
                ),
                self.theme.normal(),
            ),
            Span::styled(format!("  VOL {:>3.0}%", info.volume * 100.0), self.theme.normal()),
        ]);
        Paragraph::new(line)
            .style(self.theme.normal())
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> NowPlaying {
        NowPlaying {
            theme_name: "Cyberpunk Default".to_string(),
            mode: VisualizerMode::Bars,
            title: Some("track".to_string()),
            source: Some(SourceKind::File),
            state: PlaybackState::Playing,
            position: Some(65.4),
            duration: Some(200.0),
            filters: FilterSettings::default(),
            volume: 0.5,
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn test_time_label() {
        assert_eq!(info().time_label(), "1:05 / 3:20");
        let live = NowPlaying {
            source: Some(SourceKind::LiveCapture),
            position: None,
            duration: None,
            ..info()
        };
        assert_eq!(live.time_label(), "LIVE");
    }

    #[test]
    fn test_renders_title_and_state() {
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        TransportWidget::new(&info(), &Theme::default()).render(area, &mut buf);
        let text: String = (0..area.width).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(text.contains("PLAY"));
        assert!(text.contains("track"));
        assert!(text.contains("VOL  50%"));
    }
}
