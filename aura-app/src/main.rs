//! Aura - terminal audio visualizer
//!
//! Plays the files given on the command line (or listens to the microphone)
//! through a tone-control chain and draws the result in the terminal.

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Frame, Terminal,
};
use tracing_subscriber::EnvFilter;

use aura_audio::{CpalContext, GraphError, MediaFile, PlaybackState};
use aura_input::{Band, Command, InputHandler};
use aura_render::{IntervalScheduler, ThemeState};
use aura_session::{Config, Session, SessionError, SessionEvent};
use aura_tui::{
    canvas_size, App, NowPlaying, StatusBarWidget, Theme, TransportWidget, VisualizerWidget,
};

type AppSession = Session<CpalContext, IntervalScheduler>;

/// Input poll timeout while no frame is pending (keeps the transport line fresh)
const IDLE_POLL: Duration = Duration::from_millis(100);

fn main() -> anyhow::Result<()> {
    init_logging();

    let mut config = Config::load();
    let tracks: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    // Queries the output device only; the stream starts on first playback
    let context = CpalContext::new()?;
    let mut session = Session::new(context, IntervalScheduler::new(config.frame_rate), &config);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut session, tracks);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Remember volume and preset for next startup
    config.volume = session.volume();
    if ThemeState::preset(&session.theme().name).is_some() {
        config.preset = Some(session.theme().name.clone());
    }
    if let Err(e) = config.save() {
        tracing::warn!("failed to save config: {}", e);
    }

    result
}

/// Log to a file under the data directory so the terminal stays clean
///
/// Logging is skipped when the file cannot be created.
fn init_logging() {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aura");
    let file = fs::create_dir_all(&dir).and_then(|_| File::create(dir.join("aura.log")));
    let Ok(file) = file else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut AppSession,
    tracks: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let mut app = App::new();
    let mut input_handler = InputHandler::new();
    app.state.theme = Theme::from_state(session.theme());

    if tracks.is_empty() {
        app.state
            .set_message("Aura | :open <file> to play, m for microphone, : for commands");
    } else {
        let count = tracks.len();
        match session.add_tracks(tracks.into_iter().map(MediaFile::Path)) {
            Ok(_) => app.state.set_success(format!("Loaded {} tracks", count)),
            Err(e) => app.state.set_error(error_message(&e)),
        }
    }

    loop {
        if app.should_quit {
            break;
        }

        for event in session.poll_events() {
            match event {
                SessionEvent::TrackStarted(id) => {
                    if let Some(track) = session.playlist().get(id) {
                        app.state.set_message(format!("▶ {}", track.name));
                    }
                }
                SessionEvent::PlaylistFinished => app.state.set_message("Playlist finished"),
                SessionEvent::Failed(e) => app.state.set_error(error_message(&e)),
                SessionEvent::TrackEnded(_) => {}
            }
        }

        if let Some(handle) = session.scheduler_mut().poll(Instant::now()) {
            session.on_frame(handle);
        }

        terminal.draw(|frame| render_ui(frame, &app, session))?;

        let timeout = session
            .render_loop()
            .scheduler()
            .time_until_due(Instant::now())
            .unwrap_or(IDLE_POLL);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Any key counts as the gesture a blocked playback waits for
                let was_blocked = session.playback_state() == PlaybackState::Blocked;
                if let Err(e) = session.user_gesture() {
                    app.state.set_warning(error_message(&e));
                }

                if let Some(cmd) = input_handler.handle_key(key) {
                    if !(was_blocked && cmd == Command::TogglePlay) {
                        handle_command(&mut app, session, cmd);
                    }
                }

                app.state.set_mode(input_handler.mode());
                app.state.command_buffer = input_handler.command_buffer().to_string();
            }
        }
    }

    session.graph_mut().close();
    Ok(())
}

fn render_ui(frame: &mut Frame, app: &App, session: &mut AppSession) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Transport
        Constraint::Min(3),    // Visualizer
        Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

    // Resizing only changes the drawing size; the frame loop is untouched
    let size = canvas_size(chunks[1]);
    if session.visualizer().size() != size {
        session.resize(size);
    }

    let theme = &app.state.theme;
    let info = NowPlaying::from_session(session);
    frame.render_widget(TransportWidget::new(&info, theme), chunks[0]);
    frame.render_widget(VisualizerWidget::new(session.frame()), chunks[1]);
    frame.render_widget(
        StatusBarWidget::new(app.state.mode, &app.state.command_buffer, theme)
            .message(app.state.message.as_deref(), app.state.message_type),
        chunks[2],
    );
}

fn handle_command(app: &mut App, session: &mut AppSession, cmd: Command) {
    match cmd {
        // Playback
        Command::TogglePlay => {
            if let Err(e) = session.toggle_play() {
                app.state.set_error(error_message(&e));
            }
        }
        Command::NextTrack => match session.next() {
            Ok(true) => {
                let title = session.title().unwrap_or_default().to_string();
                app.state.set_message(format!("▶ {}", title));
            }
            Ok(false) => app.state.set_message("End of playlist"),
            Err(e) => app.state.set_error(error_message(&e)),
        },
        Command::Seek(delta) => {
            if let Some(position) = session.position() {
                session.seek((position + delta).max(0.0));
            }
        }

        // Sources
        Command::UseMicrophone => match session.use_microphone() {
            Ok(()) => app.state.set_success("Listening to microphone"),
            Err(e) => app.state.set_error(error_message(&e)),
        },
        Command::AddTrack(path) => {
            let name = path.display().to_string();
            match session.add_tracks([MediaFile::Path(path)]) {
                Ok(_) => app.state.set_success(format!("Added {}", name)),
                Err(e) => app.state.set_error(error_message(&e)),
            }
        }

        // Tone and level
        Command::AdjustFilter(band, step) => {
            let f = session.filters();
            let applied = match band {
                Band::Bass => session.set_filters(f.bass + step, f.mid, f.treble),
                Band::Mid => session.set_filters(f.bass, f.mid + step, f.treble),
                Band::Treble => session.set_filters(f.bass, f.mid, f.treble + step),
            };
            app.state.set_message(format!(
                "EQ bass {:+.0} mid {:+.0} treble {:+.0} dB",
                applied.bass, applied.mid, applied.treble
            ));
        }
        Command::ResetFilters => {
            session.set_filters(0.0, 0.0, 0.0);
            app.state.set_message("EQ flat");
        }
        Command::AdjustVolume(delta) => {
            session.set_volume(session.volume() + delta);
        }

        // Theme
        Command::SetMode(mode) => session.set_mode(mode),
        Command::NextPreset => {
            session.next_preset();
            app.state.set_message(format!("Theme: {}", session.theme().name));
        }
        Command::SetPreset(name) => {
            if !session.set_preset(&name) {
                app.state.set_error(format!("Unknown preset: {}", name));
            }
        }
        Command::SetColor(index, hex) => {
            if let Err(e) = session.set_color(index, &hex) {
                app.state.set_error(error_message(&e));
            }
        }
        Command::SetBackgroundImage(image) => session.set_background_image(image),
        Command::SetSpeed(speed) => session.set_speed(speed),

        Command::EnterCommandMode | Command::EnterNormalMode => {}
        Command::Quit => app.quit(),
        Command::Unknown(line) => app.state.set_error(format!("Unknown command: {}", line)),
    }

    app.state.theme = Theme::from_state(session.theme());
}

/// User-facing text for a recoverable error
fn error_message(error: &SessionError) -> String {
    match error {
        SessionError::Graph(GraphError::PermissionDenied) => {
            "Microphone permission denied - press m to retry".to_string()
        }
        SessionError::Graph(GraphError::PlaybackBlocked) => {
            "Playback blocked - press any key to start".to_string()
        }
        other => other.to_string(),
    }
}
