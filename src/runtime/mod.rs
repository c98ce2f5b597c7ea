use std::env;
use std::path::Path;
use std::sync::{Arc, mpsc};

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::effects::{Downmix, EffectsStage};
use crate::engine::{EngineOptions, PlaybackEngine, Player, UiEvent};
use crate::library::scan;
use crate::playlist::{Playlist, SharedPlaylist};
use crate::plugin::{PluginSet, RodioInput, RodioOutput};

mod event_loop;
mod logging;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    if let Err(e) = logging::init(&settings.log) {
        eprintln!("cadenza: logging disabled: {e}");
    }

    let dir = env::args().nth(1).unwrap_or_else(|| {
        env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    let tracks = scan(Path::new(&dir), &settings.library);
    info!(dir = %dir, tracks = tracks.len(), "library scanned");
    if tracks.is_empty() {
        warn!("no playable files found");
    }

    let playlist = SharedPlaylist::new(Playlist::new(tracks));
    let mut effects = EffectsStage::default();
    if settings.playback.downmix {
        effects.push(Box::new(Downmix));
    }
    let plugins = PluginSet::new(Box::new(RodioOutput::new()))
        .with_input(Arc::new(RodioInput::new(settings.playback.sample_format)))
        .with_effects(effects);
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>();
    let engine = PlaybackEngine::new(
        playlist,
        plugins,
        EngineOptions::from(&settings.playback),
        ui_tx,
    );
    let player = Player::new(engine)?;

    let mut app = App::new(settings.ui.follow_playback);
    app.set_current_dir(dir);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &player, &ui_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    player.quit();
    run_result
}
