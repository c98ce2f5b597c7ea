use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::{Action, App};
use crate::config;
use crate::engine::{EngineCmd, Player, UiEvent};
use crate::ui;

/// How long to wait for a key before looking at engine events again.
const POLL: Duration = Duration::from_millis(50);

/// Main terminal event loop: input, engine notifications and drawing.
/// Returns `Ok(())` when the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &Player,
    events: &Receiver<UiEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let playlist = player.engine().playlist().clone();
    let mut dirty = true;

    loop {
        dirty |= drain_events(events);

        let info = player.info();
        if dirty {
            {
                let mut playlist = playlist.write();
                app.follow(&mut playlist);
            }
            let playlist = playlist.read();
            terminal.draw(|f| ui::draw(f, app, &playlist, &info, &settings.ui, &settings.controls))?;
            dirty = false;
        }

        if !event::poll(POLL)? {
            continue;
        }
        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            Event::Resize(..) => {
                dirty = true;
                continue;
            }
            _ => continue,
        };
        dirty = true;

        let action = {
            let mut playlist = playlist.write();
            app.handle_key(
                key.code,
                &mut playlist,
                &info,
                &player.engine().equalizer(),
                &settings.controls,
            )
        };

        match action {
            Action::Nothing => {}
            Action::Quit => {
                player.quit();
                return Ok(());
            }
            Action::Send(cmd) => {
                if !info.message.is_empty() {
                    send(player, EngineCmd::ClearMessage);
                }
                send(player, cmd);
            }
        }
    }
}

fn send(player: &Player, cmd: EngineCmd) {
    if let Err(e) = player.send(cmd) {
        warn!("engine is gone, dropping {:?}", e.0);
    }
}

/// Consume pending engine events. True when any of them asks for a redraw;
/// status messages do too, since the status line shows them.
fn drain_events(events: &Receiver<UiEvent>) -> bool {
    let mut redraw = false;
    for event in events.try_iter() {
        if let UiEvent::Message(text) = &event {
            debug!(%text, "status message");
        }
        redraw = true;
    }
    redraw
}
