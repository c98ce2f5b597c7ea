//! `App`: key handling for the terminal front end.
//!
//! Keys either move the cursor (applied to the playlist right away) or turn
//! into an `EngineCmd` for the player's command queue.

use crossterm::event::KeyCode;

use crate::config::ControlsSettings;
use crate::effects::Downmix;
use crate::engine::{EngineCmd, PlaybackInfo, PlaybackState};
use crate::playlist::Playlist;
use crate::plugin::Equalizer;

/// What the event loop should do after a key press.
#[derive(Debug, Clone)]
pub enum Action {
    Nothing,
    Send(EngineCmd),
    Quit,
}

pub struct App {
    /// Keep the cursor on the playing track.
    pub follow_playback: bool,
    pub current_dir: Option<String>,
    pending_g: bool,
}

impl App {
    pub fn new(follow_playback: bool) -> Self {
        Self {
            follow_playback,
            current_dir: None,
            pending_g: false,
        }
    }

    /// Record the scanned directory for the status line.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    /// Move the cursor onto the playing track when following playback.
    pub fn follow(&self, playlist: &mut Playlist) {
        if !self.follow_playback {
            return;
        }
        if let Some(current) = playlist.current() {
            if playlist.cursor() != Some(current) {
                playlist.select(current);
            }
        }
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        playlist: &mut Playlist,
        info: &PlaybackInfo,
        equalizer: &Equalizer,
        controls: &ControlsSettings,
    ) -> Action {
        let pending_g = std::mem::take(&mut self.pending_g);
        let cursor = playlist.cursor().unwrap_or(0);

        let cmd = match key {
            KeyCode::Char('q') => return Action::Quit,

            KeyCode::Char('g') if pending_g => {
                self.follow_playback = false;
                playlist.select(0);
                return Action::Nothing;
            }
            KeyCode::Char('g') => {
                self.pending_g = true;
                return Action::Nothing;
            }
            KeyCode::Char('G') => {
                self.follow_playback = false;
                playlist.select(playlist.len().saturating_sub(1));
                return Action::Nothing;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.follow_playback = false;
                playlist.select(cursor.saturating_add(1));
                return Action::Nothing;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.follow_playback = false;
                playlist.select(cursor.saturating_sub(1));
                return Action::Nothing;
            }
            KeyCode::Char('J') => {
                self.follow_playback = false;
                playlist.extend_selection(cursor.saturating_add(1));
                return Action::Nothing;
            }
            KeyCode::Char('K') => {
                self.follow_playback = false;
                playlist.extend_selection(cursor.saturating_sub(1));
                return Action::Nothing;
            }

            KeyCode::Enter => {
                if playlist.is_empty() {
                    return Action::Nothing;
                }
                self.follow_playback = true;
                EngineCmd::StartSelected
            }
            KeyCode::Char(' ') => EngineCmd::TogglePause,
            KeyCode::Char('p') => EngineCmd::Pause,
            KeyCode::Char('x') => match info.state {
                PlaybackState::Paused => EngineCmd::Resume,
                _ if playlist.current().is_none() => EngineCmd::StartSelected,
                _ => EngineCmd::Play,
            },
            KeyCode::Char('S') => EngineCmd::Stop,
            KeyCode::Char('h') => {
                self.follow_playback = true;
                EngineCmd::Skip(-1)
            }
            KeyCode::Char('l') => {
                self.follow_playback = true;
                EngineCmd::Skip(1)
            }
            KeyCode::Char('H') => EngineCmd::Seek {
                secs: -seek_step(controls),
                relative: true,
            },
            KeyCode::Char('L') => EngineCmd::Seek {
                secs: seek_step(controls),
                relative: true,
            },
            KeyCode::Char('-') => EngineCmd::SetVolume {
                value: -i32::from(controls.volume_step),
                relative: true,
            },
            KeyCode::Char('+') | KeyCode::Char('=') => EngineCmd::SetVolume {
                value: i32::from(controls.volume_step),
                relative: true,
            },
            KeyCode::Char('[') => preamp(equalizer, -1.0),
            KeyCode::Char(']') => preamp(equalizer, 1.0),
            KeyCode::Char('s') => EngineCmd::SetShuffle(!info.sequencing.shuffle),
            KeyCode::Char('r') => EngineCmd::SetLoop(!info.sequencing.loop_play),
            KeyCode::Char('m') => {
                EngineCmd::SetDownmix(!info.effects.iter().any(|e| e == Downmix::NAME))
            }
            KeyCode::Char('d') => match playlist.selection_range() {
                Some(range) => EngineCmd::Remove {
                    start: *range.start(),
                    end: *range.end(),
                },
                None => return Action::Nothing,
            },
            _ => return Action::Nothing,
        };

        Action::Send(cmd)
    }
}

fn seek_step(controls: &ControlsSettings) -> i64 {
    i64::try_from(controls.seek_seconds).unwrap_or(i64::MAX)
}

fn preamp(current: &Equalizer, delta: f32) -> EngineCmd {
    let mut eq = current.clone();
    eq.adjust_preamp(delta);
    EngineCmd::SetEqualizer(eq)
}
