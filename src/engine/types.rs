//! Engine-wide value types shared with front ends.

use std::time::Duration;

use crate::config::PlaybackSettings;
use crate::plugin::Equalizer;

/// The playback state of the engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// How the next track is chosen.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequencing {
    /// Pick a random track instead of walking the list.
    pub shuffle: bool,
    /// Wrap around at either end of the list.
    pub loop_play: bool,
}

/// Construction-time options read from configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub sequencing: Sequencing,
    /// Refresh the cached track length from the decoder before playing.
    pub update_song_len_on_play: bool,
    /// Never open or write the output sink.
    pub silent_mode: bool,
    /// Initial volume; `None` keeps whatever the output sink reports.
    pub volume: Option<u8>,
}

impl From<&PlaybackSettings> for EngineOptions {
    fn from(settings: &PlaybackSettings) -> Self {
        Self {
            sequencing: Sequencing {
                shuffle: settings.shuffle_play,
                loop_play: settings.loop_play,
            },
            update_song_len_on_play: settings.update_song_len_on_play,
            silent_mode: settings.silent_mode,
            volume: settings.volume,
        }
    }
}

/// Commands a front end can queue for the engine.
#[derive(Debug, Clone)]
pub enum EngineCmd {
    /// Play the playlist's current track (restarting it if already playing).
    Play,
    /// Make the selection cursor the current track and play it.
    StartSelected,
    Pause,
    Resume,
    TogglePause,
    Stop,
    /// Seek to `secs` (absolute) or by `secs` (relative).
    Seek { secs: i64, relative: bool },
    /// Set the volume to `value` (absolute) or change it by `value` (relative).
    SetVolume { value: i32, relative: bool },
    /// Move `n` tracks forward (negative: backward) and play.
    Skip(i64),
    SetEqualizer(Equalizer),
    SetShuffle(bool),
    /// Turn the mono downmix effect on or off.
    SetDownmix(bool),
    SetLoop(bool),
    /// Remove the tracks in `start..=end` from the playlist.
    Remove { start: usize, end: usize },
    ClearMessage,
    /// Stop playback and end the command thread.
    Quit,
}

/// Snapshot of playback for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackInfo {
    /// Current playlist index (if any).
    pub index: Option<usize>,
    pub state: PlaybackState,
    /// Elapsed time in the current track, whole seconds.
    pub elapsed: Duration,
    /// Volume in percent.
    pub volume: u8,
    pub sequencing: Sequencing,
    /// Names of the active effects, in the order they run.
    pub effects: Vec<String>,
    /// Last status message ("" when there is none).
    pub message: String,
}
