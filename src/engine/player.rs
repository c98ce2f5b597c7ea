use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::effects::{Downmix, Effect};
use crate::playlist::SharedPlaylist;
use crate::plugin::{Equalizer, PluginSet};

use super::cancel::CancelToken;
use super::notify::UiNotify;
use super::shared::{Shared, lock};
use super::stream;
use super::types::{EngineCmd, EngineOptions, PlaybackInfo, PlaybackState, Sequencing};

/// The playback engine.
///
/// Every method may be called from any thread. Commands are serialized
/// against each other; `stop` (and anything that stops first, such as
/// `play` or `skip`) returns only once the previous stream session has
/// fully shut down.
pub struct PlaybackEngine {
    shared: Arc<Shared>,
    session: Mutex<Option<Session>>,
}

struct Session {
    cancel: CancelToken,
    thread: JoinHandle<()>,
}

impl PlaybackEngine {
    pub fn new(
        playlist: SharedPlaylist,
        plugins: PluginSet,
        options: EngineOptions,
        notify: impl UiNotify + 'static,
    ) -> Self {
        debug!(inputs = ?plugins.inputs().names(), ?options, "engine created");
        Self {
            shared: Arc::new(Shared::new(playlist, plugins, options, Box::new(notify))),
            session: Mutex::new(None),
        }
    }

    pub fn playlist(&self) -> &SharedPlaylist {
        &self.shared.playlist
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    /// Elapsed time in the current track, whole seconds.
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs(self.shared.elapsed())
    }

    pub fn volume(&self) -> u8 {
        self.shared.volume()
    }

    pub fn sequencing(&self) -> Sequencing {
        self.shared.sequencing()
    }

    pub fn equalizer(&self) -> Equalizer {
        self.shared.equalizer()
    }

    pub fn info(&self) -> PlaybackInfo {
        PlaybackInfo {
            index: self.shared.playlist.read().current(),
            state: self.shared.state(),
            elapsed: self.elapsed(),
            volume: self.volume(),
            sequencing: self.sequencing(),
            effects: self.shared.effects().names().into_iter().map(String::from).collect(),
            message: self.shared.message(),
        }
    }

    /// Play the playlist's current track from the start.
    pub fn play(&self) {
        let mut session = self.lock_session();
        self.play_locked(&mut session);
    }

    /// Make the selection cursor the current track and play it.
    pub fn start_selected(&self) {
        let mut session = self.lock_session();
        let cursor = self.shared.playlist.read().cursor();
        if cursor.is_none() {
            return;
        }
        self.shared.playlist.write().set_current(cursor);
        self.play_locked(&mut session);
    }

    pub fn pause(&self) {
        let _session = self.lock_session();
        if self
            .shared
            .transition(PlaybackState::Playing, PlaybackState::Paused)
        {
            self.shared.with_decoder(|d| d.pause());
            info!("paused");
            self.shared.redraw();
        }
    }

    pub fn resume(&self) {
        let _session = self.lock_session();
        if self
            .shared
            .transition(PlaybackState::Paused, PlaybackState::Playing)
        {
            self.shared.with_decoder(|d| d.resume());
            info!("resumed");
            self.shared.redraw();
        }
    }

    pub fn toggle_pause(&self) {
        match self.state() {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Stopped => {}
        }
    }

    /// Stop playback. Safe to call in any state, any number of times.
    pub fn stop(&self) {
        let mut session = self.lock_session();
        self.stop_locked(&mut session);
    }

    /// Seek to `secs`, or by `secs` when `relative`. The target is clamped
    /// to the track. Ignored while stopped.
    pub fn seek(&self, secs: i64, relative: bool) {
        let _session = self.lock_session();
        if self.shared.state() == PlaybackState::Stopped {
            return;
        }

        let length = self
            .shared
            .playlist
            .read()
            .current_track()
            .and_then(|t| t.duration)
            .or_else(|| self.shared.with_decoder(|d| d.length()).flatten());

        let base = if relative {
            i64::try_from(self.shared.elapsed()).unwrap_or(i64::MAX)
        } else {
            0
        };
        let mut target = u64::try_from(base.saturating_add(secs)).unwrap_or(0);
        if let Some(length) = length {
            target = target.min(length.as_secs());
        }

        match self.shared.with_decoder(|d| d.seek(target)) {
            Some(Ok(())) => {
                debug!(target, "seek");
                self.shared.set_elapsed(target);
                self.shared.redraw();
            }
            Some(Err(e)) => warn!("{e}"),
            None => {}
        }
    }

    /// Set the volume to `value`, or change it by `value` when `relative`.
    /// Returns the resulting volume, always within `0..=100`.
    pub fn set_volume(&self, value: i32, relative: bool) -> u8 {
        let _session = self.lock_session();
        let target = if relative {
            i32::from(self.shared.volume()).saturating_add(value)
        } else {
            value
        };
        let volume = target.clamp(0, 100) as u8;
        self.shared.set_volume(volume);
        self.shared.redraw();
        volume
    }

    /// Move `n` tracks forward (negative: backward) and play that track.
    /// Stops when there is nothing in that direction.
    pub fn skip(&self, n: i64) {
        let mut session = self.lock_session();
        let current = self.shared.playlist.read().current();
        match self.shared.advance(current, n) {
            Some(_) => self.play_locked(&mut session),
            None => self.stop_locked(&mut session),
        }
    }

    pub fn set_equalizer(&self, eq: Equalizer) {
        self.shared.set_equalizer(eq);
        self.notify_equalizer_changed();
    }

    /// The equalizer was changed elsewhere; reapply it to the open decoder.
    pub fn notify_equalizer_changed(&self) {
        self.shared.mark_equalizer_dirty();
    }

    pub fn set_shuffle(&self, on: bool) {
        self.shared.set_shuffle(on);
        self.shared.redraw();
    }

    pub fn set_loop(&self, on: bool) {
        self.shared.set_loop(on);
        self.shared.redraw();
    }

    pub fn add_effect(&self, effect: Box<dyn Effect>) {
        self.shared.effects().push(effect);
    }

    pub fn remove_effect(&self, name: &str) -> bool {
        self.shared.effects().remove(name)
    }

    /// Add or drop the mono downmix at the end of the effect chain.
    pub fn set_downmix(&self, on: bool) {
        self.remove_effect(Downmix::NAME);
        if on {
            self.add_effect(Box::new(Downmix));
        }
        self.shared.redraw();
    }

    /// Remove `range` from the playlist, stopping first if it holds the
    /// current track.
    pub fn remove_tracks(&self, range: RangeInclusive<usize>) {
        let mut session = self.lock_session();
        loop {
            // Holding the write lock keeps the stream from moving onto a
            // track in `range` between the check and the removal.
            let mut playlist = self.shared.playlist.write();
            let playing = playlist.current().is_some_and(|c| range.contains(&c));
            if !playing || session.is_none() {
                let removed = playlist.remove(range);
                drop(playlist);
                debug!(count = removed.len(), "tracks removed");
                self.shared.redraw();
                return;
            }
            drop(playlist);
            self.stop_locked(&mut session);
        }
    }

    pub fn clear_message(&self) {
        self.shared.clear_message();
        self.shared.redraw();
    }

    /// Apply one queued command. Returns false for `Quit`.
    pub fn handle(&self, cmd: EngineCmd) -> bool {
        match cmd {
            EngineCmd::Play => self.play(),
            EngineCmd::StartSelected => self.start_selected(),
            EngineCmd::Pause => self.pause(),
            EngineCmd::Resume => self.resume(),
            EngineCmd::TogglePause => self.toggle_pause(),
            EngineCmd::Stop => self.stop(),
            EngineCmd::Seek { secs, relative } => self.seek(secs, relative),
            EngineCmd::SetVolume { value, relative } => {
                self.set_volume(value, relative);
            }
            EngineCmd::Skip(n) => self.skip(n),
            EngineCmd::SetEqualizer(eq) => self.set_equalizer(eq),
            EngineCmd::SetShuffle(on) => self.set_shuffle(on),
            EngineCmd::SetDownmix(on) => self.set_downmix(on),
            EngineCmd::SetLoop(on) => self.set_loop(on),
            EngineCmd::Remove { start, end } => self.remove_tracks(start..=end),
            EngineCmd::ClearMessage => self.clear_message(),
            EngineCmd::Quit => {
                self.stop();
                return false;
            }
        }
        true
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        lock(&self.session)
    }

    fn play_locked(&self, session: &mut Option<Session>) {
        self.stop_locked(session);

        let Some(index) = self.shared.playlist.read().current() else {
            debug!("play requested with no current track");
            return;
        };

        let cancel = CancelToken::new();
        let Some(first) = stream::start_from(&self.shared, index, &cancel) else {
            self.shared.release();
            self.shared.reset_idle();
            return;
        };

        match stream::spawn_session(Arc::clone(&self.shared), cancel.clone(), first) {
            Ok(thread) => *session = Some(Session { cancel, thread }),
            Err(e) => {
                error!("cannot start the stream thread: {e}");
                self.shared.release();
                self.shared.reset_idle();
                self.shared.report(format!("cannot start playback: {e}"));
            }
        }
    }

    fn stop_locked(&self, session: &mut Option<Session>) {
        if let Some(Session { cancel, thread }) = session.take() {
            cancel.cancel();
            self.shared.wake_all();
            if thread.join().is_err() {
                error!("stream thread panicked");
            }
        }
        self.shared.release();
        self.shared.reset_idle();
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
