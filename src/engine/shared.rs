//! State shared by the command side, the stream thread and the clock.
//!
//! The playback state lives behind a mutex paired with a condition
//! variable so that a paused stream loop, an idle clock and a cancelled
//! session can all sleep until something changes instead of polling.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tracing::debug;

use crate::effects::EffectsStage;
use crate::playlist::SharedPlaylist;
use crate::plugin::{Decoder, Equalizer, Inputs, OutputSink, PluginSet};

use super::cancel::CancelToken;
use super::notify::UiNotify;
use super::selector::{select_next, select_untried};
use super::types::{EngineOptions, PlaybackState, Sequencing};

pub(crate) fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct Shared {
    pub(crate) playlist: SharedPlaylist,
    pub(crate) inputs: Inputs,
    pub(crate) options: EngineOptions,
    output: Mutex<Box<dyn OutputSink>>,
    effects: Mutex<EffectsStage>,
    equalizer: RwLock<Equalizer>,
    eq_dirty: AtomicBool,
    decoder: Mutex<Option<Box<dyn Decoder>>>,
    state: Mutex<PlaybackState>,
    wake: Condvar,
    elapsed: AtomicU64,
    /// Output latency in microseconds, as of the last write.
    latency: AtomicU64,
    volume: AtomicU8,
    shuffle: AtomicBool,
    loop_play: AtomicBool,
    message: Mutex<String>,
    notify: Box<dyn UiNotify>,
}

impl Shared {
    pub(crate) fn new(
        playlist: SharedPlaylist,
        plugins: PluginSet,
        options: EngineOptions,
        notify: Box<dyn UiNotify>,
    ) -> Self {
        let PluginSet {
            inputs,
            mut output,
            effects,
        } = plugins;
        if let Some(volume) = options.volume {
            output.set_volume(volume.min(100));
        }
        let volume = output.volume().min(100);

        Self {
            playlist,
            inputs,
            options,
            output: Mutex::new(output),
            effects: Mutex::new(effects),
            equalizer: RwLock::new(Equalizer::default()),
            eq_dirty: AtomicBool::new(false),
            decoder: Mutex::new(None),
            state: Mutex::new(PlaybackState::Stopped),
            wake: Condvar::new(),
            elapsed: AtomicU64::new(0),
            latency: AtomicU64::new(0),
            volume: AtomicU8::new(volume),
            shuffle: AtomicBool::new(options.sequencing.shuffle),
            loop_play: AtomicBool::new(options.sequencing.loop_play),
            message: Mutex::new(String::new()),
            notify,
        }
    }

    // --- playback state ---

    pub(crate) fn state(&self) -> PlaybackState {
        *lock(&self.state)
    }

    /// Store `next` and wake every waiter. Returns the previous state.
    pub(crate) fn set_state(&self, next: PlaybackState) -> PlaybackState {
        let mut state = lock(&self.state);
        let prev = std::mem::replace(&mut *state, next);
        self.wake.notify_all();
        prev
    }

    /// Move from `from` to `to` atomically; false if the state was not `from`.
    pub(crate) fn transition(&self, from: PlaybackState, to: PlaybackState) -> bool {
        let mut state = lock(&self.state);
        if *state != from {
            return false;
        }
        *state = to;
        self.wake.notify_all();
        true
    }

    /// Wake every thread sleeping on the state condition (after a cancel).
    pub(crate) fn wake_all(&self) {
        let _state = lock(&self.state);
        self.wake.notify_all();
    }

    /// Block while paused. Returns whether it had to wait at all.
    pub(crate) fn wait_while_paused(&self, cancel: &CancelToken) -> bool {
        let state = lock(&self.state);
        if *state != PlaybackState::Paused {
            return false;
        }
        let _state = self
            .wake
            .wait_while(state, |s| {
                *s == PlaybackState::Paused && !cancel.is_cancelled()
            })
            .unwrap_or_else(PoisonError::into_inner);
        true
    }

    /// Sleep for `period` or until cancelled; returns the state on waking.
    pub(crate) fn wait_tick(&self, cancel: &CancelToken, period: Duration) -> PlaybackState {
        let state = lock(&self.state);
        let (state, _) = self
            .wake
            .wait_timeout_while(state, period, |_| !cancel.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
        *state
    }

    /// Back to Stopped with a zeroed clock. Redraws only if anything changed.
    pub(crate) fn reset_idle(&self) {
        let prev = self.set_state(PlaybackState::Stopped);
        let prev_elapsed = self.elapsed.swap(0, Ordering::AcqRel);
        if prev != PlaybackState::Stopped || prev_elapsed != 0 {
            debug!("playback stopped");
            self.redraw();
        }
    }

    // --- sequencing ---

    pub(crate) fn sequencing(&self) -> Sequencing {
        Sequencing {
            shuffle: self.shuffle.load(Ordering::Relaxed),
            loop_play: self.loop_play.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn set_shuffle(&self, on: bool) {
        self.shuffle.store(on, Ordering::Relaxed);
    }

    pub(crate) fn set_loop(&self, on: bool) {
        self.loop_play.store(on, Ordering::Relaxed);
    }

    /// Pick the track `delta` positions away from `from` and make it current.
    /// `None` (end of a non-looping list) clears the current track.
    pub(crate) fn advance(&self, from: Option<usize>, delta: i64) -> Option<usize> {
        let sequencing = self.sequencing();
        let mut playlist = self.playlist.write();
        let next = select_next(playlist.len(), from, delta, sequencing, &mut rand::rng());
        playlist.set_current(next)
    }

    /// The track to try after `from` failed to open, skipping every index
    /// in `failed`. Shuffle draws among the untried tracks; linear order
    /// stops once it comes back around to a failed one.
    pub(crate) fn advance_untried(&self, from: usize, failed: &BTreeSet<usize>) -> Option<usize> {
        let sequencing = self.sequencing();
        if !sequencing.shuffle {
            return self.advance(Some(from), 1).filter(|next| !failed.contains(next));
        }
        let mut playlist = self.playlist.write();
        let next = select_untried(playlist.len(), failed, &mut rand::rng())?;
        playlist.set_current(Some(next))
    }

    // --- plugins ---

    /// Run `f` against the open decoder, if there is one.
    pub(crate) fn with_decoder<R>(&self, f: impl FnOnce(&mut dyn Decoder) -> R) -> Option<R> {
        let mut decoder = lock(&self.decoder);
        decoder.as_mut().map(|d| f(&mut **d))
    }

    pub(crate) fn install_decoder(&self, decoder: Box<dyn Decoder>) {
        *lock(&self.decoder) = Some(decoder);
    }

    /// Close and drop the open decoder. Returns whether there was one.
    pub(crate) fn close_decoder(&self) -> bool {
        let taken = lock(&self.decoder).take();
        match taken {
            Some(mut decoder) => {
                decoder.close();
                true
            }
            None => false,
        }
    }

    pub(crate) fn output(&self) -> MutexGuard<'_, Box<dyn OutputSink>> {
        lock(&self.output)
    }

    pub(crate) fn effects(&self) -> MutexGuard<'_, EffectsStage> {
        lock(&self.effects)
    }

    /// Close whatever a session may have left open.
    pub(crate) fn release(&self) {
        if self.close_decoder() {
            debug!("closed a leftover decoder");
        }
        let mut output = self.output();
        if output.is_open() {
            output.close();
        }
    }

    // --- equalizer ---

    pub(crate) fn equalizer(&self) -> Equalizer {
        self.equalizer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_equalizer(&self, eq: Equalizer) {
        *self
            .equalizer
            .write()
            .unwrap_or_else(PoisonError::into_inner) = eq;
    }

    pub(crate) fn mark_equalizer_dirty(&self) {
        self.eq_dirty.store(true, Ordering::Release);
    }

    /// Consume the dirty flag. A change racing with this call is picked up
    /// on the next one, so an update is applied at least once.
    pub(crate) fn take_equalizer_dirty(&self) -> bool {
        self.eq_dirty.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn apply_equalizer(&self) {
        let eq = self.equalizer();
        self.with_decoder(|d| d.set_equalizer(&eq));
    }

    // --- clock & volume ---

    pub(crate) fn elapsed(&self) -> u64 {
        self.elapsed.load(Ordering::Acquire)
    }

    pub(crate) fn set_elapsed(&self, secs: u64) {
        self.elapsed.store(secs, Ordering::Release);
    }

    /// Store a native position; returns the value it replaced.
    pub(crate) fn swap_elapsed(&self, secs: u64) -> u64 {
        self.elapsed.swap(secs, Ordering::AcqRel)
    }

    pub(crate) fn set_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency.store(micros, Ordering::Release);
    }

    pub(crate) fn latency(&self) -> Duration {
        Duration::from_micros(self.latency.load(Ordering::Acquire))
    }

    pub(crate) fn add_elapsed(&self, secs: u64) {
        self.elapsed.fetch_add(secs, Ordering::AcqRel);
    }

    pub(crate) fn volume(&self) -> u8 {
        self.volume.load(Ordering::Relaxed)
    }

    pub(crate) fn set_volume(&self, volume: u8) {
        self.volume.store(volume, Ordering::Relaxed);
        self.output().set_volume(volume);
    }

    // --- front end ---

    pub(crate) fn redraw(&self) {
        self.notify.redraw();
    }

    /// Publish a status message and ask for a redraw.
    pub(crate) fn report(&self, text: impl Into<String>) {
        let text = text.into();
        self.notify.message(&text);
        *lock(&self.message) = text;
        self.redraw();
    }

    pub(crate) fn message(&self) -> String {
        lock(&self.message).clone()
    }

    pub(crate) fn clear_message(&self) {
        lock(&self.message).clear();
    }
}
