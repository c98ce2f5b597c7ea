//! Per-track playback clock.
//!
//! Elapsed time is kept in whole seconds. When the decoder reports a
//! native position that value wins, less whatever the output still has
//! queued; otherwise wall-clock time spent in
//! `Playing` is accumulated, carrying the sub-second remainder between
//! ticks so rounding never drifts.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use super::cancel::CancelToken;
use super::shared::Shared;
use super::types::PlaybackState;

pub(crate) const TICK: Duration = Duration::from_millis(50);

pub(crate) struct Clock {
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl Clock {
    pub(crate) fn start(shared: &Arc<Shared>) -> Self {
        let cancel = CancelToken::new();
        let thread = {
            let shared = Arc::clone(shared);
            let cancel = cancel.clone();
            thread::Builder::new()
                .name("playback-clock".into())
                .spawn(move || run(&shared, &cancel))
        };
        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("playback clock unavailable: {e}");
                None
            }
        };

        Self {
            cancel,
            thread,
            shared: Arc::clone(shared),
        }
    }

    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.cancel.cancel();
        self.shared.wake_all();
        if thread.join().is_err() {
            error!("playback clock panicked");
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(shared: &Shared, cancel: &CancelToken) {
    let mut last = Instant::now();
    let mut carry = Duration::ZERO;

    loop {
        let state = shared.wait_tick(cancel, TICK);
        if cancel.is_cancelled() {
            break;
        }

        let now = Instant::now();
        let delta = now.saturating_duration_since(last);
        last = now;

        // Time spent paused or between tracks is simply dropped.
        if state == PlaybackState::Playing {
            carry = tick(shared, delta, carry);
        }
    }
}

/// Advance the clock by one step. Returns the remainder to carry.
fn tick(shared: &Shared, delta: Duration, carry: Duration) -> Duration {
    if let Some(decoded) = shared.with_decoder(|d| d.position()).flatten() {
        let native = decoded.saturating_sub(shared.latency()).as_secs();
        if shared.swap_elapsed(native) != native {
            debug!(elapsed = native, "native position");
            shared.redraw();
        }
        return Duration::ZERO;
    }

    let total = carry + delta;
    let whole = total.as_secs();
    if whole > 0 {
        shared.add_elapsed(whole);
        shared.redraw();
    }
    total - Duration::from_secs(whole)
}
