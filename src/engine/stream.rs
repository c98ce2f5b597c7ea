//! The streaming session: decode, post-process and write, track after track.
//!
//! A session is started by `play` on the command side (which opens the
//! first track itself so that failures are reported synchronously) and
//! then runs on its own thread until the playlist runs out or the session
//! is cancelled. Stopping joins that thread, so once `stop` returns no
//! decoder or output is in use anymore.

use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::plugin::AudioParams;

use super::cancel::CancelToken;
use super::clock::Clock;
use super::error::{EngineError, Result};
use super::shared::Shared;
use super::types::PlaybackState;

const BUFFER_SIZE: usize = 8192;

/// A track that has been opened and is being played.
pub(crate) struct ActiveTrack {
    pub(crate) index: usize,
    params: AudioParams,
    /// Self-rendering decoder, or silent mode: the output is left alone.
    bypass_output: bool,
    clock: Clock,
}

enum StreamEnd {
    Finished,
    Cancelled,
}

/// Open the track at `index`, get the output ready for it and start its clock.
pub(crate) fn begin_track(shared: &Arc<Shared>, index: usize) -> Result<ActiveTrack> {
    // The track becomes current before it is opened, so removals see it.
    let path = {
        let mut playlist = shared.playlist.write();
        let path = playlist
            .get(index)
            .map(|t| t.path.clone())
            .ok_or(EngineError::NoTrack(index))?;
        playlist.set_current(Some(index));
        path
    };

    let input = shared
        .inputs
        .input_for(&path)
        .ok_or_else(|| EngineError::UnsupportedFormat {
            path: path.clone(),
            source: None,
        })?;

    if shared.options.update_song_len_on_play {
        if let Some(length) = input.length(&path) {
            shared.playlist.write().set_duration(index, length);
        }
    }

    let mut decoder = input
        .open(&path)
        .map_err(|e| EngineError::UnsupportedFormat {
            path: path.clone(),
            source: Some(e),
        })?;
    let params = decoder.audio_params();
    let bypass_output = input.renders_itself() || shared.options.silent_mode;

    let mut output = shared.output();
    if bypass_output {
        // A decoder that renders itself needs the device to itself.
        if output.is_open() {
            output.close();
        }
    } else {
        if !output.is_open() {
            if let Err(e) = output.open() {
                decoder.close();
                return Err(EngineError::OutputInitFailed(e));
            }
        }
        output.configure(params);
    }
    drop(output);

    decoder.set_equalizer(&shared.equalizer());
    shared.install_decoder(decoder);
    shared.set_elapsed(0);
    let clock = Clock::start(shared);
    shared.set_state(PlaybackState::Playing);

    info!(
        index,
        path = %path.display(),
        input = input.name(),
        channels = params.channels,
        rate = params.rate,
        "track started"
    );
    shared.redraw();

    Ok(ActiveTrack {
        index,
        params,
        bypass_output,
        clock,
    })
}

/// Start playing at `index`, moving on past unopenable tracks.
///
/// Every track is tried at most once: the walk gives up once all of them
/// have failed, when the sequence runs out, or on any failure other than
/// an unreadable file.
pub(crate) fn start_from(
    shared: &Arc<Shared>,
    mut index: usize,
    cancel: &CancelToken,
) -> Option<ActiveTrack> {
    let mut failed = BTreeSet::new();
    loop {
        if cancel.is_cancelled() {
            return None;
        }
        match begin_track(shared, index) {
            Ok(track) => return Some(track),
            Err(e @ EngineError::UnsupportedFormat { .. }) => {
                warn!(index, "{e}");
                shared.report(e.to_string());
                failed.insert(index);
                index = shared.advance_untried(index, &failed)?;
            }
            Err(e) => {
                warn!(index, "{e}");
                shared.report(e.to_string());
                return None;
            }
        }
    }
}

pub(crate) fn spawn_session(
    shared: Arc<Shared>,
    cancel: CancelToken,
    first: ActiveTrack,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("playback-stream".into())
        .spawn(move || run_session(&shared, &cancel, first))
}

fn run_session(shared: &Arc<Shared>, cancel: &CancelToken, first: ActiveTrack) {
    let mut track = first;
    loop {
        let index = track.index;
        let end = stream_track(shared, cancel, &mut track);
        finish_track(shared, track);

        if matches!(end, StreamEnd::Cancelled) || cancel.is_cancelled() {
            break;
        }

        shared.set_state(PlaybackState::Stopped);
        debug!(index, "track finished");
        // Removals shift indices; the playlist's current is authoritative.
        let current = shared.playlist.read().current();
        let next = shared
            .advance(current, 1)
            .and_then(|next| start_from(shared, next, cancel));
        match next {
            Some(next) => track = next,
            None => break,
        }
    }

    {
        let mut output = shared.output();
        if output.is_open() {
            output.close();
        }
    }
    if !cancel.is_cancelled() {
        info!("end of playlist");
        shared.reset_idle();
    }
}

fn stream_track(shared: &Shared, cancel: &CancelToken, track: &mut ActiveTrack) -> StreamEnd {
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut chunk = Vec::with_capacity(BUFFER_SIZE);

    loop {
        if cancel.is_cancelled() {
            return StreamEnd::Cancelled;
        }
        if shared.take_equalizer_dirty() {
            shared.apply_equalizer();
        }
        if shared.wait_while_paused(cancel) {
            continue;
        }

        let read = shared.with_decoder(|d| d.read(&mut buf).map(|n| (n, d.audio_params())));
        let (n, params) = match read {
            None => return StreamEnd::Cancelled,
            Some(Ok((0, _))) => return StreamEnd::Finished,
            Some(Ok(read)) => read,
            Some(Err(e)) => {
                warn!(index = track.index, "{}", EngineError::DecodeTransient(e));
                return StreamEnd::Finished;
            }
        };

        if track.bypass_output {
            continue;
        }

        if params != track.params {
            debug!(from = ?track.params, to = ?params, "audio format changed");
            let mut output = shared.output();
            output.flush();
            output.configure(params);
            shared.set_latency(output.latency());
            track.params = params;
        }

        let data: &[u8] = {
            let mut effects = shared.effects();
            if effects.is_empty() {
                &buf[..n]
            } else {
                chunk.clear();
                chunk.extend_from_slice(&buf[..n]);
                effects.apply(&mut chunk, params);
                &chunk
            }
        };
        if data.is_empty() {
            continue;
        }
        let mut output = shared.output();
        if let Err(e) = output.write(data) {
            warn!("output write failed: {e}");
        }
        shared.set_latency(output.latency());
    }
}

fn finish_track(shared: &Shared, track: ActiveTrack) {
    if !track.bypass_output {
        shared.output().flush();
    }
    track.clock.stop();
    shared.close_decoder();
    shared.set_elapsed(0);
    shared.set_latency(Duration::ZERO);
}
