//! Output sink playing through the default audio device via `rodio`.
//!
//! `rodio::OutputStream` must stay on the thread that created it, so the
//! stream lives on a small device thread for as long as the sink is open.
//! Only the `rodio::Sink` handle travels back to the engine.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use super::{OutputSink, PluginError, SampleFormat};

/// Buffers queued on the device before `write` starts waiting.
const MAX_QUEUED_BUFFERS: usize = 8;
/// Upper bound for a single wait on the device (backpressure or flush).
const MAX_WAIT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

struct Device {
    sink: Sink,
    shutdown: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

pub struct RodioOutput {
    device: Option<Device>,
    /// Playing time of each buffer appended to the sink, oldest first.
    queued: VecDeque<Duration>,
    channels: u16,
    rate: u32,
    format: SampleFormat,
    volume: u8,
}

impl RodioOutput {
    pub fn new() -> Self {
        Self {
            device: None,
            queued: VecDeque::new(),
            channels: 2,
            rate: 44_100,
            format: SampleFormat::S16Le,
            volume: 100,
        }
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

fn open_device() -> Result<Device, PluginError> {
    let (ready_tx, ready_rx) = mpsc::channel::<Result<Sink, String>>();
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let thread = thread::Builder::new()
        .name("audio-device".to_string())
        .spawn(move || {
            let mut stream = match OutputStreamBuilder::open_default_stream() {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
            // but noisy for a TUI app.
            stream.log_on_drop(false);

            let sink = Sink::connect_new(stream.mixer());
            if ready_tx.send(Ok(sink)).is_err() {
                return;
            }

            // Returns on an explicit close or when the sink owner goes away.
            let _ = shutdown_rx.recv();
            drop(stream);
        })
        .map_err(|e| PluginError::Device(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(sink)) => Ok(Device {
            sink,
            shutdown: shutdown_tx,
            thread,
        }),
        Ok(Err(reason)) => {
            let _ = thread.join();
            Err(PluginError::Device(reason))
        }
        Err(_) => {
            let _ = thread.join();
            Err(PluginError::Device("audio device thread exited".to_string()))
        }
    }
}

/// Poll `done` until it holds or `MAX_WAIT` elapses.
fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + MAX_WAIT;
    while !done() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
    true
}

impl OutputSink for RodioOutput {
    fn name(&self) -> &str {
        "rodio"
    }

    fn open(&mut self) -> Result<(), PluginError> {
        if self.device.is_some() {
            return Ok(());
        }
        let device = open_device()?;
        device.sink.set_volume(self.volume as f32 / 100.0);
        device.sink.play();
        debug!("audio device opened");
        self.device = Some(device);
        Ok(())
    }

    fn close(&mut self) {
        let Some(device) = self.device.take() else {
            return;
        };
        device.sink.stop();
        self.queued.clear();
        let _ = device.shutdown.send(());
        if device.thread.join().is_err() {
            warn!("audio device thread panicked");
        }
        debug!("audio device closed");
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn set_channels(&mut self, channels: u16) {
        self.channels = channels;
    }

    fn set_freq(&mut self, rate: u32) {
        self.rate = rate;
    }

    fn set_format(&mut self, format: SampleFormat) {
        self.format = format;
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), PluginError> {
        let Some(device) = self.device.as_ref() else {
            return Err(PluginError::Device("output is not open".to_string()));
        };
        if self.channels == 0 || self.rate == 0 {
            return Err(PluginError::Device(format!(
                "unusable output format: {} channels at {} Hz",
                self.channels, self.rate
            )));
        }

        let width = self.format.bytes_per_sample();
        let frame = width * self.channels as usize;
        let usable = buf.len() - buf.len() % frame;
        if usable == 0 {
            return Ok(());
        }

        let format = self.format;
        let samples: Vec<f32> = buf[..usable]
            .chunks_exact(width)
            .map(|b| format.to_f32(b))
            .collect();

        if !wait_for(|| device.sink.len() < MAX_QUEUED_BUFFERS) {
            warn!("audio device is not draining; queueing anyway");
        }
        let frames = (samples.len() / self.channels as usize) as u64;
        device
            .sink
            .append(SamplesBuffer::new(self.channels, self.rate, samples));

        // Buffers the sink no longer holds have been played.
        let pending = device.sink.len().saturating_sub(1);
        while self.queued.len() > pending {
            self.queued.pop_front();
        }
        self.queued
            .push_back(Duration::from_nanos(frames * 1_000_000_000 / self.rate as u64));
        Ok(())
    }

    fn flush(&mut self) {
        if let Some(device) = self.device.as_ref() {
            if !wait_for(|| device.sink.empty()) {
                warn!("timed out waiting for the audio device to drain");
            }
        }
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        if let Some(device) = self.device.as_ref() {
            device.sink.set_volume(self.volume as f32 / 100.0);
        }
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn latency(&self) -> Duration {
        let pending = self.device.as_ref().map_or(0, |d| d.sink.len());
        self.queued.iter().rev().take(pending).sum()
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.close();
    }
}
