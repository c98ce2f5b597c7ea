//! Capability interfaces for decoders ("input plugins") and output sinks.
//!
//! The playback engine never touches a codec or an audio device directly.
//! It only talks to the traits defined here, so any number of decoder and
//! sink families can be plugged in. Picking an input plugin for a file is a
//! pure function of its path (`Inputs::input_for`).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::effects::EffectsStage;

mod rodio_input;
mod rodio_output;

pub use rodio_input::RodioInput;
pub use rodio_output::RodioOutput;

#[cfg(test)]
mod tests;

/// Layout of the raw interleaved samples exchanged between plugins.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    #[default]
    S16Le,
    S16Be,
    F32Le,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16Le | SampleFormat::S16Be => 2,
            SampleFormat::F32Le => 4,
        }
    }

    /// Decode one sample starting at `bytes[0]` into the `-1.0..=1.0` range.
    pub fn to_f32(self, bytes: &[u8]) -> f32 {
        match self {
            SampleFormat::U8 => (bytes[0] as f32 - 128.0) / 128.0,
            SampleFormat::S16Le => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
            SampleFormat::S16Be => i16::from_be_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
            SampleFormat::F32Le => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    /// Encode `value` (clamped to `-1.0..=1.0`) into `out[..bytes_per_sample()]`.
    pub fn write_f32(self, value: f32, out: &mut [u8]) {
        let value = value.clamp(-1.0, 1.0);
        match self {
            SampleFormat::U8 => out[0] = (value * 127.0 + 128.0).round() as u8,
            SampleFormat::S16Le => {
                out[..2].copy_from_slice(&((value * i16::MAX as f32) as i16).to_le_bytes())
            }
            SampleFormat::S16Be => {
                out[..2].copy_from_slice(&((value * i16::MAX as f32) as i16).to_be_bytes())
            }
            SampleFormat::F32Le => out[..4].copy_from_slice(&value.to_le_bytes()),
        }
    }
}

/// The (channels, rate, format) triple negotiated between decoder and sink.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AudioParams {
    pub channels: u16,
    pub rate: u32,
    pub format: SampleFormat,
}

impl AudioParams {
    /// Size in bytes of one frame (one sample for every channel).
    pub fn frame_size(&self) -> usize {
        self.format.bytes_per_sample() * self.channels.max(1) as usize
    }
}

/// Equalizer settings handed to decoders that can equalize.
///
/// All values are in dB.
#[derive(Debug, Clone, PartialEq)]
pub struct Equalizer {
    pub preamp: f32,
    pub bands: [f32; Equalizer::BANDS],
}

impl Equalizer {
    pub const BANDS: usize = 10;
    pub const MAX_DB: f32 = 20.0;

    /// Move the preamp by `delta` dB, keeping it within `±MAX_DB`.
    pub fn adjust_preamp(&mut self, delta: f32) {
        self.preamp = (self.preamp + delta).clamp(-Self::MAX_DB, Self::MAX_DB);
    }
}

impl Default for Equalizer {
    fn default() -> Self {
        Self {
            preamp: 0.0,
            bands: [0.0; Equalizer::BANDS],
        }
    }
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("cannot open {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("seek failed: {0}")]
    Seek(String),
    #[error("audio device error: {0}")]
    Device(String),
}

/// A decoder family able to open some kinds of files.
pub trait InputPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercase file extensions (without dot) this plugin understands.
    fn extensions(&self) -> &[&str];

    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions().iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    /// Decoders of this family play audio on their own and bypass the
    /// output sink entirely.
    fn renders_itself(&self) -> bool {
        false
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Decoder>, PluginError>;

    /// Length of the file without opening a full decoding session.
    fn length(&self, path: &Path) -> Option<Duration>;
}

/// One open decoding session.
pub trait Decoder: Send {
    /// Current output format. May change in the middle of a track.
    fn audio_params(&self) -> AudioParams;

    fn length(&self) -> Option<Duration>;

    /// Fill `buf` with raw samples. `Ok(0)` marks the end of the track.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PluginError>;

    /// How far into the track the audio handed out so far reaches, if the
    /// decoder keeps track of it.
    fn position(&self) -> Option<Duration> {
        None
    }

    fn seek(&mut self, secs: u64) -> Result<(), PluginError>;

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn set_equalizer(&mut self, _eq: &Equalizer) {}

    fn close(&mut self) {}
}

/// A destination for decoded audio: a device, a file or nothing at all.
pub trait OutputSink: Send {
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<(), PluginError>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn set_channels(&mut self, channels: u16);

    fn set_freq(&mut self, rate: u32);

    fn set_format(&mut self, format: SampleFormat);

    fn write(&mut self, buf: &[u8]) -> Result<(), PluginError>;

    /// Block until everything written so far has been rendered.
    fn flush(&mut self);

    /// Volume in percent, `0..=100`.
    fn set_volume(&mut self, volume: u8);

    fn volume(&self) -> u8;

    /// Audio accepted by `write` that has not been rendered yet.
    fn latency(&self) -> Duration {
        Duration::ZERO
    }

    fn configure(&mut self, params: AudioParams) {
        self.set_channels(params.channels);
        self.set_freq(params.rate);
        self.set_format(params.format);
    }
}

/// Registered input plugins, searched in registration order.
#[derive(Clone, Default)]
pub struct Inputs(Vec<Arc<dyn InputPlugin>>);

impl Inputs {
    /// First registered input plugin that handles `path`.
    pub fn input_for(&self, path: &Path) -> Option<Arc<dyn InputPlugin>> {
        self.0.iter().find(|p| p.handles(path)).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.name()).collect()
    }
}

/// Everything the engine needs from the plugin manager: the registered
/// decoders, the active output sink and the initial effect chain.
pub struct PluginSet {
    pub(crate) inputs: Inputs,
    pub(crate) output: Box<dyn OutputSink>,
    pub(crate) effects: EffectsStage,
}

impl PluginSet {
    pub fn new(output: Box<dyn OutputSink>) -> Self {
        Self {
            inputs: Inputs::default(),
            output,
            effects: EffectsStage::default(),
        }
    }

    pub fn with_input(mut self, input: Arc<dyn InputPlugin>) -> Self {
        self.inputs.0.push(input);
        self
    }

    pub fn with_effects(mut self, effects: EffectsStage) -> Self {
        self.effects = effects;
        self
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }
}
