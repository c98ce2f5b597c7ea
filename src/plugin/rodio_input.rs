//! Decoder plugin backed by the symphonia decoders bundled with `rodio`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use rodio::Source;

use super::{AudioParams, Decoder, InputPlugin, PluginError, SampleFormat};

const EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg"];

/// Decodes common compressed and PCM formats into raw samples of a fixed
/// format (signed 16-bit unless configured otherwise).
#[derive(Debug, Default)]
pub struct RodioInput {
    format: SampleFormat,
}

impl RodioInput {
    pub fn new(format: SampleFormat) -> Self {
        Self { format }
    }
}

impl InputPlugin for RodioInput {
    fn name(&self) -> &str {
        "rodio"
    }

    fn extensions(&self) -> &[&str] {
        EXTENSIONS
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Decoder>, PluginError> {
        let open_err = |reason: String| PluginError::Open {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| open_err(e.to_string()))?;
        let source =
            rodio::Decoder::new(BufReader::new(file)).map_err(|e| open_err(e.to_string()))?;
        let length = source.total_duration().or_else(|| read_length(path));

        Ok(Box::new(RodioStream {
            source,
            format: self.format,
            length,
            decoded: Duration::ZERO,
        }))
    }

    fn length(&self, path: &Path) -> Option<Duration> {
        read_length(path)
    }
}

/// Read the duration from the container headers without decoding.
fn read_length(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
}

struct RodioStream {
    source: rodio::Decoder<BufReader<File>>,
    format: SampleFormat,
    length: Option<Duration>,
    // Playing time of everything handed out so far, summed span by span.
    decoded: Duration,
}

impl RodioStream {
    fn samples_per_second(&self) -> u64 {
        self.source.channels().max(1) as u64 * self.source.sample_rate().max(1) as u64
    }
}

impl Decoder for RodioStream {
    fn audio_params(&self) -> AudioParams {
        AudioParams {
            channels: self.source.channels(),
            rate: self.source.sample_rate(),
            format: self.format,
        }
    }

    fn length(&self) -> Option<Duration> {
        self.length
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PluginError> {
        // Never cross a span boundary: the format may change right after it.
        let span_left = self.source.current_span_len().unwrap_or(usize::MAX);
        let per_second = self.samples_per_second();
        let width = self.format.bytes_per_sample();
        let max_samples = (buf.len() / width).min(span_left);

        let mut samples = 0;
        while samples < max_samples {
            let Some(sample) = self.source.next() else {
                break;
            };
            self.format.write_f32(sample, &mut buf[samples * width..]);
            samples += 1;
        }

        self.decoded += Duration::from_nanos(samples as u64 * 1_000_000_000 / per_second);
        Ok(samples * width)
    }

    fn position(&self) -> Option<Duration> {
        Some(self.decoded)
    }

    fn seek(&mut self, secs: u64) -> Result<(), PluginError> {
        self.source
            .try_seek(Duration::from_secs(secs))
            .map_err(|e| PluginError::Seek(e.to_string()))?;
        self.decoded = Duration::from_secs(secs);
        Ok(())
    }
}
