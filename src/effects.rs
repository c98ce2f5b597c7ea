//! Ordered chain of audio transforms applied between decoder and sink.

use crate::plugin::AudioParams;

/// A single transform over a buffer of raw interleaved samples.
///
/// An effect may grow or shrink the buffer (resamplers, channel mixers).
pub trait Effect: Send {
    fn name(&self) -> &str;

    fn apply(&mut self, buf: &mut Vec<u8>, params: AudioParams);
}

/// Replaces every frame with the average of its channels.
#[derive(Debug, Default)]
pub struct Downmix;

impl Downmix {
    pub const NAME: &'static str = "mono";
}

impl Effect for Downmix {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&mut self, buf: &mut Vec<u8>, params: AudioParams) {
        if params.channels < 2 {
            return;
        }
        let format = params.format;
        let width = format.bytes_per_sample();
        for frame in buf.chunks_exact_mut(params.frame_size()) {
            let sum: f32 = frame.chunks_exact(width).map(|s| format.to_f32(s)).sum();
            let mean = sum / f32::from(params.channels);
            for sample in frame.chunks_exact_mut(width) {
                format.write_f32(mean, sample);
            }
        }
    }
}

#[derive(Default)]
pub struct EffectsStage {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectsStage {
    pub fn push(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    /// Remove every effect called `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.name() != name);
        self.effects.len() != before
    }

    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Run `buf` through every effect in insertion order.
    pub fn apply(&mut self, buf: &mut Vec<u8>, params: AudioParams) {
        for effect in &mut self.effects {
            effect.apply(buf, params);
        }
    }
}
