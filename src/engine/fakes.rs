//! Scripted plugins for exercising the engine without audio hardware.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::plugin::{
    AudioParams, Decoder, Equalizer, InputPlugin, OutputSink, PluginError, SampleFormat,
};

pub(super) const CD: AudioParams = AudioParams {
    channels: 2,
    rate: 44_100,
    format: SampleFormat::S16Le,
};

pub(super) const CHUNK: usize = 64;

/// How the decoder for one file behaves.
#[derive(Clone, Debug)]
pub(super) struct Script {
    /// Chunks before end of track; `None` plays forever.
    pub chunks: Option<usize>,
    pub params: AudioParams,
    /// Switch to other params after this many chunks.
    pub switch_to: Option<(usize, AudioParams)>,
    pub fail_after: Option<usize>,
    pub native_position: Option<u64>,
    pub fail_open: bool,
    pub length: Option<Duration>,
    pub delay: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            chunks: None,
            params: CD,
            switch_to: None,
            fail_after: None,
            native_position: None,
            fail_open: false,
            length: Some(Duration::from_secs(180)),
            delay: Duration::from_millis(2),
        }
    }
}

impl Script {
    pub fn finite(chunks: usize) -> Self {
        Self {
            chunks: Some(chunks),
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }
}

/// Counters shared by every decoder an input hands out.
#[derive(Debug, Default)]
pub(super) struct Tally {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub eq_calls: AtomicUsize,
    pub pauses: AtomicUsize,
    pub resumes: AtomicUsize,
    pub seeks: Mutex<Vec<u64>>,
    pub last_eq: Mutex<Option<Equalizer>>,
    /// File names of the decoders currently open.
    pub live: Mutex<Vec<String>>,
}

impl Tally {
    pub fn open_decoders(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> Vec<String> {
        self.live.lock().unwrap().clone()
    }
}

pub(super) struct FakeInput {
    name: &'static str,
    extensions: &'static [&'static str],
    renders_itself: bool,
    default: Script,
    scripts: HashMap<String, Script>,
    pub tally: Arc<Tally>,
}

impl FakeInput {
    pub fn new(default: Script) -> Self {
        Self {
            name: "fake",
            extensions: &["fake"],
            renders_itself: false,
            default,
            scripts: HashMap::new(),
            tally: Arc::default(),
        }
    }

    /// Give the file called `file_name` its own behavior.
    pub fn with_script(mut self, file_name: &str, script: Script) -> Self {
        self.scripts.insert(file_name.to_string(), script);
        self
    }

    pub fn self_rendering(mut self, name: &'static str, extensions: &'static [&'static str]) -> Self {
        self.name = name;
        self.extensions = extensions;
        self.renders_itself = true;
        self
    }

    fn script_for(&self, path: &Path) -> Script {
        self.scripts
            .get(&file_name(path))
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl InputPlugin for FakeInput {
    fn name(&self) -> &str {
        self.name
    }

    fn extensions(&self) -> &[&str] {
        self.extensions
    }

    fn renders_itself(&self) -> bool {
        self.renders_itself
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Decoder>, PluginError> {
        let script = self.script_for(path);
        if script.fail_open {
            return Err(PluginError::Open {
                path: path.to_path_buf(),
                reason: "scripted failure".into(),
            });
        }
        self.tally.opened.fetch_add(1, Ordering::SeqCst);
        let name = file_name(path);
        self.tally.live.lock().unwrap().push(name.clone());
        Ok(Box::new(FakeDecoder {
            name,
            params: script.params,
            script,
            produced: 0,
            tally: Arc::clone(&self.tally),
        }))
    }

    fn length(&self, path: &Path) -> Option<Duration> {
        self.script_for(path).length
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

struct FakeDecoder {
    name: String,
    script: Script,
    params: AudioParams,
    produced: usize,
    tally: Arc<Tally>,
}

impl Decoder for FakeDecoder {
    fn audio_params(&self) -> AudioParams {
        self.params
    }

    fn length(&self) -> Option<Duration> {
        self.script.length
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PluginError> {
        thread::sleep(self.script.delay);
        if self.script.fail_after == Some(self.produced) {
            return Err(PluginError::Decode("scripted failure".into()));
        }
        if self.script.chunks == Some(self.produced) {
            return Ok(0);
        }
        if let Some((after, params)) = self.script.switch_to {
            if self.produced == after {
                self.params = params;
            }
        }
        self.produced += 1;
        let n = CHUNK.min(buf.len());
        buf[..n].fill(1);
        Ok(n)
    }

    fn position(&self) -> Option<Duration> {
        self.script.native_position.map(Duration::from_secs)
    }

    fn seek(&mut self, secs: u64) -> Result<(), PluginError> {
        self.tally.seeks.lock().unwrap().push(secs);
        Ok(())
    }

    fn pause(&mut self) {
        self.tally.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        self.tally.resumes.fetch_add(1, Ordering::SeqCst);
    }

    fn set_equalizer(&mut self, eq: &Equalizer) {
        self.tally.eq_calls.fetch_add(1, Ordering::SeqCst);
        *self.tally.last_eq.lock().unwrap() = Some(eq.clone());
    }

    fn close(&mut self) {
        self.tally.closed.fetch_add(1, Ordering::SeqCst);
        let mut live = self.tally.live.lock().unwrap();
        if let Some(at) = live.iter().position(|n| *n == self.name) {
            live.remove(at);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum OutEvent {
    Open,
    Close,
    Configure(AudioParams),
    Write(Vec<u8>),
    WriteWhileClosed,
    Flush,
    Volume(u8),
}

/// Everything a `FakeOutput` was asked to do, in order.
#[derive(Debug, Default)]
pub(super) struct OutputLog {
    pub events: Mutex<Vec<OutEvent>>,
    pub fail_open: AtomicBool,
    /// Reported as the output latency.
    pub latency: Mutex<Duration>,
}

impl OutputLog {
    pub fn events(&self) -> Vec<OutEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&OutEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    pub fn writes(&self) -> usize {
        self.count(|e| matches!(e, OutEvent::Write(_)))
    }

    fn push(&self, event: OutEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub(super) struct FakeOutput {
    open: bool,
    pending: AudioParams,
    volume: u8,
    pub log: Arc<OutputLog>,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self {
            open: false,
            pending: CD,
            volume: 100,
            log: Arc::default(),
        }
    }
}

impl OutputSink for FakeOutput {
    fn name(&self) -> &str {
        "fake-out"
    }

    fn open(&mut self) -> Result<(), PluginError> {
        if self.log.fail_open.load(Ordering::SeqCst) {
            return Err(PluginError::Device("no such device".into()));
        }
        self.open = true;
        self.log.push(OutEvent::Open);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.log.push(OutEvent::Close);
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn set_channels(&mut self, channels: u16) {
        self.pending.channels = channels;
    }

    fn set_freq(&mut self, rate: u32) {
        self.pending.rate = rate;
    }

    fn set_format(&mut self, format: SampleFormat) {
        self.pending.format = format;
        self.log.push(OutEvent::Configure(self.pending));
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), PluginError> {
        if !self.open {
            self.log.push(OutEvent::WriteWhileClosed);
            return Err(PluginError::Device("closed".into()));
        }
        self.log.push(OutEvent::Write(buf.to_vec()));
        Ok(())
    }

    fn flush(&mut self) {
        self.log.push(OutEvent::Flush);
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
        self.log.push(OutEvent::Volume(volume));
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn latency(&self) -> Duration {
        *self.log.latency.lock().unwrap()
    }
}
