use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::*;

struct ExtOnly(&'static str, &'static [&'static str]);

impl InputPlugin for ExtOnly {
    fn name(&self) -> &str {
        self.0
    }

    fn extensions(&self) -> &[&str] {
        self.1
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Decoder>, PluginError> {
        Err(PluginError::Open {
            path: path.to_path_buf(),
            reason: "not a real decoder".into(),
        })
    }

    fn length(&self, _path: &Path) -> Option<Duration> {
        None
    }
}

/// Minimal mono 16-bit PCM WAV file holding `samples`.
fn write_wav(path: &Path, rate: u32, samples: &[i16]) {
    let data_len = (samples.len() * 2) as u32;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&rate.to_le_bytes());
    bytes.extend_from_slice(&(rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn sample_format_widths_and_frame_size() {
    assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
    assert_eq!(SampleFormat::S16Be.bytes_per_sample(), 2);
    assert_eq!(SampleFormat::F32Le.bytes_per_sample(), 4);

    let params = AudioParams {
        channels: 2,
        rate: 48_000,
        format: SampleFormat::S16Le,
    };
    assert_eq!(params.frame_size(), 4);
}

#[test]
fn sample_format_to_f32_handles_endianness() {
    let le = i16::MIN.to_le_bytes();
    let be = i16::MIN.to_be_bytes();
    assert_eq!(SampleFormat::S16Le.to_f32(&le), -1.0);
    assert_eq!(SampleFormat::S16Be.to_f32(&be), -1.0);
    assert_eq!(SampleFormat::U8.to_f32(&[128]), 0.0);
    assert_eq!(SampleFormat::F32Le.to_f32(&0.5f32.to_le_bytes()), 0.5);
}

#[test]
fn sample_format_write_f32_encodes_and_clamps() {
    let mut out = [0u8; 4];
    SampleFormat::S16Be.write_f32(1.0, &mut out);
    assert_eq!(&out[..2], &i16::MAX.to_be_bytes());
    SampleFormat::U8.write_f32(0.0, &mut out);
    assert_eq!(out[0], 128);
    SampleFormat::F32Le.write_f32(2.5, &mut out);
    assert_eq!(out, 1.0f32.to_le_bytes());
}

#[test]
fn equalizer_preamp_is_clamped() {
    let mut eq = Equalizer::default();
    eq.adjust_preamp(15.0);
    eq.adjust_preamp(15.0);
    assert_eq!(eq.preamp, Equalizer::MAX_DB);
    eq.adjust_preamp(-100.0);
    assert_eq!(eq.preamp, -Equalizer::MAX_DB);
}

#[test]
fn handles_matches_extension_case_insensitively() {
    let p = ExtOnly("x", &["mp3", "ogg"]);
    assert!(p.handles(Path::new("/music/a.MP3")));
    assert!(p.handles(Path::new("b.ogg")));
    assert!(!p.handles(Path::new("c.flac")));
    assert!(!p.handles(Path::new("no_extension")));
}

#[test]
fn input_for_picks_first_registered_match() {
    let set = PluginSet::new(Box::new(RodioOutput::new()))
        .with_input(Arc::new(ExtOnly("first", &["mp3"])))
        .with_input(Arc::new(ExtOnly("second", &["mp3", "flac"])));

    let inputs = set.inputs();
    assert_eq!(inputs.names(), vec!["first", "second"]);
    assert_eq!(
        inputs.input_for(Path::new("a.mp3")).map(|p| p.name().to_string()),
        Some("first".to_string())
    );
    assert_eq!(
        inputs.input_for(Path::new("a.flac")).map(|p| p.name().to_string()),
        Some("second".to_string())
    );
    assert!(inputs.input_for(Path::new("a.txt")).is_none());
}

#[test]
fn rodio_input_rejects_missing_and_garbage_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.mp3");
    assert!(matches!(
        RodioInput::default().open(&missing),
        Err(PluginError::Open { path, .. }) if path == missing
    ));

    let garbage: PathBuf = dir.path().join("garbage.mp3");
    std::fs::write(&garbage, b"definitely not audio").unwrap();
    assert!(RodioInput::default().open(&garbage).is_err());
}

#[test]
fn rodio_input_decodes_wav_and_tracks_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let samples: Vec<i16> = (0..16_000).map(|i| ((i % 100) * 100) as i16).collect();
    write_wav(&path, 8_000, &samples);

    let mut decoder = RodioInput::default().open(&path).unwrap();
    let params = decoder.audio_params();
    assert_eq!(params.channels, 1);
    assert_eq!(params.rate, 8_000);
    assert_eq!(params.format, SampleFormat::S16Le);
    assert_eq!(decoder.position(), Some(Duration::ZERO));

    let mut buf = vec![0u8; 4096];
    let mut total = 0;
    loop {
        let n = decoder.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        total += n;
    }
    assert_eq!(total, samples.len() * 2);
    assert_eq!(decoder.position(), Some(Duration::from_secs(2)));
}

#[test]
fn rodio_output_rejects_writes_while_closed() {
    let mut out = RodioOutput::new();
    assert!(!out.is_open());
    assert!(matches!(out.write(&[0, 0, 0, 0]), Err(PluginError::Device(_))));
    // Closing or flushing a closed sink is harmless.
    out.flush();
    out.close();
}

#[test]
fn rodio_output_remembers_volume_without_device() {
    let mut out = RodioOutput::new();
    assert_eq!(out.volume(), 100);
    out.set_volume(42);
    assert_eq!(out.volume(), 42);
    out.set_volume(250);
    assert_eq!(out.volume(), 100);
}

#[test]
fn rodio_input_can_decode_to_float() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let samples: Vec<i16> = vec![i16::MIN / 2; 4_000];
    write_wav(&path, 4_000, &samples);

    let mut decoder = RodioInput::new(SampleFormat::F32Le).open(&path).unwrap();
    assert_eq!(decoder.audio_params().format, SampleFormat::F32Le);

    let mut buf = vec![0u8; 1024];
    let n = decoder.read(&mut buf).unwrap();
    assert_eq!(n, 1024);
    assert_eq!(SampleFormat::F32Le.to_f32(&buf[..4]), -0.5);

    let mut total = n;
    loop {
        let n = decoder.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        total += n;
    }
    assert_eq!(total, samples.len() * 4);
    assert_eq!(decoder.position(), Some(Duration::from_secs(1)));
}
