//! Looping ringtone playback.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};

use rodio::{buffer::SamplesBuffer, Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("couldn't read ringtone {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unsupported audio format (tried mp3 and wav)")]
    UnsupportedFormat,
    #[error("couldn't open audio output: {0}")]
    Stream(#[from] rodio::StreamError),
}

/// where the ringtone comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ringtone {
    File(PathBuf),
    /// generated beep pattern used when no file is given
    Builtin,
}

impl Ringtone {
    #[must_use]
    pub fn from_setting(path: Option<&Path>) -> Self {
        path.map_or(Self::Builtin, |path| Self::File(path.to_path_buf()))
    }
}

type BoxedSource = Box<dyn Source + Send>;

const BUILTIN_SAMPLE_RATE: u32 = 44_100;

/// two short beeps followed by a pause, repeated by the player
fn builtin_tone() -> SamplesBuffer {
    const BEEP_MS: u32 = 180;
    const GAP_MS: u32 = 120;
    const PAUSE_MS: u32 = 700;
    const FREQUENCY: f32 = 880.0;

    let samples_for = |ms: u32| (BUILTIN_SAMPLE_RATE * ms / 1000) as usize;
    #[allow(clippy::cast_precision_loss)]
    let beep = |samples: &mut Vec<f32>| {
        let len = samples_for(BEEP_MS);
        samples.extend((0..len).map(|i| {
            let t = i as f32 / BUILTIN_SAMPLE_RATE as f32;
            // short fade in and out so the beep doesn't click
            let envelope = (t / 0.01).min((BEEP_MS as f32 / 1000.0 - t) / 0.01).clamp(0.0, 1.0);
            (t * FREQUENCY * std::f32::consts::TAU).sin() * envelope * 0.6
        }));
    };

    let mut samples = Vec::new();
    beep(&mut samples);
    samples.resize(samples.len() + samples_for(GAP_MS), 0.0);
    beep(&mut samples);
    samples.resize(samples.len() + samples_for(PAUSE_MS), 0.0);
    SamplesBuffer::new(1, BUILTIN_SAMPLE_RATE, samples)
}

/// tries mp3 first, then wav from the start of the data again
pub fn decode(data: Arc<[u8]>) -> Result<BoxedSource, AudioError> {
    match Decoder::new_mp3(Cursor::new(Arc::clone(&data))) {
        Ok(source) => return Ok(Box::new(source)),
        Err(e) => log::debug!("not mp3 ({e}), trying wav"),
    }
    match Decoder::new_wav(Cursor::new(data)) {
        Ok(source) => Ok(Box::new(source)),
        Err(e) => {
            log::debug!("not wav either: {e}");
            Err(AudioError::UnsupportedFormat)
        }
    }
}

fn load(ringtone: &Ringtone) -> Result<BoxedSource, AudioError> {
    match ringtone {
        Ringtone::Builtin => Ok(Box::new(builtin_tone())),
        Ringtone::File(path) => {
            let data = std::fs::read(path).map_err(|source| AudioError::Read {
                path: path.clone(),
                source,
            })?;
            decode(data.into())
        }
    }
}

/// the ringtone as it plays, lives until the process exits
pub struct AlarmAudio {
    _stream: OutputStream,
    sink: Sink,
}

impl AlarmAudio {
    /// decodes the ringtone and starts looping it right away
    pub fn play(ringtone: &Ringtone) -> Result<Self, AudioError> {
        let source = load(ringtone)?;
        let sample_rate = source.sample_rate();
        let stream = OutputStreamBuilder::from_default_device()?
            .with_sample_rate(sample_rate)
            .open_stream_or_fallback()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.append(source.repeat_infinite());
        sink.play();
        log::info!("playing {ringtone:?} at {sample_rate} Hz");
        Ok(Self {
            _stream: stream,
            sink,
        })
    }

    pub fn pause(&self) {
        self.sink.pause();
    }

    pub fn resume(&self) {
        self.sink.play();
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }
}
