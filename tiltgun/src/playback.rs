use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::AudioSettings;
use crate::sfx::{AudioSink, SoundId};

pub const SYNTH_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Error)]
pub enum SfxError {
    #[error("no audio output device: {0}")]
    Device(#[from] rodio::StreamError),
    #[error("failed to read sound {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("sound {path} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

#[derive(Debug, Clone)]
enum CueData {
    Encoded(Arc<[u8]>),
    Rendered(Arc<[f32]>),
}

/// Loads every cue up front so playback never touches the filesystem.
///
/// A `<sounds_dir>/<id>.wav` file replaces the built-in synthesized cue for
/// that id; missing files fall back silently.
#[derive(Debug, Clone)]
pub struct CueBank {
    cues: HashMap<SoundId, CueData>,
}

impl CueBank {
    pub fn load(sounds_dir: Option<&Path>) -> Result<Self, SfxError> {
        let mut cues = HashMap::new();
        for id in SoundId::ALL {
            let file = sounds_dir.map(|dir| dir.join(id.file_name()));
            let data = match file.filter(|path| path.is_file()) {
                Some(path) => {
                    let bytes = fs::read(&path).map_err(|source| SfxError::Read {
                        path: path.clone(),
                        source,
                    })?;
                    // Decode once here so a broken file fails at startup.
                    Decoder::new(Cursor::new(bytes.clone())).map_err(|source| SfxError::Decode {
                        path: path.clone(),
                        source,
                    })?;
                    debug!(sound = ?id, path = %path.display(), "using sound file");
                    CueData::Encoded(bytes.into())
                }
                None => CueData::Rendered(id.cue().render(SYNTH_SAMPLE_RATE, seed_for(id)).into()),
            };
            cues.insert(id, data);
        }
        Ok(Self { cues })
    }

    pub fn is_synthesized(&self, id: SoundId) -> bool {
        matches!(self.cues.get(&id), Some(CueData::Rendered(_)))
    }
}

fn seed_for(id: SoundId) -> u64 {
    match id {
        SoundId::Fire => 0x5eed_0001,
        SoundId::Blocked => 0x5eed_0002,
        SoundId::Reload => 0x5eed_0003,
    }
}

/// Plays cues on the default output device, one detached sink per play.
pub struct RodioSfx {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    bank: CueBank,
    gain: f32,
}

impl RodioSfx {
    pub fn open(settings: &AudioSettings, sounds_dir: Option<&Path>) -> Result<Self, SfxError> {
        let bank = CueBank::load(sounds_dir)?;
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            bank,
            gain: settings.effective_sfx_gain(),
        })
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl AudioSink for RodioSfx {
    fn play_once(&mut self, sound: SoundId) {
        let volume = self.gain * sound.volume();
        if volume <= 0.0 {
            return;
        }
        let Some(data) = self.bank.cues.get(&sound) else {
            return;
        };
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(err) => {
                warn!(sound = ?sound, error = %err, "could not open audio sink");
                return;
            }
        };
        sink.set_volume(volume);

        match data {
            CueData::Encoded(bytes) => match Decoder::new(Cursor::new(Arc::clone(bytes))) {
                Ok(source) => sink.append(source),
                Err(err) => {
                    warn!(sound = ?sound, error = %err, "could not decode sound");
                    return;
                }
            },
            CueData::Rendered(samples) => {
                sink.append(SamplesBuffer::new(1, SYNTH_SAMPLE_RATE, samples.to_vec()));
            }
        }
        // The sink keeps playing after it is dropped and frees itself when done.
        sink.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_without_directory_synthesizes_every_cue() {
        let bank = CueBank::load(None).expect("synth bank");
        for id in SoundId::ALL {
            assert!(bank.is_synthesized(id), "{id:?} should be synthesized");
        }
    }

    #[test]
    fn missing_files_fall_back_to_synth() {
        let dir = std::env::temp_dir().join("tiltgun_no_such_sounds_dir");
        let bank = CueBank::load(Some(&dir)).expect("fallback bank");
        assert!(bank.is_synthesized(SoundId::Fire));
    }

    #[test]
    fn undecodable_file_is_rejected_at_load() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("tiltgun_bad_sounds_{nanos}"));
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join("fire.wav"), b"definitely not audio").expect("write file");

        let result = CueBank::load(Some(&dir));
        assert!(matches!(result, Err(SfxError::Decode { .. })));

        let _ = fs::remove_dir_all(dir);
    }
}
