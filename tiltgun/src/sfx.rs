use std::time::Duration;

use engine::synth::{Cue, Voice, Waveform};
use serde::{Deserialize, Serialize};

use crate::trigger::GunAction;

/// Per-cue playback volumes (0.0..=1.0), scaled by the player's audio
/// settings. The dry click of an empty magazine sits under the shot.
pub const FIRE_SFX_VOLUME: f32 = 0.45;
pub const BLOCKED_SFX_VOLUME: f32 = 0.25;
pub const RELOAD_SFX_VOLUME: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundId {
    Fire,
    Blocked,
    Reload,
}

impl SoundId {
    pub const ALL: [SoundId; 3] = [SoundId::Fire, SoundId::Blocked, SoundId::Reload];

    /// File name looked up in a sounds directory to override the built-in cue.
    pub fn file_name(self) -> &'static str {
        match self {
            SoundId::Fire => "fire.wav",
            SoundId::Blocked => "blocked.wav",
            SoundId::Reload => "reload.wav",
        }
    }

    pub fn volume(self) -> f32 {
        match self {
            SoundId::Fire => FIRE_SFX_VOLUME,
            SoundId::Blocked => BLOCKED_SFX_VOLUME,
            SoundId::Reload => RELOAD_SFX_VOLUME,
        }
    }

    /// Built-in synthesized version of the effect.
    pub fn cue(self) -> Cue {
        match self {
            SoundId::Fire => Cue::new()
                .with_layer(
                    Duration::ZERO,
                    Voice::new(Waveform::Noise, 0.0, Duration::from_millis(180))
                        .with_envelope(0.01, 0.85)
                        .with_gain(0.9),
                )
                .with_layer(
                    Duration::ZERO,
                    Voice::new(Waveform::Sine, 160.0, Duration::from_millis(150))
                        .with_sweep_to(45.0)
                        .with_envelope(0.02, 0.7)
                        .with_gain(0.8),
                ),
            SoundId::Blocked => Cue::new()
                .with_layer(
                    Duration::ZERO,
                    Voice::new(Waveform::Square, 900.0, Duration::from_millis(35))
                        .with_sweep_to(700.0)
                        .with_envelope(0.0, 0.8)
                        .with_gain(0.4),
                )
                .with_layer(
                    Duration::from_millis(10),
                    Voice::new(Waveform::Triangle, 140.0, Duration::from_millis(70))
                        .with_sweep_to(90.0)
                        .with_envelope(0.05, 0.8)
                        .with_gain(0.5),
                ),
            SoundId::Reload => {
                let click = Voice::new(Waveform::Square, 1400.0, Duration::from_millis(30))
                    .with_sweep_to(1100.0)
                    .with_envelope(0.0, 0.8)
                    .with_gain(0.4);
                Cue::new()
                    .with_layer(Duration::ZERO, click)
                    .with_layer(
                        Duration::from_millis(60),
                        Voice::new(Waveform::Saw, 220.0, Duration::from_millis(140))
                            .with_sweep_to(420.0)
                            .with_envelope(0.2, 0.4)
                            .with_gain(0.25),
                    )
                    .with_layer(Duration::from_millis(230), click)
            }
        }
    }
}

impl GunAction {
    pub fn sound(self) -> SoundId {
        match self {
            GunAction::Fire => SoundId::Fire,
            GunAction::Blocked => SoundId::Blocked,
            GunAction::Reload => SoundId::Reload,
        }
    }
}

/// Fire-and-forget playback. Implementations must not wait for the sound to
/// finish and must release whatever they allocated once it has played.
pub trait AudioSink {
    fn play_once(&mut self, sound: SoundId);
}

/// A missing device plays nothing.
impl<A: AudioSink> AudioSink for Option<A> {
    fn play_once(&mut self, sound: SoundId) {
        if let Some(sink) = self {
            sink.play_once(sound);
        }
    }
}

impl<A: AudioSink + ?Sized> AudioSink for Box<A> {
    fn play_once(&mut self, sound: SoundId) {
        (**self).play_once(sound);
    }
}
