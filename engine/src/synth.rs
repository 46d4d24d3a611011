use std::f32::consts::TAU;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Saw,
    Noise,
}

/// One oscillator with a linear frequency sweep and an attack/release
/// envelope. `attack` and `release` are fractions of the voice duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    pub start_hz: f32,
    pub end_hz: f32,
    pub duration: Duration,
    pub attack: f32,
    pub release: f32,
    pub gain: f32,
}

impl Voice {
    pub fn new(waveform: Waveform, hz: f32, duration: Duration) -> Self {
        Self {
            waveform,
            start_hz: hz.max(0.0),
            end_hz: hz.max(0.0),
            duration,
            attack: 0.02,
            release: 0.5,
            gain: 0.5,
        }
    }

    pub fn with_sweep_to(mut self, end_hz: f32) -> Self {
        self.end_hz = end_hz.max(0.0);
        self
    }

    pub fn with_envelope(mut self, attack: f32, release: f32) -> Self {
        self.attack = attack.clamp(0.0, 1.0);
        self.release = release.clamp(0.0, 1.0 - self.attack);
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain.max(0.0);
        self
    }

    fn render_into(&self, out: &mut [f32], sample_rate: u32, rng: &mut SmallRng) {
        let n = out.len();
        if n == 0 {
            return;
        }
        let mut phase = 0.0f32;
        for (i, slot) in out.iter_mut().enumerate() {
            let t = i as f32 / n as f32;
            let freq_hz = self.start_hz + (self.end_hz - self.start_hz) * t;
            phase = (phase + TAU * freq_hz / sample_rate as f32) % TAU;
            let raw = match self.waveform {
                Waveform::Noise => rng.gen_range(-1.0f32..=1.0),
                wave => waveform_sample(wave, phase),
            };
            *slot += raw * self.gain * envelope(t, self.attack, self.release);
        }
    }
}

fn waveform_sample(wave: Waveform, phase: f32) -> f32 {
    match wave {
        Waveform::Sine => phase.sin(),
        Waveform::Triangle => (2.0 / std::f32::consts::PI) * phase.sin().asin(),
        Waveform::Square => {
            if phase.sin() >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Saw => 2.0 * (phase / TAU) - 1.0,
        Waveform::Noise => 0.0,
    }
}

fn envelope(t: f32, attack: f32, release: f32) -> f32 {
    if attack > 0.0 && t < attack {
        return t / attack;
    }
    if release > 0.0 && t > (1.0 - release) {
        return ((1.0 - t) / release).max(0.0);
    }
    1.0
}

/// A short sound effect made of voices that start at fixed offsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cue {
    layers: Vec<(Duration, Voice)>,
}

impl Cue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, offset: Duration, voice: Voice) -> Self {
        self.layers.push((offset, voice));
        self
    }

    pub fn duration(&self) -> Duration {
        self.layers
            .iter()
            .map(|(offset, voice)| *offset + voice.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Renders a mono buffer. The same seed always yields the same samples.
    pub fn render(&self, sample_rate: u32, seed: u64) -> Vec<f32> {
        let sample_rate = sample_rate.max(1);
        let to_samples = |d: Duration| (d.as_secs_f64() * sample_rate as f64).round() as usize;
        let mut out = vec![0.0f32; to_samples(self.duration())];
        let mut rng = SmallRng::seed_from_u64(seed);

        for (offset, voice) in &self.layers {
            let start = to_samples(*offset).min(out.len());
            let end = (start + to_samples(voice.duration)).min(out.len());
            voice.render_into(&mut out[start..end], sample_rate, &mut rng);
        }

        // Soft-limit to avoid clipping where layers overlap.
        for sample in &mut out {
            *sample = sample.tanh() * 0.9;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_length_covers_latest_layer() {
        let cue = Cue::new()
            .with_layer(
                Duration::ZERO,
                Voice::new(Waveform::Sine, 440.0, Duration::from_millis(100)),
            )
            .with_layer(
                Duration::from_millis(150),
                Voice::new(Waveform::Square, 880.0, Duration::from_millis(50)),
            );
        assert_eq!(cue.duration(), Duration::from_millis(200));
        assert_eq!(cue.render(10_000, 0).len(), 2_000);
    }

    #[test]
    fn gap_between_layers_is_silent() {
        let cue = Cue::new()
            .with_layer(
                Duration::ZERO,
                Voice::new(Waveform::Saw, 300.0, Duration::from_millis(10)),
            )
            .with_layer(
                Duration::from_millis(30),
                Voice::new(Waveform::Saw, 300.0, Duration::from_millis(10)),
            );
        let samples = cue.render(1_000, 0);
        assert!(samples[10..30].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn samples_stay_under_soft_limit() {
        let loud = Voice::new(Waveform::Noise, 0.0, Duration::from_millis(50)).with_gain(4.0);
        let cue = Cue::new()
            .with_layer(Duration::ZERO, loud)
            .with_layer(Duration::ZERO, loud);
        assert!(cue.render(8_000, 3).iter().all(|s| s.abs() <= 0.9));
    }

    #[test]
    fn triangle_peaks_at_quarter_period() {
        assert!(waveform_sample(Waveform::Triangle, 0.0).abs() < 1e-6);
        assert!((waveform_sample(Waveform::Triangle, TAU / 4.0) - 1.0).abs() < 1e-4);
        assert!((waveform_sample(Waveform::Triangle, TAU / 8.0) - 0.5).abs() < 1e-4);
        assert!((waveform_sample(Waveform::Triangle, 3.0 * TAU / 4.0) + 1.0).abs() < 1e-4);
    }

    #[test]
    fn noise_is_deterministic_per_seed() {
        let cue = Cue::new().with_layer(
            Duration::ZERO,
            Voice::new(Waveform::Noise, 0.0, Duration::from_millis(20)),
        );
        assert_eq!(cue.render(8_000, 42), cue.render(8_000, 42));
        assert_ne!(cue.render(8_000, 42), cue.render(8_000, 43));
    }

    #[test]
    fn envelope_ramps_in_and_out() {
        assert_eq!(envelope(0.0, 0.1, 0.2), 0.0);
        assert!((envelope(0.05, 0.1, 0.2) - 0.5).abs() < 1e-6);
        assert_eq!(envelope(0.5, 0.1, 0.2), 1.0);
        assert!((envelope(0.9, 0.1, 0.2) - 0.5).abs() < 1e-5);
    }
}
