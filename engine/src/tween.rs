use std::time::Duration;

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(3)
}

/// Moves a scalar toward a target over a fixed duration, decelerating into
/// the target (ease-out cubic).
///
/// Retargeting mid-flight starts the new leg from the current value, so the
/// output never jumps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    elapsed: Duration,
    duration: Duration,
}

impl Tween {
    pub fn new(initial: f32, duration: Duration) -> Self {
        Self {
            from: initial,
            to: initial,
            elapsed: duration,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_settled(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn value(&self) -> f32 {
        if self.is_settled() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * ease_out_cubic(t)
    }

    pub fn retarget(&mut self, to: f32) {
        if to == self.to {
            return;
        }
        self.from = self.value();
        self.to = to;
        self.elapsed = Duration::ZERO;
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.is_settled() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
    }
}
