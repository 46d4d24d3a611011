use serde::{Deserialize, Serialize};

/// Half-width of the band around zero in which the Y axis counts as
/// horizontal, in m/s².
pub const HORIZONTAL_Y_THRESHOLD: f32 = 1.5;

/// Raw accelerometer reading in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationClassifier {
    threshold: f32,
}

impl Default for OrientationClassifier {
    fn default() -> Self {
        Self {
            threshold: HORIZONTAL_Y_THRESHOLD,
        }
    }
}

impl OrientationClassifier {
    /// Non-positive or non-finite thresholds fall back to the default.
    pub fn new(threshold: f32) -> Self {
        if threshold.is_finite() && threshold > 0.0 {
            Self { threshold }
        } else {
            Self::default()
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Gravity barely projects onto Y when the device lies with its Y axis
    /// level, so a small |y| means horizontal.
    pub fn is_horizontal(&self, sample: AccelSample) -> bool {
        sample.y > -self.threshold && sample.y < self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upright_phone_is_vertical() {
        let c = OrientationClassifier::default();
        assert!(!c.is_horizontal(AccelSample::new(0.0, 9.81, 0.0)));
        assert!(!c.is_horizontal(AccelSample::new(0.0, -9.81, 0.0)));
    }

    #[test]
    fn phone_on_its_side_is_horizontal() {
        let c = OrientationClassifier::default();
        assert!(c.is_horizontal(AccelSample::new(9.81, 0.2, 0.0)));
        assert!(c.is_horizontal(AccelSample::new(0.0, -1.49, 9.7)));
    }

    #[test]
    fn threshold_edges_are_exclusive() {
        let c = OrientationClassifier::default();
        assert!(!c.is_horizontal(AccelSample::new(0.0, 1.5, 0.0)));
        assert!(!c.is_horizontal(AccelSample::new(0.0, -1.5, 0.0)));
    }

    #[test]
    fn invalid_threshold_uses_default() {
        assert_eq!(OrientationClassifier::new(0.0).threshold(), HORIZONTAL_Y_THRESHOLD);
        assert_eq!(OrientationClassifier::new(f32::NAN).threshold(), HORIZONTAL_Y_THRESHOLD);
        assert_eq!(OrientationClassifier::new(3.0).threshold(), 3.0);
    }
}
