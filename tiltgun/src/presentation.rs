use std::io::{self, Write};
use std::time::Duration;

use engine::tween::Tween;

pub const VERTICAL_ANGLE: f32 = 0.0;
pub const HORIZONTAL_ANGLE: f32 = 90.0;

pub fn rotation_target_degrees(horizontal: bool) -> f32 {
    if horizontal {
        HORIZONTAL_ANGLE
    } else {
        VERTICAL_ANGLE
    }
}

/// Receives state after every evaluation. Animation toward the target is the
/// presenter's business.
pub trait Presenter {
    fn set_rotation_target(&mut self, angle_degrees: f32);
    fn set_ammo_display(&mut self, count: u8);
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn set_rotation_target(&mut self, angle_degrees: f32) {
        (**self).set_rotation_target(angle_degrees);
    }

    fn set_ammo_display(&mut self, count: u8) {
        (**self).set_ammo_display(count);
    }
}

/// Draws a one-line status view: eased rotation, rounds left, and which way
/// the Y axis points.
#[derive(Debug)]
pub struct TerminalPresenter<W: Write> {
    out: W,
    rotation: Tween,
    ammo: Option<u8>,
    last_line: Option<String>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, rotation_tween: Duration) -> Self {
        Self {
            out,
            rotation: Tween::new(VERTICAL_ANGLE, rotation_tween),
            ammo: None,
            last_line: None,
        }
    }

    pub fn angle(&self) -> f32 {
        self.rotation.value()
    }

    pub fn ammo(&self) -> Option<u8> {
        self.ammo
    }

    pub fn status_line(&self) -> String {
        let axis = if self.rotation.target() == HORIZONTAL_ANGLE {
            "Y axis horizontal"
        } else {
            "Y axis vertical"
        };
        let rounds = match self.ammo {
            Some(count) => count.to_string(),
            None => "-".to_string(),
        };
        format!(
            "rotation {:>5.1}°  {}  rounds: {}  {}",
            self.angle(),
            gauge(self.angle()),
            rounds,
            axis
        )
    }

    /// Advances the animation and redraws if anything visible changed.
    pub fn tick(&mut self, dt: Duration) -> io::Result<bool> {
        self.rotation.tick(dt);
        let line = self.status_line();
        if self.last_line.as_deref() == Some(line.as_str()) {
            return Ok(false);
        }
        write!(self.out, "\r{line}\x1b[K")?;
        self.out.flush()?;
        self.last_line = Some(line);
        Ok(true)
    }

    /// Ends the status line so following output starts on a fresh line.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.last_line.is_some() {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn set_rotation_target(&mut self, angle_degrees: f32) {
        self.rotation.retarget(angle_degrees);
    }

    fn set_ammo_display(&mut self, count: u8) {
        self.ammo = Some(count);
    }
}

/// Ten-cell bar filled in proportion to the rotation.
fn gauge(angle: f32) -> String {
    let filled = ((angle / HORIZONTAL_ANGLE).clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_ninety_only_when_horizontal() {
        assert_eq!(rotation_target_degrees(true), 90.0);
        assert_eq!(rotation_target_degrees(false), 0.0);
    }

    #[test]
    fn gauge_tracks_angle() {
        assert_eq!(gauge(0.0), "[..........]");
        assert_eq!(gauge(45.0), "[#####.....]");
        assert_eq!(gauge(90.0), "[##########]");
    }

    #[test]
    fn tick_redraws_only_on_change() {
        let mut presenter = TerminalPresenter::new(Vec::new(), Duration::ZERO);
        presenter.set_ammo_display(3);
        assert!(presenter.tick(Duration::from_millis(16)).unwrap());
        assert!(!presenter.tick(Duration::from_millis(16)).unwrap());

        presenter.set_rotation_target(90.0);
        assert!(presenter.tick(Duration::from_millis(16)).unwrap());
        assert!(presenter.status_line().contains("Y axis horizontal"));

        let text = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(text.contains("rounds: 3"));
        assert!(text.contains(" 90.0°"));
    }

    #[test]
    fn rotation_eases_toward_target() {
        let mut presenter = TerminalPresenter::new(Vec::new(), Duration::from_millis(400));
        presenter.set_rotation_target(90.0);
        presenter.tick(Duration::from_millis(200)).unwrap();
        assert!(presenter.angle() > 0.0 && presenter.angle() < 90.0);

        presenter.tick(Duration::from_millis(200)).unwrap();
        assert_eq!(presenter.angle(), 90.0);
    }
}
