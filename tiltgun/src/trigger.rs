use engine::Reactor;
use serde::{Deserialize, Serialize};

pub const MAGAZINE_CAPACITY: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GunAction {
    Fire,
    Blocked,
    Reload,
}

/// Everything the trigger remembers between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerState {
    pub ammo: u8,
    pub was_horizontal: bool,
    pub needs_reload: bool,
}

impl Default for TriggerState {
    fn default() -> Self {
        Self {
            ammo: MAGAZINE_CAPACITY,
            was_horizontal: false,
            needs_reload: false,
        }
    }
}

impl TriggerState {
    /// Clamps ammo into the magazine and drops a pending reload that a
    /// non-empty magazine could never satisfy.
    pub fn sanitized(mut self) -> Self {
        self.ammo = self.ammo.min(MAGAZINE_CAPACITY);
        self.needs_reload = self.needs_reload && self.ammo == 0;
        self
    }
}

/// Turns a "Y axis is horizontal" signal into gun actions.
///
/// Tilting to horizontal fires once per tilt; an empty magazine blocks
/// instead. After the shot that emptied the magazine, tilting back to
/// vertical reloads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrientationTrigger {
    state: TriggerState,
}

impl OrientationTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: TriggerState) -> Self {
        Self {
            state: state.sanitized(),
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn ammo(&self) -> u8 {
        self.state.ammo
    }

    pub fn needs_reload(&self) -> bool {
        self.state.needs_reload
    }

    pub fn was_horizontal(&self) -> bool {
        self.state.was_horizontal
    }

    pub fn evaluate(&mut self, horizontal: bool) -> Option<GunAction> {
        let s = &mut self.state;
        let rising = horizontal && !s.was_horizontal;
        let falling = !horizontal && s.was_horizontal;

        let action = if rising {
            if s.ammo > 0 {
                s.ammo -= 1;
                if s.ammo == 0 {
                    s.needs_reload = true;
                }
                Some(GunAction::Fire)
            } else {
                Some(GunAction::Blocked)
            }
        } else if falling && s.needs_reload && s.ammo == 0 {
            s.ammo = MAGAZINE_CAPACITY;
            s.needs_reload = false;
            Some(GunAction::Reload)
        } else {
            None
        };

        s.was_horizontal = horizontal;
        action
    }
}

impl Reactor for OrientationTrigger {
    type Input = bool;
    type Effect = GunAction;

    fn react(&mut self, horizontal: bool) -> Option<GunAction> {
        self.evaluate(horizontal)
    }
}
