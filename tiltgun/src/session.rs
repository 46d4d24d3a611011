use engine::inbox::{self, Inbox};
use engine::{HeadlessRunner, Trace};
use tracing::{debug, info};

use crate::presentation::{Presenter, rotation_target_degrees};
use crate::sensor::{SensorError, SensorSource};
use crate::sfx::AudioSink;
use crate::trigger::{GunAction, OrientationTrigger, TriggerState};

/// The screen-level controller: owns the trigger and wires it to sound and
/// presentation.
///
/// Every evaluation happens on whichever context owns the session. Sensors
/// only ever push into the session's inbox, so evaluations cannot overlap.
pub struct GunSession<A, P> {
    runner: HeadlessRunner<OrientationTrigger>,
    audio: A,
    presenter: P,
    inbox: Option<Inbox<bool>>,
}

impl<A: AudioSink, P: Presenter> GunSession<A, P> {
    pub fn new(audio: A, presenter: P) -> Self {
        Self::with_trigger(OrientationTrigger::new(), audio, presenter)
    }

    pub fn with_trigger(trigger: OrientationTrigger, audio: A, presenter: P) -> Self {
        Self {
            runner: HeadlessRunner::new(trigger),
            audio,
            presenter,
            inbox: None,
        }
    }

    pub fn trigger(&self) -> &OrientationTrigger {
        self.runner.reactor()
    }

    pub fn state(&self) -> TriggerState {
        self.runner.reactor().state()
    }

    pub fn trace(&self) -> &Trace<bool, GunAction> {
        self.runner.trace()
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn is_active(&self) -> bool {
        self.inbox.is_some()
    }

    /// Runs one orientation sample through the trigger and notifies the
    /// collaborators: one sound per action, presenter after every sample.
    pub fn evaluate(&mut self, horizontal: bool) -> Option<GunAction> {
        let action = self.runner.step(horizontal);
        if let Some(action) = action {
            self.audio.play_once(action.sound());
        }

        let ammo = self.runner.reactor().ammo();
        self.presenter.set_rotation_target(rotation_target_degrees(horizontal));
        self.presenter.set_ammo_display(ammo);

        debug!(
            frame = self.runner.frame(),
            horizontal,
            action = ?action,
            ammo,
            "evaluated orientation sample"
        );
        if let Some(action) = action {
            info!(action = ?action, ammo, "gun action");
        }
        action
    }

    /// Starts receiving samples from `sensor`. Resuming an active session
    /// first pauses it against the same sensor.
    pub fn resume<S>(&mut self, sensor: &mut S) -> Result<(), SensorError>
    where
        S: SensorSource + ?Sized,
    {
        if self.is_active() {
            self.pause(sensor);
        }
        let (outbox, inbox) = inbox::channel();
        sensor.subscribe(outbox)?;
        self.inbox = Some(inbox);
        info!(ammo = self.trigger().ammo(), "session resumed");
        Ok(())
    }

    /// Stops delivery and drops samples that have not been evaluated yet.
    /// Trigger state is left exactly as the last evaluation left it.
    pub fn pause<S>(&mut self, sensor: &mut S)
    where
        S: SensorSource + ?Sized,
    {
        sensor.unsubscribe();
        if let Some(mut inbox) = self.inbox.take() {
            let discarded = inbox.close_and_discard();
            info!(discarded, ammo = self.trigger().ammo(), "session paused");
        }
    }

    /// Evaluates every sample already queued, in arrival order.
    pub fn pump(&mut self) -> Vec<GunAction> {
        let mut actions = Vec::new();
        if let Some(mut inbox) = self.inbox.take() {
            inbox.drain(|horizontal| actions.extend(self.evaluate(horizontal)));
            self.inbox = Some(inbox);
        }
        actions
    }

    /// Waits for the next queued sample without evaluating it. `None` when
    /// the session is paused or the sensor has stopped producing.
    pub async fn next_sample(&mut self) -> Option<bool> {
        match self.inbox.as_mut() {
            Some(inbox) => inbox.recv().await,
            None => None,
        }
    }
}
