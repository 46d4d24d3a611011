use engine::HeadlessRunner;
use tiltgun::trigger::{GunAction, MAGAZINE_CAPACITY, OrientationTrigger, TriggerState};

use GunAction::{Blocked, Fire, Reload};

fn run(trigger: OrientationTrigger, inputs: &[bool]) -> (Vec<GunAction>, OrientationTrigger) {
    let mut runner = HeadlessRunner::new(trigger);
    let actions = runner.run(inputs.iter().copied());
    (actions, runner.reactor().clone())
}

/// Every boolean sequence up to `max_len` samples.
fn all_sequences(max_len: usize) -> impl Iterator<Item = Vec<bool>> {
    (0..=max_len).flat_map(|len| {
        (0u32..(1 << len)).map(move |bits| {
            (0..len)
                .map(|i| bits & (1 << i) != 0)
                .collect::<Vec<bool>>()
        })
    })
}

fn all_start_states() -> Vec<TriggerState> {
    let mut states = Vec::new();
    for ammo in 0..=MAGAZINE_CAPACITY {
        for was_horizontal in [false, true] {
            for needs_reload in [false, true] {
                states.push(
                    TriggerState {
                        ammo,
                        was_horizontal,
                        needs_reload,
                    }
                    .sanitized(),
                );
            }
        }
    }
    states
}

#[test]
fn single_tilt_fires_and_spends_one_round() {
    let (actions, trigger) = run(OrientationTrigger::new(), &[false, true]);
    assert_eq!(actions, vec![Fire]);
    assert_eq!(trigger.ammo(), 2);
}

#[test]
fn emptying_the_magazine_then_tilting_back_reloads() {
    let mut trigger = OrientationTrigger::new();
    let inputs = [false, true, false, true, false, true, false, true];
    let per_step: Vec<_> = inputs.iter().map(|&h| trigger.evaluate(h)).collect();

    assert_eq!(
        per_step,
        vec![
            None,
            Some(Fire),
            None,
            Some(Fire),
            None,
            Some(Fire),
            Some(Reload),
            Some(Fire),
        ]
    );
    assert_eq!(trigger.ammo(), 2);
    assert!(!trigger.needs_reload());
}

#[test]
fn third_shot_sets_pending_reload() {
    let (_, trigger) = run(OrientationTrigger::new(), &[true, false, true, false, true]);
    assert_eq!(trigger.ammo(), 0);
    assert!(trigger.needs_reload());
}

#[test]
fn staying_horizontal_on_empty_magazine_blocks_once() {
    let forced = OrientationTrigger::from_state(TriggerState {
        ammo: 0,
        was_horizontal: false,
        needs_reload: false,
    });
    let (actions, trigger) = run(forced, &[true, true, true]);
    assert_eq!(actions, vec![Blocked]);
    assert_eq!(trigger.ammo(), 0);
}

#[test]
fn empty_magazine_without_pending_reload_never_reloads() {
    let forced = OrientationTrigger::from_state(TriggerState {
        ammo: 0,
        was_horizontal: false,
        needs_reload: false,
    });
    let (actions, trigger) = run(forced, &[true, false, true, false]);
    assert_eq!(actions, vec![Blocked, Blocked]);
    assert_eq!(trigger.ammo(), 0);
}

#[test]
fn repeated_horizontal_samples_emit_exactly_one_action() {
    let inputs = vec![true; 50];
    let (actions, _) = run(OrientationTrigger::new(), &inputs);
    assert_eq!(actions, vec![Fire]);
}

#[test]
fn every_transition_follows_the_edge_rules() {
    for start in all_start_states() {
        for inputs in all_sequences(10) {
            let mut trigger = OrientationTrigger::from_state(start);
            for &horizontal in &inputs {
                let before = trigger.state();
                let action = trigger.evaluate(horizontal);
                let after = trigger.state();

                let rising = horizontal && !before.was_horizontal;
                let falling = !horizontal && before.was_horizontal;
                let reload_due = falling && before.needs_reload && before.ammo == 0;
                let ctx = || format!("start={start:?} inputs={inputs:?} before={before:?}");

                assert!(after.ammo <= MAGAZINE_CAPACITY, "{}", ctx());
                assert!(!after.needs_reload || after.ammo == 0, "{}", ctx());
                assert_eq!(after.was_horizontal, horizontal, "{}", ctx());

                match action {
                    Some(Fire) => {
                        assert!(rising && before.ammo > 0, "{}", ctx());
                        assert_eq!(after.ammo, before.ammo - 1, "{}", ctx());
                        assert_eq!(after.needs_reload, after.ammo == 0, "{}", ctx());
                    }
                    Some(Blocked) => {
                        assert!(rising && before.ammo == 0, "{}", ctx());
                        assert_eq!(after.ammo, before.ammo, "{}", ctx());
                        assert_eq!(after.needs_reload, before.needs_reload, "{}", ctx());
                    }
                    Some(Reload) => {
                        assert!(reload_due, "{}", ctx());
                        assert_eq!(after.ammo, MAGAZINE_CAPACITY, "{}", ctx());
                        assert!(!after.needs_reload, "{}", ctx());
                    }
                    None => {
                        assert!(!rising && !reload_due, "{}", ctx());
                        assert_eq!(after.ammo, before.ammo, "{}", ctx());
                        assert_eq!(after.needs_reload, before.needs_reload, "{}", ctx());
                    }
                }
            }
        }
    }
}

#[test]
fn samples_without_an_edge_never_act() {
    for start in all_start_states() {
        for horizontal in [false, true] {
            let mut trigger = OrientationTrigger::from_state(TriggerState {
                was_horizontal: horizontal,
                ..start
            });
            assert_eq!(trigger.evaluate(horizontal), None, "start={start:?}");
        }
    }
}
