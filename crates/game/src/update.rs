//! Per-frame and fixed-step advancement of the range.

use engine_core::Transform;
use glam::Vec3;
use physics::PhysicsBody;

use crate::dart::{Dart, StuckTo};
use crate::gun::TriggerEdge;
use crate::state::RangeState;
use crate::visual::DartMaterialParams;
use crate::wobble::DartWobble;

/// Run one frame of toy update. `trigger_value` is the [0,1] trigger axis
/// from whatever input source drives the gun.
pub fn frame(state: &mut RangeState, dt: f32, trigger_value: f32) {
    match state.trigger.update(trigger_value) {
        Some(TriggerEdge::Pulled) => state.fire_gun(),
        Some(TriggerEdge::Released) => state.gun.release_trigger(),
        None => {}
    }
    log::trace!("Trigger at {:?}", state.trigger.position());

    if state.chamber.update(dt) {
        state.gun.chamber_stopped();
        log::debug!("Chamber aligned at {:.1} deg", state.chamber.current_rotation());
    }

    sync_flying_darts(state);
    follow_stuck_darts(state);

    for (entity, (wobble, params)) in state
        .world
        .query_mut::<(&mut DartWobble, &mut DartMaterialParams)>()
    {
        wobble.update(dt, params);
        if wobble.is_wobbling() {
            log::trace!(
                "Dart {:?} bend {:.4} along {:?}",
                entity,
                params.bend_strength,
                params.direction
            );
        }
    }

    let due = state.scheduler.advance(dt);
    state.apply_deferred(due);

    if let Some(audio) = state.audio.as_mut() {
        audio.update_listener(state.muzzle.position, state.muzzle.forward(), Vec3::Y);
        audio.cleanup();
    }
}

/// Run one fixed physics tick.
pub fn fixed_step(state: &mut RangeState, dt: f32) {
    // Cache pre-impact velocities before the solver runs; the stick decision
    // reads the velocity of the step immediately preceding the contact, not
    // the already-deflected one.
    for (_, (dart, pb)) in state.world.query_mut::<(&mut Dart, &PhysicsBody)>() {
        if let Some(velocity) = state.physics.body_linear_velocity(pb.rigid_body) {
            dart.cache_velocity(velocity);
        }
    }

    state.platform.update(&mut state.physics, dt);
    state.physics.step();

    for contact in state.physics.drain_contact_events() {
        state.handle_contact(contact);
    }
}

/// Free darts mirror their physics body and face along their velocity.
fn sync_flying_darts(state: &mut RangeState) {
    for (_, (transform, dart, pb)) in state
        .world
        .query_mut::<(&mut Transform, &Dart, &PhysicsBody)>()
    {
        if dart.is_stuck() {
            continue;
        }
        if let Some(body_transform) = state.physics.get_body_transform(pb.rigid_body) {
            transform.position = body_transform.position;
            transform.rotation = body_transform.rotation;
        }
        if let Some(velocity) = state.physics.body_linear_velocity(pb.rigid_body) {
            if velocity.length() > 0.1 {
                transform.look_along(velocity);
            }
        }
    }
}

/// Stuck darts ride their anchor; the kinematic body is driven to match.
fn follow_stuck_darts(state: &mut RangeState) {
    for (_, (transform, anchor, pb)) in state
        .world
        .query_mut::<(&mut Transform, &StuckTo, &PhysicsBody)>()
    {
        let (position, rotation) = match anchor.parent {
            Some(parent) => match state.physics.get_body_transform(parent) {
                Some(parent_transform) => anchor.world_pose(Some(&parent_transform)),
                None => continue,
            },
            None => anchor.world_pose(None),
        };
        transform.position = position;
        transform.rotation = rotation;
        state
            .physics
            .set_kinematic_pose(pb.rigid_body, position, rotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RangeConfig;
    use audio::RandomClipPlayer;
    use std::cell::Cell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn test_state() -> RangeState {
        RangeState::new(
            &RangeConfig::default(),
            None,
            RandomClipPlayer::new(0.5, 1.0),
        )
    }

    fn run(state: &mut RangeState, frames: usize, trigger: f32) {
        for _ in 0..frames {
            fixed_step(state, DT);
            frame(state, DT, trigger);
        }
    }

    fn dart_count(state: &mut RangeState) -> usize {
        state.world.query_mut::<&Dart>().into_iter().count()
    }

    #[test]
    fn fired_dart_sticks_to_the_wall_and_freezes() {
        let mut state = test_state();
        state.fire_gun();
        run(&mut state, 240, 0.0);

        let mut seen = 0;
        for (_, (dart, pb)) in state.world.query_mut::<(&Dart, &PhysicsBody)>() {
            assert!(dart.is_stuck());
            let velocity = state.physics.body_linear_velocity(pb.rigid_body).unwrap();
            assert!(velocity.length() < 1e-3);
            seen += 1;
        }
        assert_eq!(seen, 1);
    }

    #[test]
    fn trigger_cycle_fires_once_and_rearms_after_chamber() {
        let mut state = test_state();

        // Pull: exactly one dart leaves.
        run(&mut state, 5, 1.0);
        assert_eq!(dart_count(&mut state), 1);

        // Holding the trigger never fires again.
        run(&mut state, 5, 1.0);
        assert_eq!(dart_count(&mut state), 1);

        // Releasing while the chamber is still turning keeps the gun gated.
        run(&mut state, 2, 0.0);
        assert_eq!(dart_count(&mut state), 1);

        // Let the chamber finish its 60 degree advance, then pull again.
        run(&mut state, 120, 0.0);
        run(&mut state, 5, 1.0);
        assert_eq!(dart_count(&mut state), 2);
    }

    #[test]
    fn stuck_dart_despawns_after_its_lifetime() {
        let mut config = RangeConfig::default();
        config.dart.destroy_after = 0.5;
        let mut state =
            RangeState::new(&config, None, RandomClipPlayer::new(0.5, 1.0));

        state.fire_gun();
        run(&mut state, 120, 0.0);
        assert_eq!(dart_count(&mut state), 0);
    }

    #[test]
    fn hit_and_stuck_notifications_fire_for_a_wall_impact() {
        let mut state = test_state();
        let hits = Rc::new(Cell::new(0));
        let sticks = Rc::new(Cell::new(0));
        {
            let hits = Rc::clone(&hits);
            state.on_dart_hit.connect(move || hits.set(hits.get() + 1));
        }
        {
            let sticks = Rc::clone(&sticks);
            state
                .on_dart_stuck
                .connect(move || sticks.set(sticks.get() + 1));
        }

        state.fire_gun();
        run(&mut state, 120, 0.0);

        assert_eq!(hits.get(), 1);
        assert_eq!(sticks.get(), 1);
    }

    #[test]
    fn wobble_settles_to_zero_bend_after_sticking() {
        let mut state = test_state();
        state.fire_gun();
        // Long enough for flight, stick, and the full wobble decay.
        run(&mut state, 600, 0.0);

        for (_, (wobble, params)) in state
            .world
            .query_mut::<(&DartWobble, &DartMaterialParams)>()
        {
            assert!(!wobble.is_wobbling());
            assert_eq!(params.bend_strength, 0.0);
        }
    }
}
