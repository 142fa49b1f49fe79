//! Range state: world, physics, audio, gun, chamber, and the impact wiring
//! between them.

use std::collections::HashMap;

use audio::{AudioSystem, RandomClipPlayer};
use engine_core::{Scheduler, Signal, Transform};
use glam::Vec3;
use hecs::{Entity, World};
use physics::{ColliderHandle, CollisionGroup, ContactStarted, PhysicsBody, PhysicsWorld};

use crate::chamber::Chamber;
use crate::config::{DartTuning, RangeConfig, WobbleTuning};
use crate::dart::{Dart, StuckTo};
use crate::gun::{Gun, Trigger};
use crate::range::{self, Platform};
use crate::visual::DartMaterialParams;
use crate::wobble::DartWobble;

/// Dart capsule dimensions in meters.
const DART_HALF_LENGTH: f32 = 0.06;
const DART_RADIUS: f32 = 0.015;

/// Dart mass in kilograms. With the default launch force this gives a
/// muzzle speed around 40 m/s.
const DART_MASS: f32 = 0.25;

/// How far in front of the muzzle a dart spawns.
const DART_SPAWN_OFFSET: f32 = 0.2;

/// Seconds a fresh dart ignores the gun's own colliders.
const MUZZLE_WINDOW_SECONDS: f32 = 0.1;

/// Deferred one-shot actions the scheduler hands back to the state.
#[derive(Debug, Clone, Copy)]
pub enum Deferred {
    /// Remove a dart that has outstayed its post-stick lifetime.
    DespawnDart(Entity),
    /// End a dart's muzzle window so it collides with the gun again.
    ArmDartCollisions(Entity),
}

pub struct RangeState {
    pub world: World,
    pub physics: PhysicsWorld,
    pub audio: Option<AudioSystem>,
    pub hit_sounds: RandomClipPlayer,

    pub gun: Gun,
    pub trigger: Trigger,
    pub chamber: Chamber,
    pub platform: Platform,
    pub muzzle: Transform,

    dart_tuning: DartTuning,
    wobble_tuning: WobbleTuning,

    pub scheduler: Scheduler<Deferred>,
    collider_to_entity: HashMap<ColliderHandle, Entity>,

    pub on_dart_hit: Signal,
    pub on_dart_stuck: Signal,
}

impl RangeState {
    pub fn new(
        config: &RangeConfig,
        audio: Option<AudioSystem>,
        hit_sounds: RandomClipPlayer,
    ) -> Self {
        let mut physics = PhysicsWorld::new();
        let platform = range::build_scene(&mut physics);

        // Firing position: chest height, aimed straight downrange (-Z).
        let muzzle = Transform::from_position(Vec3::new(0.0, 1.4, 0.0));

        // The gun body occupies the space around the muzzle so the muzzle
        // window has something to ignore.
        let gun_body = physics.add_kinematic_body(muzzle.position);
        physics.add_box_collider(gun_body, Vec3::new(0.05, 0.1, 0.25), CollisionGroup::gun());

        Self {
            world: World::new(),
            physics,
            audio,
            hit_sounds,
            gun: Gun::from_tuning(&config.gun),
            trigger: Trigger::new(Vec3::new(0.0, -0.06, 0.08), Vec3::new(0.0, -0.06, 0.11)),
            chamber: Chamber::from_tuning(&config.chamber),
            platform,
            muzzle,
            dart_tuning: config.dart.clone(),
            wobble_tuning: config.wobble.clone(),
            scheduler: Scheduler::new(),
            collider_to_entity: HashMap::new(),
            on_dart_hit: Signal::new(),
            on_dart_stuck: Signal::new(),
        }
    }

    /// Fire if the gun is ready: spawn a dart, launch it, and start the
    /// chamber advancing toward the next position.
    pub fn fire_gun(&mut self) {
        if !self.gun.try_fire() {
            return;
        }
        self.chamber.start_rotation(self.gun.chamber_step_degrees);

        let entity = self.spawn_dart();
        self.launch(entity);
    }

    fn spawn_dart(&mut self) -> Entity {
        let mut transform = self.muzzle;
        transform.position += self.muzzle.forward() * DART_SPAWN_OFFSET;

        let body = self
            .physics
            .add_dynamic_body(transform.position, transform.rotation);
        let collider = self
            .physics
            .add_dart_collider(body, DART_HALF_LENGTH, DART_RADIUS, DART_MASS);

        let entity = self.world.spawn((
            transform,
            Dart::from_tuning(&self.dart_tuning),
            DartWobble::from_tuning(&self.wobble_tuning),
            DartMaterialParams::default(),
            PhysicsBody::with_collider(body, collider),
        ));
        self.collider_to_entity.insert(collider, entity);
        self.scheduler
            .schedule(MUZZLE_WINDOW_SECONDS, Deferred::ArmDartCollisions(entity));
        entity
    }

    /// Impart the launch impulse. A dart without a physics body spawns inert.
    fn launch(&mut self, entity: Entity) {
        let body = match self.world.get::<&PhysicsBody>(entity) {
            Ok(pb) => pb.rigid_body,
            Err(_) => {
                log::warn!("Fired dart has no rigid body, it will not move");
                return;
            }
        };
        self.physics
            .apply_impulse(body, self.muzzle.forward() * self.gun.launch_force);
    }

    /// Route a physics contact to the darts involved. The event normal points
    /// from `collider_a` toward `collider_b`; each dart wants the normal of
    /// the surface it hit, i.e. pointing back at itself.
    pub fn handle_contact(&mut self, contact: ContactStarted) {
        let entity_a = self.collider_to_entity.get(&contact.collider_a).copied();
        let entity_b = self.collider_to_entity.get(&contact.collider_b).copied();

        if let Some(entity) = entity_a {
            self.dart_impact(
                entity,
                contact.point,
                -contact.normal,
                contact.collider_b,
                entity_b.is_some(),
            );
        }
        if let Some(entity) = entity_b {
            self.dart_impact(
                entity,
                contact.point,
                contact.normal,
                contact.collider_a,
                entity_a.is_some(),
            );
        }
    }

    fn dart_impact(
        &mut self,
        entity: Entity,
        point: Vec3,
        surface_normal: Vec3,
        other: ColliderHandle,
        other_is_dart: bool,
    ) {
        match self.world.get::<&Dart>(entity) {
            Ok(dart) if !dart.is_stuck() => {}
            _ => return,
        }
        // Dart-on-dart contacts bounce without any stick evaluation.
        if other_is_dart {
            return;
        }

        self.on_dart_hit.emit();
        if let Some(audio) = self.audio.as_mut() {
            self.hit_sounds.play_at(audio, point);
        }

        let should_stick = self
            .world
            .get::<&Dart>(entity)
            .map(|dart| dart.should_stick(surface_normal))
            .unwrap_or(false);
        if should_stick {
            self.stick_dart(entity, point, surface_normal, other);
        }
    }

    fn stick_dart(
        &mut self,
        entity: Entity,
        point: Vec3,
        surface_normal: Vec3,
        other: ColliderHandle,
    ) {
        let (cached_velocity, destroy_after) = {
            let mut dart = match self.world.get::<&mut Dart>(entity) {
                Ok(dart) => dart,
                Err(_) => return,
            };
            dart.mark_stuck();
            (dart.cached_velocity(), dart.destroy_after)
        };
        self.on_dart_stuck.emit();

        // Nose into the surface: forward axis opposite the impact normal.
        let mut pose = Transform::from_position(point);
        pose.look_along(-surface_normal);

        if let Ok(mut transform) = self.world.get::<&mut Transform>(entity) {
            *transform = pose;
        }

        let body = self
            .world
            .get::<&PhysicsBody>(entity)
            .map(|pb| pb.rigid_body)
            .ok();
        if let Some(body) = body {
            self.physics.freeze_body(body);
            self.physics.set_body_pose(body, pose.position, pose.rotation);
        }

        // Anchor to whatever was hit so the dart rides along with it.
        let anchor = match self.physics.collider_parent(other) {
            Some(parent) => match self.physics.get_body_transform(parent) {
                Some(parent_transform) => {
                    StuckTo::on_body(parent, &parent_transform, pose.position, pose.rotation)
                }
                None => StuckTo::world_anchor(pose.position, pose.rotation),
            },
            None => StuckTo::world_anchor(pose.position, pose.rotation),
        };
        let _ = self.world.insert_one(entity, anchor);

        if let Ok((wobble, params)) = self
            .world
            .query_one_mut::<(&mut DartWobble, &mut DartMaterialParams)>(entity)
        {
            wobble.start(cached_velocity, surface_normal, params);
        }

        self.scheduler
            .schedule(destroy_after, Deferred::DespawnDart(entity));
        log::debug!("Dart stuck at {:?}", pose.position);
    }

    /// Act on the scheduler's due one-shots.
    pub fn apply_deferred(&mut self, due: Vec<Deferred>) {
        for action in due {
            match action {
                Deferred::DespawnDart(entity) => self.despawn_dart(entity),
                Deferred::ArmDartCollisions(entity) => self.arm_dart(entity),
            }
        }
    }

    fn despawn_dart(&mut self, entity: Entity) {
        let handles = self
            .world
            .get::<&PhysicsBody>(entity)
            .map(|pb| (pb.rigid_body, pb.collider))
            .ok();
        if let Some((body, collider)) = handles {
            self.physics.remove_body(body);
            if let Some(collider) = collider {
                self.collider_to_entity.remove(&collider);
            }
        }
        self.world.despawn(entity).ok();
    }

    fn arm_dart(&mut self, entity: Entity) {
        let collider = self
            .world
            .get::<&PhysicsBody>(entity)
            .ok()
            .and_then(|pb| pb.collider);
        if let Some(collider) = collider {
            self.physics
                .set_collision_groups(collider, CollisionGroup::dart());
        }
    }
}
