//! Physics world management with Rapier3D.

use crate::collision::CollisionGroup;
use crossbeam::channel::Receiver;
use engine_core::{Transform, Vec3};
use glam::Quat;
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

/// Environment collision groups so static geometry (ground, walls, platforms)
/// collides with darts and the gun.
fn env_collision_groups() -> InteractionGroups {
    let (membership, filter) = CollisionGroup::environment();
    InteractionGroups::new(membership, filter)
}

fn to_isometry(position: Vec3, rotation: Quat) -> Isometry3<Real> {
    Isometry3::from_parts(
        Translation3::new(position.x, position.y, position.z),
        UnitQuaternion::from_quaternion(Quaternion::new(
            rotation.w, rotation.x, rotation.y, rotation.z,
        )),
    )
}

/// A contact that began this physics step.
///
/// `normal` is world-space and points away from `collider_a`'s surface toward
/// `collider_b`. Callers that care which side they are on must check handles
/// and flip accordingly.
#[derive(Debug, Clone, Copy)]
pub struct ContactStarted {
    pub collider_a: ColliderHandle,
    pub collider_b: ColliderHandle,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    events: ChannelEventCollector,
    collision_recv: Receiver<CollisionEvent>,
    contact_force_recv: Receiver<ContactForceEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default gravity.
    pub fn new() -> Self {
        let (collision_send, collision_recv) = crossbeam::channel::unbounded();
        let (contact_force_send, contact_force_recv) = crossbeam::channel::unbounded();
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            events: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_recv,
            contact_force_recv,
        }
    }

    /// Step the physics simulation.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &self.events,
        );
    }

    /// Drain the contacts that began since the last call.
    ///
    /// Must be called after [`PhysicsWorld::step`], while the narrow phase
    /// still holds the pair data for this step.
    pub fn drain_contact_events(&mut self) -> Vec<ContactStarted> {
        // Contact-force events are not consumed; drain them so the channel
        // does not grow without bound.
        while self.contact_force_recv.try_recv().is_ok() {}

        let mut started = Vec::new();
        while let Ok(event) = self.collision_recv.try_recv() {
            let (h1, h2) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2),
                CollisionEvent::Stopped(..) => continue,
            };

            let pair = match self.narrow_phase.contact_pair(h1, h2) {
                Some(pair) => pair,
                None => continue,
            };
            let (manifold, contact) = match pair.find_deepest_contact() {
                Some(deepest) => deepest,
                None => continue,
            };

            // Solver contacts are already world-space; fall back to
            // transforming the local point when the solver skipped the pair.
            let point = match manifold.data.solver_contacts.first() {
                Some(solver) => Vec3::new(solver.point.x, solver.point.y, solver.point.z),
                None => match self.collider_set.get(pair.collider1) {
                    Some(co1) => {
                        let p = co1.position() * contact.local_p1;
                        Vec3::new(p.x, p.y, p.z)
                    }
                    None => continue,
                },
            };

            let n = manifold.data.normal;
            started.push(ContactStarted {
                collider_a: pair.collider1,
                collider_b: pair.collider2,
                point,
                normal: Vec3::new(n.x, n.y, n.z),
            });
        }
        started
    }

    /// Add a dynamic rigid body with an initial pose. CCD is enabled since
    /// darts are small and fast.
    pub fn add_dynamic_body(&mut self, position: Vec3, rotation: Quat) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::dynamic()
            .position(to_isometry(position, rotation))
            .ccd_enabled(true)
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add a kinematic rigid body (for moving platforms).
    pub fn add_kinematic_body(&mut self, position: Vec3) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position.x, position.y, position.z])
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add a capsule collider along the body's forward axis for a dart.
    /// Fresh darts start in the muzzle collision group; call
    /// [`PhysicsWorld::set_collision_groups`] with [`CollisionGroup::dart`]
    /// once the muzzle window expires.
    pub fn add_dart_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        half_length: f32,
        radius: f32,
        mass: f32,
    ) -> ColliderHandle {
        let (membership, filter) = CollisionGroup::dart_muzzle();
        let collider = ColliderBuilder::capsule_z(half_length, radius)
            .mass(mass)
            .collision_groups(InteractionGroups::new(membership, filter))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a box collider to a rigid body (stick targets, gun body).
    pub fn add_box_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        half_extents: Vec3,
        groups: (Group, Group),
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(InteractionGroups::new(groups.0, groups.1))
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a ground plane collider (flat Y=0 half-space).
    pub fn add_ground_plane(&mut self) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .collision_groups(env_collision_groups())
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a static cuboid collider (walls). No parent body; collider is fixed
    /// in world. `translation`: world position of center. `rotation_y_rad`:
    /// rotation around Y axis in radians.
    pub fn add_static_cuboid(
        &mut self,
        translation: Vec3,
        rotation_y_rad: f32,
        half_extents: Vec3,
    ) -> ColliderHandle {
        let position = to_isometry(translation, Quat::from_rotation_y(rotation_y_rad));
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .position(position)
            .collision_groups(env_collision_groups())
            .build();
        self.collider_set.insert(collider)
    }

    /// Replace a collider's collision groups (muzzle window expiry).
    pub fn set_collision_groups(&mut self, handle: ColliderHandle, groups: (Group, Group)) {
        if let Some(collider) = self.collider_set.get_mut(handle) {
            collider.set_collision_groups(InteractionGroups::new(groups.0, groups.1));
        }
    }

    /// The rigid body a collider is attached to, if any.
    pub fn collider_parent(&self, handle: ColliderHandle) -> Option<RigidBodyHandle> {
        self.collider_set.get(handle).and_then(|c| c.parent())
    }

    /// Get the transform of a rigid body.
    pub fn get_body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    /// Get a body's linear velocity.
    pub fn body_linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|body| {
            let v = body.linvel();
            Vec3::new(v.x, v.y, v.z)
        })
    }

    /// Convert a dynamic body to kinematic so the simulation no longer moves
    /// it. The body keeps its colliders, so other darts still hit it.
    pub fn freeze_body(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linvel(vector![0.0, 0.0, 0.0], false);
            body.set_angvel(vector![0.0, 0.0, 0.0], false);
            body.set_body_type(RigidBodyType::KinematicPositionBased, true);
        }
    }

    /// Teleport a body to a pose immediately.
    pub fn set_body_pose(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_position(to_isometry(position, rotation), true);
        }
    }

    /// Drive a kinematic body toward a pose over the next step.
    pub fn set_kinematic_pose(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_next_kinematic_position(to_isometry(position, rotation));
        }
    }

    /// Apply an impulse to a dynamic body.
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.apply_impulse(vector![impulse.x, impulse.y, impulse.z], true);
        }
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}
