//! The shooting range scene: ground, a wall downrange, and a drifting
//! target platform darts can ride.

use glam::{Quat, Vec3};
use physics::{CollisionGroup, PhysicsWorld, RigidBodyHandle};

/// Kinematic stick target that drifts side to side on a scripted path.
pub struct Platform {
    pub body: RigidBodyHandle,
    origin: Vec3,
    amplitude: f32,
    speed: f32,
    time: f32,
}

impl Platform {
    /// Advance the scripted path. Runs in the fixed step so the kinematic
    /// body velocity stays consistent.
    pub fn update(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        self.time += dt;
        let offset = (self.time * self.speed).sin() * self.amplitude;
        physics.set_kinematic_pose(self.body, self.origin + Vec3::X * offset, Quat::IDENTITY);
    }
}

/// Build the range geometry and return the moving platform.
pub fn build_scene(physics: &mut PhysicsWorld) -> Platform {
    physics.add_ground_plane();

    // Back wall, six meters downrange of the firing position.
    physics.add_static_cuboid(Vec3::new(0.0, 1.5, -6.0), 0.0, Vec3::new(3.0, 1.5, 0.2));

    let origin = Vec3::new(2.0, 1.0, -4.0);
    let body = physics.add_kinematic_body(origin);
    physics.add_box_collider(body, Vec3::new(0.6, 0.6, 0.15), CollisionGroup::environment());

    Platform {
        body,
        origin,
        amplitude: 1.5,
        speed: 0.8,
        time: 0.0,
    }
}
