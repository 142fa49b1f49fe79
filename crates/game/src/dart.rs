//! Dart stick behavior: decide on impact whether a dart embeds into the
//! surface, and anchor it to whatever it hit.

use engine_core::Transform;
use glam::{Quat, Vec3};
use physics::RigidBodyHandle;

use crate::config::DartTuning;

/// Dart component: stick thresholds and the velocity cache that feeds the
/// stick decision.
#[derive(Debug, Clone, Copy)]
pub struct Dart {
    /// Maximum deviation from the surface normal, in degrees.
    pub max_angle_to_stick: f32,
    /// Minimum speed required to stick.
    pub min_velocity_to_stick: f32,
    /// Seconds a stuck dart stays before despawning.
    pub destroy_after: f32,

    stuck: bool,
    cached_velocity: Vec3,
}

impl Dart {
    pub fn from_tuning(tuning: &DartTuning) -> Self {
        Self {
            max_angle_to_stick: tuning.max_angle_to_stick,
            min_velocity_to_stick: tuning.min_velocity_to_stick,
            destroy_after: tuning.destroy_after,
            stuck: false,
            cached_velocity: Vec3::ZERO,
        }
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    pub fn cached_velocity(&self) -> Vec3 {
        self.cached_velocity
    }

    /// Record the body velocity for this physics step. The cache freezes once
    /// the dart sticks, so the impact handler reads the velocity from the
    /// step immediately preceding contact resolution, not the deflected one.
    pub fn cache_velocity(&mut self, velocity: Vec3) {
        if !self.stuck {
            self.cached_velocity = velocity;
        }
    }

    /// Angle in degrees between the impact normal and the reversed flight
    /// direction. Undefined (`None`) when the cached velocity is zero.
    fn incidence_angle(&self, impact_normal: Vec3) -> Option<f32> {
        let speed = self.cached_velocity.length();
        if speed < 1e-6 {
            return None;
        }
        let reversed_flight = -self.cached_velocity / speed;
        Some(impact_normal.angle_between(reversed_flight).to_degrees())
    }

    /// Stick decision: inside the incidence cone and fast enough. An
    /// undefined incidence angle fails closed.
    pub fn should_stick(&self, impact_normal: Vec3) -> bool {
        match self.incidence_angle(impact_normal) {
            Some(angle) => {
                angle <= self.max_angle_to_stick
                    && self.cached_velocity.length() >= self.min_velocity_to_stick
            }
            None => false,
        }
    }

    /// Mark the dart as stuck. Irreversible.
    pub fn mark_stuck(&mut self) {
        self.stuck = true;
    }
}

/// Anchors a stuck dart to the body it hit so it moves with that body.
/// A dart stuck to bodiless static geometry anchors in world space.
#[derive(Debug, Clone, Copy)]
pub struct StuckTo {
    pub parent: Option<RigidBodyHandle>,
    local_position: Vec3,
    local_rotation: Quat,
}

impl StuckTo {
    /// Anchor at a fixed world pose (static geometry).
    pub fn world_anchor(position: Vec3, rotation: Quat) -> Self {
        Self {
            parent: None,
            local_position: position,
            local_rotation: rotation,
        }
    }

    /// Anchor to a body, storing the dart pose in the parent's local frame.
    pub fn on_body(
        parent: RigidBodyHandle,
        parent_transform: &Transform,
        position: Vec3,
        rotation: Quat,
    ) -> Self {
        let inverse = parent_transform.rotation.inverse();
        Self {
            parent: Some(parent),
            local_position: inverse * (position - parent_transform.position),
            local_rotation: inverse * rotation,
        }
    }

    /// World pose of the anchor given the parent's current transform.
    /// For world anchors the stored pose is returned as-is.
    pub fn world_pose(&self, parent_transform: Option<&Transform>) -> (Vec3, Quat) {
        match (self.parent, parent_transform) {
            (Some(_), Some(parent)) => (
                parent.position + parent.rotation * self.local_position,
                parent.rotation * self.local_rotation,
            ),
            _ => (self.local_position, self.local_rotation),
        }
    }
}
