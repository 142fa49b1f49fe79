//! Transform component and utilities for spatial positioning.

use glam::{Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Get the forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get the right direction (positive X).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction (positive Y).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Translate the transform by a delta.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Orient the transform so its forward axis points along `direction`.
    /// A near-zero direction leaves the rotation unchanged.
    pub fn look_along(&mut self, direction: Vec3) {
        if direction.length_squared() > 0.0001 {
            self.rotation = Quat::from_rotation_arc(-Vec3::Z, direction.normalize());
        }
    }

    /// Look at a target position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = target - self.position;
        if forward.length_squared() > 0.0001 {
            self.rotation = Quat::from_mat4(&Mat4::look_at_rh(self.position, target, up)).inverse();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_along_points_forward_axis() {
        let mut t = Transform::default();
        t.look_along(Vec3::new(3.0, 0.0, 0.0));
        assert!((t.forward() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn look_along_ignores_zero_direction() {
        let mut t = Transform::from_position_rotation(Vec3::ZERO, Quat::from_rotation_y(1.0));
        let before = t.rotation;
        t.look_along(Vec3::ZERO);
        assert_eq!(t.rotation, before);
    }
}
