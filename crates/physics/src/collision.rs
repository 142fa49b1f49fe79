//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for the entity types in the range.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment (ground, walls) and stick targets.
    Environment = 1 << 0,
    /// The gun body and its attachments.
    Gun = 1 << 1,
    /// Darts in flight or stuck.
    Dart = 1 << 2,
}

impl CollisionGroup {
    /// Create a collision group for environment geometry.
    pub fn environment() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Environment as u32);
        let filter = Group::ALL;
        (membership, filter)
    }

    /// Create a collision group for the gun's colliders.
    pub fn gun() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Gun as u32);
        let filter = Group::from_bits_retain(Self::Environment as u32 | Self::Dart as u32);
        (membership, filter)
    }

    /// Create a collision group for an armed dart.
    pub fn dart() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Dart as u32);
        let filter = Group::from_bits_retain(
            Self::Environment as u32 | Self::Gun as u32 | Self::Dart as u32,
        );
        (membership, filter)
    }

    /// Create a collision group for a dart still inside the muzzle window.
    /// Identical to [`CollisionGroup::dart`] except the gun is filtered out,
    /// so a freshly fired dart cannot clip the gun that launched it.
    pub fn dart_muzzle() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Dart as u32);
        let filter = Group::from_bits_retain(Self::Environment as u32 | Self::Dart as u32);
        (membership, filter)
    }
}

/// Component linking an ECS entity to its physics handles.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub rigid_body: RigidBodyHandle,
    pub collider: Option<ColliderHandle>,
}

impl PhysicsBody {
    pub fn new(rigid_body: RigidBodyHandle) -> Self {
        Self {
            rigid_body,
            collider: None,
        }
    }

    pub fn with_collider(rigid_body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            rigid_body,
            collider: Some(collider),
        }
    }
}
