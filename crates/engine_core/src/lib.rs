//! Core engine types and utilities for DartRange.
//!
//! This crate provides the foundational types used across all toy systems:
//! - Transform and spatial math
//! - Time management (frame delta + fixed physics timestep)
//! - Deferred one-shot actions and event signals

pub mod scheduler;
pub mod signal;
pub mod time;
pub mod transform;

pub use scheduler::*;
pub use signal::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
