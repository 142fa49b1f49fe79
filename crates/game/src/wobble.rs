//! Procedural wobble of a stuck dart: a damped oscillation on the bend
//! parameter of the dart material.

use glam::Vec3;

use crate::config::WobbleTuning;
use crate::visual::WobbleSurface;

/// Tangential impact speed below which no wobble starts (near-perpendicular
/// impacts produce no visible bend).
const MIN_TANGENTIAL_SPEED: f32 = 0.1;

/// Bend strength below which the oscillation is considered settled.
const MIN_BEND_STRENGTH: f32 = 0.001;

/// Wobble state for one dart.
#[derive(Debug, Clone, Copy)]
pub struct DartWobble {
    /// Frequency of the oscillation.
    pub frequency: f32,
    /// Damping factor; higher values settle faster.
    pub damping: f32,
    /// Scales the initial bend strength from the tangential impact speed.
    pub bend_strength_multiplier: f32,
    /// Hard cap on the wobble duration in seconds.
    pub max_duration: f32,

    wobbling: bool,
    direction: Vec3,
    initial_bend: f32,
    timer: f32,
}

impl DartWobble {
    pub fn from_tuning(tuning: &WobbleTuning) -> Self {
        Self {
            frequency: tuning.frequency,
            damping: tuning.damping,
            bend_strength_multiplier: tuning.bend_strength_multiplier,
            max_duration: tuning.max_duration,
            wobbling: false,
            direction: Vec3::ZERO,
            initial_bend: 0.0,
            timer: 0.0,
        }
    }

    pub fn is_wobbling(&self) -> bool {
        self.wobbling
    }

    /// Start the wobble from the dart's velocity at the moment of sticking
    /// and the normal of the surface it stuck to.
    pub fn start(
        &mut self,
        initial_velocity: Vec3,
        surface_normal: Vec3,
        surface: &mut dyn WobbleSurface,
    ) {
        // The bend oscillates along the component of the impact velocity
        // parallel to the surface.
        let normal = surface_normal.normalize_or_zero();
        let tangential = initial_velocity - normal * initial_velocity.dot(normal);

        if tangential.length() < MIN_TANGENTIAL_SPEED {
            return;
        }

        self.direction = tangential.normalize();
        self.initial_bend = tangential.length() * self.bend_strength_multiplier;
        surface.set_wobble_direction(self.direction);

        self.wobbling = true;
        self.timer = 0.0;
    }

    /// Start the wobble from an explicit direction and strength, bypassing
    /// the velocity projection. Diagnostic entry point.
    pub fn start_manual(
        &mut self,
        direction: Vec3,
        strength: f32,
        surface: &mut dyn WobbleSurface,
    ) {
        if direction == Vec3::ZERO {
            log::warn!("Manual wobble: direction vector is zero, wobble not started");
            return;
        }

        self.direction = direction.normalize();
        self.initial_bend = strength;
        surface.set_wobble_direction(self.direction);

        self.wobbling = true;
        self.timer = 0.0;
    }

    /// Advance the oscillation and push the current bend strength to the
    /// surface. On settling, pushes zero exactly once so the dart comes to
    /// rest with no residual bend.
    pub fn update(&mut self, dt: f32, surface: &mut dyn WobbleSurface) {
        if !self.wobbling {
            return;
        }

        self.timer += dt;

        // Exponential decay envelope over a sine carrier.
        let envelope = (-self.damping * self.timer).exp();
        let oscillation = envelope * (self.frequency * self.timer).sin();
        let strength = self.initial_bend * oscillation;

        surface.set_bend_strength(strength);

        if self.timer >= self.max_duration || strength.abs() < MIN_BEND_STRENGTH {
            self.wobbling = false;
            self.timer = 0.0;
            surface.set_bend_strength(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        direction: Vec3,
        direction_pushes: usize,
        strengths: Vec<f32>,
    }

    impl WobbleSurface for Recorder {
        fn set_wobble_direction(&mut self, direction: Vec3) {
            self.direction = direction;
            self.direction_pushes += 1;
        }

        fn set_bend_strength(&mut self, strength: f32) {
            self.strengths.push(strength);
        }
    }

    fn wobble() -> DartWobble {
        DartWobble::from_tuning(&crate::config::WobbleTuning::default())
    }

    #[test]
    fn glancing_impact_starts_wobble_along_surface() {
        let mut w = wobble();
        let mut surface = Recorder::default();
        // Hit the floor while moving mostly sideways.
        w.start(Vec3::new(3.0, -4.0, 0.0), Vec3::Y, &mut surface);
        assert!(w.is_wobbling());
        assert!((surface.direction - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn near_perpendicular_impact_never_activates() {
        let mut w = wobble();
        let mut surface = Recorder::default();
        // Tangential component is 0.05, below the 0.1 threshold.
        w.start(Vec3::new(0.05, -5.0, 0.0), Vec3::Y, &mut surface);
        assert!(!w.is_wobbling());
        assert_eq!(surface.direction_pushes, 0);
    }

    #[test]
    fn amplitude_stays_inside_decay_envelope() {
        let mut w = wobble();
        let mut surface = Recorder::default();
        w.start(Vec3::new(4.0, -4.0, 0.0), Vec3::Y, &mut surface);
        let initial_bend = 4.0 * w.bend_strength_multiplier;

        let dt = 1.0 / 60.0;
        let mut t = 0.0;
        while w.is_wobbling() {
            w.update(dt, &mut surface);
            t += dt;
            let bound = initial_bend * (-w.damping * t).exp() + 1e-6;
            assert!(surface.strengths.last().unwrap().abs() <= bound);
        }
    }

    #[test]
    fn settles_with_a_single_trailing_zero() {
        let mut w = wobble();
        let mut surface = Recorder::default();
        w.start(Vec3::new(4.0, -4.0, 0.0), Vec3::Y, &mut surface);

        let dt = 1.0 / 60.0;
        for _ in 0..1200 {
            w.update(dt, &mut surface);
            if !w.is_wobbling() {
                break;
            }
        }
        assert!(!w.is_wobbling());
        assert_eq!(*surface.strengths.last().unwrap(), 0.0);

        // Further updates push nothing.
        let pushes = surface.strengths.len();
        w.update(dt, &mut surface);
        assert_eq!(surface.strengths.len(), pushes);
    }

    #[test]
    fn direction_is_fixed_for_the_wobble_lifetime() {
        let mut w = wobble();
        let mut surface = Recorder::default();
        w.start(Vec3::new(2.0, -6.0, 1.0), Vec3::Y, &mut surface);
        let dt = 1.0 / 60.0;
        while w.is_wobbling() {
            w.update(dt, &mut surface);
        }
        assert_eq!(surface.direction_pushes, 1);
    }

    #[test]
    fn manual_start_rejects_zero_direction() {
        let mut w = wobble();
        let mut surface = Recorder::default();
        w.start_manual(Vec3::ZERO, 0.5, &mut surface);
        assert!(!w.is_wobbling());
        assert_eq!(surface.direction_pushes, 0);
    }

    #[test]
    fn manual_start_normalizes_direction() {
        let mut w = wobble();
        let mut surface = Recorder::default();
        w.start_manual(Vec3::new(0.0, 3.0, 0.0), 0.1, &mut surface);
        assert!(w.is_wobbling());
        assert!((surface.direction - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn duration_cap_ends_a_slow_decay() {
        let mut w = wobble();
        w.damping = 0.01; // decays far too slowly to hit the strength cutoff
        let mut surface = Recorder::default();
        w.start(Vec3::new(5.0, 0.0, 0.0), Vec3::Y, &mut surface);

        let dt = 0.05;
        let mut elapsed = 0.0;
        while w.is_wobbling() && elapsed < 60.0 {
            w.update(dt, &mut surface);
            elapsed += dt;
        }
        assert!(!w.is_wobbling());
        assert!(elapsed <= w.max_duration + dt * 2.0);
    }
}
