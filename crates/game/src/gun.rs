//! Gun fire gating and the spring trigger.

use engine_core::Signal;
use glam::Vec3;

use crate::config::GunTuning;

/// Axis value above which the trigger counts as pulled.
const PULL_THRESHOLD: f32 = 0.9;

/// Axis value below which a pulled trigger counts as released.
const RELEASE_THRESHOLD: f32 = 0.1;

/// Fire-readiness state machine. A shot is allowed once per trigger pull and
/// only after the chamber has finished advancing.
pub struct Gun {
    /// Impulse applied to the dart along the muzzle forward axis.
    pub launch_force: f32,
    /// How far the chamber advances after each shot, in degrees.
    pub chamber_step_degrees: f32,

    can_fire: bool,
    trigger_released: bool,
    chamber_idle: bool,

    /// Notified once per successful fire.
    pub on_fire: Signal,
}

impl Gun {
    pub fn from_tuning(tuning: &GunTuning) -> Self {
        Self {
            launch_force: tuning.launch_force,
            chamber_step_degrees: tuning.chamber_step_degrees,
            // The gun comes up loaded and ready.
            can_fire: true,
            trigger_released: false,
            chamber_idle: false,
            on_fire: Signal::new(),
        }
    }

    /// Consume the fire opportunity if one is available. On success both gate
    /// flags reset; the trigger release and the chamber completion must both
    /// arrive before the next shot.
    pub fn try_fire(&mut self) -> bool {
        if !self.can_fire {
            return false;
        }
        self.on_fire.emit();
        self.can_fire = false;
        self.trigger_released = false;
        self.chamber_idle = false;
        true
    }

    /// The trigger finished its return travel.
    pub fn release_trigger(&mut self) {
        self.trigger_released = true;
        self.check_can_fire();
    }

    /// The chamber reached its target rotation.
    pub fn chamber_stopped(&mut self) {
        self.chamber_idle = true;
        self.check_can_fire();
    }

    fn check_can_fire(&mut self) {
        self.can_fire = self.trigger_released && self.chamber_idle;
    }
}

/// Edge reported by the trigger when the axis value crosses a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    Pulled,
    Released,
}

/// Spring trigger: follows a [0,1] axis value between its rest position and
/// the full-pull offset, and reports pull/release edges.
#[derive(Debug, Clone, Copy)]
pub struct Trigger {
    start_position: Vec3,
    pull_offset: Vec3,
    position: Vec3,
    pulled: bool,
}

impl Trigger {
    pub fn new(start_position: Vec3, pull_offset: Vec3) -> Self {
        Self {
            start_position,
            pull_offset,
            position: start_position,
            pulled: false,
        }
    }

    /// Consume this frame's axis value. Returns the edge crossed, if any.
    pub fn update(&mut self, value: f32) -> Option<TriggerEdge> {
        let value = value.clamp(0.0, 1.0);
        self.position = self.start_position.lerp(self.pull_offset, value);

        if !self.pulled && value >= PULL_THRESHOLD {
            self.pulled = true;
            return Some(TriggerEdge::Pulled);
        }
        if self.pulled && value <= RELEASE_THRESHOLD {
            self.pulled = false;
            return Some(TriggerEdge::Released);
        }
        None
    }

    /// Current trigger position in gun-local space.
    pub fn position(&self) -> Vec3 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn gun() -> Gun {
        Gun::from_tuning(&crate::config::GunTuning::default())
    }

    #[test]
    fn first_shot_is_free_then_gated() {
        let mut g = gun();
        assert!(g.try_fire());
        assert!(!g.try_fire());
    }

    #[test]
    fn rearms_only_after_release_and_chamber() {
        let mut g = gun();
        g.try_fire();

        g.release_trigger();
        assert!(!g.try_fire());

        g.chamber_stopped();
        assert!(g.try_fire());
    }

    #[test]
    fn notification_order_does_not_matter() {
        let mut g = gun();
        g.try_fire();

        g.chamber_stopped();
        assert!(!g.try_fire());

        g.release_trigger();
        assert!(g.try_fire());
    }

    #[test]
    fn firing_clears_both_gates() {
        let mut g = gun();
        g.try_fire();
        g.release_trigger();
        g.chamber_stopped();
        assert!(g.try_fire());

        // Chamber completion alone must not re-arm the next shot.
        g.chamber_stopped();
        assert!(!g.try_fire());
    }

    #[test]
    fn on_fire_emits_per_successful_shot_only() {
        let mut g = gun();
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        g.on_fire.connect(move || inner.set(inner.get() + 1));

        g.try_fire();
        g.try_fire(); // gated, no emit
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn trigger_reports_each_edge_once() {
        let mut t = Trigger::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.03));
        assert_eq!(t.update(0.5), None);
        assert_eq!(t.update(0.95), Some(TriggerEdge::Pulled));
        assert_eq!(t.update(1.0), None);
        assert_eq!(t.update(0.4), None);
        assert_eq!(t.update(0.05), Some(TriggerEdge::Released));
        assert_eq!(t.update(0.0), None);
    }

    #[test]
    fn trigger_position_follows_the_axis() {
        let mut t = Trigger::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.04));
        t.update(0.5);
        assert!((t.position() - Vec3::new(0.0, 0.0, 0.02)).length() < 1e-6);
        t.update(1.0);
        assert!((t.position() - Vec3::new(0.0, 0.0, 0.04)).length() < 1e-6);
    }
}
