//! Revolving chamber: accelerates toward a requested angle, snaps exactly on
//! arrival, and reports completion so the gun can re-arm.

use engine_core::Signal;

use crate::config::ChamberTuning;

/// Single-axis rotation controller for the gun chamber. The accumulated
/// `current_rotation` angle (degrees, local X axis) is the authoritative
/// chamber orientation.
pub struct Chamber {
    /// Degrees per second.
    pub max_speed: f32,
    /// Degrees per second squared.
    pub acceleration: f32,
    /// Remaining angle below which the chamber snaps to target.
    pub stop_threshold: f32,
    /// Snap speed to zero at the threshold instead of braking smoothly.
    pub instant_stop: bool,

    current_speed: f32,
    current_rotation: f32,
    target_rotation: f32,
    rotating: bool,

    /// Notified exactly once per rotation, when the chamber reaches target.
    pub on_rotation_complete: Signal,
}

impl Chamber {
    pub fn from_tuning(tuning: &ChamberTuning) -> Self {
        Self {
            max_speed: tuning.max_speed,
            acceleration: tuning.acceleration,
            stop_threshold: tuning.stop_threshold,
            instant_stop: tuning.instant_stop,
            current_speed: 0.0,
            current_rotation: 0.0,
            target_rotation: 0.0,
            rotating: false,
            on_rotation_complete: Signal::new(),
        }
    }

    /// Current chamber angle in degrees.
    pub fn current_rotation(&self) -> f32 {
        self.current_rotation
    }

    /// Request a relative rotation. Requests while already rotating are
    /// dropped, not queued.
    pub fn start_rotation(&mut self, delta_degrees: f32) {
        if !self.rotating {
            self.target_rotation += delta_degrees;
            self.rotating = true;
            self.current_speed = 0.0;
        }
    }

    /// Advance the rotation. Returns true on the frame the chamber reaches
    /// its target; completion is reported exactly once per rotation, whether
    /// the threshold or the overshoot clamp ends it.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.rotating {
            return false;
        }

        let remaining = (self.target_rotation - self.current_rotation).abs();

        if remaining <= self.stop_threshold {
            if !self.instant_stop {
                // One frame of double-rate braking before the snap.
                self.current_speed = (self.current_speed - self.acceleration * dt * 2.0).max(0.0);
            }
            self.complete();
            return true;
        }

        self.current_speed = (self.current_speed + self.acceleration * dt).min(self.max_speed);

        let mut delta = self.current_speed * dt;
        // Never step past the target; a clamped step ends the rotation too.
        let finished = delta >= remaining;
        if finished {
            delta = remaining;
        }

        self.current_rotation += delta * (self.target_rotation - self.current_rotation).signum();

        if finished {
            self.complete();
        }
        finished
    }

    fn complete(&mut self) {
        self.rotating = false;
        self.current_speed = 0.0;
        // Snap to the exact target, eliminating residual error.
        self.current_rotation = self.target_rotation;
        self.on_rotation_complete.emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn chamber() -> Chamber {
        Chamber::from_tuning(&crate::config::ChamberTuning::default())
    }

    fn completion_counter(chamber: &mut Chamber) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        chamber.on_rotation_complete.connect(move || inner.set(inner.get() + 1));
        count
    }

    #[test]
    fn reaches_exact_target_with_one_completion() {
        let mut c = chamber();
        let completions = completion_counter(&mut c);
        c.start_rotation(90.0);

        let mut frames = 0;
        while c.rotating {
            c.update(DT);
            frames += 1;
            assert!(frames < 600, "chamber never settled");
        }

        assert_eq!(c.current_rotation(), 90.0);
        assert_eq!(completions.get(), 1);
        // Idle updates report nothing further.
        assert!(!c.update(DT));
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn speed_is_capped_at_max() {
        let mut c = chamber();
        c.start_rotation(360.0);
        for _ in 0..120 {
            c.update(DT);
            assert!(c.current_speed <= c.max_speed);
        }
    }

    #[test]
    fn approach_is_monotonic_and_never_crosses_target() {
        let mut c = chamber();
        c.start_rotation(90.0);

        let mut prev_remaining = 90.0_f32;
        while c.rotating {
            c.update(DT);
            let remaining = (c.target_rotation - c.current_rotation).abs();
            assert!(remaining <= prev_remaining);
            assert!(c.current_rotation <= 90.0);
            prev_remaining = remaining;
        }
    }

    #[test]
    fn requests_while_rotating_are_dropped() {
        let mut c = chamber();
        c.start_rotation(60.0);
        c.update(DT);
        c.start_rotation(60.0); // dropped

        while c.rotating {
            c.update(DT);
        }
        assert_eq!(c.current_rotation(), 60.0);
    }

    #[test]
    fn idle_chamber_accumulates_new_requests() {
        let mut c = chamber();
        c.start_rotation(60.0);
        while c.rotating {
            c.update(DT);
        }
        c.start_rotation(60.0);
        while c.rotating {
            c.update(DT);
        }
        assert_eq!(c.current_rotation(), 120.0);
    }

    #[test]
    fn threshold_branch_completes_once() {
        let mut c = chamber();
        let completions = completion_counter(&mut c);
        // Request smaller than the stop threshold: first update snaps.
        c.start_rotation(0.3);
        assert!(c.update(DT));
        assert_eq!(c.current_rotation(), 0.3);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn overshoot_clamp_completes_once() {
        let mut c = chamber();
        c.acceleration = 6000.0;
        let completions = completion_counter(&mut c);
        // Remaining (1°) is above the threshold but smaller than one step at
        // full speed, so the clamp branch ends the rotation.
        c.start_rotation(1.0);
        assert!(c.update(0.1));
        assert_eq!(c.current_rotation(), 1.0);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn negative_rotation_reaches_negative_target() {
        let mut c = chamber();
        let completions = completion_counter(&mut c);
        c.start_rotation(-90.0);
        while c.rotating {
            c.update(DT);
        }
        assert_eq!(c.current_rotation(), -90.0);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn smooth_stop_still_snaps_to_target() {
        let mut c = chamber();
        c.instant_stop = false;
        let completions = completion_counter(&mut c);
        c.start_rotation(90.0);
        while c.rotating {
            c.update(DT);
        }
        assert_eq!(c.current_rotation(), 90.0);
        assert_eq!(completions.get(), 1);
    }
}
