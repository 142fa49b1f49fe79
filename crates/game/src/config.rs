//! Range configuration (gun, dart, wobble, chamber, audio tuning). Loaded
//! from dartrange.ron at startup.

use serde::{Deserialize, Serialize};

/// Persistent range settings. Loaded from `dartrange.ron` in the current
/// directory (or next to the binary).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeConfig {
    #[serde(default)]
    pub gun: GunTuning,
    #[serde(default)]
    pub dart: DartTuning,
    #[serde(default)]
    pub wobble: WobbleTuning,
    #[serde(default)]
    pub chamber: ChamberTuning,
    #[serde(default)]
    pub audio: AudioTuning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GunTuning {
    /// Impulse applied to the dart along the muzzle forward axis.
    #[serde(default = "default_launch_force")]
    pub launch_force: f32,
    /// How far the chamber advances after each shot, in degrees.
    #[serde(default = "default_chamber_step")]
    pub chamber_step_degrees: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DartTuning {
    /// Maximum deviation from the surface normal, in degrees.
    #[serde(default = "default_max_angle_to_stick")]
    pub max_angle_to_stick: f32,
    /// Minimum speed required to stick.
    #[serde(default = "default_min_velocity_to_stick")]
    pub min_velocity_to_stick: f32,
    /// Seconds a stuck dart stays before despawning.
    #[serde(default = "default_destroy_after")]
    pub destroy_after: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WobbleTuning {
    /// Frequency of the wobble oscillation.
    #[serde(default = "default_wobble_frequency")]
    pub frequency: f32,
    /// Damping factor; higher values settle faster.
    #[serde(default = "default_wobble_damping")]
    pub damping: f32,
    /// Scales the initial bend strength from the tangential impact speed.
    #[serde(default = "default_bend_strength_multiplier")]
    pub bend_strength_multiplier: f32,
    /// Hard cap on the wobble duration in seconds.
    #[serde(default = "default_max_wobble_duration")]
    pub max_duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamberTuning {
    /// Degrees per second.
    #[serde(default = "default_chamber_max_speed")]
    pub max_speed: f32,
    /// Degrees per second squared.
    #[serde(default = "default_chamber_acceleration")]
    pub acceleration: f32,
    /// Remaining angle below which the chamber snaps to target.
    #[serde(default = "default_stop_threshold")]
    pub stop_threshold: f32,
    /// Snap speed to zero at the threshold instead of braking smoothly.
    #[serde(default = "default_true")]
    pub instant_stop: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTuning {
    /// Minimum playback volume (0.0 to 1.0).
    #[serde(default = "default_min_volume")]
    pub min_volume: f64,
    /// Maximum playback volume (0.0 to 1.0).
    #[serde(default = "default_max_volume")]
    pub max_volume: f64,
}

fn default_launch_force() -> f32 {
    10.0
}
fn default_chamber_step() -> f32 {
    60.0
}
fn default_max_angle_to_stick() -> f32 {
    15.0
}
fn default_min_velocity_to_stick() -> f32 {
    2.0
}
fn default_destroy_after() -> f32 {
    60.0
}
fn default_wobble_frequency() -> f32 {
    5.0
}
fn default_wobble_damping() -> f32 {
    5.0
}
fn default_bend_strength_multiplier() -> f32 {
    0.1
}
fn default_max_wobble_duration() -> f32 {
    5.0
}
fn default_chamber_max_speed() -> f32 {
    100.0
}
fn default_chamber_acceleration() -> f32 {
    300.0
}
fn default_stop_threshold() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_min_volume() -> f64 {
    0.5
}
fn default_max_volume() -> f64 {
    1.0
}

impl Default for GunTuning {
    fn default() -> Self {
        Self {
            launch_force: default_launch_force(),
            chamber_step_degrees: default_chamber_step(),
        }
    }
}

impl Default for DartTuning {
    fn default() -> Self {
        Self {
            max_angle_to_stick: default_max_angle_to_stick(),
            min_velocity_to_stick: default_min_velocity_to_stick(),
            destroy_after: default_destroy_after(),
        }
    }
}

impl Default for WobbleTuning {
    fn default() -> Self {
        Self {
            frequency: default_wobble_frequency(),
            damping: default_wobble_damping(),
            bend_strength_multiplier: default_bend_strength_multiplier(),
            max_duration: default_max_wobble_duration(),
        }
    }
}

impl Default for ChamberTuning {
    fn default() -> Self {
        Self {
            max_speed: default_chamber_max_speed(),
            acceleration: default_chamber_acceleration(),
            stop_threshold: default_stop_threshold(),
            instant_stop: true,
        }
    }
}

impl Default for AudioTuning {
    fn default() -> Self {
        Self {
            min_volume: default_min_volume(),
            max_volume: default_max_volume(),
        }
    }
}

impl RangeConfig {
    /// Load config from `dartrange.ron`. If the file is missing or invalid,
    /// returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `dartrange.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("dartrange.ron")
}
