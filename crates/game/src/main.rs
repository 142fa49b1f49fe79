//! DartRange - a physics-driven foam-dart toy: spring trigger, revolving
//! chamber, and darts that stick to what they hit and wobble.

mod chamber;
mod config;
mod dart;
mod gun;
mod range;
mod state;
mod update;
mod visual;
mod wobble;

use anyhow::Result;
use audio::{AudioSystem, RandomClipPlayer};

use config::RangeConfig;
use engine_core::Time;
use state::RangeState;

/// How long the demo session runs, in seconds.
const RUN_SECONDS: f32 = 12.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting DartRange");

    let config = RangeConfig::load();
    if !std::path::Path::new("dartrange.ron").exists() {
        // Write the defaults out so there is a file to tweak.
        config.save();
    }

    let audio = match AudioSystem::new() {
        Ok(audio) => Some(audio),
        Err(e) => {
            log::warn!("Audio unavailable, running silent: {}", e);
            None
        }
    };

    let mut hit_sounds = RandomClipPlayer::new(config.audio.min_volume, config.audio.max_volume);
    load_hit_clips(&mut hit_sounds);

    let mut state = RangeState::new(&config, audio, hit_sounds);
    state.gun.on_fire.connect(|| log::info!("Fired"));
    state.on_dart_hit.connect(|| log::info!("Dart hit"));
    state.on_dart_stuck.connect(|| log::info!("Dart stuck"));
    state
        .chamber
        .on_rotation_complete
        .connect(|| log::debug!("Chamber rotation complete"));

    let mut time = Time::new();
    while time.elapsed_seconds() < RUN_SECONDS {
        time.update();
        while time.should_fixed_update() {
            update::fixed_step(&mut state, time.fixed_timestep_seconds());
        }
        let trigger_value = scripted_trigger(time.elapsed_seconds());
        update::frame(&mut state, time.delta_seconds(), trigger_value);
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    log::info!(
        "Range session over: {} frames, chamber resting at {:.1} deg",
        time.frame_count(),
        state.chamber.current_rotation()
    );
    Ok(())
}

/// Trigger pull profile for the demo: squeeze, hold, release, rest - one
/// cycle every three seconds.
fn scripted_trigger(elapsed: f32) -> f32 {
    let phase = elapsed % 3.0;
    if phase < 0.3 {
        phase / 0.3
    } else if phase < 1.0 {
        1.0
    } else if phase < 1.3 {
        1.0 - (phase - 1.0) / 0.3
    } else {
        0.0
    }
}

/// Load impact clips from assets/sounds. A missing directory just means a
/// silent range.
fn load_hit_clips(player: &mut RandomClipPlayer) {
    let dir = std::path::Path::new("assets/sounds");
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            log::warn!("No sound directory at {:?}, dart hits will be silent", dir);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_clip = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("ogg") | Some("wav") | Some("mp3")
        );
        if !is_clip {
            continue;
        }
        if let Err(e) = player.load_clip(&path) {
            log::warn!("Could not load clip {:?}: {}", path, e);
        }
    }
    log::info!("Loaded {} hit clips", player.clip_count());
}

#[cfg(test)]
mod tests {
    use super::scripted_trigger;

    #[test]
    fn trigger_profile_pulls_and_releases_each_cycle() {
        assert_eq!(scripted_trigger(0.0), 0.0);
        assert_eq!(scripted_trigger(0.6), 1.0);
        assert_eq!(scripted_trigger(2.0), 0.0);
        // Same shape in the next cycle.
        assert_eq!(scripted_trigger(3.6), 1.0);
    }
}
