//! Audio system using Kira, plus the random hit-clip player.

use anyhow::Result;
use engine_core::Vec3;
use kira::{
    manager::{AudioManager, AudioManagerSettings, backend::DefaultBackend},
    sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
    spatial::{
        emitter::EmitterSettings,
        listener::{ListenerHandle, ListenerSettings},
        scene::{SpatialSceneHandle, SpatialSceneSettings},
    },
    tween::Tween,
};
use rand::Rng;
use std::path::Path;

/// Main audio system managing playback and spatial audio.
pub struct AudioSystem {
    manager: AudioManager,
    spatial_scene: SpatialSceneHandle,
    listener: ListenerHandle,
    active_sounds: Vec<StaticSoundHandle>,
}

impl AudioSystem {
    /// Create a new audio system.
    pub fn new() -> Result<Self> {
        let mut manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())?;

        let mut spatial_scene = manager.add_spatial_scene(SpatialSceneSettings::default())?;

        let listener = spatial_scene.add_listener(
            mint::Vector3 { x: 0.0, y: 0.0, z: 0.0 },
            mint::Quaternion { v: mint::Vector3 { x: 0.0, y: 0.0, z: 0.0 }, s: 1.0 },
            ListenerSettings::default(),
        )?;

        Ok(Self {
            manager,
            spatial_scene,
            listener,
            active_sounds: Vec::new(),
        })
    }

    /// Play a sound non-spatially (UI, dry fire) at the given volume.
    pub fn play_data(&mut self, sound_data: StaticSoundData, volume: f64) -> Result<()> {
        let settings = StaticSoundSettings::new().volume(volume);
        let handle = self.manager.play(sound_data.with_settings(settings))?;
        self.active_sounds.push(handle);
        Ok(())
    }

    /// Play a sound at a 3D position (dart impacts).
    pub fn play_data_at(
        &mut self,
        sound_data: StaticSoundData,
        volume: f64,
        position: Vec3,
    ) -> Result<()> {
        let emitter = self.spatial_scene.add_emitter(
            mint::Vector3 { x: position.x, y: position.y, z: position.z },
            EmitterSettings::default(),
        )?;
        let settings = StaticSoundSettings::new()
            .volume(volume)
            .output_destination(&emitter);
        let handle = self.manager.play(sound_data.with_settings(settings))?;
        self.active_sounds.push(handle);
        // The emitter handle is dropped here but the sound keeps playing.
        Ok(())
    }

    /// Update listener position and orientation (call each frame).
    pub fn update_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        // Compute orientation quaternion from forward and up vectors
        let right = forward.cross(up).normalize();
        let corrected_up = right.cross(forward).normalize();

        let rotation = glam::Mat3::from_cols(right, corrected_up, -forward);
        let quat = glam::Quat::from_mat3(&rotation);

        self.listener.set_position(
            mint::Vector3 { x: position.x, y: position.y, z: position.z },
            Tween::default(),
        );
        self.listener.set_orientation(
            mint::Quaternion {
                v: mint::Vector3 { x: quat.x, y: quat.y, z: quat.z },
                s: quat.w,
            },
            Tween::default(),
        );
    }

    /// Clean up finished sounds.
    pub fn cleanup(&mut self) {
        self.active_sounds
            .retain(|handle| handle.state() != kira::sound::PlaybackState::Stopped);
    }

    /// Stop all sounds.
    pub fn stop_all(&mut self) {
        for handle in &mut self.active_sounds {
            let _ = handle.stop(Tween::default());
        }
        self.active_sounds.clear();
    }

    /// Set master volume (0.0 to 1.0).
    pub fn set_master_volume(&mut self, volume: f64) {
        let _ = self.manager.main_track().set_volume(volume, Tween::default());
    }
}

/// Indices into a clip list, drawn without replacement until exhausted and
/// then refilled. Selection lives apart from the sound data so the draw
/// policy is testable without an audio device.
#[derive(Debug, Clone)]
pub struct ClipPool {
    total: usize,
    remaining: Vec<usize>,
}

impl ClipPool {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            remaining: (0..total).collect(),
        }
    }

    /// Draw one clip index. Returns `None` only when the pool tracks no clips
    /// at all; an exhausted pool refills first.
    pub fn draw(&mut self, rng: &mut impl Rng) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        if self.remaining.is_empty() {
            self.remaining = (0..self.total).collect();
        }
        let slot = rng.gen_range(0..self.remaining.len());
        Some(self.remaining.swap_remove(slot))
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Plays one random clip per trigger, never repeating a clip until every
/// other clip has been played, at a volume sampled from [min, max].
pub struct RandomClipPlayer {
    clips: Vec<StaticSoundData>,
    pool: ClipPool,
    pub min_volume: f64,
    pub max_volume: f64,
}

impl RandomClipPlayer {
    pub fn new(min_volume: f64, max_volume: f64) -> Self {
        Self {
            clips: Vec::new(),
            pool: ClipPool::new(0),
            min_volume,
            max_volume,
        }
    }

    /// Load a clip from a file and add it to the pool.
    pub fn load_clip(&mut self, path: &Path) -> Result<()> {
        self.clips.push(StaticSoundData::from_file(path)?);
        self.pool = ClipPool::new(self.clips.len());
        Ok(())
    }

    /// Load a clip from embedded bytes and add it to the pool.
    pub fn load_clip_from_bytes(&mut self, data: &'static [u8]) -> Result<()> {
        let cursor = std::io::Cursor::new(data);
        self.clips.push(StaticSoundData::from_cursor(cursor)?);
        self.pool = ClipPool::new(self.clips.len());
        Ok(())
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Play one random clip non-spatially. No clips loaded is a logged no-op.
    pub fn play(&mut self, audio: &mut AudioSystem) {
        if let Some((data, volume)) = self.pick() {
            if let Err(e) = audio.play_data(data, volume) {
                log::warn!("RandomClipPlayer: playback failed: {}", e);
            }
        }
    }

    /// Play one random clip at a 3D position. No clips loaded is a logged no-op.
    pub fn play_at(&mut self, audio: &mut AudioSystem, position: Vec3) {
        if let Some((data, volume)) = self.pick() {
            if let Err(e) = audio.play_data_at(data, volume, position) {
                log::warn!("RandomClipPlayer: playback failed: {}", e);
            }
        }
    }

    fn pick(&mut self) -> Option<(StaticSoundData, f64)> {
        let mut rng = rand::thread_rng();
        let index = match self.pool.draw(&mut rng) {
            Some(index) => index,
            None => {
                log::warn!("RandomClipPlayer: no clips loaded, skipping playback");
                return None;
            }
        };
        let lo = self.min_volume.min(self.max_volume);
        let hi = self.min_volume.max(self.max_volume);
        let volume = rng.gen_range(lo..=hi);
        Some((self.clips[index].clone(), volume))
    }
}

// Re-export for convenience
pub use kira;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn empty_pool_never_draws() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = ClipPool::new(0);
        assert_eq!(pool.draw(&mut rng), None);
    }

    #[test]
    fn draws_every_clip_once_before_refilling() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut pool = ClipPool::new(5);

        let first_round: HashSet<usize> = (0..5).map(|_| pool.draw(&mut rng).unwrap()).collect();
        assert_eq!(first_round.len(), 5);

        // Sixth draw refills and succeeds.
        assert!(pool.draw(&mut rng).is_some());
    }

    #[test]
    fn refilled_pool_covers_all_clips_again() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = ClipPool::new(3);
        for _ in 0..3 {
            pool.draw(&mut rng);
        }
        let second_round: HashSet<usize> = (0..3).map(|_| pool.draw(&mut rng).unwrap()).collect();
        assert_eq!(second_round.len(), 3);
    }
}
