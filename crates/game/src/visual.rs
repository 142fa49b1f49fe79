//! Visual parameter interface the wobble animator writes to.

use glam::Vec3;

/// Render-facing parameter pair for the dart bend effect.
///
/// The animator pushes a direction once when a wobble starts and a strength
/// every active frame, plus a final zero when it settles.
pub trait WobbleSurface {
    fn set_wobble_direction(&mut self, direction: Vec3);
    fn set_bend_strength(&mut self, strength: f32);
}

/// CPU-side staging of the dart's material parameters. A renderer would read
/// these when drawing the dart mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct DartMaterialParams {
    pub direction: Vec3,
    pub bend_strength: f32,
}

impl WobbleSurface for DartMaterialParams {
    fn set_wobble_direction(&mut self, direction: Vec3) {
        self.direction = direction;
    }

    fn set_bend_strength(&mut self, strength: f32) {
        self.bend_strength = strength;
    }
}
