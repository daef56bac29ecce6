use engine::{FrameSource, FrameStatus};
use kernels::{FrameBuffer, Resolution, Rgba};
use rand::prelude::*;

/// Synthetic stand-in for a camera: a dim noise floor with a bright disc
/// orbiting the frame centre. The disc is the only region that crosses the
/// default light level, so the stage chain paints a moving highlight blob
/// while the floor stays black.
pub struct OrbitingDiscSource {
    resolution: Resolution,
    rng: StdRng,
    warmup_remaining: u64,
    frame_index: u64,
}

impl OrbitingDiscSource {
    /// Noise floor stays below the default light level.
    const NOISE_CEILING: f32 = 0.05;
    /// Disc and orbit sizes as fractions of the shorter frame edge.
    const DISC_RADIUS: f32 = 0.08;
    const ORBIT_RADIUS: f32 = 0.25;
    /// Radians the disc advances per captured frame.
    const ORBIT_STEP: f32 = 0.05;

    pub fn new(resolution: Resolution, seed: u64, warmup_frames: u64) -> Self {
        Self {
            resolution,
            rng: StdRng::seed_from_u64(seed),
            warmup_remaining: warmup_frames,
            frame_index: 0,
        }
    }
}

impl FrameSource for OrbitingDiscSource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn capture(&mut self, target: &mut FrameBuffer) -> FrameStatus {
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return FrameStatus::Pending;
        }

        let width = self.resolution.width as f32;
        let height = self.resolution.height as f32;
        let short_edge = width.min(height);
        let angle = self.frame_index as f32 * Self::ORBIT_STEP;
        let centre_x = width / 2.0 + short_edge * Self::ORBIT_RADIUS * angle.cos();
        let centre_y = height / 2.0 + short_edge * Self::ORBIT_RADIUS * angle.sin();
        let disc_radius = short_edge * Self::DISC_RADIUS;

        for y in 0..self.resolution.height {
            for x in 0..self.resolution.width {
                let noise = self.rng.gen_range(0.0..Self::NOISE_CEILING);
                let dx = x as f32 - centre_x;
                let dy = y as f32 - centre_y;
                let sample = if dx * dx + dy * dy <= disc_radius * disc_radius {
                    Rgba::new(1.0, 1.0, 0.9, 1.0)
                } else {
                    Rgba::new(noise, noise, noise, 1.0)
                };
                target.set(x, y, sample);
            }
        }
        self.frame_index += 1;
        FrameStatus::Captured
    }
}
