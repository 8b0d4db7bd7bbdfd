//! Default pan/zoom for images that do not specify one

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::effects::KenBurnsConfig;

const ZOOM_FLOOR: f64 = 1.0;
const ZOOM_CEILING: f64 = 1.2;
const MIN_ZOOM_CHANGE: f64 = 0.05;
const FORCED_ZOOM_CHANGE: f64 = 0.08;
const MIN_PAN: f64 = 0.1;
const FORCED_PAN: f64 = 0.2;

/// Supplies Ken Burns settings for scenes that have none
pub trait MotionSource: Send + Sync {
    fn ken_burns_for(&self, scene_index: usize, total_scenes: usize) -> KenBurnsConfig;
}

/// Subtle random zoom and pan
///
/// With a seed, scene `i` always draws from `seed + i`; without one every call
/// uses fresh entropy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMotion {
    seed: Option<u64>,
}

impl RandomMotion {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }
}

impl MotionSource for RandomMotion {
    fn ken_burns_for(&self, scene_index: usize, _total_scenes: usize) -> KenBurnsConfig {
        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(scene_index as u64)),
            None => SmallRng::from_entropy(),
        };
        synthesize(&mut rng, scene_index)
    }
}

/// Draw one scene's motion from `rng`
///
/// Zoom ends are drawn in `[1.0, 1.1]`; a change under 0.05 is widened to
/// ±0.08 and both ends are clamped to `[1.0, 1.2]`. Pan ends are drawn in
/// `[0.3, 0.7]`; when neither axis moves by 0.1 the end point is pushed 0.2
/// right, left, down or up depending on `scene_index % 4`.
pub fn synthesize<R: Rng + ?Sized>(rng: &mut R, scene_index: usize) -> KenBurnsConfig {
    let mut start_zoom = ZOOM_FLOOR + rng.gen::<f64>() * 0.1;
    let mut end_zoom = ZOOM_FLOOR + rng.gen::<f64>() * 0.1;

    if (end_zoom - start_zoom).abs() < MIN_ZOOM_CHANGE {
        end_zoom = if rng.gen::<f64>() > 0.5 {
            start_zoom + FORCED_ZOOM_CHANGE
        } else {
            start_zoom - FORCED_ZOOM_CHANGE
        };
    }

    start_zoom = start_zoom.clamp(ZOOM_FLOOR, ZOOM_CEILING);
    end_zoom = end_zoom.clamp(ZOOM_FLOOR, ZOOM_CEILING);

    let start_x = 0.3 + rng.gen::<f64>() * 0.4;
    let start_y = 0.3 + rng.gen::<f64>() * 0.4;
    let mut end_x = 0.3 + rng.gen::<f64>() * 0.4;
    let mut end_y = 0.3 + rng.gen::<f64>() * 0.4;

    if (end_x - start_x).abs() < MIN_PAN && (end_y - start_y).abs() < MIN_PAN {
        match scene_index % 4 {
            0 => end_x = (start_x + FORCED_PAN).min(1.0),
            1 => end_x = (start_x - FORCED_PAN).max(0.0),
            2 => end_y = (start_y + FORCED_PAN).min(1.0),
            _ => end_y = (start_y - FORCED_PAN).max(0.0),
        }
    }

    KenBurnsConfig {
        start_zoom,
        end_zoom,
        start_x,
        start_y,
        end_x,
        end_y,
    }
}
