//! Deterministic pixel noise for synthetic views.
//!
//! Each `(view, point)` pair seeds its own SplitMix64 stream, so a sample does
//! not depend on how many others were drawn before it.

use crate::{Real, Vec2};

/// Uniform pixel noise in `[-max_abs_px, +max_abs_px]` per axis.
///
/// The default adds no noise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformPixelNoise {
    pub seed: u64,
    pub max_abs_px: Real,
}

impl UniformPixelNoise {
    pub fn sample(&self, view_idx: usize, point_idx: usize) -> Vec2 {
        let amplitude = self.max_abs_px.abs();
        if amplitude == 0.0 {
            return Vec2::zeros();
        }
        let mut state = self.seed ^ ((view_idx as u64) << 32) ^ point_idx as u64;
        let x = (2.0 * next_unit(&mut state) - 1.0) * amplitude;
        let y = (2.0 * next_unit(&mut state) - 1.0) * amplitude;
        Vec2::new(x, y)
    }
}

/// Next value in `[0, 1)` from a SplitMix64 stream.
fn next_unit(state: &mut u64) -> Real {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as Real / (1_u64 << 53) as Real
}
