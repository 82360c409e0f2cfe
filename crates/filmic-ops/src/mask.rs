//! Clipped-highlight detection mask.
//!
//! Each pixel gets a weight in [0, 1] telling the reconstruction how
//! clipped it is. The weight is a base-2 sigmoid over the Euclidean
//! RGB norm, centred on the reconstruction threshold so the
//! transition into the clipped region is soft and symmetrical.

use filmic_math::sqf;
use rayon::prelude::*;

/// Sigmoid argument above which a pixel's mask opacity drops under
/// ~5.9% and reconstruction would not visibly change it.
const DETECT_ARG: f32 = 4.0;

/// Minimum number of detected pixels worth reconstructing. At or
/// below this, recovery costs more than it shows.
pub const MIN_CLIPPED_PIXELS: usize = 9;

/// Fill `mask` with per-pixel clipping weights and return how many
/// pixels are close enough to clipping to matter.
///
/// `normalize` is `feather / threshold`, `feathering` the committed
/// sigmoid steepness. Callers skip reconstruction when the count is
/// at most [`MIN_CLIPPED_PIXELS`].
pub fn build_clipping_mask(
    input: &[f32],
    mask: &mut [f32],
    width: usize,
    height: usize,
    normalize: f32,
    feathering: f32,
) -> usize {
    debug_assert_eq!(input.len(), width * height * 4);
    debug_assert_eq!(mask.len(), width * height);

    mask.par_chunks_mut(width)
        .enumerate()
        .map(|(y, mask_row)| {
            let in_row = &input[y * width * 4..(y + 1) * width * 4];
            let mut clipped = 0_usize;
            for (x, weight) in mask_row.iter_mut().enumerate() {
                let px = &in_row[x * 4..x * 4 + 3];
                let norm = (sqf(px[0]) + sqf(px[1]) + sqf(px[2])).sqrt();
                let argument = -norm * normalize + feathering;
                *weight = 1.0 / (1.0 + argument.exp2());
                clipped += usize::from(argument < DETECT_ARG);
            }
            clipped
        })
        .sum()
}

/// Write the mask into an RGBA buffer for host-side visualization.
pub fn render_mask(mask: &[f32], output: &mut [f32], width: usize, height: usize) {
    debug_assert_eq!(mask.len(), width * height);
    debug_assert_eq!(output.len(), width * height * 4);

    output
        .par_chunks_mut(4)
        .zip(mask.par_iter())
        .for_each(|(px, &weight)| {
            px.fill(weight);
        });
}
