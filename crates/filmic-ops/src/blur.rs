//! Separable à-trous B-spline blur.
//!
//! One dimension of the wavelet decomposition kernel: the cubic
//! B-spline filter `[1 4 6 4 1] / 16`, with its taps spread apart by
//! `2^scale` pixels. Dilating the kernel instead of downsampling the
//! image keeps every scale at full resolution (the "with holes"
//! scheme), which is what lets the reconstruction write back into
//! the original pixel grid. See <https://jo.dreggn.org/home/2010_atrous.pdf>.
//!
//! Both passes operate on 4-channel interleaved buffers; the first
//! three channels are convolved, the fourth is carried through from
//! the pass input. Out-of-range taps clamp to the edge sample.

use rayon::prelude::*;

/// The 1-D cubic B-spline kernel.
pub(crate) const BSPLINE_FILTER: [f32; 5] = [
    1.0 / 16.0,
    4.0 / 16.0,
    6.0 / 16.0,
    4.0 / 16.0,
    1.0 / 16.0,
];

/// Number of kernel taps.
pub(crate) const FILTER_TAPS: usize = 5;

/// Convolve along x with taps `mult` pixels apart.
///
/// Rows are independent and processed in parallel.
pub fn blur_bspline_horizontal(
    input: &[f32],
    output: &mut [f32],
    width: usize,
    height: usize,
    mult: usize,
) {
    debug_assert_eq!(input.len(), width * height * 4);
    debug_assert_eq!(output.len(), input.len());

    output
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let in_row = &input[y * width * 4..(y + 1) * width * 4];
            for x in 0..width {
                let mut acc = [0.0_f32; 3];
                for (tap, &weight) in BSPLINE_FILTER.iter().enumerate() {
                    let offset = mult as isize * (tap as isize - 2);
                    let sx = (x as isize + offset).clamp(0, width as isize - 1) as usize;
                    for c in 0..3 {
                        acc[c] += weight * in_row[sx * 4 + c];
                    }
                }
                row[x * 4..x * 4 + 3].copy_from_slice(&acc);
                row[x * 4 + 3] = in_row[x * 4 + 3];
            }
        });
}

/// Convolve along y with taps `mult` rows apart.
///
/// Output rows are independent; each reads the five clamped source
/// rows it needs.
pub fn blur_bspline_vertical(
    input: &[f32],
    output: &mut [f32],
    width: usize,
    height: usize,
    mult: usize,
) {
    debug_assert_eq!(input.len(), width * height * 4);
    debug_assert_eq!(output.len(), input.len());

    output
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = [0.0_f32; 3];
                for (tap, &weight) in BSPLINE_FILTER.iter().enumerate() {
                    let offset = mult as isize * (tap as isize - 2);
                    let sy = (y as isize + offset).clamp(0, height as isize - 1) as usize;
                    for c in 0..3 {
                        acc[c] += weight * input[(sy * width + x) * 4 + c];
                    }
                }
                row[x * 4..x * 4 + 3].copy_from_slice(&acc);
                row[x * 4 + 3] = input[(y * width + x) * 4 + 3];
            }
        });
}

/// Full 2-D à-trous blur: horizontal then vertical, through `scratch`.
pub fn blur_bspline_2d(
    input: &[f32],
    output: &mut [f32],
    scratch: &mut [f32],
    width: usize,
    height: usize,
    mult: usize,
) {
    blur_bspline_horizontal(input, scratch, width, height, mult);
    blur_bspline_vertical(scratch, output, width, height, mult);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_image(width: usize, height: usize, value: f32) -> Vec<f32> {
        vec![value; width * height * 4]
    }

    #[test]
    fn test_kernel_is_normalized() {
        let sum: f32 = BSPLINE_FILTER.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_image_unchanged() {
        let (w, h) = (16, 12);
        let input = constant_image(w, h, 0.7);
        let mut scratch = vec![0.0; input.len()];
        let mut output = vec![0.0; input.len()];
        for mult in [1, 2, 4] {
            blur_bspline_2d(&input, &mut output, &mut scratch, w, h, mult);
            for (i, &v) in output.iter().enumerate() {
                assert!((v - 0.7).abs() < 1e-5, "index {} drifted to {}", i, v);
            }
        }
    }

    #[test]
    fn test_impulse_spread_matches_kernel() {
        let (w, h) = (17, 1);
        let mut input = constant_image(w, h, 0.0);
        input[8 * 4] = 1.0; // impulse in the red channel, centre pixel
        let mut output = vec![0.0; input.len()];
        blur_bspline_horizontal(&input, &mut output, w, h, 1);
        for (tap, &weight) in BSPLINE_FILTER.iter().enumerate() {
            let x = 8 + tap - 2;
            assert!(
                (output[x * 4] - weight).abs() < 1e-6,
                "tap {} at x={}: {} vs {}",
                tap,
                x,
                output[x * 4],
                weight
            );
        }
        // nothing leaks outside the kernel footprint
        assert_eq!(output[5 * 4], 0.0);
        assert_eq!(output[11 * 4], 0.0);
    }

    #[test]
    fn test_dilation_spreads_taps() {
        let (w, h) = (33, 1);
        let mut input = constant_image(w, h, 0.0);
        input[16 * 4] = 1.0;
        let mut output = vec![0.0; input.len()];
        blur_bspline_horizontal(&input, &mut output, w, h, 4);
        // taps land 4 pixels apart
        assert!((output[8 * 4] - BSPLINE_FILTER[0]).abs() < 1e-6);
        assert!((output[12 * 4] - BSPLINE_FILTER[1]).abs() < 1e-6);
        assert!((output[16 * 4] - BSPLINE_FILTER[2]).abs() < 1e-6);
        // in-between pixels see nothing
        assert_eq!(output[14 * 4], 0.0);
    }

    #[test]
    fn test_boundary_taps_clamp() {
        let (w, h) = (8, 1);
        let mut input = constant_image(w, h, 0.0);
        input[0] = 1.0; // red impulse at the left edge
        let mut output = vec![0.0; input.len()];
        blur_bspline_horizontal(&input, &mut output, w, h, 1);
        // at x=0 the two left taps clamp onto the edge sample
        let expected = BSPLINE_FILTER[0] + BSPLINE_FILTER[1] + BSPLINE_FILTER[2];
        assert!((output[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_carried_through() {
        let (w, h) = (6, 6);
        let mut input = constant_image(w, h, 0.25);
        for px in input.chunks_exact_mut(4) {
            px[3] = 0.5;
        }
        let mut scratch = vec![0.0; input.len()];
        let mut output = vec![0.0; input.len()];
        blur_bspline_2d(&input, &mut output, &mut scratch, w, h, 1);
        for px in output.chunks_exact(4) {
            assert_eq!(px[3], 0.5);
        }
    }
}
