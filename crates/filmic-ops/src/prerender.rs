//! Pre-computed pipeline data.
//!
//! [`commit`] turns user parameters into everything the per-pixel
//! loops need: the tone curve, the log-encoding anchors, the
//! desaturation widths and the reconstruction thresholds. It runs
//! once per parameter change; `process` then treats the result as
//! immutable.

use filmic_core::{ColorScience, FilmicParams, NormMethod, Result};
use tracing::debug;

use crate::curve::{compute_spline, effective_contrast, grey_display, Spline};

/// Runtime data for one pipeline piece.
///
/// All angles of the parameter record are resolved here: percentages
/// become fractions, EV offsets become linear thresholds, the
/// -100..=100 reconstruction mixes become 0..=1 blend weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmicPreRender {
    /// The tone curve.
    pub spline: Spline,
    /// Scene dynamic range in EV.
    pub dynamic_range: f32,
    /// Scene black anchor in EV (negative).
    pub black_source: f32,
    /// Scene grey as a fraction of linear white.
    pub grey_source: f32,
    /// Display transfer exponent.
    pub output_power: f32,
    /// Latitude slope after clamping.
    pub contrast: f32,
    /// Effective saturation multiplier (1.0 = neutral).
    pub saturation: f32,
    /// Gaussian width of the toe desaturation lobe.
    pub sigma_toe: f32,
    /// Gaussian width of the shoulder desaturation lobe.
    pub sigma_shoulder: f32,
    /// Linear clipping threshold for the reconstruction mask.
    pub reconstruct_threshold: f32,
    /// Sigmoid steepness of the clipping transition.
    pub reconstruct_feather: f32,
    /// Bloom vs. details blend, 0..=1.
    pub reconstruct_bloom_vs_details: f32,
    /// Grey vs. color blend, 0..=1.
    pub reconstruct_grey_vs_color: f32,
    /// Structure vs. texture blend, 0..=1.
    pub reconstruct_structure_vs_texture: f32,
    /// Norm used by the chroma-preserving variants.
    pub preserve_color: NormMethod,
    /// Color science revision.
    pub version: ColorScience,
    /// Run the second reconstruction pass on chromaticity ratios.
    pub high_quality_reconstruction: bool,
}

/// Remap a -100..=100 slider to a 0..=1 blend weight.
#[inline]
fn blend_weight(slider: f32) -> f32 {
    (slider / 100.0 + 1.0) / 2.0
}

/// Resolve user parameters into runtime data.
///
/// Pure transform, no I/O. Fails only if the curve solver reports
/// degenerate anchors.
pub fn commit(p: &FilmicParams) -> Result<FilmicPreRender> {
    let grey_source = if p.custom_grey {
        p.grey_point_source / 100.0
    } else {
        0.1845
    };

    let white_source = p.white_point_source;
    let black_source = p.black_point_source;
    let dynamic_range = white_source - black_source;
    let grey_log = black_source.abs() / dynamic_range;

    let contrast = effective_contrast(p, grey_display(p), grey_log);

    let spline = compute_spline(p)?;

    let data = FilmicPreRender {
        spline,
        dynamic_range,
        black_source,
        grey_source,
        output_power: p.output_power,
        contrast,
        saturation: 2.0 * p.saturation / 100.0 + 1.0,
        sigma_toe: (spline.latitude_min / 3.0).powi(2),
        sigma_shoulder: ((1.0 - spline.latitude_max) / 3.0).powi(2),
        reconstruct_threshold: (white_source + p.reconstruct_threshold).exp2() * grey_source,
        reconstruct_feather: (12.0 / p.reconstruct_feather).exp2(),
        reconstruct_bloom_vs_details: blend_weight(p.reconstruct_bloom_vs_details),
        reconstruct_grey_vs_color: blend_weight(p.reconstruct_grey_vs_color),
        reconstruct_structure_vs_texture: blend_weight(p.reconstruct_structure_vs_texture),
        preserve_color: p.preserve_color,
        version: p.version,
        high_quality_reconstruction: p.high_quality_reconstruction,
    };

    debug!(
        dynamic_range,
        contrast,
        threshold = data.reconstruct_threshold,
        "committed filmic parameters"
    );

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_commit_defaults() {
        let d = commit(&FilmicParams::default()).unwrap();
        assert!((d.dynamic_range - 14.0).abs() < EPSILON);
        assert!((d.grey_source - 0.1845).abs() < EPSILON);
        assert!((d.saturation - 1.0).abs() < EPSILON);
        // threshold 0 EV over white: 2^3.45 * 0.1845
        assert!((d.reconstruct_threshold - 3.45_f32.exp2() * 0.1845).abs() < 1e-3);
        // feather 3 EV: 2^4
        assert!((d.reconstruct_feather - 16.0).abs() < EPSILON);
    }

    #[test]
    fn test_blend_weights_remap() {
        let p = FilmicParams::default();
        let d = commit(&p).unwrap();
        // bloom 100 -> 1.0, grey_vs_color 0 -> 0.5, structure 50 -> 0.75
        assert!((d.reconstruct_bloom_vs_details - 1.0).abs() < EPSILON);
        assert!((d.reconstruct_grey_vs_color - 0.5).abs() < EPSILON);
        assert!((d.reconstruct_structure_vs_texture - 0.75).abs() < EPSILON);
    }

    #[test]
    fn test_sigma_follows_latitude() {
        let d = commit(&FilmicParams::default()).unwrap();
        let expected_toe = (d.spline.latitude_min / 3.0).powi(2);
        let expected_shoulder = ((1.0 - d.spline.latitude_max) / 3.0).powi(2);
        assert!((d.sigma_toe - expected_toe).abs() < EPSILON);
        assert!((d.sigma_shoulder - expected_shoulder).abs() < EPSILON);
    }

    #[test]
    fn test_contrast_clamped_above_grey_slope() {
        let p = FilmicParams {
            contrast: 0.3,
            ..FilmicParams::default()
        };
        let d = commit(&p).unwrap();
        let grey_log = p.black_point_source.abs() / p.dynamic_range();
        let grey_display = 0.1845_f32.powf(1.0 / p.output_power);
        assert!(
            d.contrast > grey_display / grey_log,
            "contrast {} must exceed the grey slope {}",
            d.contrast,
            grey_display / grey_log
        );
        // and the committed curve uses the clamped slope
        assert!((d.spline.m2[2] - d.contrast).abs() < EPSILON);
    }

    #[test]
    fn test_custom_grey_source() {
        let p = FilmicParams {
            custom_grey: true,
            grey_point_source: 9.0,
            ..FilmicParams::default()
        };
        let d = commit(&p).unwrap();
        assert!((d.grey_source - 0.09).abs() < EPSILON);
    }
}
