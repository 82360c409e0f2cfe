//! Per-pixel tone mapping.
//!
//! Four variants, selected by `(preserve_color, version)`:
//!
//! - **split**: every channel is log-encoded and pushed through the
//!   curve independently. Cheap, shifts hues near the extremities.
//! - **chroma**: one scalar norm goes through the curve and the RGB
//!   ratios are re-applied afterwards, preserving chromaticity.
//!
//! Each exists in the 2019 (v1) and 2020 (v2) color science; they
//! differ in where desaturation happens and, for chroma v2, in the
//! output gamut mapping. All variants share the tail: clamp to
//! [0, 1], raise to the display power, copy alpha through.

use filmic_core::{profile_luminance, ColorScience, NormMethod, WorkProfile};
use filmic_math::{
    clamp_unit, desaturate_v1, desaturate_v2, linear_saturation, log_tonemap_v1, log_tonemap_v2,
    pixel_norm, NORM_FLOOR,
};
use rayon::prelude::*;

use crate::prerender::FilmicPreRender;

/// Row-parallel driver shared by the four variants.
#[inline]
fn for_each_pixel(
    input: &[f32],
    output: &mut [f32],
    width: usize,
    kernel: impl Fn(&[f32], &mut [f32]) + Sync,
) {
    output
        .par_chunks_mut(width * 4)
        .zip(input.par_chunks(width * 4))
        .for_each(|(out_row, in_row)| {
            for (out_px, in_px) in out_row
                .chunks_exact_mut(4)
                .zip(in_row.chunks_exact(4))
            {
                kernel(in_px, out_px);
                out_px[3] = in_px[3];
            }
        });
}

/// Per-channel pipeline, 2019 color science.
pub fn filmic_split_v1(
    input: &[f32],
    output: &mut [f32],
    profile: Option<&WorkProfile>,
    data: &FilmicPreRender,
    width: usize,
    height: usize,
) {
    debug_assert_eq!(output.len(), width * height * 4);
    let spline = data.spline;

    for_each_pixel(input, output, width, |px, out| {
        let mut temp = [0.0_f32; 3];
        for c in 0..3 {
            temp[c] = log_tonemap_v1(
                px[c].max(NORM_FLOOR),
                data.grey_source,
                data.black_source,
                data.dynamic_range,
            );
        }

        // desaturate towards the log luminance near the extremities
        let lum = profile_luminance(temp, profile);
        let desaturation = desaturate_v1(lum, data.sigma_toe, data.sigma_shoulder, data.saturation);

        for c in 0..3 {
            let value = linear_saturation(temp[c], lum, desaturation);
            out[c] = clamp_unit(spline.eval(value)).powf(data.output_power);
        }
    });
}

/// Per-channel pipeline, 2020 color science.
pub fn filmic_split_v2(
    input: &[f32],
    output: &mut [f32],
    profile: Option<&WorkProfile>,
    data: &FilmicPreRender,
    width: usize,
    height: usize,
) {
    debug_assert_eq!(output.len(), width * height * 4);
    let spline = data.spline;

    for_each_pixel(input, output, width, |px, out| {
        let mut temp = [0.0_f32; 3];
        for c in 0..3 {
            temp[c] = log_tonemap_v2(
                px[c].max(NORM_FLOOR),
                data.grey_source,
                data.black_source,
                data.dynamic_range,
            );
        }

        let lum = profile_luminance(temp, profile);
        let desaturation = desaturate_v2(lum, data.sigma_toe, data.sigma_shoulder, data.saturation);

        for c in 0..3 {
            let value = linear_saturation(temp[c], lum, desaturation);
            out[c] = clamp_unit(spline.eval(value)).powf(data.output_power);
        }
    });
}

/// Chroma-preserving pipeline, 2019 color science.
pub fn filmic_chroma_v1(
    input: &[f32],
    output: &mut [f32],
    profile: Option<&WorkProfile>,
    data: &FilmicPreRender,
    method: NormMethod,
    width: usize,
    height: usize,
) {
    debug_assert_eq!(output.len(), width * height * 4);
    let spline = data.spline;

    for_each_pixel(input, output, width, |px, out| {
        let rgb = [px[0], px[1], px[2]];
        let mut norm = pixel_norm(rgb, method, profile).max(NORM_FLOOR);

        let mut ratios = [rgb[0] / norm, rgb[1] / norm, rgb[2] / norm];

        // a negative channel makes its ratio negative; shift all
        // three so the darkest sits at zero
        let min_ratios = ratios[0].min(ratios[1]).min(ratios[2]);
        if min_ratios < 0.0 {
            for r in &mut ratios {
                *r -= min_ratios;
            }
        }

        norm = log_tonemap_v1(norm, data.grey_source, data.black_source, data.dynamic_range);
        let desaturation =
            desaturate_v1(norm, data.sigma_toe, data.sigma_shoulder, data.saturation);

        for r in &mut ratios {
            *r *= norm;
        }
        let lum = profile_luminance(ratios, profile);
        for r in &mut ratios {
            *r = linear_saturation(*r, lum, desaturation) / norm;
        }

        norm = clamp_unit(spline.eval(norm)).powf(data.output_power);

        for c in 0..3 {
            out[c] = ratios[c] * norm;
        }
    });
}

/// Chroma-preserving pipeline, 2020 color science.
///
/// Desaturation is folded into the ratio restore, and overflowing
/// pixels are pulled back into gamut by penalizing the ratios.
pub fn filmic_chroma_v2(
    input: &[f32],
    output: &mut [f32],
    profile: Option<&WorkProfile>,
    data: &FilmicPreRender,
    method: NormMethod,
    width: usize,
    height: usize,
) {
    debug_assert_eq!(output.len(), width * height * 4);
    let spline = data.spline;

    for_each_pixel(input, output, width, |px, out| {
        let rgb = [px[0], px[1], px[2]];
        let mut norm = pixel_norm(rgb, method, profile).max(NORM_FLOOR);

        let mut ratios = [rgb[0] / norm, rgb[1] / norm, rgb[2] / norm];

        let min_ratios = ratios[0].min(ratios[1]).min(ratios[2]);
        if min_ratios < 0.0 {
            for r in &mut ratios {
                *r -= min_ratios;
            }
        }

        norm = log_tonemap_v2(norm, data.grey_source, data.black_source, data.dynamic_range);
        let desaturation =
            desaturate_v2(norm, data.sigma_toe, data.sigma_shoulder, data.saturation);

        norm = clamp_unit(spline.eval(norm)).powf(data.output_power);

        // restore the ratios, desaturating towards white
        for c in 0..3 {
            ratios[c] = (ratios[c] + (1.0 - ratios[c]) * (1.0 - desaturation)).max(0.0);
            out[c] = ratios[c] * norm;
        }

        // gamut mapping: spend the overflow of the brightest channel
        // on desaturating all three
        let max_pix = out[0].max(out[1]).max(out[2]);
        if max_pix > 1.0 {
            for c in 0..3 {
                ratios[c] = (ratios[c] + (1.0 - max_pix)).max(0.0);
                out[c] = clamp_unit(ratios[c] * norm);
            }
        }
    });
}

/// Dispatch on `(preserve_color, version)`.
pub fn apply_tonemap(
    input: &[f32],
    output: &mut [f32],
    profile: Option<&WorkProfile>,
    data: &FilmicPreRender,
    width: usize,
    height: usize,
) {
    match (data.preserve_color, data.version) {
        (NormMethod::None, ColorScience::V1) => {
            filmic_split_v1(input, output, profile, data, width, height)
        }
        (NormMethod::None, ColorScience::V2) => {
            filmic_split_v2(input, output, profile, data, width, height)
        }
        (method, ColorScience::V1) => {
            filmic_chroma_v1(input, output, profile, data, method, width, height)
        }
        (method, ColorScience::V2) => {
            filmic_chroma_v2(input, output, profile, data, method, width, height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prerender::commit;
    use filmic_core::FilmicParams;

    fn run_one(
        pixel: [f32; 3],
        params: &FilmicParams,
        profile: Option<&WorkProfile>,
    ) -> [f32; 3] {
        let data = commit(params).unwrap();
        let input = [pixel[0], pixel[1], pixel[2], 1.0];
        let mut output = [0.0_f32; 4];
        apply_tonemap(&input, &mut output, profile, &data, 1, 1);
        [output[0], output[1], output[2]]
    }

    #[test]
    fn test_split_v1_grey_maps_to_display_grey() {
        let p = FilmicParams {
            preserve_color: NormMethod::None,
            version: ColorScience::V1,
            ..FilmicParams::default()
        };
        let out = run_one([0.1845, 0.1845, 0.1845], &p, None);
        // the curve places source grey on target grey (18.45%)
        for c in 0..3 {
            assert!(
                (out[c] - 0.1845).abs() < 1e-4,
                "channel {}: {} vs display grey",
                c,
                out[c]
            );
        }
    }

    #[test]
    fn test_chroma_v2_grey_maps_to_display_grey() {
        let out = run_one([0.1845; 3], &FilmicParams::default(), None);
        for c in 0..3 {
            assert!((out[c] - 0.1845).abs() < 1e-3, "channel {}: {}", c, out[c]);
        }
    }

    #[test]
    fn test_output_is_bounded() {
        for &pixel in &[
            [0.0_f32, 0.0, 0.0],
            [16.0, 16.0, 16.0],
            [4.0, 0.01, 0.01],
            [-0.1, 0.5, 0.5],
            [1e6, 1e6, 1e6],
        ] {
            for version in [ColorScience::V1, ColorScience::V2] {
                for method in [
                    NormMethod::None,
                    NormMethod::MaxRgb,
                    NormMethod::Luminance,
                    NormMethod::PowerNorm,
                ] {
                    let p = FilmicParams {
                        preserve_color: method,
                        version,
                        ..FilmicParams::default()
                    };
                    let out = run_one(pixel, &p, None);
                    for c in 0..3 {
                        assert!(
                            out[c].is_finite(),
                            "{:?}/{:?} produced {} for {:?}",
                            method,
                            version,
                            out[c],
                            pixel
                        );
                    }
                    // the chroma v2 gamut mapper guarantees [0, 1]
                    if version == ColorScience::V2 && method != NormMethod::None {
                        for c in 0..3 {
                            assert!(
                                (0.0..=1.0).contains(&out[c]),
                                "{:?} out of gamut: {:?}",
                                method,
                                out
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_black_maps_to_black_target() {
        let p = FilmicParams {
            preserve_color: NormMethod::None,
            version: ColorScience::V2,
            ..FilmicParams::default()
        };
        let out = run_one([0.0; 3], &p, None);
        // default black target is 0%
        for c in 0..3 {
            assert!(out[c].abs() < 1e-4, "black leaked to {}", out[c]);
        }
    }

    #[test]
    fn test_chroma_v1_sanitizes_negative_channel() {
        let p = FilmicParams {
            preserve_color: NormMethod::MaxRgb,
            version: ColorScience::V1,
            ..FilmicParams::default()
        };
        let out = run_one([-0.1, 0.5, 0.5], &p, None);
        assert!(out.iter().all(|v| v.is_finite()), "NaN leaked: {:?}", out);
        assert!(
            out[0] <= out[1] && out[0] <= out[2],
            "channel order lost: {:?}",
            out
        );
    }

    #[test]
    fn test_split_is_monotonic_in_exposure() {
        let p = FilmicParams {
            preserve_color: NormMethod::None,
            saturation: 0.0,
            ..FilmicParams::default()
        };
        let mut prev = -1.0_f32;
        for stop in -8..=3 {
            let v = 0.1845 * (stop as f32).exp2();
            let out = run_one([v; 3], &p, None);
            assert!(
                out[0] >= prev,
                "tone curve reversed at {} EV: {} < {}",
                stop,
                out[0],
                prev
            );
            prev = out[0];
        }
    }

    #[test]
    fn test_chroma_preserves_hue_ratios() {
        // an in-gamut, mid-range pixel keeps its channel ordering
        let out = run_one([0.10, 0.18, 0.30], &FilmicParams::default(), None);
        assert!(
            out[0] < out[1] && out[1] < out[2],
            "ordering lost: {:?}",
            out
        );
    }
}
