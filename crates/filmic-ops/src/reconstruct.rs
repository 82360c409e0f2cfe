//! Multi-scale highlight reconstruction.
//!
//! Clipped regions carry no usable signal, so the engine rebuilds
//! them from their surroundings: an à-trous wavelet decomposition
//! splits the image into per-scale detail bands, each band is
//! inpainted by blurring it at its own dilation (valid detail bleeds
//! into the holes), and the bands are summed back under the clipping
//! mask. Three user weights steer the synthesis: texture vs. smooth
//! structure (γ), achromatic vs. colorful filling (β), and detail
//! vs. bloom (δ).
//!
//! Two variants share the machinery. The RGB pass favors the
//! sharpest channel (clipping rarely hits all three at once) and the
//! darkest low frequency. The ratios pass runs on chromaticity
//! ratios, which are smooth by nature, so it favors the smoothest
//! detail and the most achromatic low frequency instead.

use filmic_core::{Error, NormMethod, PipeGeometry, Result, Roi, WorkProfile};
use filmic_math::{max_abs, min_abs, pixel_norm, NORM_FLOOR};
use rayon::prelude::*;

use crate::blur::{blur_bspline_2d, blur_bspline_horizontal, blur_bspline_vertical, FILTER_TAPS};
use crate::prerender::FilmicPreRender;

/// Hard ceiling on the wavelet scale count.
pub const MAX_SCALES: usize = 12;

/// Which detail/synthesis rules a reconstruction pass uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructVariant {
    /// First pass, on the RGB image itself.
    Rgb,
    /// Second pass, on chromaticity ratios.
    Ratios,
}

/// Per-band synthesis weights, resolved once per pass.
struct BandWeights {
    gamma: f32,
    gamma_comp: f32,
    beta: f32,
    beta_comp: f32,
    delta: f32,
}

/// Number of wavelet scales for the current rendering geometry.
///
/// The coarsest filter should cover the same fraction of the image
/// no matter the zoom, so previews match the full-size render. The
/// B-spline filter at scale `s` spans `2^s * (taps - 1) + 1` pixels;
/// solving for the level whose span covers `zoom / taps` of the
/// largest raw dimension gives the count below.
pub fn scale_count(roi: &Roi, geometry: &PipeGeometry) -> usize {
    let zoom = roi.scale / geometry.iscale;
    let size = geometry.max_raw_dim();
    let span = ((FILTER_TAPS - 1) * FILTER_TAPS) as f32;
    let scales = (2.0 * size * zoom / span - 1.0).log2().floor() as isize;
    scales.clamp(1, MAX_SCALES as isize) as usize
}

/// Allocate an image-sized scratch buffer, reporting failure instead
/// of aborting.
pub(crate) fn try_buffer(len: usize, label: &str) -> Result<Vec<f32>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed(format!("{} ({} floats)", label, len)))?;
    buffer.resize(len, 0.0);
    Ok(buffer)
}

/// Seed the output with the valid parts of the input.
///
/// Plain multiplied alpha blending: fully clipped pixels start from
/// zero and receive their content from the band synthesis.
fn init_reconstruct(input: &[f32], mask: &[f32], reconstructed: &mut [f32]) {
    reconstructed
        .par_chunks_mut(4)
        .zip(input.par_chunks(4))
        .zip(mask.par_iter())
        .for_each(|((out, px), &alpha)| {
            let keep = 1.0 - alpha;
            for c in 0..4 {
                out[c] = px[c] * keep;
            }
        });
}

/// Split one scale into high frequencies and a texture map.
///
/// `hf = detail - lf` per channel; the texture map keeps the channel
/// extremum of the high frequency so valid texture can be copied
/// onto clipped channels.
fn detail_level(
    detail: &[f32],
    lf: &[f32],
    hf: &mut [f32],
    texture: &mut [f32],
    variant: ReconstructVariant,
) {
    hf.par_chunks_mut(4)
        .zip(texture.par_iter_mut())
        .enumerate()
        .for_each(|(k, (hf_px, tex))| {
            let detail_px = &detail[k * 4..k * 4 + 4];
            let lf_px = &lf[k * 4..k * 4 + 4];
            for c in 0..3 {
                hf_px[c] = detail_px[c] - lf_px[c];
            }
            hf_px[3] = 0.0;
            *tex = match variant {
                ReconstructVariant::Rgb => max_abs(max_abs(hf_px[0], hf_px[1]), hf_px[2]),
                ReconstructVariant::Ratios => min_abs(min_abs(hf_px[0], hf_px[1]), hf_px[2]),
            };
        });
}

/// Add one band's contribution into the reconstructed image.
fn reconstruct_band(
    hf: &[f32],
    lf: &[f32],
    texture: &[f32],
    mask: &[f32],
    reconstructed: &mut [f32],
    weights: &BandWeights,
    variant: ReconstructVariant,
    scales: usize,
) {
    let scales_inv = 1.0 / scales as f32;

    reconstructed
        .par_chunks_mut(4)
        .zip(mask.par_iter())
        .enumerate()
        .for_each(|(k, (out, &alpha))| {
            let hf_px = &hf[k * 4..k * 4 + 4];
            let lf_px = &lf[k * 4..k * 4 + 4];

            // flat texture term: the extremum channel's detail,
            // shared across the pixel so one valid channel can
            // re-texture the clipped ones
            let grey_texture = weights.gamma * texture[k];

            // smoother fallback when the texture term is ~0
            let grey_details =
                weights.gamma_comp * max_abs(max_abs(hf_px[0], hf_px[1]), hf_px[2]);

            let grey_hf = weights.beta_comp * (grey_details + grey_texture);

            // achromatic structure term; the darkest channel for RGB
            // (least clipped), the most achromatic for ratios
            let grey_residual = weights.beta_comp
                * match variant {
                    ReconstructVariant::Rgb => lf_px[0].min(lf_px[1]).min(lf_px[2]),
                    ReconstructVariant::Ratios => lf_px[0].max(lf_px[1]).max(lf_px[2]),
                };

            for c in 0..3 {
                let color_residual = lf_px[c] * weights.beta;
                let color_details = hf_px[c] * weights.beta * weights.gamma_comp;
                out[c] += alpha
                    * (weights.delta * (grey_hf + color_details)
                        + (grey_residual + color_residual) * scales_inv);
            }
        });
}

/// Run one reconstruction pass over `input`, writing into
/// `reconstructed`.
///
/// Needs five image-sized scratch buffers; if any allocation fails
/// the error is returned before anything is written, so the caller
/// can fall back to the unreconstructed input.
pub fn reconstruct_highlights(
    input: &[f32],
    mask: &[f32],
    reconstructed: &mut [f32],
    variant: ReconstructVariant,
    data: &FilmicPreRender,
    width: usize,
    height: usize,
    scales: usize,
) -> Result<()> {
    let len = width * height * 4;
    debug_assert_eq!(input.len(), len);
    debug_assert_eq!(reconstructed.len(), len);
    debug_assert_eq!(mask.len(), width * height);

    let mut lf_prev = try_buffer(len, "low-frequency ping")?;
    let mut lf = try_buffer(len, "low-frequency pong")?;
    let mut hf = try_buffer(len, "high-frequency")?;
    let mut temp = try_buffer(len, "blur scratch")?;
    let mut texture = try_buffer(width * height, "texture map")?;

    init_reconstruct(input, mask, reconstructed);

    let weights = BandWeights {
        gamma: data.reconstruct_structure_vs_texture,
        gamma_comp: 1.0 - data.reconstruct_structure_vs_texture,
        beta: data.reconstruct_grey_vs_color,
        beta_comp: 1.0 - data.reconstruct_grey_vs_color,
        delta: data.reconstruct_bloom_vs_details,
    };

    for s in 0..scales {
        let mult = 1_usize << s;
        let detail: &[f32] = if s == 0 { input } else { &lf_prev };

        // low frequencies of this scale
        blur_bspline_2d(detail, &mut lf, &mut temp, width, height, mult);

        // high frequencies and the texture extremum
        detail_level(detail, &lf, &mut hf, &mut texture, variant);

        // inpaint: blurring the detail band at its own dilation
        // bleeds valid detail into the clipped holes
        blur_bspline_horizontal(&hf, &mut temp, width, height, mult);
        blur_bspline_vertical(&temp, &mut hf, width, height, mult);

        reconstruct_band(
            &hf,
            &lf,
            &texture,
            mask,
            reconstructed,
            &weights,
            variant,
            scales,
        );

        std::mem::swap(&mut lf_prev, &mut lf);
    }

    Ok(())
}

/// Split an image into per-pixel norms and chromaticity ratios.
///
/// Feeds the high-quality second pass: ratios are reconstructed as a
/// smooth chroma field, then [`restore_ratios`] scales them back.
pub fn compute_ratios(
    input: &[f32],
    norms: &mut [f32],
    ratios: &mut [f32],
    method: NormMethod,
    profile: Option<&WorkProfile>,
) {
    ratios
        .par_chunks_mut(4)
        .zip(norms.par_iter_mut())
        .zip(input.par_chunks(4))
        .for_each(|((ratio_px, norm), px)| {
            let n = pixel_norm([px[0], px[1], px[2]], method, profile).max(NORM_FLOOR);
            *norm = n;
            for c in 0..3 {
                ratio_px[c] = px[c] / n;
            }
            ratio_px[3] = px[3];
        });
}

/// Multiply ratios back by their norms, in place.
pub fn restore_ratios(ratios: &mut [f32], norms: &[f32]) {
    ratios
        .par_chunks_mut(4)
        .zip(norms.par_iter())
        .for_each(|(px, &norm)| {
            for c in 0..3 {
                px[c] *= norm;
            }
        });
}
