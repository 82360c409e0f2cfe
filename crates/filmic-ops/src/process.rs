//! Pipeline entry point.
//!
//! `process` runs the whole engine over one region: build the
//! clipping mask, reconstruct highlights if enough pixels are
//! clipped, then tone map into the output buffer. Reconstruction
//! failures degrade gracefully -- the tone mapper falls back to the
//! original input, matching what the user would get with
//! reconstruction disabled.

use filmic_core::{Error, PipeGeometry, Result, Roi, WorkProfile};
use tracing::{debug, warn};

use crate::mask::{build_clipping_mask, MIN_CLIPPED_PIXELS};
use crate::prerender::FilmicPreRender;
use crate::reconstruct::{
    compute_ratios, reconstruct_highlights, restore_ratios, scale_count, try_buffer,
    ReconstructVariant,
};
use crate::tonemap::apply_tonemap;

/// Validate the buffer/ROI contract shared by both buffers.
fn check_buffers(
    input: &[f32],
    output: &[f32],
    roi_in: &Roi,
    roi_out: &Roi,
) -> Result<()> {
    if roi_in.width != roi_out.width || roi_in.height != roi_out.height {
        return Err(Error::InvalidInput(format!(
            "input region {}x{} does not match output region {}x{}",
            roi_in.width, roi_in.height, roi_out.width, roi_out.height
        )));
    }
    if input.len() != roi_in.buffer_len() || output.len() != roi_out.buffer_len() {
        return Err(Error::InvalidInput(format!(
            "expected 4-channel RGBA buffers of {} floats, got input {} / output {}",
            roi_out.buffer_len(),
            input.len(),
            output.len()
        )));
    }
    Ok(())
}

/// Run the filmic pipeline over one region.
///
/// `input` and `output` are 4-channel interleaved f32 buffers of the
/// ROI size. The input is read-only; the output is fully written on
/// success. Rejects non-RGBA buffers with a logged error; recovers
/// from reconstruction allocation failures by tone mapping the
/// original input.
pub fn process(
    input: &[f32],
    output: &mut [f32],
    roi_in: &Roi,
    roi_out: &Roi,
    geometry: &PipeGeometry,
    data: &FilmicPreRender,
    profile: Option<&WorkProfile>,
) -> Result<()> {
    if let Err(err) = check_buffers(input, output, roi_in, roi_out) {
        warn!("filmic works only on 4-channel RGB input: {}", err);
        return Err(err);
    }

    let width = roi_out.width;
    let height = roi_out.height;

    // clipping mask, and whether reconstruction is worth running
    let reconstructed = build_mask_and_reconstruct(input, roi_in, geometry, data, profile, width, height);

    let source: &[f32] = reconstructed.as_deref().unwrap_or(input);
    apply_tonemap(source, output, profile, data, width, height);

    Ok(())
}

/// Mask the clipped pixels and, when worthwhile, rebuild them.
///
/// Returns `None` whenever the pipeline should tone map the original
/// input: nothing clipped, or a scratch allocation failed.
fn build_mask_and_reconstruct(
    input: &[f32],
    roi_in: &Roi,
    geometry: &PipeGeometry,
    data: &FilmicPreRender,
    profile: Option<&WorkProfile>,
    width: usize,
    height: usize,
) -> Option<Vec<f32>> {
    let mut mask = match try_buffer(width * height, "clipping mask") {
        Ok(mask) => mask,
        Err(err) => {
            warn!("highlight reconstruction skipped: {}", err);
            return None;
        }
    };

    let normalize = data.reconstruct_feather / data.reconstruct_threshold;
    let clipped = build_clipping_mask(
        input,
        &mut mask,
        width,
        height,
        normalize,
        data.reconstruct_feather,
    );
    if clipped <= MIN_CLIPPED_PIXELS {
        return None;
    }

    let scales = scale_count(roi_in, geometry);
    debug!(clipped, scales, "reconstructing clipped highlights");

    let mut reconstructed = match try_buffer(input.len(), "reconstruction target") {
        Ok(buffer) => buffer,
        Err(err) => {
            warn!(
                "highlight reconstruction failed, using the original image: {}",
                err
            );
            return None;
        }
    };
    if let Err(err) = reconstruct_highlights(
        input,
        &mask,
        &mut reconstructed,
        ReconstructVariant::Rgb,
        data,
        width,
        height,
        scales,
    ) {
        warn!(
            "highlight reconstruction failed, using the original image: {}",
            err
        );
        return None;
    }

    if data.high_quality_reconstruction {
        if let Err(err) = reconstruct_ratios_pass(
            &mut reconstructed,
            &mask,
            data,
            profile,
            width,
            height,
            scales,
        ) {
            warn!(
                "high quality reconstruction pass failed, keeping the first pass: {}",
                err
            );
        }
    }

    Some(reconstructed)
}

/// Second reconstruction pass on chromaticity ratios.
///
/// Splits the first-pass result into norms and ratios, rebuilds the
/// ratios as a smooth chroma field, then re-applies the norms.
fn reconstruct_ratios_pass(
    reconstructed: &mut [f32],
    mask: &[f32],
    data: &FilmicPreRender,
    profile: Option<&WorkProfile>,
    width: usize,
    height: usize,
    scales: usize,
) -> Result<()> {
    let pixels = width * height;
    let mut norms = try_buffer(pixels, "norms")?;
    let mut ratios = try_buffer(pixels * 4, "ratios")?;

    compute_ratios(
        reconstructed,
        &mut norms,
        &mut ratios,
        data.preserve_color,
        profile,
    );
    reconstruct_highlights(
        &ratios,
        mask,
        reconstructed,
        ReconstructVariant::Ratios,
        data,
        width,
        height,
        scales,
    )?;
    restore_ratios(reconstructed, &norms);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prerender::commit;
    use filmic_core::FilmicParams;

    #[test]
    fn test_rejects_mismatched_buffers() {
        let data = commit(&FilmicParams::default()).unwrap();
        let roi = Roi::new(4, 4);
        let geo = PipeGeometry::new(4, 4);
        let input = vec![0.5; 4 * 4 * 4];
        let mut output = vec![0.0; 8]; // wrong size

        let err = process(&input, &mut output, &roi, &roi, &geo, &data, None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_mismatched_regions() {
        let data = commit(&FilmicParams::default()).unwrap();
        let roi_in = Roi::new(4, 4);
        let roi_out = Roi::new(4, 5);
        let geo = PipeGeometry::new(4, 5);
        let input = vec![0.5; roi_in.buffer_len()];
        let mut output = vec![0.0; roi_out.buffer_len()];

        let err = process(&input, &mut output, &roi_in, &roi_out, &geo, &data, None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_unclipped_image_skips_reconstruction() {
        // a mid-grey frame tone maps straight through
        let data = commit(&FilmicParams::default()).unwrap();
        let roi = Roi::new(8, 8);
        let geo = PipeGeometry::new(8, 8);
        let input = vec![0.1845; roi.buffer_len()];
        let mut output = vec![0.0; roi.buffer_len()];

        process(&input, &mut output, &roi, &roi, &geo, &data, None).unwrap();
        for px in output.chunks_exact(4) {
            assert!((px[0] - 0.1845).abs() < 1e-3, "grey moved to {}", px[0]);
        }
    }

    #[test]
    fn test_alpha_passes_through() {
        let data = commit(&FilmicParams::default()).unwrap();
        let roi = Roi::new(4, 4);
        let geo = PipeGeometry::new(4, 4);
        let mut input = vec![0.25; roi.buffer_len()];
        for px in input.chunks_exact_mut(4) {
            px[3] = 0.75;
        }
        let mut output = vec![0.0; roi.buffer_len()];

        process(&input, &mut output, &roi, &roi, &geo, &data, None).unwrap();
        for px in output.chunks_exact(4) {
            assert_eq!(px[3], 0.75);
        }
    }
}
