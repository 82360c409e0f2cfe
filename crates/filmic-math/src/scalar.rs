//! Scalar tone-mapping kernels.
//!
//! These are the per-pixel building blocks of the filmic transform:
//! the log encoding that maps scene exposure onto [0, 1], and the
//! Gaussian desaturation weights applied near the curve extremities.
//! All functions are total on finite floats and branch-free where it
//! matters for auto-vectorization.

/// Smallest value fed to divisions and logs: 2^-16, the first
/// non-null 16-bit raw level. Anything below is sensor noise and
/// would blow up `log2` into negative amplification.
pub const NORM_FLOOR: f32 = 1.525_878_9e-5;

/// Clamp to [0, 1].
#[inline]
pub fn clamp_unit(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Square.
#[inline]
pub fn sqf(x: f32) -> f32 {
    x * x
}

/// Of two values, the one with the larger magnitude.
#[inline]
pub fn max_abs(a: f32, b: f32) -> f32 {
    if a.abs() > b.abs() {
        a
    } else {
        b
    }
}

/// Of two values, the one with the smaller magnitude.
#[inline]
pub fn min_abs(a: f32, b: f32) -> f32 {
    if a.abs() < b.abs() {
        a
    } else {
        b
    }
}

/// Log encoding, 2019 revision.
///
/// Maps `x` through `(log2(x / grey) - black) / range` and clamps to
/// [2^-16, 1]. The non-zero floor keeps later divisions by the
/// encoded value finite. Callers must raise `x` to [`NORM_FLOOR`]
/// first.
#[inline]
pub fn log_tonemap_v1(x: f32, grey: f32, black: f32, range: f32) -> f32 {
    let encoded = ((x / grey).log2() - black) / range;
    encoded.min(1.0).max(NORM_FLOOR)
}

/// Log encoding, 2020 revision. Same mapping, clamped to [0, 1].
#[inline]
pub fn log_tonemap_v2(x: f32, grey: f32, black: f32, range: f32) -> f32 {
    clamp_unit(((x / grey).log2() - black) / range)
}

/// Desaturation weight, 2019 revision.
///
/// Two Gaussian lobes centred on the curve extremities (toe at 0,
/// shoulder at 1) fade saturation out where the curve crushes values.
/// Returns 1 in the latitude, approaching 0 at the extremities.
#[inline]
pub fn desaturate_v1(x: f32, sigma_toe: f32, sigma_shoulder: f32, saturation: f32) -> f32 {
    let radius_toe = x;
    let radius_shoulder = 1.0 - x;
    let key_toe = (-0.5 * radius_toe * radius_toe / sigma_toe).exp();
    let key_shoulder = (-0.5 * radius_shoulder * radius_shoulder / sigma_shoulder).exp();
    1.0 - clamp_unit((key_toe + key_shoulder) / saturation)
}

/// Desaturation weight, 2020 revision.
///
/// Reshaped so the user saturation scales both the plateau height and
/// the lobe width, which reads more linearly on the slider.
#[inline]
pub fn desaturate_v2(x: f32, sigma_toe: f32, sigma_shoulder: f32, saturation: f32) -> f32 {
    let radius_toe = x;
    let radius_shoulder = 1.0 - x;
    let sat2 = 0.5 / saturation.sqrt();
    let key_toe = (-radius_toe * radius_toe / sigma_toe * sat2).exp();
    let key_shoulder = (-radius_shoulder * radius_shoulder / sigma_shoulder * sat2).exp();
    saturation - (key_toe + key_shoulder) * saturation
}

/// Linear interpolation towards/away from the luminance axis.
///
/// `d = 1` keeps the input, `d = 0` collapses to pure luminance,
/// `d > 1` oversaturates.
#[inline]
pub fn linear_saturation(x: f32, luminance: f32, d: f32) -> f32 {
    luminance + d * (x - luminance)
}
