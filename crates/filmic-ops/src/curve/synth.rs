//! Tone curve synthesis from user anchors.
//!
//! Node placement follows the filmic construction: the grey anchor
//! maps onto the latitude, a straight line of slope `contrast`
//! through `(grey_log, grey_display)`; the toe and shoulder
//! polynomials continue that line towards the black and white
//! anchors with matching first derivatives and zero curvature at the
//! junctions. Each outer segment is solved as a small dense linear
//! system over f64.
//!
//! Background on the construction:
//! <https://eng.aurelienpierre.com/2018/11/30/filmic-darktable-and-the-quest-of-the-hdr-tone-mapping/>

use filmic_core::{CurveMode, FilmicParams, Result};
use filmic_math::gauss_solve;

use super::spline::{Spline, SEG_LATITUDE, SEG_SHOULDER, SEG_TOE};

const ORDER_4: usize = 5;
const ORDER_3: usize = 4;

/// Slope of the latitude after clamping.
///
/// The user value is bounded to [0.1, 2.0], then raised so the
/// latitude's y-intercept `grey_display - contrast * grey_log` stays
/// non-positive; the outer boundary systems are unsolvable in [0, 1]
/// otherwise.
pub(crate) fn effective_contrast(p: &FilmicParams, grey_display: f32, grey_log: f32) -> f32 {
    let contrast = p.contrast.clamp(0.1, 2.0);
    let floor = grey_display / grey_log;
    if contrast < floor {
        1.0001 * floor
    } else {
        contrast
    }
}

/// Display-space grey for the given parameters.
pub(crate) fn grey_display(p: &FilmicParams) -> f32 {
    if p.custom_grey {
        let grey = p
            .grey_point_target
            .clamp(p.black_point_target, p.white_point_target);
        (grey / 100.0).powf(1.0 / p.output_power)
    } else {
        0.1845_f32.powf(1.0 / p.output_power)
    }
}

/// Build the filmic tone curve from the parameters.
///
/// Fails only when the boundary systems are degenerate (coincident
/// nodes); callers may substitute [`Spline::identity`].
pub fn compute_spline(p: &FilmicParams) -> Result<Spline> {
    let white_source = p.white_point_source;
    let black_source = p.black_point_source;
    let dynamic_range = white_source - black_source;

    // luminance anchors after log encoding
    let grey_log = black_source.abs() / dynamic_range;
    let grey_display = grey_display(p);

    // target luminance after the curve
    let black_display = p.black_point_target.clamp(0.0, p.grey_point_target) / 100.0;
    let white_display = p.white_point_target.clamp(p.grey_point_target, 100.0) / 100.0;

    let latitude = p.latitude.clamp(0.0, 100.0) / 100.0 * dynamic_range;
    let balance = p.balance.clamp(-50.0, 50.0) / 100.0;
    let contrast = effective_contrast(p, grey_display, grey_log);

    // toe and shoulder x, offset from grey along the log axis
    let mut toe_log = grey_log - latitude / dynamic_range * (black_source / dynamic_range).abs();
    let mut shoulder_log =
        grey_log + latitude / dynamic_range * (white_source / dynamic_range).abs();

    // y on the latitude line
    let linear_intercept = grey_display - contrast * grey_log;
    let mut toe_display = toe_log * contrast + linear_intercept;
    let mut shoulder_display = shoulder_log * contrast + linear_intercept;

    // balance shifts both latitude endpoints along the contrast
    // slope; negative drags towards the shadows
    let norm = (contrast * contrast + 1.0).sqrt();
    let coeff = -((2.0 * latitude) / dynamic_range) * balance;
    toe_display += coeff * contrast / norm;
    shoulder_display += coeff * contrast / norm;
    toe_log += coeff / norm;
    shoulder_log += coeff / norm;

    let mut spline = Spline {
        x: [0.0, toe_log, grey_log, shoulder_log, 1.0],
        y: [
            black_display,
            toe_display,
            grey_display,
            shoulder_display,
            white_display,
        ],
        m1: [0.0; 3],
        m2: [0.0; 3],
        m3: [0.0; 3],
        m4: [0.0; 3],
        m5: [0.0; 3],
        latitude_min: toe_log,
        latitude_max: shoulder_log,
    };

    // latitude: the affine section itself
    spline.m2[SEG_LATITUDE] = contrast;
    spline.m1[SEG_LATITUDE] = spline.y[1] - contrast * spline.x[1];

    solve_toe(p.shadows, &mut spline)?;
    solve_shoulder(p.highlights, &mut spline)?;

    Ok(spline)
}

/// Solve the toe polynomial on [0, toe_log].
///
/// Constraints: value at 0, value/slope/zero-curvature at the toe
/// node, plus a flat tangent at 0 for the quartic mode.
fn solve_toe(mode: CurveMode, spline: &mut Spline) -> Result<()> {
    let tl = f64::from(spline.x[1]);
    let tl2 = tl * tl;
    let tl3 = tl2 * tl;
    let tl4 = tl3 * tl;

    let y_black = f64::from(spline.y[0]);
    let y_toe = f64::from(spline.y[1]);
    let slope = f64::from(spline.m2[SEG_LATITUDE]);

    match mode {
        CurveMode::Poly4 => {
            #[rustfmt::skip]
            let mut a = [
                0.,         0.,       0.,       0., 1., // position at 0
                0.,         0.,       0.,       1., 0., // first derivative at 0
                tl4,        tl3,      tl2,      tl, 1., // position at toe node
                4. * tl3,   3. * tl2, 2. * tl,  1., 0., // first derivative at toe node
                12. * tl2,  6. * tl,  2.,       0., 0., // second derivative at toe node
            ];
            let mut b = [y_black, 0., y_toe, slope, 0.];
            gauss_solve(&mut a, &mut b, ORDER_4)?;

            spline.m5[SEG_TOE] = b[0] as f32;
            spline.m4[SEG_TOE] = b[1] as f32;
            spline.m3[SEG_TOE] = b[2] as f32;
            spline.m2[SEG_TOE] = b[3] as f32;
            spline.m1[SEG_TOE] = b[4] as f32;
        }
        CurveMode::Poly3 => {
            #[rustfmt::skip]
            let mut a = [
                0.,        0.,       0.,  1., // position at 0
                tl3,       tl2,      tl,  1., // position at toe node
                3. * tl2,  2. * tl,  1.,  0., // first derivative at toe node
                6. * tl,   2.,       0.,  0., // second derivative at toe node
            ];
            let mut b = [y_black, y_toe, slope, 0.];
            gauss_solve(&mut a, &mut b, ORDER_3)?;

            spline.m5[SEG_TOE] = 0.0;
            spline.m4[SEG_TOE] = b[0] as f32;
            spline.m3[SEG_TOE] = b[1] as f32;
            spline.m2[SEG_TOE] = b[2] as f32;
            spline.m1[SEG_TOE] = b[3] as f32;
        }
    }
    Ok(())
}

/// Solve the shoulder polynomial on [shoulder_log, 1].
///
/// Mirror image of the toe: value at 1, value/slope/zero-curvature
/// at the shoulder node, plus a flat tangent at 1 for the quartic
/// mode.
fn solve_shoulder(mode: CurveMode, spline: &mut Spline) -> Result<()> {
    let sl = f64::from(spline.x[3]);
    let sl2 = sl * sl;
    let sl3 = sl2 * sl;
    let sl4 = sl3 * sl;

    let y_white = f64::from(spline.y[4]);
    let y_shoulder = f64::from(spline.y[3]);
    let slope = f64::from(spline.m2[SEG_LATITUDE]);

    match mode {
        CurveMode::Poly3 => {
            #[rustfmt::skip]
            let mut a = [
                1.,        1.,       1.,  1., // position at 1
                sl3,       sl2,      sl,  1., // position at shoulder node
                3. * sl2,  2. * sl,  1.,  0., // first derivative at shoulder node
                6. * sl,   2.,       0.,  0., // second derivative at shoulder node
            ];
            let mut b = [y_white, y_shoulder, slope, 0.];
            gauss_solve(&mut a, &mut b, ORDER_3)?;

            spline.m5[SEG_SHOULDER] = 0.0;
            spline.m4[SEG_SHOULDER] = b[0] as f32;
            spline.m3[SEG_SHOULDER] = b[1] as f32;
            spline.m2[SEG_SHOULDER] = b[2] as f32;
            spline.m1[SEG_SHOULDER] = b[3] as f32;
        }
        CurveMode::Poly4 => {
            #[rustfmt::skip]
            let mut a = [
                1.,         1.,       1.,       1., 1., // position at 1
                4.,         3.,       2.,       1., 0., // first derivative at 1
                sl4,        sl3,      sl2,      sl, 1., // position at shoulder node
                4. * sl3,   3. * sl2, 2. * sl,  1., 0., // first derivative at shoulder node
                12. * sl2,  6. * sl,  2.,       0., 0., // second derivative at shoulder node
            ];
            let mut b = [y_white, 0., y_shoulder, slope, 0.];
            gauss_solve(&mut a, &mut b, ORDER_4)?;

            spline.m5[SEG_SHOULDER] = b[0] as f32;
            spline.m4[SEG_SHOULDER] = b[1] as f32;
            spline.m3[SEG_SHOULDER] = b[2] as f32;
            spline.m2[SEG_SHOULDER] = b[3] as f32;
            spline.m1[SEG_SHOULDER] = b[4] as f32;
        }
    }
    Ok(())
}
