//! User-facing parameters of the filmic tone mapper.
//!
//! Two persisted schema versions exist. [`FilmicParamsV1`] is the
//! legacy 13-field record from before highlight reconstruction and
//! the second color science were introduced; [`FilmicParams`] is the
//! current record. [`FilmicParams::from_v1`] is the sole
//! compatibility surface between the two.
//!
//! Scene anchors (`*_point_source`) are exposures in EV relative to
//! middle grey, except the grey point itself which is a percentage of
//! linear scene white. Display anchors (`*_point_target`) are
//! percentages of display peak.

use serde::{Deserialize, Serialize};

/// Scalar norm used by the chroma-preserving pipeline variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NormMethod {
    /// No chroma preservation: tone map each channel independently.
    None,
    /// Maximum of the RGB channels.
    MaxRgb,
    /// Luminance through the working profile (or a camera-RGB fallback).
    Luminance,
    /// Ratio of cubic to quadratic channel sums. Behaves like a
    /// saturation-weighted luminance and tends to flatter skies.
    #[default]
    PowerNorm,
}

/// Polynomial degree of an outer curve segment.
///
/// `Poly4` adds a flat-tangent constraint at the curve end-point,
/// which softens the roll-off; `Poly3` lets the end-point slope float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CurveMode {
    /// Fourth-order segment (five constraints).
    #[default]
    Poly4,
    /// Third-order segment (four constraints).
    Poly3,
}

/// Color science revision of the per-pixel transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorScience {
    /// 2019 pipeline: desaturation applied before the curve.
    V1,
    /// 2020 pipeline: desaturation folded into the ratio restore,
    /// with output gamut mapping.
    #[default]
    V2,
}

/// Current persisted parameter record (schema version 2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilmicParams {
    /// Scene-referred grey point, in percent of linear scene white.
    pub grey_point_source: f32,
    /// Scene black anchor, in EV below middle grey. Negative.
    pub black_point_source: f32,
    /// Scene white anchor, in EV above middle grey. Positive.
    pub white_point_source: f32,
    /// Clipping threshold for highlight reconstruction, in EV
    /// relative to the white anchor.
    pub reconstruct_threshold: f32,
    /// Width of the clipping transition, in EV.
    pub reconstruct_feather: f32,
    /// Bloom vs. details mix, -100..=100.
    pub reconstruct_bloom_vs_details: f32,
    /// Grey vs. color mix, -100..=100.
    pub reconstruct_grey_vs_color: f32,
    /// Structure vs. texture mix, -100..=100.
    pub reconstruct_structure_vs_texture: f32,
    /// Symmetric enlargement of the source range, in percent.
    pub security_factor: f32,
    /// Display grey target, percent of display peak.
    pub grey_point_target: f32,
    /// Display black target, percent of display peak.
    pub black_point_target: f32,
    /// Display white target, percent of display peak.
    pub white_point_target: f32,
    /// Exponent of the display transfer function.
    pub output_power: f32,
    /// Width of the linear section, percent of the dynamic range.
    pub latitude: f32,
    /// Slope of the linear section.
    pub contrast: f32,
    /// Extreme-luminance saturation, -50..=50 percent.
    pub saturation: f32,
    /// Shadows/highlights balance, -50..=50. Shifts the latitude
    /// along the contrast slope.
    pub balance: f32,
    /// Norm used when preserving chrominance.
    pub preserve_color: NormMethod,
    /// Color science revision.
    pub version: ColorScience,
    /// Derive `output_power` from the anchors instead of the slider.
    pub auto_hardness: bool,
    /// Use the grey point sliders instead of fixed 18.45%.
    pub custom_grey: bool,
    /// Run a second reconstruction pass on chromaticity ratios.
    pub high_quality_reconstruction: bool,
    /// Shadow (toe) segment degree.
    pub shadows: CurveMode,
    /// Highlight (shoulder) segment degree.
    pub highlights: CurveMode,
}

impl Default for FilmicParams {
    fn default() -> Self {
        Self {
            grey_point_source: 18.45,
            black_point_source: -10.55,
            white_point_source: 3.45,
            reconstruct_threshold: 0.0,
            reconstruct_feather: 3.0,
            reconstruct_bloom_vs_details: 100.0,
            reconstruct_grey_vs_color: 0.0,
            reconstruct_structure_vs_texture: 50.0,
            security_factor: 0.0,
            grey_point_target: 18.45,
            black_point_target: 0.0,
            white_point_target: 100.0,
            output_power: 5.98,
            latitude: 40.0,
            contrast: 1.30,
            saturation: 0.0,
            balance: 12.0,
            preserve_color: NormMethod::PowerNorm,
            version: ColorScience::V2,
            auto_hardness: true,
            custom_grey: false,
            high_quality_reconstruction: false,
            shadows: CurveMode::Poly4,
            highlights: CurveMode::Poly4,
        }
    }
}

impl FilmicParams {
    /// Dynamic range of the scene anchors, in EV.
    #[inline]
    pub fn dynamic_range(&self) -> f32 {
        self.white_point_source - self.black_point_source
    }

    /// Migrate a legacy v1 record to the current schema.
    ///
    /// The 13 shared fields are copied verbatim. New fields take
    /// defaults chosen so old edits render unchanged: the
    /// reconstruction threshold sits 3 EV above the white anchor
    /// (clipping mask stays empty), and the curve/color options match
    /// what v1 hard-coded.
    pub fn from_v1(old: &FilmicParamsV1) -> Self {
        Self {
            grey_point_source: old.grey_point_source,
            black_point_source: old.black_point_source,
            white_point_source: old.white_point_source,
            security_factor: old.security_factor,
            grey_point_target: old.grey_point_target,
            black_point_target: old.black_point_target,
            white_point_target: old.white_point_target,
            output_power: old.output_power,
            latitude: old.latitude,
            contrast: old.contrast,
            saturation: old.saturation,
            balance: old.balance,
            preserve_color: old.preserve_color,
            reconstruct_threshold: 3.0,
            reconstruct_feather: 3.0,
            shadows: CurveMode::Poly4,
            highlights: CurveMode::Poly3,
            version: ColorScience::V1,
            auto_hardness: true,
            custom_grey: true,
            high_quality_reconstruction: false,
            ..Self::default()
        }
    }

    /// Update the security factor, enlarging or shrinking the source
    /// range symmetrically around grey.
    ///
    /// Both anchors are scaled by the relative change from the
    /// previous factor, so repeated adjustments compose instead of
    /// re-scaling the raw picked values every time.
    pub fn apply_security_factor(&mut self, factor: f32) {
        let ratio = (factor - self.security_factor) / (self.security_factor + 100.0);
        self.black_point_source += ratio * self.black_point_source;
        self.white_point_source += ratio * self.white_point_source;
        self.security_factor = factor;
        if self.auto_hardness {
            self.output_power = self.auto_output_power();
        }
    }

    /// Display exponent that places the log-encoded grey exactly at
    /// the grey target.
    ///
    /// Solves `(grey_target)^(1/power) = grey_log` for `power`.
    pub fn auto_output_power(&self) -> f32 {
        (self.grey_point_target / 100.0).ln()
            / (-self.black_point_source / self.dynamic_range()).ln()
    }
}

/// Legacy persisted parameter record (schema version 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilmicParamsV1 {
    /// Scene-referred grey point, in percent of linear scene white.
    pub grey_point_source: f32,
    /// Scene black anchor, in EV below middle grey.
    pub black_point_source: f32,
    /// Scene white anchor, in EV above middle grey.
    pub white_point_source: f32,
    /// Symmetric enlargement of the source range, in percent.
    pub security_factor: f32,
    /// Display grey target, percent of display peak.
    pub grey_point_target: f32,
    /// Display black target, percent of display peak.
    pub black_point_target: f32,
    /// Display white target, percent of display peak.
    pub white_point_target: f32,
    /// Exponent of the display transfer function.
    pub output_power: f32,
    /// Width of the linear section, percent of the dynamic range.
    pub latitude: f32,
    /// Slope of the linear section.
    pub contrast: f32,
    /// Extreme-luminance saturation, -50..=50 percent.
    pub saturation: f32,
    /// Shadows/highlights balance, -50..=50.
    pub balance: f32,
    /// Norm used when preserving chrominance.
    pub preserve_color: NormMethod,
}
