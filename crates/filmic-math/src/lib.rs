//! # filmic-math
//!
//! Scalar kernels and numeric helpers for the filmic tone mapping
//! engine.
//!
//! # Modules
//!
//! - [`scalar`] - log encoding, desaturation weights, small helpers
//! - [`norm`] - pixel norms for the chroma-preserving variants
//! - [`solve`] - dense Gaussian elimination for the curve systems
//!
//! Everything here is pure and allocation-free; the image-level
//! operations live in `filmic-ops`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod norm;
pub mod scalar;
pub mod solve;

pub use norm::{pixel_norm, pixel_norm_power};
pub use scalar::{
    clamp_unit, desaturate_v1, desaturate_v2, linear_saturation, log_tonemap_v1, log_tonemap_v2,
    max_abs, min_abs, sqf, NORM_FLOOR,
};
pub use solve::gauss_solve;
