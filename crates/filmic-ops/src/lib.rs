//! # filmic-ops
//!
//! Scene-referred filmic tone mapping: curve synthesis, highlight
//! reconstruction and the per-pixel pipeline.
//!
//! The engine takes unbounded linear RGB and compresses it into the
//! display range while keeping middle grey in place, rolling off
//! highlights and shadows along a piecewise-polynomial S curve, and
//! optionally rebuilding clipped highlight regions from an à-trous
//! wavelet decomposition of their surroundings.
//!
//! # Modules
//!
//! - [`curve`] - tone curve synthesis and evaluation
//! - [`prerender`] - parameter commit into runtime data
//! - [`blur`] - separable à-trous B-spline blur
//! - [`mask`] - clipped-highlight detection
//! - [`reconstruct`] - multi-scale highlight inpainting
//! - [`tonemap`] - the four per-pixel transform variants
//! - [`process`] - the pipeline entry point
//!
//! # Example
//!
//! ```
//! use filmic_core::{FilmicParams, PipeGeometry, Roi};
//! use filmic_ops::{commit, process};
//!
//! let params = FilmicParams::default();
//! let data = commit(&params).unwrap();
//!
//! let roi = Roi::new(16, 16);
//! let geometry = PipeGeometry::new(16, 16);
//! let input = vec![0.1845_f32; roi.buffer_len()];
//! let mut output = vec![0.0_f32; roi.buffer_len()];
//!
//! process(&input, &mut output, &roi, &roi, &geometry, &data, None).unwrap();
//! assert!((output[0] - 0.1845).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod blur;
pub mod curve;
pub mod mask;
pub mod prerender;
pub mod process;
pub mod reconstruct;
pub mod tonemap;

pub use curve::{compute_spline, Spline};
pub use prerender::{commit, FilmicPreRender};
pub use process::process;
pub use reconstruct::{scale_count, ReconstructVariant, MAX_SCALES};
