//! # filmic-core
//!
//! Core types for the filmic tone mapping engine.
//!
//! This crate provides the foundational types shared by the engine
//! crates:
//!
//! - [`FilmicParams`] / [`FilmicParamsV1`] - persisted parameter records
//! - [`NormMethod`], [`CurveMode`], [`ColorScience`] - discrete options
//! - [`Roi`], [`PipeGeometry`] - processing region and pipeline geometry
//! - [`WorkProfile`] - host-supplied working-space luminance
//! - [`Error`], [`Result`] - unified error handling
//!
//! ## Crate Structure
//!
//! This crate is the foundation of the workspace and has no internal
//! dependencies:
//!
//! ```text
//! filmic-core (this crate)
//!    ^
//!    |
//!    +-- filmic-math (scalar kernels, norms, solver)
//!    +-- filmic-ops  (curve synthesis, reconstruction, pixel pipeline)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod params;
pub mod profile;
pub mod roi;

pub use error::{Error, Result};
pub use params::{ColorScience, CurveMode, FilmicParams, FilmicParamsV1, NormMethod};
pub use profile::{camera_rgb_luminance, profile_luminance, WorkProfile};
pub use roi::{PipeGeometry, Roi};
