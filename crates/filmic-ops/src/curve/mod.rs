//! Filmic tone curve: type, evaluation and synthesis.
//!
//! [`compute_spline`] turns user anchors into a [`Spline`]; the
//! pixel pipeline evaluates it per pixel, and hosts drawing the
//! curve can sample [`Spline::eval`] directly.

mod spline;
mod synth;

pub use spline::Spline;
pub use synth::compute_spline;

pub(crate) use synth::{effective_contrast, grey_display};
