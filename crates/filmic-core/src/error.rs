//! Error types for the filmic engine.
//!
//! Provides unified error handling for parameter commit, curve
//! synthesis and pixel processing.

use thiserror::Error;

/// Error type for filmic operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input buffer rejected (wrong channel count or size mismatch).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A scratch buffer could not be allocated.
    ///
    /// Raised by the highlight reconstruction stage. Non-fatal: the
    /// pipeline falls back to tone mapping the original input.
    #[error("scratch allocation failed: {0}")]
    AllocationFailed(String),

    /// The curve solver hit a near-zero pivot.
    ///
    /// Should not occur for well-formed anchors; callers may fall
    /// back to an identity curve.
    #[error("degenerate pivot in row {row} of the spline system")]
    DegeneratePivot {
        /// Elimination row at which the pivot collapsed.
        row: usize,
    },
}

/// Result type for filmic operations.
pub type Result<T> = std::result::Result<T, Error>;
