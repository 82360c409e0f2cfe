//! Region of interest and pipeline geometry types.
//!
//! The engine processes one region of a larger image at a time. A
//! [`Roi`] describes the region handed to `process` together with the
//! rendering scale it was sampled at; [`PipeGeometry`] describes the
//! full input buffer, which the wavelet stage needs to keep its
//! coarsest filter scale-invariant across zoom levels.
//!
//! # Coordinate System
//!
//! Origin (0, 0) at the top-left corner, X to the right, Y downward.

/// A processing region with its rendering scale.
///
/// # Invariants
///
/// - `width` and `height` must be > 0 for a valid region
/// - `scale` is the ratio of this region's sampling to full
///   resolution (1.0 = 1:1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roi {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Rendering scale of the region (1.0 = full resolution).
    pub scale: f32,
}

impl Roi {
    /// Creates a full-resolution region.
    #[inline]
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
        }
    }

    /// Creates a region sampled at the given scale.
    #[inline]
    pub const fn with_scale(width: usize, height: usize, scale: f32) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }

    /// Number of pixels in the region.
    #[inline]
    pub const fn pixels(&self) -> usize {
        self.width * self.height
    }

    /// Length of a 4-channel interleaved buffer covering the region.
    #[inline]
    pub const fn buffer_len(&self) -> usize {
        self.pixels() * 4
    }
}

/// Geometry of the full pipeline buffer feeding a processing region.
///
/// `full_width`/`full_height` are the module's input buffer
/// dimensions before any downsampling; `iscale` is the scale that
/// buffer was produced at relative to the raw image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeGeometry {
    /// Input buffer width at `iscale`.
    pub full_width: usize,
    /// Input buffer height at `iscale`.
    pub full_height: usize,
    /// Scale of the input buffer relative to the raw image.
    pub iscale: f32,
}

impl PipeGeometry {
    /// Geometry for an unscaled buffer.
    #[inline]
    pub const fn new(full_width: usize, full_height: usize) -> Self {
        Self {
            full_width,
            full_height,
            iscale: 1.0,
        }
    }

    /// Largest raw-image dimension covered by the buffer.
    #[inline]
    pub fn max_raw_dim(&self) -> f32 {
        (self.full_width as f32).max(self.full_height as f32) * self.iscale
    }
}
