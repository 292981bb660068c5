//! Geometric transforms: flips, rotations, resampling, cropping and
//! shape drawing.
//!
//! Transforms that keep the dimensions work in place. Those that change them
//! build the result in a fresh bitmap and then replace the buffer's storage
//! and dimensions together.

mod crop;
mod draw;
mod flip;
mod resize;
mod rotate;

use serde::{Deserialize, Serialize};

/// Axis for [`PixelBuffer::flip`](crate::PixelBuffer::flip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    /// Mirror left and right.
    Horizontal,
    /// Mirror top and bottom.
    Vertical,
}

/// Resampling filter for [`PixelBuffer::resize`](crate::PixelBuffer::resize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeKind {
    /// Closest source pixel.
    Nearest,
    /// Bilinear interpolation of the four surrounding pixels.
    #[default]
    Linear,
    /// Bicubic convolution over a 4x4 neighbourhood (a = -0.5).
    Cubic,
}
