//! The pixel buffer every operation mutates.
//!
//! A [`PixelBuffer`] owns a contiguous RGBA byte vector together with its
//! dimensions. Public accessors use 1-based inclusive coordinates and check
//! bounds before touching storage; the crate-internal helpers work with
//! 0-based offsets.

use std::fmt;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Coordinates
// ============================================================================

/// A value usable as a pixel coordinate.
///
/// Every coordinate is truncated toward zero before bounds checking, so
/// `2.9` addresses column 2. Floating point values that are NaN or infinite
/// are rejected.
pub trait Coordinate: Copy + fmt::Display {
    /// Returns the coordinate truncated toward zero, or `None` when it is
    /// not a finite number.
    fn truncate(self) -> Option<i64>;
}

macro_rules! integer_coordinate {
    ($($ty:ty),*) => {
        $(
            impl Coordinate for $ty {
                fn truncate(self) -> Option<i64> {
                    Some(i64::try_from(self).unwrap_or(i64::MAX))
                }
            }
        )*
    };
}

integer_coordinate!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Coordinate for f32 {
    fn truncate(self) -> Option<i64> {
        self.is_finite().then(|| self.trunc() as i64)
    }
}

impl Coordinate for f64 {
    fn truncate(self) -> Option<i64> {
        self.is_finite().then(|| self.trunc() as i64)
    }
}

fn check_axis<C: Coordinate>(axis: char, value: C, bound: u32) -> Result<u32> {
    let Some(index) = value.truncate() else {
        return Err(Error::NonFiniteCoordinate {
            axis,
            value: value.to_string(),
        });
    };

    if index < 1 || index > i64::from(bound) {
        return Err(Error::OutOfBounds {
            axis,
            value: index,
            bound,
        });
    }

    Ok((index - 1) as u32)
}

/// Number of bytes needed for a `width` x `height` RGBA bitmap.
pub(crate) fn byte_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::invalid(format!(
            "image dimensions must be positive (got {width}x{height})"
        )));
    }

    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| Error::invalid(format!("image dimensions too large ({width}x{height})")))
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// An 8-bit straight-alpha RGBA image.
///
/// Colors are exchanged either as big-endian `0xRRGGBBAA` integers or as
/// 4-byte channel slices. The bitmap length is always
/// `4 * width * height`; operations that change the dimensions replace the
/// whole buffer at once.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPixelBuffer")]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bitmap: Vec<u8>,
}

/// Unvalidated wire form of a [`PixelBuffer`].
#[derive(Deserialize)]
struct RawPixelBuffer {
    width: u32,
    height: u32,
    bitmap: Vec<u8>,
}

impl TryFrom<RawPixelBuffer> for PixelBuffer {
    type Error = Error;

    fn try_from(raw: RawPixelBuffer) -> Result<Self> {
        Self::from_raw(raw.width, raw.height, raw.bitmap)
    }
}

impl PixelBuffer {
    /// Creates a transparent black buffer.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            bitmap: vec![0; len],
        })
    }

    /// Wraps an existing RGBA byte vector without copying it.
    ///
    /// Fails with [`Error::Capacity`] unless `bitmap.len()` is exactly
    /// `4 * width * height`.
    pub fn from_raw(width: u32, height: u32, bitmap: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)?;
        if bitmap.len() != expected {
            return Err(Error::Capacity {
                expected,
                actual: bitmap.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bitmap,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The raw RGBA bytes in row-major order.
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    /// Mutable access to the raw RGBA bytes. The length cannot change.
    pub fn bitmap_mut(&mut self) -> &mut [u8] {
        &mut self.bitmap
    }

    /// Consumes the buffer and returns its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.bitmap
    }

    /// Returns the color at `(x, y)`.
    pub fn get<X: Coordinate, Y: Coordinate>(&self, x: X, y: Y) -> Result<u32> {
        let (x, y) = self.locate(x, y)?;
        Ok(self.pixel(x, y))
    }

    /// Sets the color at `(x, y)`.
    pub fn set<X: Coordinate, Y: Coordinate>(
        &mut self,
        x: X,
        y: Y,
        color: u32,
    ) -> Result<&mut Self> {
        let (x, y) = self.locate(x, y)?;
        self.put(x, y, color);
        Ok(self)
    }

    /// Returns a view of the four channels at `(x, y)`.
    pub fn channels<X: Coordinate, Y: Coordinate>(&self, x: X, y: Y) -> Result<&[u8]> {
        let (x, y) = self.locate(x, y)?;
        let offset = self.offset(x, y);
        Ok(&self.bitmap[offset..offset + 4])
    }

    /// Returns a mutable view of the four channels at `(x, y)`.
    pub fn channels_mut<X: Coordinate, Y: Coordinate>(&mut self, x: X, y: Y) -> Result<&mut [u8]> {
        let (x, y) = self.locate(x, y)?;
        let offset = self.offset(x, y);
        Ok(&mut self.bitmap[offset..offset + 4])
    }

    /// Fills every pixel with `color`.
    pub fn fill(&mut self, color: u32) -> &mut Self {
        let bytes = color.to_be_bytes();
        for pixel in self.bitmap.chunks_exact_mut(4) {
            pixel.copy_from_slice(&bytes);
        }
        self
    }

    /// Fills every pixel with the color returned by `f(x, y)`.
    pub fn fill_with<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(u32, u32) -> u32,
    {
        let width = self.width as usize;
        for (i, pixel) in self.bitmap.chunks_exact_mut(4).enumerate() {
            let x = (i % width) as u32 + 1;
            let y = (i / width) as u32 + 1;
            pixel.copy_from_slice(&f(x, y).to_be_bytes());
        }
        self
    }

    /// Resets every byte to zero.
    pub fn clear(&mut self) -> &mut Self {
        self.bitmap.fill(0);
        self
    }

    /// Iterates over `(x, y, color)` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let width = self.width as usize;
        self.bitmap.chunks_exact(4).enumerate().map(move |(i, px)| {
            (
                (i % width) as u32 + 1,
                (i / width) as u32 + 1,
                u32::from_be_bytes([px[0], px[1], px[2], px[3]]),
            )
        })
    }

    // ------------------------------------------------------------------------
    // Crate-internal 0-based helpers
    // ------------------------------------------------------------------------

    fn locate<X: Coordinate, Y: Coordinate>(&self, x: X, y: Y) -> Result<(u32, u32)> {
        let x = check_axis('x', x, self.width)?;
        let y = check_axis('y', y, self.height)?;
        Ok((x, y))
    }

    /// Byte offset of the 0-based pixel `(x, y)`.
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        4 * (y as usize * self.width as usize + x as usize)
    }

    /// Bytes per row.
    pub(crate) fn stride(&self) -> usize {
        4 * self.width as usize
    }

    pub(crate) fn pixel(&self, x: u32, y: u32) -> u32 {
        let o = self.offset(x, y);
        u32::from_be_bytes([
            self.bitmap[o],
            self.bitmap[o + 1],
            self.bitmap[o + 2],
            self.bitmap[o + 3],
        ])
    }

    pub(crate) fn put(&mut self, x: u32, y: u32, color: u32) {
        let o = self.offset(x, y);
        self.bitmap[o..o + 4].copy_from_slice(&color.to_be_bytes());
    }

    /// Builds a buffer whose length is correct by construction.
    pub(crate) fn from_parts(width: u32, height: u32, bitmap: Vec<u8>) -> Self {
        debug_assert_eq!(bitmap.len(), 4 * width as usize * height as usize);
        Self {
            width,
            height,
            bitmap,
        }
    }

    /// Swaps in a buffer of possibly different dimensions.
    pub(crate) fn replace_storage(&mut self, next: PixelBuffer) {
        *self = next;
    }
}

impl fmt::Display for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelBuffer<{}x{}>", self.width, self.height)
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bitmap.len())
            .finish()
    }
}

// ============================================================================
// image interop
// ============================================================================

impl TryFrom<RgbaImage> for PixelBuffer {
    type Error = Error;

    fn try_from(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.into_raw())
    }
}

impl From<PixelBuffer> for RgbaImage {
    fn from(buffer: PixelBuffer) -> Self {
        let (width, height) = buffer.dimensions();
        // The length invariant guarantees from_raw succeeds.
        RgbaImage::from_raw(width, height, buffer.bitmap)
            .unwrap_or_else(|| RgbaImage::new(width, height))
    }
}
