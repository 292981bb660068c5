//! Clockwise rotations.
//!
//! Quarter turns are exact permutations of the pixels. Any other angle is
//! resolved by inverse mapping each destination pixel around the center and
//! sampling the source bilinearly.

use super::resize::sample_bilinear;
use crate::buffer::{byte_len, PixelBuffer};
use crate::error::{Error, Result};
use crate::rows::for_each_row;

impl PixelBuffer {
    /// Rotates a quarter turn clockwise, swapping width and height.
    pub fn rotate_90(&mut self) -> &mut Self {
        let (w, h) = self.dimensions();
        let next = self.permuted(h, w, |nx, ny| (ny, h - 1 - nx));
        self.replace_storage(next);
        self
    }

    /// Rotates half a turn in place.
    pub fn rotate_180(&mut self) -> &mut Self {
        let bitmap = self.bitmap_mut();
        bitmap.reverse();
        for px in bitmap.chunks_exact_mut(4) {
            px.reverse();
        }
        self
    }

    /// Rotates three quarter turns clockwise, swapping width and height.
    pub fn rotate_270(&mut self) -> &mut Self {
        let (w, h) = self.dimensions();
        let next = self.permuted(h, w, |nx, ny| (w - 1 - ny, nx));
        self.replace_storage(next);
        self
    }

    /// Rotates clockwise by `degrees`.
    ///
    /// With `resize_canvas` the result grows to the bounding box of the
    /// rotated corners; otherwise the dimensions are kept and the corners
    /// are clipped. Uncovered destination pixels are transparent black.
    pub fn rotate(&mut self, degrees: f64, resize_canvas: bool) -> Result<&mut Self> {
        if !degrees.is_finite() {
            return Err(Error::invalid(format!("invalid rotation angle: {degrees}")));
        }

        let degrees = degrees.rem_euclid(360.0);
        if degrees == 0.0 {
            return Ok(self);
        } else if degrees == 90.0 {
            return Ok(self.rotate_90());
        } else if degrees == 180.0 {
            return Ok(self.rotate_180());
        } else if degrees == 270.0 {
            return Ok(self.rotate_270());
        }

        let (w, h) = self.dimensions();
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (nw, nh) = if resize_canvas {
            let span = |a: f64, b: f64| ((a + b - 1e-9).ceil() as u32).max(1);
            (
                span(w as f64 * cos.abs(), h as f64 * sin.abs()),
                span(w as f64 * sin.abs(), h as f64 * cos.abs()),
            )
        } else {
            (w, h)
        };
        let len = byte_len(nw, nh)?;

        let src = self.bitmap();
        let (sw, sh) = (w as f64, h as f64);
        let (half_nw, half_nh) = (nw as f64 / 2.0, nh as f64 / 2.0);

        let mut out = vec![0u8; len];
        for_each_row(&mut out, 4 * nw as usize, |ny, row| {
            let py = ny as f64 + 0.5 - half_nh;
            for (nx, px) in row.chunks_exact_mut(4).enumerate() {
                let qx = nx as f64 + 0.5 - half_nw;
                let sx = qx * cos + py * sin + sw / 2.0 - 0.5;
                let sy = -qx * sin + py * cos + sh / 2.0 - 0.5;
                if sx < -0.5 || sy < -0.5 || sx > sw - 0.5 || sy > sh - 0.5 {
                    continue;
                }
                let (sx, sy) = (sx.clamp(0.0, sw - 1.0), sy.clamp(0.0, sh - 1.0));
                let sample = sample_bilinear(src, w, h, sx, sy);
                px.copy_from_slice(&sample);
            }
        });

        log::trace!("rotated {w}x{h} by {degrees} degrees into {nw}x{nh}");
        self.replace_storage(PixelBuffer::from_parts(nw, nh, out));
        Ok(self)
    }

    /// Builds a `width` x `height` buffer whose 0-based pixel `(nx, ny)` is
    /// copied from `source(nx, ny)` of `self`.
    fn permuted<F>(&self, width: u32, height: u32, source: F) -> PixelBuffer
    where
        F: Fn(u32, u32) -> (u32, u32) + Send + Sync,
    {
        let src = self.bitmap();
        let mut out = vec![0u8; src.len()];
        for_each_row(&mut out, 4 * width as usize, |ny, row| {
            for (nx, px) in row.chunks_exact_mut(4).enumerate() {
                let (sx, sy) = source(nx as u32, ny as u32);
                let o = self.offset(sx, sy);
                px.copy_from_slice(&src[o..o + 4]);
            }
        });
        PixelBuffer::from_parts(width, height, out)
    }
}
