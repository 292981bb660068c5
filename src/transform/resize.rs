//! Resampling to new dimensions.
//!
//! Destination pixel centers are mapped onto the source grid, so shrinking
//! to a single pixel samples the source center. Every channel, alpha
//! included, is interpolated the same way.

use super::ResizeKind;
use crate::buffer::{byte_len, PixelBuffer};
use crate::error::{Error, Result};
use crate::rows::for_each_row;

/// Keys cubic convolution parameter.
const CUBIC_A: f64 = -0.5;

/// Continuous source coordinate of destination index `d`.
fn source_coord(d: u32, src: u32, dst: u32) -> f64 {
    (d as f64 + 0.5) * src as f64 / dst as f64 - 0.5
}

/// Bilinearly samples `src` at a continuous position already clamped to
/// `[0, width - 1] x [0, height - 1]`.
pub(crate) fn sample_bilinear(src: &[u8], width: u32, height: u32, x: f64, y: f64) -> [u8; 4] {
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width as usize - 1);
    let y1 = (y0 + 1).min(height as usize - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let stride = 4 * width as usize;
    let at = |px: usize, py: usize, c: usize| src[py * stride + 4 * px + c] as f64;

    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = at(x0, y0, c) * (1.0 - fx) + at(x1, y0, c) * fx;
        let bottom = at(x0, y1, c) * (1.0 - fx) + at(x1, y1, c) * fx;
        *slot = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        (CUBIC_A + 2.0) * t.powi(3) - (CUBIC_A + 3.0) * t.powi(2) + 1.0
    } else if t < 2.0 {
        CUBIC_A * t.powi(3) - 5.0 * CUBIC_A * t.powi(2) + 8.0 * CUBIC_A * t - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Source indices and weights of the four taps for every destination index.
fn cubic_taps(src: u32, dst: u32) -> Vec<([usize; 4], [f64; 4])> {
    let last = src as i64 - 1;
    (0..dst)
        .map(|d| {
            let s = source_coord(d, src, dst);
            let base = s.floor();
            let frac = s - base;
            let mut indices = [0usize; 4];
            let mut weights = [0f64; 4];
            for (k, m) in (-1i64..=2).enumerate() {
                indices[k] = (base as i64 + m).clamp(0, last) as usize;
                weights[k] = cubic_weight(frac - m as f64);
            }
            (indices, weights)
        })
        .collect()
}

impl PixelBuffer {
    /// Resamples the buffer to `width` x `height`.
    ///
    /// Fails with [`Error::InvalidArgument`] if either dimension is zero.
    pub fn resize(&mut self, kind: ResizeKind, width: u32, height: u32) -> Result<&mut Self> {
        let len = byte_len(width, height)?;
        if (width, height) == self.dimensions() {
            return Ok(self);
        }

        let next = match kind {
            ResizeKind::Nearest => self.resized_nearest(width, height, len),
            ResizeKind::Linear => self.resized_linear(width, height, len),
            ResizeKind::Cubic => self.resized_cubic(width, height, len),
        };
        self.replace_storage(next);
        Ok(self)
    }

    /// Resizes both dimensions by `factor`, truncating the results.
    pub fn scale(&mut self, kind: ResizeKind, factor: f64) -> Result<&mut Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::invalid(format!("invalid scale factor: {factor}")));
        }
        let width = (self.width() as f64 * factor) as u32;
        let height = (self.height() as f64 * factor) as u32;
        self.resize(kind, width, height)
    }

    fn resized_nearest(&self, width: u32, height: u32, len: usize) -> PixelBuffer {
        let (sw, sh) = self.dimensions();
        let map = |d: u32, src: u32, dst: u32| {
            (((2 * d as u64 + 1) * src as u64) / (2 * dst as u64)).min(src as u64 - 1) as usize
        };
        let columns: Vec<usize> = (0..width).map(|x| map(x, sw, width)).collect();
        let src = self.bitmap();
        let stride = self.stride();

        let mut out = vec![0u8; len];
        for_each_row(&mut out, 4 * width as usize, |y, row| {
            let sy = map(y as u32, sh, height);
            let src_row = &src[sy * stride..(sy + 1) * stride];
            for (px, &sx) in row.chunks_exact_mut(4).zip(&columns) {
                px.copy_from_slice(&src_row[4 * sx..4 * sx + 4]);
            }
        });
        PixelBuffer::from_parts(width, height, out)
    }

    fn resized_linear(&self, width: u32, height: u32, len: usize) -> PixelBuffer {
        let (sw, sh) = self.dimensions();
        let src = self.bitmap();
        let max_x = (sw - 1) as f64;
        let max_y = (sh - 1) as f64;

        let mut out = vec![0u8; len];
        for_each_row(&mut out, 4 * width as usize, |y, row| {
            let sy = source_coord(y as u32, sh, height).clamp(0.0, max_y);
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let sx = source_coord(x as u32, sw, width).clamp(0.0, max_x);
                px.copy_from_slice(&sample_bilinear(src, sw, sh, sx, sy));
            }
        });
        PixelBuffer::from_parts(width, height, out)
    }

    fn resized_cubic(&self, width: u32, height: u32, len: usize) -> PixelBuffer {
        let (sw, sh) = self.dimensions();
        let columns = cubic_taps(sw, width);
        let rows = cubic_taps(sh, height);
        let src = self.bitmap();
        let stride = self.stride();

        let mut out = vec![0u8; len];
        for_each_row(&mut out, 4 * width as usize, |y, row| {
            let (ys, wy) = rows[y];
            for (px, (xs, wx)) in row.chunks_exact_mut(4).zip(&columns) {
                let mut acc = [0f64; 4];
                for (&sy, &ky) in ys.iter().zip(&wy) {
                    let line = &src[sy * stride..(sy + 1) * stride];
                    for (&sx, &kx) in xs.iter().zip(wx) {
                        let weight = kx * ky;
                        for (c, sum) in acc.iter_mut().enumerate() {
                            *sum += line[4 * sx + c] as f64 * weight;
                        }
                    }
                }
                for (slot, sum) in px.iter_mut().zip(acc) {
                    *slot = sum.round().clamp(0.0, 255.0) as u8;
                }
            }
        });
        PixelBuffer::from_parts(width, height, out)
    }
}
