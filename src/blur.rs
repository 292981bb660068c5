//! Separable convolution blurs.
//!
//! Every kernel runs as a horizontal pass followed by a vertical pass over
//! each RGBA channel independently, with samples past the edges clamped to
//! the nearest edge pixel. Each pass reads from a snapshot taken before it
//! writes, so no output pixel ever sees an already blurred neighbour from
//! the same pass.

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use crate::rows::for_each_row;

/// Blur kernel for [`PixelBuffer::blur`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlurKind {
    /// Mean over a `2 * radius + 1` window.
    Box { radius: u32 },
    /// Gaussian with sigma `radius / 2`, truncated at `ceil(radius)`.
    Gaussian { radius: f32 },
    /// Fixed cubic B-spline smoothing, `[1, 4, 1] / 6`.
    Cubic,
}

impl BlurKind {
    /// Normalized 1D kernel with its center at index `len / 2`.
    ///
    /// The half-width never exceeds `max_half`; past the longest side every
    /// extra tap only repeats an edge pixel.
    fn kernel(self, max_half: usize) -> Result<Vec<f32>> {
        match self {
            BlurKind::Box { radius } => {
                let taps = 2 * (radius as usize).min(max_half) + 1;
                Ok(vec![1.0 / taps as f32; taps])
            }
            BlurKind::Gaussian { radius } => {
                if !radius.is_finite() || radius < 0.0 {
                    return Err(Error::invalid(format!("invalid blur radius: {radius}")));
                }
                if radius == 0.0 {
                    return Ok(vec![1.0]);
                }
                let sigma = radius / 2.0;
                let half = (radius.ceil() as usize).min(max_half) as isize;
                let mut weights: Vec<f32> = (-half..=half)
                    .map(|i| {
                        let d = i as f32;
                        (-(d * d) / (2.0 * sigma * sigma)).exp()
                    })
                    .collect();
                let sum: f32 = weights.iter().sum();
                weights.iter_mut().for_each(|w| *w /= sum);
                Ok(weights)
            }
            BlurKind::Cubic => Ok(vec![1.0 / 6.0, 4.0 / 6.0, 1.0 / 6.0]),
        }
    }
}

impl PixelBuffer {
    /// Blurs the buffer with `kind`.
    ///
    /// Fails with [`Error::InvalidArgument`] for a negative or non-finite
    /// gaussian radius.
    pub fn blur(&mut self, kind: BlurKind) -> Result<&mut Self> {
        let (w, h) = self.dimensions();
        let (w, h) = (w as usize, h as usize);

        let kernel = kind.kernel(w.max(h))?;
        if kernel.len() == 1 {
            return Ok(self);
        }
        log::trace!("blurring {self} with {kind:?} ({} taps)", kernel.len());

        let half = (kernel.len() / 2) as isize;
        let stride = self.stride();

        for_each_row(self.bitmap_mut(), stride, |_, row| {
            let line = row.to_vec();
            for x in 0..w {
                let mut acc = [0f32; 4];
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - half).clamp(0, w as isize - 1) as usize;
                    for (c, sum) in acc.iter_mut().enumerate() {
                        *sum += line[4 * sx + c] as f32 * weight;
                    }
                }
                store(&mut row[4 * x..4 * x + 4], acc);
            }
        });

        let snapshot = self.bitmap().to_vec();
        for_each_row(self.bitmap_mut(), stride, |y, row| {
            for x in 0..w {
                let mut acc = [0f32; 4];
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = (y as isize + k as isize - half).clamp(0, h as isize - 1) as usize;
                    let o = sy * stride + 4 * x;
                    for (c, sum) in acc.iter_mut().enumerate() {
                        *sum += snapshot[o + c] as f32 * weight;
                    }
                }
                store(&mut row[4 * x..4 * x + 4], acc);
            }
        });

        Ok(self)
    }
}

fn store(px: &mut [u8], acc: [f32; 4]) {
    for (slot, value) in px.iter_mut().zip(acc) {
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }
}
