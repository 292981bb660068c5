//! In-place mirroring.

use super::FlipAxis;
use crate::buffer::PixelBuffer;

impl PixelBuffer {
    /// Mirrors the buffer along `axis`.
    pub fn flip(&mut self, axis: FlipAxis) -> &mut Self {
        let stride = self.stride();
        let height = self.height() as usize;
        let bitmap = self.bitmap_mut();

        match axis {
            FlipAxis::Horizontal => {
                for row in bitmap.chunks_exact_mut(stride) {
                    // Reversing the bytes also reverses each pixel's channels.
                    row.reverse();
                    for px in row.chunks_exact_mut(4) {
                        px.reverse();
                    }
                }
            }
            FlipAxis::Vertical => {
                for y in 0..height / 2 {
                    let (top, bottom) = bitmap.split_at_mut((height - 1 - y) * stride);
                    top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
                }
            }
        }

        self
    }
}
