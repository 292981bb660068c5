//! Box and circle crops.

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

impl PixelBuffer {
    /// Returns the `width` x `height` region whose top-left corner sits at the
    /// 0-based offset `(x, y)`. Parts of the region outside this buffer are
    /// transparent black.
    pub fn cropped(&self, x: i64, y: i64, width: u32, height: u32) -> Result<PixelBuffer> {
        let mut region = PixelBuffer::new(width, height)?;
        region.replace(self, x.saturating_neg(), y.saturating_neg());
        Ok(region)
    }

    /// Crops the buffer in place to the region described by [`cropped`].
    ///
    /// [`cropped`]: PixelBuffer::cropped
    pub fn crop(&mut self, x: i64, y: i64, width: u32, height: u32) -> Result<&mut Self> {
        let region = self.cropped(x, y, width, height)?;
        self.replace_storage(region);
        Ok(self)
    }

    /// Masks the buffer to the largest centered circle.
    ///
    /// Pixels closer to the center than `radius * (1 - feathering)` keep
    /// their alpha, pixels beyond `radius` become fully transparent, and the
    /// band between fades linearly. `feathering` must lie in `0..=1`.
    pub fn crop_circle(&mut self, feathering: f64) -> Result<&mut Self> {
        if !(0.0..=1.0).contains(&feathering) {
            return Err(Error::invalid(format!(
                "feathering must be within 0..=1 (got {feathering})"
            )));
        }

        let (w, h) = self.dimensions();
        let radius = w.min(h) as f64 / 2.0;
        let inner = radius * (1.0 - feathering);
        let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
        let width = w as usize;

        for (i, px) in self.bitmap_mut().chunks_exact_mut(4).enumerate() {
            let dx = (i % width) as f64 + 0.5 - cx;
            let dy = (i / width) as f64 + 0.5 - cy;
            let distance = (dx * dx + dy * dy).sqrt();

            if distance <= inner {
                continue;
            }
            px[3] = if distance >= radius {
                0
            } else {
                let keep = (radius - distance) / (radius - inner);
                (px[3] as f64 * keep).round() as u8
            };
        }

        Ok(self)
    }
}
