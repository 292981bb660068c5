//! Placing one buffer onto another.
//!
//! Offsets are 0-based and may be negative; whatever falls outside the
//! destination is dropped.

use crate::buffer::PixelBuffer;

/// The overlapping region of `src` placed at `(x, y)` on `dst`:
/// `(src_x, src_y, dst_x, dst_y, width, height)`.
fn clip(
    dst: &PixelBuffer,
    src: &PixelBuffer,
    x: i64,
    y: i64,
) -> Option<(u32, u32, u32, u32, u32, u32)> {
    let left = x.max(0);
    let top = y.max(0);
    let right = x.saturating_add(i64::from(src.width())).min(i64::from(dst.width()));
    let bottom = y.saturating_add(i64::from(src.height())).min(i64::from(dst.height()));

    if left >= right || top >= bottom {
        return None;
    }

    Some((
        (left - x) as u32,
        (top - y) as u32,
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Blends a straight-alpha source pixel over a destination pixel.
///
/// Color channels use `src * sa + dst * (1 - sa)`; alpha combines as
/// `sa + da * (1 - sa)`.
fn blend(src: &[u8], dst: &mut [u8]) {
    match src[3] {
        0 => {}
        255 => dst.copy_from_slice(src),
        alpha => {
            let sa = alpha as f32 / 255.0;
            let da = dst[3] as f32 / 255.0;
            let inv = 1.0 - sa;
            for i in 0..3 {
                let out = src[i] as f32 * sa + dst[i] as f32 * inv;
                dst[i] = out.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = ((sa + da * inv) * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

impl PixelBuffer {
    /// Alpha-composites `src` over this buffer with its top-left corner at
    /// `(x, y)`.
    pub fn overlay(&mut self, src: &PixelBuffer, x: i64, y: i64) -> &mut Self {
        let Some((sx, sy, dx, dy, width, height)) = clip(self, src, x, y) else {
            return self;
        };

        let row_bytes = 4 * width as usize;
        for row in 0..height {
            let s = src.offset(sx, sy + row);
            let d = self.offset(dx, dy + row);
            let src_row = &src.bitmap()[s..s + row_bytes];
            let dst_row = &mut self.bitmap_mut()[d..d + row_bytes];
            for (sp, dp) in src_row.chunks_exact(4).zip(dst_row.chunks_exact_mut(4)) {
                blend(sp, dp);
            }
        }

        self
    }

    /// Copies `src` onto this buffer at `(x, y)`, ignoring alpha.
    pub fn replace(&mut self, src: &PixelBuffer, x: i64, y: i64) -> &mut Self {
        let Some((sx, sy, dx, dy, width, height)) = clip(self, src, x, y) else {
            return self;
        };

        let row_bytes = 4 * width as usize;
        for row in 0..height {
            let s = src.offset(sx, sy + row);
            let d = self.offset(dx, dy + row);
            self.bitmap_mut()[d..d + row_bytes].copy_from_slice(&src.bitmap()[s..s + row_bytes]);
        }

        self
    }
}
