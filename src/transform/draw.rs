//! Filled shapes and corner rounding.
//!
//! Shape positions use the same 1-based coordinates as
//! [`PixelBuffer::get`]. Shapes may extend past the edges; only the part
//! inside the buffer is drawn.

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

/// 0-based half-open span `[start, end)` of a 1-based run of `len` pixels
/// starting at `from`, clipped to `0..bound`.
fn clip_span(from: i64, len: u32, bound: u32) -> Option<(u32, u32)> {
    let from = from.saturating_sub(1);
    let start = from.max(0);
    let end = from.saturating_add(i64::from(len)).min(i64::from(bound));
    (start < end).then(|| (start as u32, end as u32))
}

impl PixelBuffer {
    /// Fills a `width` x `height` box whose top-left pixel is `(x, y)`.
    pub fn draw_box(&mut self, x: i64, y: i64, width: u32, height: u32, color: u32) -> &mut Self {
        let (Some((left, right)), Some((top, bottom))) = (
            clip_span(x, width, self.width()),
            clip_span(y, height, self.height()),
        ) else {
            return self;
        };

        let start = self.offset(left, top);
        let end = self.offset(right, top);
        let stride = self.stride();
        let bitmap = self.bitmap_mut();

        let bytes = color.to_be_bytes();
        for px in bitmap[start..end].chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
        for row in 1..(bottom - top) as usize {
            bitmap.copy_within(start..end, start + row * stride);
        }

        self
    }

    /// Fills a box with the colors returned by `f(bx, by)`, where `(bx, by)`
    /// is the 1-based position inside the box. `f` is not called for pixels
    /// outside the buffer.
    pub fn draw_box_with<F>(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        mut f: F,
    ) -> &mut Self
    where
        F: FnMut(u32, u32) -> u32,
    {
        let (Some((left, right)), Some((top, bottom))) = (
            clip_span(x, width, self.width()),
            clip_span(y, height, self.height()),
        ) else {
            return self;
        };

        for py in top..bottom {
            for px in left..right {
                let bx = (i64::from(px) - (x - 1) + 1) as u32;
                let by = (i64::from(py) - (y - 1) + 1) as u32;
                self.put(px, py, f(bx, by));
            }
        }

        self
    }

    /// Fills the pixels strictly closer than `radius` to the center `(x, y)`.
    pub fn draw_circle(&mut self, x: i64, y: i64, radius: u32, color: u32) -> &mut Self {
        self.draw_circle_with(x, y, radius, |_, _| color)
    }

    /// Fills a circle with the colors returned by `f(cx, cy)`, where
    /// `(cx, cy)` is the position inside the circle's bounding box with the
    /// center at `(radius, radius)`.
    pub fn draw_circle_with<F>(&mut self, x: i64, y: i64, radius: u32, mut f: F) -> &mut Self
    where
        F: FnMut(u32, u32) -> u32,
    {
        let r = i64::from(radius);
        let r2 = i128::from(r) * i128::from(r);
        let (w, h) = (i64::from(self.width()), i64::from(self.height()));

        for py in y.saturating_sub(r).max(1)..=y.saturating_add(r).min(h) {
            for px in x.saturating_sub(r).max(1)..=x.saturating_add(r).min(w) {
                let (dx, dy) = (px - x, py - y);
                if i128::from(dx).pow(2) + i128::from(dy).pow(2) < r2 {
                    let to_box = |d: i64| (d + r).min(i64::from(u32::MAX)) as u32;
                    let color = f(to_box(dx), to_box(dy));
                    self.put((px - 1) as u32, (py - 1) as u32, color);
                }
            }
        }

        self
    }

    /// Makes the corners transparent outside quarter circles of `radius`.
    ///
    /// The radius defaults to a quarter of the shorter side.
    pub fn round_corners(&mut self, radius: Option<f64>) -> Result<&mut Self> {
        let (w, h) = self.dimensions();
        let radius = radius.unwrap_or(w.min(h) as f64 / 4.0);
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::invalid(format!("invalid corner radius: {radius}")));
        }

        let r2 = radius * radius;
        let width = w as usize;
        for (i, px) in self.bitmap_mut().chunks_exact_mut(4).enumerate() {
            let (x, y) = ((i % width) as u32, (i / width) as u32);
            // 1-based distance from the nearest vertical and horizontal edge.
            let ex = (x + 1).min(w - x) as f64;
            let ey = (y + 1).min(h - y) as f64;
            if ex > radius || ey > radius {
                continue;
            }
            if (ex - radius).powi(2) + (ey - radius).powi(2) > r2 {
                px[3] = 0;
            }
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_covering_buffer_fills_everything() {
        let mut buffer = PixelBuffer::new(2, 2).unwrap();
        buffer.draw_box(1, 1, 2, 2, 0xff0000ff);
        assert!(buffer.pixels().all(|(_, _, c)| c == 0xff0000ff));
    }

    #[test]
    fn box_is_clipped() {
        let mut buffer = PixelBuffer::new(4, 4).unwrap();
        buffer.draw_box(3, -1, 5, 4, 0x00ff00ff);
        assert_eq!(buffer.get(3, 1).unwrap(), 0x00ff00ff);
        assert_eq!(buffer.get(4, 2).unwrap(), 0x00ff00ff);
        assert_eq!(buffer.get(4, 3).unwrap(), 0);
        assert_eq!(buffer.get(2, 1).unwrap(), 0);
    }

    #[test]
    fn box_outside_is_ignored() {
        let mut buffer = PixelBuffer::new(3, 3).unwrap();
        buffer.draw_box(4, 1, 2, 2, 0xffffffff);
        buffer.draw_box(1, 1, 0, 2, 0xffffffff);
        assert!(buffer.bitmap().iter().all(|&b| b == 0));
    }

    #[test]
    fn extreme_positions_draw_nothing() {
        let mut buffer = PixelBuffer::new(3, 3).unwrap();
        buffer
            .draw_box(i64::MIN, 1, 2, 2, 0xffffffff)
            .draw_box(1, i64::MAX, 2, 2, 0xffffffff)
            .draw_box(i64::MAX, i64::MIN, u32::MAX, u32::MAX, 0xffffffff)
            .draw_circle(i64::MIN, i64::MAX, u32::MAX, 0xffffffff)
            .draw_circle(i64::MAX, 2, 4, 0xffffffff);
        assert!(buffer.bitmap().iter().all(|&b| b == 0));
    }

    #[test]
    fn huge_circle_covers_buffer() {
        let mut buffer = PixelBuffer::new(2, 2).unwrap();
        buffer.draw_circle(1, 1, u32::MAX, 0x00ff00ff);
        assert!(buffer.pixels().all(|(_, _, c)| c == 0x00ff00ff));
    }

    #[test]
    fn huge_box_from_far_left_covers_buffer() {
        let mut buffer = PixelBuffer::new(2, 2).unwrap();
        buffer.draw_box(-i64::from(u32::MAX) + 3, 1, u32::MAX, 2, 0xff0000ff);
        assert!(buffer.pixels().all(|(_, _, c)| c == 0xff0000ff));
    }

    #[test]
    fn box_callback_gets_box_coordinates() {
        let mut buffer = PixelBuffer::new(4, 4).unwrap();
        buffer.draw_box_with(0, 2, 3, 2, |bx, by| (bx << 8) | by);
        // Column 0 is outside, so the first drawn pixel is box column 2.
        assert_eq!(buffer.get(1, 2).unwrap(), 0x0201);
        assert_eq!(buffer.get(2, 3).unwrap(), 0x0302);
        assert_eq!(buffer.get(3, 2).unwrap(), 0);
    }

    #[test]
    fn circle_is_strict() {
        let mut buffer = PixelBuffer::new(5, 5).unwrap();
        buffer.draw_circle(3, 3, 2, 0xffffffff);
        assert_eq!(buffer.get(3, 3).unwrap(), 0xffffffff);
        assert_eq!(buffer.get(2, 2).unwrap(), 0xffffffff);
        assert_eq!(buffer.get(3, 1).unwrap(), 0);
        assert_eq!(buffer.get(1, 1).unwrap(), 0);
    }

    #[test]
    fn circle_callback_is_centered_on_radius() {
        let mut buffer = PixelBuffer::new(5, 5).unwrap();
        let mut seen = Vec::new();
        buffer.draw_circle_with(3, 3, 1, |cx, cy| {
            seen.push((cx, cy));
            0xff
        });
        assert_eq!(seen, vec![(1, 1)]);
    }

    #[test]
    fn corners_are_rounded() {
        let mut buffer = PixelBuffer::new(8, 8).unwrap();
        buffer.fill(0xffffffff);
        buffer.round_corners(Some(4.0)).unwrap();
        for (x, y) in [(1, 1), (8, 1), (1, 8), (8, 8)] {
            assert_eq!(buffer.get(x, y).unwrap(), 0xffffff00, "({x}, {y})");
        }
        assert_eq!(buffer.get(2, 1).unwrap(), 0xffffffff);
        assert_eq!(buffer.get(4, 4).unwrap(), 0xffffffff);
    }

    #[test]
    fn default_radius_is_a_quarter_of_the_short_side() {
        let mut buffer = PixelBuffer::new(32, 16).unwrap();
        buffer.fill(0xffffffff);
        buffer.round_corners(None).unwrap();
        assert_eq!(buffer.get(1, 1).unwrap() & 0xff, 0);
        assert_eq!(buffer.get(2, 2).unwrap() & 0xff, 0xff);
    }

    #[test]
    fn negative_radius_fails() {
        let mut buffer = PixelBuffer::new(2, 2).unwrap();
        assert!(buffer.round_corners(Some(-1.0)).is_err());
    }
}
