//! Color conversions, gradients and whole-image color statistics.
//!
//! Colors are packed big-endian as `0xRRGGBBAA`. HSL values (and the alpha
//! that travels with them) are normalized to `[0, 1]`; hue wraps modulo 1 in
//! both directions, so a hue of `1.2` is the same as `0.2`.

use palette::{Hsl, IntoColor, Srgb};

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

/// Default lightness threshold for [`dominant_color`], about a quarter of the
/// 64 lightness levels.
pub const DEFAULT_BW_THRESHOLD: u8 = 0xf;

const LEVELS: f32 = 63.0;

// ============================================================================
// Packing
// ============================================================================

/// Packs four channels into `0xRRGGBBAA`.
pub fn rgba_to_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_be_bytes([r, g, b, a])
}

/// Unpacks `0xRRGGBBAA` into `[r, g, b, a]`.
pub fn color_to_rgba(color: u32) -> [u8; 4] {
    color.to_be_bytes()
}

/// Clamps a channel value to `[0, 255]` and truncates it.
///
/// NaN maps to 0.
pub fn clamp_channel(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Converts a unit-range value to the nearest channel value.
fn unit_to_channel(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// HSL
// ============================================================================

/// Converts RGBA channels to `[h, s, l, a]`, each in `[0, 1]`.
pub fn rgba_to_hsla(r: u8, g: u8, b: u8, a: u8) -> [f32; 4] {
    let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let hsl: Hsl = rgb.into_color();
    let hue = (hsl.hue.into_positive_degrees() / 360.0).rem_euclid(1.0);
    [hue, hsl.saturation, hsl.lightness, a as f32 / 255.0]
}

/// Converts normalized HSLA to a packed color.
///
/// Hue wraps modulo 1; saturation, lightness and alpha are clamped to
/// `[0, 1]`.
pub fn hsla_to_color(h: f32, s: f32, l: f32, a: f32) -> u32 {
    let hsl = Hsl::new(
        h.rem_euclid(1.0) * 360.0,
        s.clamp(0.0, 1.0),
        l.clamp(0.0, 1.0),
    );
    let rgb: Srgb = hsl.into_color();
    rgba_to_color(
        unit_to_channel(rgb.red),
        unit_to_channel(rgb.green),
        unit_to_channel(rgb.blue),
        unit_to_channel(a),
    )
}

// ============================================================================
// Gradient
// ============================================================================

/// Linearly interpolates each channel between two colors.
///
/// `t` is not clamped; results are clamped per channel.
pub fn lerp_color(start: u32, end: u32, t: f64) -> u32 {
    let s = color_to_rgba(start);
    let e = color_to_rgba(end);
    let channel = |i: usize| {
        let from = s[i] as f64;
        clamp_channel((from + t * (e[i] as f64 - from)) as f32)
    };
    rgba_to_color(channel(0), channel(1), channel(2), channel(3))
}

/// A multi-point color gradient.
///
/// Stops are sorted by position. Evaluating below the first stop or above
/// the last returns that stop's color; between stops the two neighbors are
/// interpolated linearly per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, u32)>,
}

impl Gradient {
    /// Builds a gradient from `(position, color)` points in any order.
    ///
    /// Fails when there are no points, a position is not finite, or two
    /// points share a position.
    pub fn new<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, u32)>,
    {
        let mut stops: Vec<(f64, u32)> = points.into_iter().collect();
        if stops.is_empty() {
            return Err(Error::invalid("invalid gradient point count (0)"));
        }
        if let Some((position, _)) = stops.iter().find(|(p, _)| !p.is_finite()) {
            return Err(Error::invalid(format!(
                "invalid gradient position: {position}"
            )));
        }

        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = stops.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::invalid(format!(
                "duplicate gradient position: {}",
                pair[0].0
            )));
        }

        Ok(Self { stops })
    }

    /// The sorted stops.
    pub fn stops(&self) -> &[(f64, u32)] {
        &self.stops
    }

    /// Evaluates the gradient at `position`. NaN evaluates to the first stop.
    pub fn at(&self, position: f64) -> u32 {
        let (first_pos, first_color) = self.stops[0];
        let (last_pos, last_color) = self.stops[self.stops.len() - 1];

        if self.stops.len() == 1 || position.is_nan() || position <= first_pos {
            return first_color;
        }
        if position >= last_pos {
            return last_color;
        }

        // First stop strictly after `position`; always in 1..len here.
        let upper = self.stops.partition_point(|(p, _)| *p <= position);
        let (p0, c0) = self.stops[upper - 1];
        let (p1, c1) = self.stops[upper];
        if position == p0 {
            return c0;
        }

        lerp_color(c0, c1, (position - p0) / (p1 - p0))
    }
}

/// Returns a closure evaluating a gradient built from `points`.
pub fn gradient<I>(points: I) -> Result<impl Fn(f64) -> u32>
where
    I: IntoIterator<Item = (f64, u32)>,
{
    let gradient = Gradient::new(points)?;
    Ok(move |position| gradient.at(position))
}

// ============================================================================
// Statistics
// ============================================================================

/// Alpha-weighted mean color with alpha fixed at 255.
///
/// Fully transparent pixels carry no weight. A buffer with no visible pixels
/// yields opaque black.
pub fn average_color(buffer: &PixelBuffer) -> u32 {
    let mut sums = [0f64; 3];
    let mut divisor = 0f64;

    for px in buffer.bitmap().chunks_exact(4) {
        let weight = px[3] as f64 / 255.0;
        for (sum, &channel) in sums.iter_mut().zip(px) {
            *sum += channel as f64 * weight;
        }
        divisor += weight;
    }

    if divisor <= 0.0 {
        return 0x0000_00ff;
    }

    let mean = |sum: f64| clamp_channel((sum / divisor).round() as f32);
    rgba_to_color(mean(sums[0]), mean(sums[1]), mean(sums[2]), 0xff)
}

fn hsl_key(px: &[u8]) -> usize {
    let [h, s, l, _] = rgba_to_hsla(px[0], px[1], px[2], px[3]);
    let q = |v: f32| ((v * LEVELS) as usize).min(LEVELS as usize);
    (q(h) << 12) | (q(s) << 6) | q(l)
}

/// The most frequent color after quantizing each pixel's HSL to 64 levels
/// per component.
///
/// With `ignore_black`, buckets whose lightness level is below `threshold`
/// are skipped; with `ignore_white`, those above `63 - threshold`. When the
/// exclusions leave nothing, the threshold is relaxed one level at a time.
/// Fully transparent pixels never count. Fails with
/// [`Error::NoColorFound`] once the threshold is exhausted.
pub fn dominant_color(
    buffer: &PixelBuffer,
    ignore_black: bool,
    ignore_white: bool,
    threshold: u8,
) -> Result<u32> {
    let mut counts = vec![0u32; 1 << 18];
    for px in buffer.bitmap().chunks_exact(4) {
        if px[3] == 0 {
            continue;
        }
        counts[hsl_key(px)] += 1;
    }

    let mut threshold = threshold.min(LEVELS as u8 + 1) as usize;
    loop {
        let mut best: Option<(usize, u32)> = None;
        for (key, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let lightness = key & 0x3f;
            if ignore_black && lightness < threshold {
                continue;
            }
            if ignore_white && lightness > LEVELS as usize - threshold.min(LEVELS as usize) {
                continue;
            }
            // Ties resolve to the later bucket.
            if best.is_none_or(|(_, max)| count >= max) {
                best = Some((key, count));
            }
        }

        if let Some((key, _)) = best {
            let h = ((key >> 12) & 0x3f) as f32 / LEVELS;
            let s = ((key >> 6) & 0x3f) as f32 / LEVELS;
            let l = (key & 0x3f) as f32 / LEVELS;
            return Ok(hsla_to_color(h, s, l, 1.0));
        }

        if threshold == 0 {
            return Err(Error::NoColorFound);
        }
        threshold -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_is_exact() {
        assert_eq!(rgba_to_color(0x12, 0x34, 0x56, 0x78), 0x12345678);
        assert_eq!(color_to_rgba(0x12345678), [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(clamp_channel(300.0), 255);
        assert_eq!(clamp_channel(-4.0), 0);
        assert_eq!(clamp_channel(127.9), 127);
    }

    #[test]
    fn hsl_primary_colors() {
        let [h, s, l, a] = rgba_to_hsla(255, 0, 0, 255);
        assert!(h.abs() < 1e-6);
        assert!((s - 1.0).abs() < 1e-6);
        assert!((l - 0.5).abs() < 1e-6);
        assert_eq!(a, 1.0);

        let [h, ..] = rgba_to_hsla(0, 0, 255, 255);
        assert!((h - 2.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn hue_wraps_in_both_directions() {
        assert_eq!(hsla_to_color(1.2, 1.0, 0.5, 1.0), hsla_to_color(0.2, 1.0, 0.5, 1.0));
        assert_eq!(hsla_to_color(-0.8, 1.0, 0.5, 1.0), hsla_to_color(0.2, 1.0, 0.5, 1.0));
        assert_eq!(hsla_to_color(1.0, 1.0, 0.5, 1.0), 0xff0000ff);
    }

    #[test]
    fn hsl_roundtrip_within_one_unit() {
        for r in (0..=255u16).step_by(5) {
            for g in (0..=255u16).step_by(5) {
                for b in (0..=255u16).step_by(5) {
                    let (r, g, b) = (r as u8, g as u8, b as u8);
                    let [h, s, l, a] = rgba_to_hsla(r, g, b, 255);
                    let [r2, g2, b2, a2] = color_to_rgba(hsla_to_color(h, s, l, a));
                    assert!(r.abs_diff(r2) <= 1, "{r},{g},{b}");
                    assert!(g.abs_diff(g2) <= 1, "{r},{g},{b}");
                    assert!(b.abs_diff(b2) <= 1, "{r},{g},{b}");
                    assert_eq!(a2, 255);
                }
            }
        }
    }

    #[test]
    fn gradient_two_points() {
        let g = gradient([(0.0, 0xff0000ff), (1.0, 0x0000ffff)]).unwrap();
        assert_eq!(g(0.0), 0xff0000ff);
        assert_eq!(g(1.0), 0x0000ffff);
        assert_eq!(g(0.5), 0x7f007fff);
        assert_eq!(g(-3.0), 0xff0000ff);
        assert_eq!(g(7.0), 0x0000ffff);
    }

    #[test]
    fn gradient_many_points_hits_stops_exactly() {
        let g = Gradient::new([(1.0, 0x00ff00ff), (0.0, 0xff0000ff), (0.5, 0x0000ffff)]).unwrap();
        assert_eq!(g.stops()[0].0, 0.0);
        assert_eq!(g.at(0.5), 0x0000ffff);
        assert_eq!(g.at(1.0), 0x00ff00ff);
        assert_eq!(g.at(0.25), lerp_color(0xff0000ff, 0x0000ffff, 0.5));
        assert_eq!(g.at(0.75), lerp_color(0x0000ffff, 0x00ff00ff, 0.5));
    }

    #[test]
    fn gradient_single_point_is_constant() {
        let g = Gradient::new([(0.3, 0x12345678)]).unwrap();
        assert_eq!(g.at(-10.0), 0x12345678);
        assert_eq!(g.at(10.0), 0x12345678);
    }

    #[test]
    fn gradient_rejects_bad_points() {
        assert!(matches!(
            Gradient::new(Vec::new()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(Gradient::new([(f64::NAN, 0)]).is_err());
        assert!(Gradient::new([(0.5, 0), (0.5, 1)]).is_err());
    }

    #[test]
    fn average_of_solid_fill() {
        let mut buffer = PixelBuffer::new(4, 4).unwrap();
        buffer.fill(0x112233ff);
        assert_eq!(average_color(&buffer), 0x112233ff);
    }

    #[test]
    fn average_ignores_transparent_pixels() {
        let mut buffer = PixelBuffer::new(2, 1).unwrap();
        buffer.set(1, 1, 0xff000000).unwrap();
        buffer.set(2, 1, 0x00ff0080).unwrap();
        assert_eq!(average_color(&buffer), 0x00ff00ff);
    }

    #[test]
    fn average_of_transparent_buffer_is_black() {
        let buffer = PixelBuffer::new(3, 3).unwrap();
        assert_eq!(average_color(&buffer), 0x000000ff);
    }

    #[test]
    fn dominant_picks_most_frequent_bucket() {
        let mut buffer = PixelBuffer::new(3, 1).unwrap();
        buffer.fill(0xff0000ff);
        buffer.set(3, 1, 0x0000ffff).unwrap();
        let color = dominant_color(&buffer, true, true, DEFAULT_BW_THRESHOLD).unwrap();
        let [r, g, b, a] = color_to_rgba(color);
        assert!(r > 240 && g < 10 && b < 10);
        assert_eq!(a, 255);
    }

    #[test]
    fn dominant_relaxes_threshold_for_black_images() {
        let mut buffer = PixelBuffer::new(2, 2).unwrap();
        buffer.fill(0x000000ff);
        assert_eq!(
            dominant_color(&buffer, true, true, DEFAULT_BW_THRESHOLD).unwrap(),
            0x000000ff
        );
    }

    #[test]
    fn dominant_of_transparent_buffer_fails() {
        let buffer = PixelBuffer::new(2, 2).unwrap();
        assert!(matches!(
            dominant_color(&buffer, true, true, DEFAULT_BW_THRESHOLD),
            Err(Error::NoColorFound)
        ));
    }
}
