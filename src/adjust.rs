//! Per-pixel color adjustments.

use crate::buffer::PixelBuffer;
use crate::color::{self, color_to_rgba, hsla_to_color, rgba_to_hsla};
use crate::error::{Error, Result};

fn check_factor(name: &str, value: f32) -> Result<()> {
    if value.is_nan() || value < 0.0 {
        return Err(Error::invalid(format!("invalid {name} value: {value}")));
    }
    Ok(())
}

impl PixelBuffer {
    /// Scales (or with `absolute`, sets) the alpha channel. `opacity` is a
    /// factor in `0..=1`.
    pub fn opacity(&mut self, opacity: f32, absolute: bool) -> Result<&mut Self> {
        check_factor("opacity", opacity)?;
        self.scale_channel(3, opacity, absolute);
        Ok(self)
    }

    /// Scales or sets the red channel.
    pub fn red(&mut self, saturation: f32, absolute: bool) -> Result<&mut Self> {
        check_factor("saturation", saturation)?;
        self.scale_channel(0, saturation, absolute);
        Ok(self)
    }

    /// Scales or sets the green channel.
    pub fn green(&mut self, saturation: f32, absolute: bool) -> Result<&mut Self> {
        check_factor("saturation", saturation)?;
        self.scale_channel(1, saturation, absolute);
        Ok(self)
    }

    /// Scales or sets the blue channel.
    pub fn blue(&mut self, saturation: f32, absolute: bool) -> Result<&mut Self> {
        check_factor("saturation", saturation)?;
        self.scale_channel(2, saturation, absolute);
        Ok(self)
    }

    fn scale_channel(&mut self, channel: usize, value: f32, absolute: bool) {
        for px in self.bitmap_mut().chunks_exact_mut(4) {
            let base = if absolute { 255.0 } else { px[channel] as f32 };
            px[channel] = (value * base).round().clamp(0.0, 255.0) as u8;
        }
    }

    /// Scales or sets the HSL lightness of every pixel.
    pub fn lightness(&mut self, value: f32, absolute: bool) -> Result<&mut Self> {
        check_factor("lightness", value)?;
        self.map_hsla(|[h, s, l, a]| [h, s, value * if absolute { 1.0 } else { l }, a]);
        Ok(self)
    }

    /// Scales or sets the HSL saturation of every pixel.
    pub fn saturation(&mut self, value: f32, absolute: bool) -> Result<&mut Self> {
        check_factor("saturation", value)?;
        self.map_hsla(|[h, s, l, a]| [h, value * if absolute { 1.0 } else { s }, l, a]);
        Ok(self)
    }

    /// Rotates the hue of every pixel by `degrees`.
    pub fn hue_shift(&mut self, degrees: f32) -> Result<&mut Self> {
        if !degrees.is_finite() {
            return Err(Error::invalid(format!("invalid hue shift: {degrees}")));
        }
        self.map_hsla(|[h, s, l, a]| [h + degrees / 360.0, s, l, a]);
        Ok(self)
    }

    /// Inverts the color channels, leaving alpha untouched.
    pub fn invert(&mut self) -> &mut Self {
        for px in self.bitmap_mut().chunks_exact_mut(4) {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        }
        self
    }

    /// Inverts HSL lightness.
    pub fn invert_value(&mut self) -> &mut Self {
        self.map_hsla(|[h, s, l, a]| [h, s, 1.0 - l, a]);
        self
    }

    /// Inverts HSL saturation.
    pub fn invert_saturation(&mut self) -> &mut Self {
        self.map_hsla(|[h, s, l, a]| [h, 1.0 - s, l, a]);
        self
    }

    /// Mirrors the hue around zero.
    pub fn invert_hue(&mut self) -> &mut Self {
        self.map_hsla(|[h, s, l, a]| [1.0 - h, s, l, a]);
        self
    }

    fn map_hsla<F>(&mut self, f: F)
    where
        F: Fn([f32; 4]) -> [f32; 4],
    {
        for px in self.bitmap_mut().chunks_exact_mut(4) {
            let [h, s, l, a] = f(rgba_to_hsla(px[0], px[1], px[2], px[3]));
            px.copy_from_slice(&color_to_rgba(hsla_to_color(h, s, l, a)));
        }
    }

    /// See [`color::average_color`].
    pub fn average_color(&self) -> u32 {
        color::average_color(self)
    }

    /// See [`color::dominant_color`].
    pub fn dominant_color(
        &self,
        ignore_black: bool,
        ignore_white: bool,
        threshold: u8,
    ) -> Result<u32> {
        color::dominant_color(self, ignore_black, ignore_white, threshold)
    }
}
