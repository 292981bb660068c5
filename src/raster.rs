//! Text rendering through an external glyph rasterizer.
//!
//! Font parsing and glyph layout live outside this crate. A [`Rasterizer`]
//! turns a font, a string and a [`TextLayout`] into an RGBA [`Raster`], which
//! becomes a regular [`PixelBuffer`].

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::color::color_to_rgba;
use crate::error::{CodecError, Error, Result};

/// Where the layout may break lines when wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapStyle {
    /// Break between words.
    #[default]
    Word,
    /// Break between any two characters.
    Letter,
}

/// Layout constraints handed to the rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayout {
    /// Font size in pixels.
    pub scale: f32,
    /// Text color as `0xRRGGBBAA`. The rasterizer paints RGB; alpha is applied
    /// afterwards as opacity.
    pub color: u32,
    /// Maximum line width in pixels, unbounded when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_width: Option<u32>,
    #[serde(default)]
    pub wrap_style: WrapStyle,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            scale: 16.0,
            color: 0xffffffff,
            wrap_width: None,
            wrap_style: WrapStyle::Word,
        }
    }
}

impl TextLayout {
    pub fn new(scale: f32, color: u32) -> Self {
        Self {
            scale,
            color,
            ..Self::default()
        }
    }

    pub fn with_wrap(mut self, width: u32, style: WrapStyle) -> Self {
        self.wrap_width = Some(width);
        self.wrap_style = style;
        self
    }
}

/// Straight-alpha RGBA output of a rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub bitmap: Vec<u8>,
}

/// External glyph layout and rasterization.
pub trait Rasterizer {
    /// Lays out `text` with `font` and paints it in the RGB of
    /// `layout.color`.
    fn layout(
        &self,
        font: &[u8],
        text: &str,
        layout: &TextLayout,
    ) -> std::result::Result<Raster, CodecError>;
}

impl PixelBuffer {
    /// Adopts a rasterizer's output, checking that its length matches the
    /// reported dimensions.
    pub fn from_raster(raster: Raster) -> Result<Self> {
        Self::from_raw(raster.width, raster.height, raster.bitmap)
    }

    /// Renders `text` into a new buffer sized to the laid out text.
    pub fn render_text<R>(
        rasterizer: &R,
        font: &[u8],
        text: &str,
        layout: &TextLayout,
    ) -> Result<Self>
    where
        R: Rasterizer + ?Sized,
    {
        if !layout.scale.is_finite() || layout.scale <= 0.0 {
            return Err(Error::invalid(format!("invalid font scale: {}", layout.scale)));
        }

        let raster = rasterizer.layout(font, text, layout).map_err(Error::Codec)?;
        log::debug!(
            "rasterized {} chars at {}x{}",
            text.chars().count(),
            raster.width,
            raster.height
        );

        let mut buffer = Self::from_raster(raster)?;
        let alpha = color_to_rgba(layout.color)[3];
        if alpha != 0xff {
            buffer.opacity(alpha as f32 / 255.0, false)?;
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Paints one opaque cell per character in the layout color.
    struct BlockRasterizer;

    impl Rasterizer for BlockRasterizer {
        fn layout(
            &self,
            font: &[u8],
            text: &str,
            layout: &TextLayout,
        ) -> std::result::Result<Raster, CodecError> {
            if font.is_empty() {
                return Err("empty font".into());
            }
            let [r, g, b, _] = color_to_rgba(layout.color);
            let width = text.chars().count() as u32;
            let bitmap = (0..width).flat_map(|_| [r, g, b, 0xff]).collect();
            Ok(Raster {
                width,
                height: 1,
                bitmap,
            })
        }
    }

    #[test]
    fn applies_color_alpha_as_opacity() {
        let layout = TextLayout::new(12.0, 0xff000080);
        let buffer = PixelBuffer::render_text(&BlockRasterizer, b"font", "abc", &layout).unwrap();
        assert_eq!(buffer.dimensions(), (3, 1));
        assert_eq!(buffer.get(2, 1).unwrap(), 0xff000080);
    }

    #[test]
    fn opaque_color_is_untouched() {
        let layout = TextLayout::default();
        let buffer = PixelBuffer::render_text(&BlockRasterizer, b"font", "ab", &layout).unwrap();
        assert_eq!(buffer.get(1, 1).unwrap(), 0xffffffff);
    }

    #[test]
    fn rasterizer_errors_surface_unchanged() {
        let layout = TextLayout::default();
        let err = PixelBuffer::render_text(&BlockRasterizer, b"", "x", &layout).unwrap_err();
        assert!(matches!(&err, Error::Codec(inner) if inner.to_string() == "empty font"));
    }

    #[test]
    fn mismatched_raster_is_a_capacity_error() {
        let raster = Raster {
            width: 2,
            height: 2,
            bitmap: vec![0; 12],
        };
        assert!(matches!(
            PixelBuffer::from_raster(raster),
            Err(Error::Capacity {
                expected: 16,
                actual: 12
            })
        ));
    }

    #[test]
    fn rejects_bad_scale() {
        let layout = TextLayout::new(f32::NAN, 0xffffffff);
        assert!(PixelBuffer::render_text(&BlockRasterizer, b"font", "x", &layout).is_err());
    }

    #[test]
    fn layout_json() {
        let layout = TextLayout::new(24.0, 0xffffffff).with_wrap(100, WrapStyle::Letter);
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(
            json,
            r#"{"scale":24.0,"color":4294967295,"wrapWidth":100,"wrapStyle":"letter"}"#
        );
        let back: TextLayout = serde_json::from_str(r#"{"scale":8.0,"color":255}"#).unwrap();
        assert_eq!(back.wrap_style, WrapStyle::Word);
        assert_eq!(back.wrap_width, None);
    }
}
