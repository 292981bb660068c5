//! rasterkit: 8-bit RGBA raster image manipulation
//!
//! This crate provides an owned pixel buffer with color math, compositing,
//! geometric transforms and blurs, plus a native lossless chunked container
//! codec. Lossy formats, SVG documents and text are handled by pluggable
//! collaborators.
//!
//! # Example
//!
//! ```
//! use rasterkit::{BlurKind, PixelBuffer, ResizeKind};
//!
//! let mut image = PixelBuffer::new(64, 64).unwrap();
//! image.fill(0x3366ccff);
//! image.draw_circle(32, 32, 16, 0xffffffff);
//!
//! image
//!     .rotate(30.0, true)
//!     .unwrap()
//!     .resize(ResizeKind::Cubic, 48, 48)
//!     .unwrap()
//!     .blur(BlurKind::Gaussian { radius: 2.0 })
//!     .unwrap();
//!
//! let png = image.encode_png(6).unwrap();
//! let decoded = PixelBuffer::decode_png(&png).unwrap();
//! assert_eq!(decoded, image);
//! ```
//!
//! # Recipes
//!
//! Operations can also be described as data with [`Recipe`], which
//! serializes to JSON:
//!
//! ```
//! use rasterkit::{PixelBuffer, Recipe, Step};
//!
//! let json = r#"{"steps":[{"op":"fill","color":255},{"op":"invert"}]}"#;
//! let recipe = Recipe::from_json(json).unwrap();
//!
//! let mut image = PixelBuffer::new(2, 2).unwrap();
//! recipe.apply(&mut image).unwrap();
//! assert_eq!(image.get(1, 1).unwrap(), 0xffffffff);
//! ```

mod adjust;
mod blur;
mod buffer;
pub mod codec;
pub mod color;
mod composite;
mod error;
mod raster;
mod recipe;
mod rows;
pub mod svg;
mod transform;

pub use blur::BlurKind;
pub use buffer::{Coordinate, PixelBuffer};
pub use codec::{
    Codecs, DecodeFormat, DecodeLimits, EncodeFormat, ImageFormat, JpegCodec, LossyCodec,
    LossyFrame,
};
pub use color::Gradient;
pub use error::{CodecError, Error, FormatError, Result};
pub use raster::{Raster, Rasterizer, TextLayout, WrapStyle};
pub use recipe::{Recipe, Step};
pub use svg::SvgFit;
pub use transform::{FlipAxis, ResizeKind};
