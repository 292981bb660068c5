//! Encoding and decoding of whole buffers.
//!
//! [`png`] implements the lossless tile container format natively. Lossy
//! images go through a [`LossyCodec`] collaborator registered on a
//! [`Codecs`] value, and SVG documents are rasterized by [`crate::svg`].
//!
//! # Example
//!
//! ```
//! use rasterkit::codec::{Codecs, DecodeFormat, EncodeFormat};
//! use rasterkit::PixelBuffer;
//!
//! let mut buffer = PixelBuffer::new(4, 4).unwrap();
//! buffer.fill(0x112233ff);
//!
//! let codecs = Codecs::new();
//! let bytes = codecs.encode(&buffer, &EncodeFormat::Png { level: 6 }).unwrap();
//! let decoded = codecs.decode(&bytes, &DecodeFormat::Auto).unwrap();
//! assert_eq!(decoded, buffer);
//! ```

pub mod jpeg;
pub mod png;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::{CodecError, Error, FormatError, Result};
use crate::svg::{self, SvgFit};

pub use jpeg::JpegCodec;

// ============================================================================
// Format detection
// ============================================================================

/// Container formats recognized by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Tiff,
}

impl ImageFormat {
    /// Detects the format from magic bytes. Returns `None` if unrecognized.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xff, 0xd8, 0xff]) {
            return Some(Self::Jpeg);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }
        if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            return Some(Self::Tiff);
        }
        None
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Options
// ============================================================================

/// How to interpret the bytes handed to [`Codecs::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum DecodeFormat {
    /// Detect the format from its magic bytes.
    #[default]
    Auto,
    Png,
    Jpeg,
    /// Rasterize an SVG document, optionally scaled.
    Svg {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fit: Option<SvgFit>,
    },
}

/// Output format for [`Codecs::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum EncodeFormat {
    /// Lossless tile container; `level` 0 stores, 1-9 deflate.
    Png {
        #[serde(default)]
        level: u8,
    },
    /// Lossy output through the registered collaborator, `quality` 1-100.
    Jpeg {
        #[serde(default = "default_quality")]
        quality: u8,
    },
}

impl Default for EncodeFormat {
    fn default() -> Self {
        Self::Png { level: 0 }
    }
}

fn default_quality() -> u8 {
    90
}

/// Caps checked against the declared dimensions before any pixel data is
/// decoded. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pixels: Option<u64>,
}

impl DecodeLimits {
    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    /// Fails with [`FormatError::TooLarge`] when any cap is exceeded.
    pub fn check(&self, width: u32, height: u32) -> std::result::Result<(), FormatError> {
        let over = self.max_width.is_some_and(|max| width > max)
            || self.max_height.is_some_and(|max| height > max)
            || self
                .max_pixels
                .is_some_and(|max| u64::from(width) * u64::from(height) > max);
        if over {
            return Err(FormatError::TooLarge { width, height });
        }
        Ok(())
    }
}

// ============================================================================
// Lossy collaborator
// ============================================================================

/// A decoded lossy frame with 1 to 4 interleaved 8-bit channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossyFrame {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub bytes: Vec<u8>,
}

/// Narrow interface to an external lossy codec.
///
/// Implementations own whatever native state they need and are loaded once;
/// per-call failures are reported as [`CodecError`] and surface unchanged as
/// [`Error::Codec`].
pub trait LossyCodec: Send + Sync {
    /// Encodes straight-alpha RGBA pixels at `quality` (1-100).
    fn encode(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        quality: u8,
    ) -> std::result::Result<Vec<u8>, CodecError>;

    /// Decodes `bytes` into a frame.
    fn decode(&self, bytes: &[u8]) -> std::result::Result<LossyFrame, CodecError>;
}

/// Expands 1 (grey), 2 (grey + alpha), 3 (RGB) or 4 (RGBA) channel pixels
/// to RGBA.
pub fn expand_channels(bytes: Vec<u8>, channels: u8) -> Result<Vec<u8>> {
    Ok(match channels {
        4 => bytes,
        3 => expand(&bytes, 3, |p| [p[0], p[1], p[2], 0xff]),
        2 => expand(&bytes, 2, |p| [p[0], p[0], p[0], p[1]]),
        1 => expand(&bytes, 1, |p| [p[0], p[0], p[0], 0xff]),
        other => return Err(Error::invalid(format!("unsupported channel count {other}"))),
    })
}

fn expand(bytes: &[u8], channels: usize, to_rgba: impl Fn(&[u8]) -> [u8; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() / channels * 4);
    for px in bytes.chunks_exact(channels) {
        out.extend_from_slice(&to_rgba(px));
    }
    out
}

// ============================================================================
// Codecs
// ============================================================================

/// Format dispatch with an optional lossy collaborator and decode limits.
#[derive(Default)]
pub struct Codecs {
    lossy: Option<Box<dyn LossyCodec>>,
    limits: DecodeLimits,
}

impl Codecs {
    /// Codecs without a lossy collaborator and without limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the lossy collaborator.
    pub fn with_lossy(mut self, codec: impl LossyCodec + 'static) -> Self {
        self.lossy = Some(Box::new(codec));
        self
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    pub fn has_lossy(&self) -> bool {
        self.lossy.is_some()
    }

    fn lossy(&self) -> Result<&dyn LossyCodec> {
        self.lossy
            .as_deref()
            .ok_or_else(|| Error::UnsupportedFormat("jpeg (no lossy codec registered)".into()))
    }

    /// Decodes `bytes` as `format`.
    pub fn decode(&self, bytes: &[u8], format: &DecodeFormat) -> Result<PixelBuffer> {
        match format {
            DecodeFormat::Auto => match ImageFormat::sniff(bytes) {
                Some(ImageFormat::Png) => png::decode(bytes, &self.limits),
                Some(ImageFormat::Jpeg) => self.decode_lossy(bytes),
                Some(other) => Err(Error::UnsupportedFormat(other.to_string())),
                None => Err(Error::UnsupportedFormat("unrecognized magic bytes".into())),
            },
            DecodeFormat::Png => png::decode(bytes, &self.limits),
            DecodeFormat::Jpeg => self.decode_lossy(bytes),
            DecodeFormat::Svg { fit } => {
                let buffer = svg::rasterize(bytes, *fit)?;
                self.limits.check(buffer.width(), buffer.height())?;
                Ok(buffer)
            }
        }
    }

    fn decode_lossy(&self, bytes: &[u8]) -> Result<PixelBuffer> {
        let frame = self.lossy()?.decode(bytes).map_err(Error::Codec)?;
        self.limits.check(frame.width, frame.height)?;
        log::debug!(
            "lossy decode: {}x{} with {} channels from {} bytes",
            frame.width,
            frame.height,
            frame.channels,
            bytes.len()
        );
        let bitmap = expand_channels(frame.bytes, frame.channels)?;
        PixelBuffer::from_raw(frame.width, frame.height, bitmap)
    }

    /// Encodes `buffer` as `format`.
    pub fn encode(&self, buffer: &PixelBuffer, format: &EncodeFormat) -> Result<Vec<u8>> {
        match *format {
            EncodeFormat::Png { level } => png::encode(buffer, level),
            EncodeFormat::Jpeg { quality } => {
                if !(1..=100).contains(&quality) {
                    return Err(Error::invalid(format!(
                        "jpeg quality must be 1..=100 (got {quality})"
                    )));
                }
                let (width, height) = buffer.dimensions();
                let bytes = self
                    .lossy()?
                    .encode(buffer.bitmap(), width, height, quality)
                    .map_err(Error::Codec)?;
                log::debug!(
                    "lossy encode: {width}x{height} at quality {quality} into {} bytes",
                    bytes.len()
                );
                Ok(bytes)
            }
        }
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codecs")
            .field("lossy", &self.lossy.is_some())
            .field("limits", &self.limits)
            .finish()
    }
}

// ============================================================================
// PixelBuffer convenience
// ============================================================================

impl PixelBuffer {
    /// Decodes a tile container or reports the detected format as
    /// unsupported. Use [`Codecs`] for lossy input or limits.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Codecs::new().decode(bytes, &DecodeFormat::Auto)
    }

    /// Decodes a tile container without limits.
    pub fn decode_png(bytes: &[u8]) -> Result<Self> {
        png::decode(bytes, &DecodeLimits::default())
    }

    /// Encodes the buffer as a tile container at compression `level` (0-9).
    pub fn encode_png(&self, level: u8) -> Result<Vec<u8>> {
        png::encode(self, level)
    }
}
