//! The tile container format: a PNG-layout, chunked, CRC-checked and
//! scanline-filtered lossless encoding of a [`PixelBuffer`].
//!
//! The encoder always writes 8-bit RGBA with the "none" filter on every row.
//! The decoder accepts 8-bit greyscale, greyscale with alpha, RGB and RGBA
//! with any of the five standard filters, and expands everything to RGBA.
//! Palette images, other bit depths and interlaced images are rejected.

mod chunk;
mod filter;
mod zlib;

pub use chunk::crc32;
pub use zlib::adler32;

use chunk::{ChunkReader, IDAT, IEND, IHDR, PLTE, SIGNATURE, write_chunk};

use super::{DecodeLimits, expand_channels};
use crate::buffer::PixelBuffer;
use crate::error::{Error, FormatError, Result};

/// Largest payload written into a single IDAT chunk.
const IDAT_SPLIT: usize = 256 * 1024;

/// Highest supported compression level.
pub const MAX_LEVEL: u8 = 9;

const COLOR_GREYSCALE: u8 = 0;
const COLOR_RGB: u8 = 2;
const COLOR_PALETTE: u8 = 3;
const COLOR_GREY_ALPHA: u8 = 4;
const COLOR_RGBA: u8 = 6;

// ============================================================================
// Header
// ============================================================================

/// Parsed IHDR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    width: u32,
    height: u32,
    color_type: u8,
}

impl Header {
    fn parse(data: &[u8]) -> std::result::Result<Self, FormatError> {
        let &[
            w0,
            w1,
            w2,
            w3,
            h0,
            h1,
            h2,
            h3,
            bit_depth,
            color_type,
            compression,
            filter,
            interlace,
        ] = data
        else {
            return Err(FormatError::Malformed(format!(
                "IHDR is {} bytes, expected 13",
                data.len()
            )));
        };

        let width = u32::from_be_bytes([w0, w1, w2, w3]);
        let height = u32::from_be_bytes([h0, h1, h2, h3]);
        if width == 0 || height == 0 {
            return Err(FormatError::Malformed(format!("zero image dimension ({width}x{height})")));
        }
        if compression != 0 || filter != 0 {
            return Err(FormatError::Malformed(format!(
                "unknown compression method {compression} or filter method {filter}"
            )));
        }
        match interlace {
            0 => {}
            1 => return Err(FormatError::Interlaced),
            other => {
                return Err(FormatError::Malformed(format!(
                    "unknown interlace method {other}"
                )));
            }
        }

        match (bit_depth, color_type) {
            (8, COLOR_GREYSCALE | COLOR_RGB | COLOR_GREY_ALPHA | COLOR_RGBA) => Ok(Self {
                width,
                height,
                color_type,
            }),
            _ => Err(FormatError::UnsupportedColor { bit_depth, color_type }),
        }
    }

    fn write(&self) -> [u8; 13] {
        let mut out = [0u8; 13];
        out[..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = 8;
        out[9] = self.color_type;
        out
    }

    fn channels(&self) -> usize {
        match self.color_type {
            COLOR_GREYSCALE => 1,
            COLOR_GREY_ALPHA => 2,
            COLOR_RGB => 3,
            _ => 4,
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes `buffer` as 8-bit RGBA at compression `level`.
///
/// Level 0 stores the data uncompressed; 1-9 trade speed for size.
pub fn encode(buffer: &PixelBuffer, level: u8) -> Result<Vec<u8>> {
    if level > MAX_LEVEL {
        return Err(Error::invalid(format!(
            "compression level must be 0..={MAX_LEVEL} (got {level})"
        )));
    }

    let (width, height) = buffer.dimensions();
    let header = Header {
        width,
        height,
        color_type: COLOR_RGBA,
    };

    let scanlines = filter::filter_none(buffer.bitmap(), buffer.stride());
    let compressed = zlib::compress(&scanlines, level);

    let idat_chunks = compressed.len().div_ceil(IDAT_SPLIT);
    let mut out =
        Vec::with_capacity(SIGNATURE.len() + 25 + compressed.len() + 12 * idat_chunks + 12);
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, &IHDR, &header.write());
    for part in compressed.chunks(IDAT_SPLIT) {
        write_chunk(&mut out, &IDAT, part);
    }
    write_chunk(&mut out, &IEND, &[]);

    log::debug!(
        "encoded {width}x{height} at level {level}: {} scanline bytes into {} bytes",
        scanlines.len(),
        out.len()
    );
    Ok(out)
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a tile container, refusing images larger than `limits` before
/// any image data is inflated.
pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<PixelBuffer> {
    let mut reader = ChunkReader::new(bytes)?;

    let first = reader.next_chunk()?;
    if first.kind != IHDR {
        let message = format!("first chunk is {}, expected IHDR", first.name());
        return Err(FormatError::Malformed(message).into());
    }
    let header = Header::parse(first.data)?;
    limits.check(header.width, header.height)?;

    let mut data = Vec::new();
    loop {
        let chunk = reader.next_chunk()?;
        match chunk.kind {
            IDAT => data.extend_from_slice(chunk.data),
            IEND => break,
            IHDR => return Err(FormatError::Malformed("duplicate IHDR chunk".into()).into()),
            // Suggested palette of a truecolor image.
            PLTE => {}
            _ if chunk.is_critical() => {
                let message = format!("unknown critical chunk {}", chunk.name());
                return Err(FormatError::Malformed(message).into());
            }
            _ => log::warn!(
                "skipping ancillary chunk {} ({} bytes)",
                chunk.name(),
                chunk.data.len()
            ),
        }
    }

    if reader.remaining() > 0 {
        log::warn!("ignoring {} bytes after IEND", reader.remaining());
    }
    if data.is_empty() {
        return Err(FormatError::Malformed("no IDAT chunk".into()).into());
    }

    let too_large = || FormatError::TooLarge {
        width: header.width,
        height: header.height,
    };
    let channels = header.channels();
    let row_bytes = (header.width as usize).checked_mul(channels).ok_or_else(too_large)?;
    let expected = (row_bytes + 1).checked_mul(header.height as usize).ok_or_else(too_large)?;

    let scanlines = zlib::decompress(&data, expected)?;
    let pixels = filter::unfilter(&scanlines, row_bytes, channels)?;
    let bitmap = expand_channels(pixels, channels as u8)?;

    log::debug!(
        "decoded {}x{} color type {} from {} bytes ({} compressed)",
        header.width,
        header.height,
        header.color_type,
        bytes.len(),
        data.len()
    );
    PixelBuffer::from_raw(header.width, header.height, bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assembles a container from raw scanlines using a third-party deflate.
    fn container(
        width: u32,
        height: u32,
        bit_depth: u8,
        color_type: u8,
        scanlines: &[u8],
    ) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);

        let mut out = SIGNATURE.to_vec();
        write_chunk(&mut out, &IHDR, &ihdr);
        write_chunk(&mut out, &IDAT, &miniz_oxide::deflate::compress_to_vec_zlib(scanlines, 6));
        write_chunk(&mut out, &IEND, &[]);
        out
    }

    fn solid_red() -> Vec<u8> {
        let row = [0, 0xff, 0, 0, 0xff, 0xff, 0, 0, 0xff];
        container(2, 2, 8, COLOR_RGBA, &[row, row].concat())
    }

    fn noise(width: u32, height: u32) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(width, height).unwrap();
        let mut state = 0x1234_5678u32;
        buffer.fill_with(|_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        });
        buffer
    }

    fn chunk_kinds(bytes: &[u8]) -> Vec<[u8; 4]> {
        let mut reader = ChunkReader::new(bytes).unwrap();
        let mut kinds = Vec::new();
        while reader.remaining() > 0 {
            kinds.push(reader.next_chunk().unwrap().kind);
        }
        kinds
    }

    #[test]
    fn decodes_known_good_container() {
        let buffer = decode(&solid_red(), &DecodeLimits::default()).unwrap();
        assert_eq!(buffer.dimensions(), (2, 2));
        assert_eq!(buffer.bitmap(), &[0xffu8, 0, 0, 0xff].repeat(4)[..]);
    }

    #[test]
    fn corrupt_crc_is_a_format_error() {
        let mut bytes = solid_red();
        // First byte of the IHDR CRC.
        bytes[29] ^= 0x01;
        assert!(matches!(
            decode(&bytes, &DecodeLimits::default()),
            Err(Error::Format(FormatError::CrcMismatch { chunk, .. })) if chunk == "IHDR"
        ));
    }

    #[test]
    fn roundtrip_is_lossless() {
        let original = noise(13, 7);
        for level in [0, 1, 6, 9] {
            let encoded = encode(&original, level).unwrap();
            let decoded = decode(&encoded, &DecodeLimits::default()).unwrap();
            assert_eq!(decoded, original, "level {level}");
        }
    }

    #[test]
    fn encoder_layout() {
        let encoded = encode(&noise(3, 2), 0).unwrap();
        assert_eq!(&encoded[..8], &SIGNATURE);
        assert_eq!(&encoded[12..16], b"IHDR");
        assert_eq!(&encoded[16..24], &[0, 0, 0, 3, 0, 0, 0, 2]);
        assert_eq!(&encoded[24..29], &[8, 6, 0, 0, 0]);
        assert_eq!(
            &encoded[encoded.len() - 12..],
            &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xae, 0x42, 0x60, 0x82]
        );
    }

    #[test]
    fn large_data_is_split_across_idat_chunks() {
        let original = noise(300, 300);
        let encoded = encode(&original, 0).unwrap();
        let kinds = chunk_kinds(&encoded);
        assert_eq!(kinds, vec![IHDR, IDAT, IDAT, IEND]);
        assert_eq!(decode(&encoded, &DecodeLimits::default()).unwrap(), original);
    }

    #[test]
    fn invalid_level_is_rejected() {
        assert!(matches!(encode(&noise(1, 1), 10), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn greyscale_expands_to_rgba() {
        let bytes = container(2, 1, 8, COLOR_GREYSCALE, &[0, 10, 200]);
        let buffer = decode(&bytes, &DecodeLimits::default()).unwrap();
        assert_eq!(buffer.get(1, 1).unwrap(), 0x0a0a0aff);
        assert_eq!(buffer.get(2, 1).unwrap(), 0xc8c8c8ff);
    }

    #[test]
    fn grey_alpha_and_rgb_expand_to_rgba() {
        let grey_alpha = container(1, 1, 8, COLOR_GREY_ALPHA, &[0, 7, 9]);
        let buffer = decode(&grey_alpha, &DecodeLimits::default()).unwrap();
        assert_eq!(buffer.get(1, 1).unwrap(), 0x07070709);

        let rgb = container(1, 2, 8, COLOR_RGB, &[0, 1, 2, 3, 2, 1, 1, 1]);
        let buffer = decode(&rgb, &DecodeLimits::default()).unwrap();
        assert_eq!(buffer.get(1, 1).unwrap(), 0x010203ff);
        // Up filter adds the row above.
        assert_eq!(buffer.get(1, 2).unwrap(), 0x020304ff);
    }

    #[test]
    fn palette_and_wide_samples_are_rejected() {
        let palette = container(1, 1, 8, COLOR_PALETTE, &[0, 0]);
        assert!(matches!(
            decode(&palette, &DecodeLimits::default()),
            Err(Error::Format(FormatError::UnsupportedColor { bit_depth: 8, color_type: 3 }))
        ));

        let deep = container(1, 1, 16, COLOR_RGBA, &[0; 9]);
        assert!(matches!(
            decode(&deep, &DecodeLimits::default()),
            Err(Error::Format(FormatError::UnsupportedColor { bit_depth: 16, .. }))
        ));
    }

    #[test]
    fn interlaced_is_rejected() {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&1u32.to_be_bytes());
        ihdr.extend_from_slice(&1u32.to_be_bytes());
        ihdr.extend_from_slice(&[8, COLOR_RGBA, 0, 0, 1]);
        let mut bytes = SIGNATURE.to_vec();
        write_chunk(&mut bytes, &IHDR, &ihdr);
        assert!(matches!(
            decode(&bytes, &DecodeLimits::default()),
            Err(Error::Format(FormatError::Interlaced))
        ));
    }

    #[test]
    fn missing_iend_is_truncation() {
        let mut bytes = solid_red();
        bytes.truncate(bytes.len() - 12);
        assert!(matches!(
            decode(&bytes, &DecodeLimits::default()),
            Err(Error::Format(FormatError::Truncated(_)))
        ));
    }

    #[test]
    fn ancillary_chunks_are_skipped() {
        let plain = solid_red();
        // Insert a text chunk right after IHDR (8 + 25 bytes).
        let mut bytes = plain[..33].to_vec();
        write_chunk(&mut bytes, b"tEXt", b"Comment\0red");
        bytes.extend_from_slice(&plain[33..]);
        bytes.extend_from_slice(b"trailing");

        let buffer = decode(&bytes, &DecodeLimits::default()).unwrap();
        assert_eq!(buffer.get(2, 2).unwrap(), 0xff0000ff);
    }

    #[test]
    fn unknown_critical_chunk_fails() {
        let plain = solid_red();
        let mut bytes = plain[..33].to_vec();
        write_chunk(&mut bytes, b"ZZZZ", &[]);
        bytes.extend_from_slice(&plain[33..]);
        assert!(matches!(
            decode(&bytes, &DecodeLimits::default()),
            Err(Error::Format(FormatError::Malformed(_)))
        ));
    }

    #[test]
    fn limits_apply_before_inflating() {
        let limits = DecodeLimits::default().with_max_pixels(3);
        assert!(matches!(
            decode(&solid_red(), &limits),
            Err(Error::Format(FormatError::TooLarge { width: 2, height: 2 }))
        ));
        let wide = DecodeLimits::default().with_max_width(1);
        assert!(decode(&solid_red(), &wide).is_err());
    }

    #[test]
    fn short_image_data_fails() {
        let bytes = container(2, 2, 8, COLOR_RGBA, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(matches!(
            decode(&bytes, &DecodeLimits::default()),
            Err(Error::Format(FormatError::Malformed(_)))
        ));
    }
}
