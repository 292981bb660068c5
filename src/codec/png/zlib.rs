//! zlib wrapping of the image data stream.
//!
//! Level 0 writes uncompressed "stored" deflate blocks by hand; levels 1-9
//! hand the data to `miniz_oxide`. Decoding always goes through
//! `miniz_oxide`, which also verifies the Adler-32 trailer.

use miniz_oxide::inflate::{self, TINFLStatus};

use crate::error::FormatError;

/// Largest payload of a single stored deflate block.
const MAX_STORED_BLOCK: usize = 65_535;

/// CMF/FLG pair: deflate with a 32 KiB window, no preset dictionary, fastest
/// compression level hint.
const STORED_HEADER: [u8; 2] = [0x78, 0x01];

const ADLER_MOD: u32 = 65_521;
/// Bytes that can be summed before `b` may overflow a `u32`.
const ADLER_NMAX: usize = 5_552;

/// Adler-32 checksum of `bytes`.
pub fn adler32(bytes: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for block in bytes.chunks(ADLER_NMAX) {
        for &byte in block {
            a += byte as u32;
            b += a;
        }
        a %= ADLER_MOD;
        b %= ADLER_MOD;
    }
    (b << 16) | a
}

/// Wraps `data` into a zlib stream at compression `level` (0-9).
pub(crate) fn compress(data: &[u8], level: u8) -> Vec<u8> {
    if level == 0 {
        store(data)
    } else {
        miniz_oxide::deflate::compress_to_vec_zlib(data, level.min(9))
    }
}

/// zlib stream of stored blocks, the last one flagged final.
fn store(data: &[u8]) -> Vec<u8> {
    let blocks = data.len().div_ceil(MAX_STORED_BLOCK).max(1);
    let mut out = Vec::with_capacity(STORED_HEADER.len() + data.len() + 5 * blocks + 4);
    out.extend_from_slice(&STORED_HEADER);

    if data.is_empty() {
        out.extend_from_slice(&[1, 0x00, 0x00, 0xff, 0xff]);
    } else {
        let mut chunks = data.chunks(MAX_STORED_BLOCK).peekable();
        while let Some(block) = chunks.next() {
            let len = block.len() as u16;
            out.push(u8::from(chunks.peek().is_none()));
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(&(!len).to_le_bytes());
            out.extend_from_slice(block);
        }
    }

    out.extend_from_slice(&adler32(data).to_be_bytes());
    out
}

/// Inflates a zlib stream that must hold exactly `expected` bytes.
pub(crate) fn decompress(data: &[u8], expected: usize) -> Result<Vec<u8>, FormatError> {
    let limit = expected.saturating_add(1);
    let out = inflate::decompress_to_vec_zlib_with_limit(data, limit).map_err(|err| {
        match err.status {
            TINFLStatus::HasMoreOutput => {
                FormatError::Malformed(format!("image data inflates past {expected} bytes"))
            }
            TINFLStatus::FailedCannotMakeProgress => {
                FormatError::Truncated("compressed image data")
            }
            status => FormatError::Inflate(format!("{status:?}")),
        }
    })?;

    if out.len() != expected {
        return Err(FormatError::Malformed(format!(
            "image data inflates to {} bytes, expected {expected}",
            out.len()
        )));
    }
    Ok(out)
}
