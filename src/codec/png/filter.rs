//! Scanline filters.

use crate::error::FormatError;

const FILTER_NONE: u8 = 0;
const FILTER_SUB: u8 = 1;
const FILTER_UP: u8 = 2;
const FILTER_AVERAGE: u8 = 3;
const FILTER_PAETH: u8 = 4;

/// Prefixes every row of `bitmap` with the "none" filter byte.
pub(crate) fn filter_none(bitmap: &[u8], row_bytes: usize) -> Vec<u8> {
    let rows = bitmap.len() / row_bytes;
    let mut out = Vec::with_capacity(bitmap.len() + rows);
    for row in bitmap.chunks_exact(row_bytes) {
        out.push(FILTER_NONE);
        out.extend_from_slice(row);
    }
    out
}

/// Reverses the per-row filters of an inflated image stream.
///
/// `raw` holds `height` rows of one filter byte followed by `row_bytes`
/// filtered bytes; `bpp` is the number of bytes per pixel.
pub(crate) fn unfilter(raw: &[u8], row_bytes: usize, bpp: usize) -> Result<Vec<u8>, FormatError> {
    let stride = row_bytes + 1;
    if raw.len() % stride != 0 {
        return Err(FormatError::Malformed(format!(
            "image data length {} is not a multiple of the scanline length {stride}",
            raw.len()
        )));
    }

    let height = raw.len() / stride;
    let mut out = vec![0u8; height * row_bytes];
    for (y, line) in raw.chunks_exact(stride).enumerate() {
        let (done, rest) = out.split_at_mut(y * row_bytes);
        let row = &mut rest[..row_bytes];
        row.copy_from_slice(&line[1..]);
        let prev = if y == 0 { None } else { Some(&done[(y - 1) * row_bytes..]) };
        unfilter_row(line[0], row, prev, bpp)?;
    }

    Ok(out)
}

/// Unfilters one row in place. `prev` is `None` for the first row, which
/// behaves as if preceded by a row of zeros.
fn unfilter_row(
    filter: u8,
    row: &mut [u8],
    prev: Option<&[u8]>,
    bpp: usize,
) -> Result<(), FormatError> {
    let up = |i: usize| prev.map_or(0, |p| p[i]);

    match filter {
        FILTER_NONE => {}
        FILTER_SUB => {
            for i in bpp..row.len() {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        FILTER_UP => {
            if let Some(prev) = prev {
                for (byte, &b) in row.iter_mut().zip(prev) {
                    *byte = byte.wrapping_add(b);
                }
            }
        }
        FILTER_AVERAGE => {
            for i in 0..row.len() {
                let a = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                let b = up(i) as u16;
                row[i] = row[i].wrapping_add(((a + b) / 2) as u8);
            }
        }
        FILTER_PAETH => {
            for i in 0..row.len() {
                let a = if i >= bpp { row[i - bpp] } else { 0 };
                let b = up(i);
                let c = if i >= bpp { up(i - bpp) } else { 0 };
                row[i] = row[i].wrapping_add(paeth(a, b, c));
            }
        }
        other => return Err(FormatError::UnknownFilter(other)),
    }

    Ok(())
}

/// Paeth predictor; ties prefer `a`, then `b`.
#[inline]
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a16, b16, c16) = (a as i16, b as i16, c as i16);
    let p = a16 + b16 - c16;
    let pa = (p - a16).abs();
    let pb = (p - b16).abs();
    let pc = (p - c16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
