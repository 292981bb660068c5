//! Chunk framing: signature, length-prefixed chunks and their CRC32.

use crate::error::FormatError;

pub(crate) const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub(crate) const IHDR: [u8; 4] = *b"IHDR";
pub(crate) const IDAT: [u8; 4] = *b"IDAT";
pub(crate) const IEND: [u8; 4] = *b"IEND";
pub(crate) const PLTE: [u8; 4] = *b"PLTE";

// ============================================================================
// CRC32 (ISO-HDLC, reflected polynomial 0xedb88320)
// ============================================================================

const CRC_TABLE: [u32; 256] = crc_table();

const fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xedb8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Feeds `bytes` into a running (pre-inverted) CRC register.
fn crc_update(mut crc: u32, bytes: &[u8]) -> u32 {
    for &byte in bytes {
        crc = CRC_TABLE[((crc ^ byte as u32) & 0xff) as usize] ^ (crc >> 8);
    }
    crc
}

/// CRC32 of `bytes`.
pub fn crc32(bytes: &[u8]) -> u32 {
    crc_update(0xffff_ffff, bytes) ^ 0xffff_ffff
}

/// CRC32 of a chunk: its type tag followed by its payload.
fn chunk_crc(kind: &[u8; 4], data: &[u8]) -> u32 {
    crc_update(crc_update(0xffff_ffff, kind), data) ^ 0xffff_ffff
}

// ============================================================================
// Writing
// ============================================================================

/// Appends one framed chunk to `out`.
pub(crate) fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.reserve(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(kind, data).to_be_bytes());
}

// ============================================================================
// Reading
// ============================================================================

/// A chunk whose CRC has been verified.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
}

impl Chunk<'_> {
    /// Critical chunks have an uppercase first letter.
    pub fn is_critical(&self) -> bool {
        self.kind[0].is_ascii_uppercase()
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }
}

/// Sequential reader over the chunks following the signature.
pub(crate) struct ChunkReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    /// Checks the signature and positions the reader on the first chunk.
    pub fn new(bytes: &'a [u8]) -> Result<Self, FormatError> {
        if bytes.len() < SIGNATURE.len() || bytes[..SIGNATURE.len()] != SIGNATURE {
            return Err(FormatError::Signature);
        }
        Ok(Self {
            bytes,
            pos: SIGNATURE.len(),
        })
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Reads and verifies the next chunk.
    pub fn next_chunk(&mut self) -> Result<Chunk<'a>, FormatError> {
        let rest = &self.bytes[self.pos..];
        if rest.len() < 8 {
            return Err(FormatError::Truncated("chunk header"));
        }

        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let kind = [rest[4], rest[5], rest[6], rest[7]];
        if len > i32::MAX as usize {
            return Err(FormatError::Malformed(format!("chunk length {len} exceeds 2^31 - 1")));
        }
        if rest.len() - 8 < len + 4 {
            return Err(FormatError::Truncated("chunk data"));
        }

        let data = &rest[8..8 + len];
        let stored = u32::from_be_bytes([
            rest[8 + len],
            rest[9 + len],
            rest[10 + len],
            rest[11 + len],
        ]);
        let computed = chunk_crc(&kind, data);
        if stored != computed {
            return Err(FormatError::CrcMismatch {
                chunk: String::from_utf8_lossy(&kind).into_owned(),
                stored,
                computed,
            });
        }

        self.pos += 12 + len;
        Ok(Chunk { kind, data })
    }
}
