//! Error types shared by every operation in the crate.

use thiserror::Error;

/// Error reported by an external codec or rasterizer collaborator.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by pixel buffer operations and codecs.
#[derive(Debug, Error)]
pub enum Error {
    /// A coordinate was NaN or infinite.
    #[error("invalid pixel coordinate ({axis}={value})")]
    NonFiniteCoordinate { axis: char, value: String },

    /// A coordinate fell outside `1..=bound`.
    #[error("tried referencing a pixel outside of the image boundaries: ({axis}={value}) not in 1..={bound}")]
    OutOfBounds { axis: char, value: i64, bound: u32 },

    /// An argument was rejected before any pixel was touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An externally supplied buffer does not match the declared dimensions.
    #[error("invalid capacity of buffer: expected {expected} bytes, got {actual}")]
    Capacity { expected: usize, actual: usize },

    /// The container bytes are malformed or corrupt.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The format is unknown or not allowed in this context.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Dominant color search excluded every pixel at every threshold.
    #[error("no dominant color found")]
    NoColorFound,

    /// A collaborator could not be loaded.
    #[error("codec unavailable: {0}")]
    CodecUnavailable(String),

    /// A collaborator failed while encoding or decoding.
    #[error("codec error: {0}")]
    Codec(#[source] CodecError),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Failures while reading or writing the tile container format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("format error: invalid signature")]
    Signature,

    #[error("format error: truncated stream ({0})")]
    Truncated(&'static str),

    #[error("format error: crc mismatch in {chunk} chunk (stored {stored:#010x}, computed {computed:#010x})")]
    CrcMismatch {
        chunk: String,
        stored: u32,
        computed: u32,
    },

    #[error("format error: malformed stream ({0})")]
    Malformed(String),

    #[error("format error: unsupported bit depth {bit_depth} with color type {color_type}")]
    UnsupportedColor { bit_depth: u8, color_type: u8 },

    #[error("format error: interlaced images are not supported")]
    Interlaced,

    #[error("format error: compressed stream is invalid ({0})")]
    Inflate(String),

    #[error("format error: unknown scanline filter {0}")]
    UnknownFilter(u8),

    #[error("format error: image too large ({width}x{height})")]
    TooLarge { width: u32, height: u32 },
}
