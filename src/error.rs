//! Crate error type.

use crate::bitmap::LockError;
use crate::format::PixelFormat;
use crate::limits::LimitExceeded;

/// Errors from pixel buffer operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The bitmap's native encoding is known but has no decoder.
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(PixelFormat),
    /// A raw encoding tag outside the known enumeration.
    #[error("invalid pixel format tag {0:#010x}")]
    InvalidEncodingTag(u32),
    /// Pixel index past the end of the buffer.
    #[error("pixel index {index} out of range (len: {len})")]
    IndexOutOfRange {
        /// Requested index. 2D accesses report `x + y * width`.
        index: usize,
        /// Number of pixels in the buffer.
        len: usize,
    },
    /// An indexed pixel references a palette entry that does not exist.
    #[error("palette index {index} out of range (palette size: {len})")]
    PaletteIndex {
        /// Index byte read from the bitmap.
        index: u8,
        /// Number of palette entries.
        len: usize,
    },
    /// The locked region is too small to hold the whole working set.
    #[error("locked region holds {available} bytes, {needed} needed")]
    ShortRegion {
        /// Pixel bytes the write-back needs, excluding row padding.
        needed: usize,
        /// Length of the region the bitmap handed out.
        available: usize,
    },
    /// The bitmap refused a lock, unlock, access or reallocation.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// A configured limit was exceeded.
    #[error(transparent)]
    Limit(#[from] LimitExceeded),
}

/// Result alias for this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
