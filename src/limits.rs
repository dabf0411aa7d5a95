//! Size caps checked when a [`Pixelmap`](crate::Pixelmap) is constructed.
//!
//! [`Limits::check_pixelmap`] runs before the bitmap is locked, so an
//! oversized image is rejected without touching its memory.

use crate::format::PixelFormat;
use crate::pixel::Pixel;

/// Caps on the size of a pixel buffer. `None` leaves a dimension unbounded.
///
/// # Example
///
/// ```
/// use pixelmap::{Limits, PixelFormat};
///
/// let limits = Limits::none()
///     .with_max_pixels(16_000_000)
///     .with_max_memory(256 * 1024 * 1024);
/// assert!(limits.check_pixelmap(4000, 4000, PixelFormat::Argb32).is_ok());
/// assert!(limits.check_pixelmap(4000, 4001, PixelFormat::Argb32).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Limits {
    /// Most pixels a buffer may hold.
    pub max_pixels: Option<u64>,
    /// Most bytes a buffer may need, see [`Limits::check_pixelmap`].
    pub max_memory_bytes: Option<u64>,
    /// Widest accepted bitmap.
    pub max_width: Option<u32>,
    /// Tallest accepted bitmap.
    pub max_height: Option<u32>,
}

impl Limits {
    /// Accept any size.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Check whether a `width × height` bitmap stored as `format` fits.
    ///
    /// The memory charged is the decoded working set (`width × height`
    /// pixels of [`Pixel::BYTES`]), plus the canonical storage that
    /// normalization allocates when `format` is not canonical. Sums saturate
    /// at `u64::MAX`.
    ///
    /// # Errors
    ///
    /// Returns the first cap exceeded, checked in the order width, height,
    /// pixels, memory.
    pub fn check_pixelmap(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_width
            && width > max
        {
            return Err(LimitExceeded::Width { actual: width, max });
        }
        if let Some(max) = self.max_height
            && height > max
        {
            return Err(LimitExceeded::Height {
                actual: height,
                max,
            });
        }
        let pixels = u64::from(width) * u64::from(height);
        if let Some(max) = self.max_pixels
            && pixels > max
        {
            return Err(LimitExceeded::Pixels {
                actual: pixels,
                max,
            });
        }
        if let Some(max) = self.max_memory_bytes {
            let bytes = pixelmap_bytes(width, height, format);
            if bytes > max {
                return Err(LimitExceeded::Memory { actual: bytes, max });
            }
        }
        Ok(())
    }
}

/// Bytes a pixel buffer over a `width × height` bitmap in `format` needs.
fn pixelmap_bytes(width: u32, height: u32, format: PixelFormat) -> u64 {
    let pixels = u64::from(width) * u64::from(height);
    let working_set = pixels.saturating_mul(Pixel::BYTES as u64);
    if format.is_canonical() {
        return working_set;
    }
    let bits = u64::from(PixelFormat::CANONICAL.bits_per_pixel());
    let stride = (u64::from(width) * bits).div_ceil(32) * 4;
    working_set.saturating_add(stride.saturating_mul(u64::from(height)))
}

/// A size cap in [`Limits`] was exceeded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LimitExceeded {
    #[error("bitmap width {actual} exceeds limit {max}")]
    Width { actual: u32, max: u32 },
    #[error("bitmap height {actual} exceeds limit {max}")]
    Height { actual: u32, max: u32 },
    #[error("{actual} pixels exceed limit {max}")]
    Pixels { actual: u64, max: u64 },
    /// `actual` is `u64::MAX` when the estimate saturated.
    #[error("pixel buffer needs {actual} bytes, limit is {max}")]
    Memory { actual: u64, max: u64 },
}
