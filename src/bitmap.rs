//! Boundary with the externally owned bitmap.
//!
//! A [`Pixelmap`](crate::Pixelmap) never owns the image it edits. It talks to
//! it through [`Bitmap`], which hands out exclusive locks on the pixel memory
//! as [`BitmapData`] handles and serves byte access through those handles.
//!
//! # Contract
//!
//! - At most one lock is outstanding per bitmap. A second
//!   [`lock_bits()`](Bitmap::lock_bits) fails with [`LockError::AlreadyLocked`].
//! - [`bits()`](Bitmap::bits) and [`bits_mut()`](Bitmap::bits_mut) only serve
//!   the handle of the current lock. Any other handle is stale.
//! - [`reallocate()`](Bitmap::reallocate) invalidates every outstanding
//!   handle, whatever its state.
//! - [`unlock_bits()`](Bitmap::unlock_bits) records the handle's
//!   [`pixel_format()`](BitmapData::pixel_format) as the bitmap's format.

use rgb::Rgba;

use crate::format::PixelFormat;

/// Opaque identity of one lock acquisition.
///
/// Implementations mint a fresh token for every successful
/// [`lock_bits()`](Bitmap::lock_bits) and use it to reject stale handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LockToken(u64);

impl LockToken {
    /// Wrap an implementation-defined token value.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw token value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Handle to a locked pixel region.
///
/// Describes where the locked rows live (row pitch, row count) and which
/// encoding they were locked at. The handle does not borrow the bitmap;
/// bytes are reached through [`Bitmap::bits`] so that a reallocation can
/// never leave a dangling view behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapData {
    token: LockToken,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl BitmapData {
    /// Describe a freshly locked region.
    pub const fn new(
        token: LockToken,
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Self {
        Self {
            token,
            width,
            height,
            stride,
            format,
        }
    }

    /// Lock identity.
    #[inline]
    pub fn token(&self) -> LockToken {
        self.token
    }

    /// Locked width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Locked height in rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte stride between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Encoding the region was locked at.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Change the encoding recorded on unlock.
    #[inline]
    pub fn set_pixel_format(&mut self, format: PixelFormat) {
        self.format = format;
    }

    /// Total byte length of the region, `stride × height`.
    #[inline]
    pub fn len(&self) -> usize {
        self.stride * self.height as usize
    }

    /// Whether the region holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock protocol failures reported by a [`Bitmap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LockError {
    /// The bitmap already has an outstanding lock.
    #[error("bitmap is already locked")]
    AlreadyLocked,
    /// Unlock or access without an outstanding lock.
    #[error("bitmap is not locked")]
    NotLocked,
    /// The handle belongs to an earlier lock or predates a reallocation.
    #[error("stale bitmap lock handle")]
    StaleHandle,
    /// The bitmap cannot expose its pixels in the requested encoding.
    #[error("cannot lock {actual} bitmap as {requested}")]
    FormatMismatch {
        /// Encoding passed to `lock_bits`.
        requested: PixelFormat,
        /// Current encoding of the bitmap.
        actual: PixelFormat,
    },
}

/// An externally owned raster image with lockable pixel memory.
///
/// Implement this for whatever image type owns the pixels. See the
/// [module documentation](self) for the lock contract.
pub trait Bitmap {
    /// Current width in pixels.
    fn width(&self) -> u32;

    /// Current height in pixels.
    fn height(&self) -> u32;

    /// Current native encoding.
    fn pixel_format(&self) -> PixelFormat;

    /// Color table for indexed encodings. Empty for direct-color bitmaps.
    fn palette(&self) -> &[Rgba<u8>];

    /// Acquire the exclusive lock on the pixel memory at `format`.
    fn lock_bits(&mut self, format: PixelFormat) -> Result<BitmapData, LockError>;

    /// Release a lock, recording `data.pixel_format()` as the bitmap's format.
    fn unlock_bits(&mut self, data: BitmapData) -> Result<(), LockError>;

    /// Bytes of the locked region, `data.len()` long.
    fn bits(&self, data: &BitmapData) -> Result<&[u8], LockError>;

    /// Mutable bytes of the locked region, `data.len()` long.
    fn bits_mut(&mut self, data: &BitmapData) -> Result<&mut [u8], LockError>;

    /// Replace the backing storage with a zeroed `width × height` region at
    /// `format`. Invalidates any outstanding lock.
    fn reallocate(&mut self, width: u32, height: u32, format: PixelFormat)
    -> Result<(), LockError>;
}
