//! `Vec`-backed [`Bitmap`] implementation.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use rgb::Rgba;

use crate::bitmap::{Bitmap, BitmapData, LockError, LockToken};
use crate::format::PixelFormat;

/// A bitmap whose pixels live in a plain byte vector.
///
/// Rows are padded to a 4-byte boundary (see [`PixelFormat::stride`]). Locks
/// are tracked by token, so handles from an earlier lock or from before a
/// [`reallocate`](Bitmap::reallocate) are rejected with
/// [`LockError::StaleHandle`].
pub struct MemoryBitmap {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    palette: Vec<Rgba<u8>>,
    locked: Option<LockToken>,
    next_token: u64,
}

impl MemoryBitmap {
    /// Allocate a zero-filled bitmap.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = format.stride(width);
        Self {
            data: vec![0u8; stride * height as usize],
            width,
            height,
            stride,
            format,
            palette: Vec::new(),
            locked: None,
            next_token: 1,
        }
    }

    /// Wrap existing pixel bytes laid out with [`PixelFormat::stride`] rows.
    ///
    /// Short input is zero-filled; extra bytes are dropped.
    pub fn from_bytes(width: u32, height: u32, format: PixelFormat, bytes: &[u8]) -> Self {
        let mut bitmap = Self::new(width, height, format);
        let n = bytes.len().min(bitmap.data.len());
        bitmap.data[..n].copy_from_slice(&bytes[..n]);
        bitmap
    }

    /// Attach a color table.
    pub fn with_palette(mut self, palette: impl Into<Vec<Rgba<u8>>>) -> Self {
        self.palette = palette.into();
        self
    }

    /// Raw pixel bytes, including row padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte stride between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether a lock is outstanding.
    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    fn check(&self, data: &BitmapData) -> Result<(), LockError> {
        match self.locked {
            Some(token) if token == data.token() => Ok(()),
            Some(_) => Err(LockError::StaleHandle),
            None => Err(LockError::NotLocked),
        }
    }
}

impl Bitmap for MemoryBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn palette(&self) -> &[Rgba<u8>] {
        &self.palette
    }

    fn lock_bits(&mut self, format: PixelFormat) -> Result<BitmapData, LockError> {
        if self.locked.is_some() {
            return Err(LockError::AlreadyLocked);
        }
        if format != self.format {
            return Err(LockError::FormatMismatch {
                requested: format,
                actual: self.format,
            });
        }
        let token = LockToken::new(self.next_token);
        self.next_token += 1;
        self.locked = Some(token);
        Ok(BitmapData::new(
            token,
            self.width,
            self.height,
            self.stride,
            format,
        ))
    }

    fn unlock_bits(&mut self, data: BitmapData) -> Result<(), LockError> {
        self.check(&data)?;
        self.locked = None;
        self.format = data.pixel_format();
        Ok(())
    }

    fn bits(&self, data: &BitmapData) -> Result<&[u8], LockError> {
        self.check(data)?;
        Ok(&self.data)
    }

    fn bits_mut(&mut self, data: &BitmapData) -> Result<&mut [u8], LockError> {
        self.check(data)?;
        Ok(&mut self.data)
    }

    fn reallocate(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<(), LockError> {
        let stride = format.stride(width);
        self.data = vec![0u8; stride * height as usize];
        self.width = width;
        self.height = height;
        self.stride = stride;
        self.format = format;
        self.locked = None;
        if !format.is_indexed() {
            self.palette.clear();
        }
        Ok(())
    }
}

impl fmt::Debug for MemoryBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoryBitmap({}x{}, {})",
            self.width, self.height, self.format
        )
    }
}
