//! Random-access pixel buffer over a locked [`Bitmap`].
//!
//! [`Pixelmap`] decodes a bitmap's native pixel memory into a `Vec<Pixel>`
//! once, lets the caller edit that working set freely, and writes it back in
//! the canonical (B, G, R, A) encoding when asked.
//!
//! # Lifecycle
//!
//! ```text
//! lock(native) ── decode ──► [non-canonical?] unlock ─ reallocate ─ lock(canonical) ─ seed
//!                                  │
//!   edit via get/set/index ◄───────┘
//!          │
//!   commit(): encode ─ write ─ unlock ─ lock(canonical)
//!          │
//!   dispose(Commit):  encode ─ write ─ unlock
//!   dispose(Discard): unlock
//! ```
//!
//! Dropping a `Pixelmap` without calling [`dispose`](Pixelmap::dispose)
//! takes the discard path: the lock is released, edits since the last
//! [`commit`](Pixelmap::commit) are lost.

use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut};
use core::slice;

use imgref::{ImgRef, ImgRefMut};
use log::{debug, error, trace, warn};

use crate::bitmap::{Bitmap, BitmapData, LockError};
use crate::codec::{self, Codec};
use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::limits::Limits;
use crate::pixel::Pixel;

/// What happens to in-memory edits when a [`Pixelmap`] is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposal {
    /// Write the working set back into the bitmap, then unlock.
    Commit,
    /// Unlock without writing. Edits since the last commit are lost.
    Discard,
}

/// Typed, random-access view of a bitmap's pixels.
///
/// Borrows the bitmap mutably for its whole lifetime and owns the lock on
/// its pixel memory. Width and height are fixed at construction.
pub struct Pixelmap<'a, B: Bitmap + ?Sized> {
    bitmap: &'a mut B,
    pixels: Vec<Pixel>,
    /// Current lock. `None` only after release or mid-way through relocking.
    data: Option<BitmapData>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl<'a, B: Bitmap + ?Sized> Pixelmap<'a, B> {
    /// Decode `bitmap` with no size limits.
    ///
    /// # Errors
    ///
    /// See [`with_limits`](Self::with_limits).
    pub fn new(bitmap: &'a mut B) -> Result<Self> {
        Self::with_limits(bitmap, &Limits::none())
    }

    /// Lock and decode `bitmap`, normalizing it to
    /// [`PixelFormat::CANONICAL`] if it uses another encoding.
    ///
    /// # Errors
    ///
    /// - [`Error::Limit`] if the image exceeds `limits`.
    /// - [`Error::UnsupportedFormat`] if the native encoding has no decoder.
    ///   The bitmap is left untouched and unlocked.
    /// - [`Error::PaletteIndex`] if an indexed pixel has no palette entry.
    /// - [`Error::Lock`] if the bitmap refuses a lock or reallocation.
    /// - [`Error::ShortRegion`] if normalization cannot seed the new storage.
    ///
    /// No lock is left behind on any error path.
    pub fn with_limits(bitmap: &'a mut B, limits: &Limits) -> Result<Self> {
        let width = bitmap.width();
        let height = bitmap.height();
        let format = bitmap.pixel_format();
        limits.check_pixelmap(width, height, format)?;

        let codec = Codec::for_format(format);
        if let Codec::Unsupported(format) = codec {
            return Err(Error::UnsupportedFormat(format));
        }

        let data = bitmap.lock_bits(format)?;
        trace!("locked {width}x{height} {format} bitmap, stride {}", data.stride());
        let mut pixels = match read_pixels(&*bitmap, &data, codec) {
            Ok(pixels) => pixels,
            Err(err) => {
                if let Err(unlock_err) = bitmap.unlock_bits(data) {
                    error!("failed to unlock bitmap after decode error: {unlock_err}");
                }
                return Err(err);
            }
        };

        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            warn!(
                "decoded {} of {expected} pixels from {width}x{height} {format} bitmap",
                pixels.len()
            );
            pixels.resize(expected, Pixel::default());
        }

        let mut map = Self {
            bitmap,
            pixels,
            data: Some(data),
            width,
            height,
            format,
        };
        if !format.is_canonical() {
            map.normalize()?;
        }
        debug!("created pixelmap {map:?}");
        Ok(map)
    }

    /// Swap the bitmap's storage for canonical storage and seed it with the
    /// decoded pixels.
    fn normalize(&mut self) -> Result<()> {
        let from = self.format;
        self.unlock()?;
        self.bitmap
            .reallocate(self.width, self.height, PixelFormat::CANONICAL)?;
        self.lock()?;
        self.format = PixelFormat::CANONICAL;
        self.write_back()?;
        debug!("normalized {from} bitmap to {}", self.format);
        Ok(())
    }

    fn lock(&mut self) -> Result<()> {
        let data = self.bitmap.lock_bits(PixelFormat::CANONICAL)?;
        trace!("locked bitmap, stride {}", data.stride());
        self.data = Some(data);
        Ok(())
    }

    fn unlock(&mut self) -> Result<()> {
        if let Some(data) = self.data.take() {
            self.bitmap.unlock_bits(data)?;
            trace!("unlocked bitmap");
        }
        Ok(())
    }

    fn write_back(&mut self) -> Result<()> {
        let data = self.data.as_ref().ok_or(LockError::NotLocked)?;
        let written = write_pixels(&mut *self.bitmap, &self.pixels, self.width, data)?;
        trace!("wrote {written} bytes to bitmap");
        Ok(())
    }

    /// Encode the working set into the bitmap, then refresh the lock.
    ///
    /// The bitmap may move its memory while unlocked; every later access
    /// goes through the new lock. Each call re-encodes and copies the whole
    /// image, so call it at synchronization points, not per pixel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lock`] if the bitmap rejects the write, the unlock,
    /// or the new lock, and [`Error::ShortRegion`] if the locked region is
    /// too small to hold every pixel. The lock is kept on a write failure.
    pub fn commit(&mut self) -> Result<()> {
        self.write_back()?;
        self.unlock()?;
        self.lock()?;
        debug!("committed {} pixels", self.pixels.len());
        Ok(())
    }

    /// Release the bitmap, committing or discarding edits.
    ///
    /// Both modes record [`PixelFormat::CANONICAL`] on the lock before
    /// unlocking it, and both unlock exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lock`] if the write or the unlock fails, and
    /// [`Error::ShortRegion`] if a commit could not write every pixel. The
    /// unlock is attempted even when the write fails.
    pub fn dispose(mut self, disposal: Disposal) -> Result<()> {
        self.release(disposal)
    }

    /// Shorthand for [`dispose(Disposal::Commit)`](Self::dispose).
    pub fn close(self) -> Result<()> {
        self.dispose(Disposal::Commit)
    }

    /// Shorthand for [`dispose(Disposal::Discard)`](Self::dispose).
    pub fn discard(self) -> Result<()> {
        self.dispose(Disposal::Discard)
    }

    fn release(&mut self, disposal: Disposal) -> Result<()> {
        let Some(mut data) = self.data.take() else {
            return Ok(());
        };
        data.set_pixel_format(PixelFormat::CANONICAL);
        let written = match disposal {
            Disposal::Commit => write_pixels(&mut *self.bitmap, &self.pixels, self.width, &data),
            Disposal::Discard => Ok(0),
        };
        let unlocked = self.bitmap.unlock_bits(data);
        debug!("released pixelmap ({disposal:?})");
        written?;
        unlocked?;
        Ok(())
    }

    /// Commit, then borrow the bitmap.
    ///
    /// # Errors
    ///
    /// Same as [`commit`](Self::commit).
    pub fn bitmap(&mut self) -> Result<&B> {
        self.commit()?;
        Ok(&*self.bitmap)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoding of the backing storage. Always canonical after construction.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Number of pixels, `width × height`.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Byte stride of the locked bitmap memory.
    pub fn stride(&self) -> usize {
        self.data.as_ref().map_or(0, BitmapData::stride)
    }

    /// Byte length of the locked bitmap memory, `stride × height`.
    pub fn byte_len(&self) -> usize {
        self.data.as_ref().map_or(0, BitmapData::len)
    }

    /// Pixel at scan-order position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn get(&self, index: usize) -> Result<Pixel> {
        self.pixels
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.pixels.len(),
            })
    }

    /// Replace the pixel at scan-order position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn set(&mut self, index: usize, pixel: Pixel) -> Result<()> {
        let len = self.pixels.len();
        let slot = self
            .pixels
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        *slot = pixel;
        Ok(())
    }

    /// Pixel at column `x`, row `y`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] unless `x < width` and `y < height`.
    pub fn pixel(&self, x: u32, y: u32) -> Result<Pixel> {
        self.get(self.offset(x, y)?)
    }

    /// Replace the pixel at column `x`, row `y`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] unless `x < width` and `y < height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<()> {
        let index = self.offset(x, y)?;
        self.set(index, pixel)
    }

    fn offset(&self, x: u32, y: u32) -> Result<usize> {
        let index = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize));
        match index {
            Some(index) if x < self.width && y < self.height => Ok(index),
            _ => Err(Error::IndexOutOfRange {
                index: index.unwrap_or(usize::MAX),
                len: self.pixels.len(),
            }),
        }
    }

    /// All pixels in scan order.
    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// All pixels in scan order, mutable.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Iterate pixels in scan order.
    pub fn iter(&self) -> slice::Iter<'_, Pixel> {
        self.pixels.iter()
    }

    /// Iterate pixels mutably in scan order.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, Pixel> {
        self.pixels.iter_mut()
    }

    /// Borrow the working set as a 2D image.
    pub fn as_img(&self) -> ImgRef<'_, Pixel> {
        ImgRef::new(
            self.pixels.as_slice(),
            self.width as usize,
            self.height as usize,
        )
    }

    /// Borrow the working set as a mutable 2D image.
    pub fn as_img_mut(&mut self) -> ImgRefMut<'_, Pixel> {
        ImgRefMut::new(
            self.pixels.as_mut_slice(),
            self.width as usize,
            self.height as usize,
        )
    }
}

/// Decode the locked region of `bitmap`.
fn read_pixels<B: Bitmap + ?Sized>(
    bitmap: &B,
    data: &BitmapData,
    codec: Codec,
) -> Result<Vec<Pixel>> {
    let bits = bitmap.bits(data)?;
    codec.decode(
        bits,
        data.width(),
        data.height(),
        data.stride(),
        bitmap.palette(),
    )
}

/// Encode `pixels` into the locked region of `bitmap`.
///
/// Fails with [`Error::ShortRegion`] unless every pixel was written.
fn write_pixels<B: Bitmap + ?Sized>(
    bitmap: &mut B,
    pixels: &[Pixel],
    width: u32,
    data: &BitmapData,
) -> Result<usize> {
    let bits = bitmap.bits_mut(data)?;
    let available = bits.len();
    let written = codec::encode_bgra32(pixels, width, data.stride(), bits);
    let needed = pixels.len() * Pixel::BYTES;
    if written < needed {
        return Err(Error::ShortRegion { needed, available });
    }
    Ok(written)
}

impl<B: Bitmap + ?Sized> Drop for Pixelmap<'_, B> {
    fn drop(&mut self) {
        if self.data.is_some() {
            warn!("pixelmap dropped without dispose, discarding uncommitted edits");
            if let Err(err) = self.release(Disposal::Discard) {
                error!("failed to release bitmap lock: {err}");
            }
        }
    }
}

impl<B: Bitmap + ?Sized> Index<usize> for Pixelmap<'_, B> {
    type Output = Pixel;

    fn index(&self, index: usize) -> &Pixel {
        &self.pixels[index]
    }
}

impl<B: Bitmap + ?Sized> IndexMut<usize> for Pixelmap<'_, B> {
    fn index_mut(&mut self, index: usize) -> &mut Pixel {
        &mut self.pixels[index]
    }
}

impl<B: Bitmap + ?Sized> Index<(u32, u32)> for Pixelmap<'_, B> {
    type Output = Pixel;

    /// # Panics
    ///
    /// Panics unless `x < width` and `y < height`.
    fn index(&self, (x, y): (u32, u32)) -> &Pixel {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds ({}x{})",
            self.width,
            self.height
        );
        &self.pixels[x as usize + y as usize * self.width as usize]
    }
}

impl<B: Bitmap + ?Sized> IndexMut<(u32, u32)> for Pixelmap<'_, B> {
    fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut Pixel {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds ({}x{})",
            self.width,
            self.height
        );
        let width = self.width as usize;
        &mut self.pixels[x as usize + y as usize * width]
    }
}

impl<'p, B: Bitmap + ?Sized> IntoIterator for &'p Pixelmap<'_, B> {
    type Item = &'p Pixel;
    type IntoIter = slice::Iter<'p, Pixel>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'p, B: Bitmap + ?Sized> IntoIterator for &'p mut Pixelmap<'_, B> {
    type Item = &'p mut Pixel;
    type IntoIter = slice::IterMut<'p, Pixel>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<B: Bitmap + ?Sized> fmt::Debug for Pixelmap<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pixelmap({}x{}, {})",
            self.width, self.height, self.format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBitmap;
    use alloc::vec;
    use rgb::Rgba;

    const RED: Rgba<u8> = Rgba {
        r: 255,
        g: 0,
        b: 0,
        a: 255,
    };
    const BLUE: Rgba<u8> = Rgba {
        r: 0,
        g: 0,
        b: 255,
        a: 255,
    };

    fn argb(width: u32, height: u32, bytes: &[u8]) -> MemoryBitmap {
        MemoryBitmap::from_bytes(width, height, PixelFormat::Argb32, bytes)
    }

    fn gradient(width: u32, height: u32) -> MemoryBitmap {
        let bytes: Vec<u8> = (0..width * height * 4).map(|i| (i * 7 % 251) as u8).collect();
        argb(width, height, &bytes)
    }

    /// Wraps a bitmap and hides the tail of its locked region.
    struct Truncated {
        inner: MemoryBitmap,
        visible: usize,
    }

    impl Bitmap for Truncated {
        fn width(&self) -> u32 {
            self.inner.width()
        }
        fn height(&self) -> u32 {
            self.inner.height()
        }
        fn pixel_format(&self) -> PixelFormat {
            self.inner.pixel_format()
        }
        fn palette(&self) -> &[Rgba<u8>] {
            self.inner.palette()
        }
        fn lock_bits(&mut self, format: PixelFormat) -> Result<BitmapData, LockError> {
            self.inner.lock_bits(format)
        }
        fn unlock_bits(&mut self, data: BitmapData) -> Result<(), LockError> {
            self.inner.unlock_bits(data)
        }
        fn bits(&self, data: &BitmapData) -> Result<&[u8], LockError> {
            let bits = self.inner.bits(data)?;
            Ok(&bits[..self.visible.min(bits.len())])
        }
        fn bits_mut(&mut self, data: &BitmapData) -> Result<&mut [u8], LockError> {
            let bits = self.inner.bits_mut(data)?;
            let visible = self.visible.min(bits.len());
            Ok(&mut bits[..visible])
        }
        fn reallocate(
            &mut self,
            width: u32,
            height: u32,
            format: PixelFormat,
        ) -> Result<(), LockError> {
            self.inner.reallocate(width, height, format)
        }
    }

    #[test]
    fn decodes_canonical_bytes() {
        let mut bitmap = argb(2, 1, &[10, 20, 30, 40, 50, 60, 70, 80]);
        let map = Pixelmap::new(&mut bitmap).unwrap();
        assert_eq!(map.len(), 2);
        let p0 = map[0];
        let p1 = map[1];
        assert_eq!((p0.b, p0.g, p0.r, p0.a), (10, 20, 30, 40));
        assert_eq!((p1.b, p1.g, p1.r, p1.a), (50, 60, 70, 80));
        map.discard().unwrap();
    }

    #[test]
    fn decodes_indexed_through_palette() {
        let mut bitmap = MemoryBitmap::from_bytes(2, 1, PixelFormat::Indexed8, &[0, 1])
            .with_palette([RED, BLUE]);
        let map = Pixelmap::new(&mut bitmap).unwrap();
        assert_eq!(map.pixels(), &[Pixel::from(RED), Pixel::from(BLUE)]);
        assert_eq!(map[0], Pixel::from_argb(255, 255, 0, 0));
        assert_eq!(map[1], Pixel::from_argb(255, 0, 0, 255));
        map.close().unwrap();
    }

    #[test_log::test]
    fn normalizes_indexed_to_canonical() {
        let indices = [0, 1, 0, 0, 1, 1, 0, 0];
        let mut bitmap = MemoryBitmap::from_bytes(3, 2, PixelFormat::Indexed8, &indices)
            .with_palette([RED, BLUE]);
        let map = Pixelmap::new(&mut bitmap).unwrap();
        assert_eq!(map.pixel_format(), PixelFormat::CANONICAL);
        assert_eq!((map.width(), map.height(), map.len()), (3, 2, 6));
        assert_eq!(map.stride(), 12);
        assert_eq!(map.byte_len(), 24);
        map.discard().unwrap();

        assert_eq!(bitmap.pixel_format(), PixelFormat::Argb32);
        assert!(!bitmap.is_locked());
        // Decoded pixels were seeded into the new storage.
        let reread = Pixelmap::new(&mut bitmap).unwrap();
        assert_eq!(reread[(1, 0)], Pixel::from(BLUE));
        assert_eq!(reread[(0, 1)], Pixel::from(BLUE));
        assert_eq!(reread[(2, 1)], Pixel::from(RED));
        reread.discard().unwrap();
    }

    #[test]
    fn unsupported_format_leaves_bitmap_alone() {
        let mut bitmap = MemoryBitmap::from_bytes(2, 2, PixelFormat::Rgb24, &[9; 16]);
        let err = Pixelmap::new(&mut bitmap).unwrap_err();
        assert_eq!(err, Error::UnsupportedFormat(PixelFormat::Rgb24));
        assert!(!bitmap.is_locked());
        assert_eq!(bitmap.pixel_format(), PixelFormat::Rgb24);
        assert_eq!(bitmap.as_bytes(), &[9u8; 16]);
    }

    #[test]
    fn flag_tag_is_unsupported_not_invalid() {
        let format = PixelFormat::try_from(0x0001_0000).unwrap();
        let mut bitmap = MemoryBitmap::new(2, 2, format);
        assert_eq!(
            Pixelmap::new(&mut bitmap).unwrap_err(),
            Error::UnsupportedFormat(PixelFormat::IndexedFlag)
        );
        assert!(!bitmap.is_locked());
    }

    #[test]
    fn palette_error_releases_lock() {
        let mut bitmap = MemoryBitmap::from_bytes(2, 1, PixelFormat::Indexed8, &[0, 3])
            .with_palette([RED]);
        let err = Pixelmap::new(&mut bitmap).unwrap_err();
        assert_eq!(err, Error::PaletteIndex { index: 3, len: 1 });
        assert!(!bitmap.is_locked());
        assert_eq!(bitmap.pixel_format(), PixelFormat::Indexed8);
    }

    #[test]
    fn limits_reject_before_locking() {
        let mut bitmap = gradient(4, 4);
        let limits = Limits::none().with_max_width(3);
        let err = Pixelmap::with_limits(&mut bitmap, &limits).unwrap_err();
        assert!(matches!(err, Error::Limit(_)));
        assert!(!bitmap.is_locked());
    }

    #[test]
    fn already_locked_bitmap_is_rejected() {
        let mut bitmap = gradient(1, 1);
        let data = bitmap.lock_bits(PixelFormat::Argb32).unwrap();
        let err = Pixelmap::new(&mut bitmap).unwrap_err();
        assert_eq!(err, Error::Lock(LockError::AlreadyLocked));
        bitmap.unlock_bits(data).unwrap();
    }

    #[test_log::test]
    fn short_region_fills_with_default() {
        let mut bitmap = Truncated {
            inner: argb(2, 2, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
            visible: 10,
        };
        let map = Pixelmap::new(&mut bitmap).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map[1], Pixel::new(7, 6, 5, 8));
        assert_eq!(map[2], Pixel::default());
        assert_eq!(map[3], Pixel::default());
        map.discard().unwrap();
    }

    #[test_log::test]
    fn close_into_short_region_fails() {
        let mut bitmap = Truncated {
            inner: argb(2, 1, &[]),
            visible: 4,
        };
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        map[0] = Pixel::new(1, 2, 3, 4);
        map[1] = Pixel::new(5, 6, 7, 8);
        assert_eq!(
            map.close(),
            Err(Error::ShortRegion {
                needed: 8,
                available: 4
            })
        );
        assert!(!bitmap.inner.is_locked());
        assert_eq!(bitmap.inner.as_bytes(), &[3, 2, 1, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn commit_into_short_region_keeps_lock() {
        let mut bitmap = Truncated {
            inner: argb(1, 2, &[]),
            visible: 4,
        };
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        assert!(matches!(map.commit(), Err(Error::ShortRegion { .. })));
        assert_eq!(map.len(), 2);
        map.discard().unwrap();
        assert!(!bitmap.inner.is_locked());
    }

    #[test]
    fn indexing_symmetry() {
        let mut bitmap = gradient(5, 3);
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        for y in 0..3 {
            for x in 0..5 {
                let i = (x + y * 5) as usize;
                assert_eq!(map.pixel(x, y).unwrap(), map.get(i).unwrap());
                assert_eq!(map[(x, y)], map[i]);
            }
        }
        let v = Pixel::new(1, 2, 3, 4);
        map.set_pixel(4, 2, v).unwrap();
        assert_eq!(map.pixel(4, 2).unwrap(), v);
        assert_eq!(map.get(14).unwrap(), v);
        map[(0, 1)] = Pixel::TRANSPARENT;
        assert_eq!(map[5], Pixel::TRANSPARENT);
        map.discard().unwrap();
    }

    #[test]
    fn out_of_range_access() {
        let mut bitmap = gradient(2, 2);
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        assert_eq!(
            map.get(4).unwrap_err(),
            Error::IndexOutOfRange { index: 4, len: 4 }
        );
        assert_eq!(
            map.set(9, Pixel::BLACK).unwrap_err(),
            Error::IndexOutOfRange { index: 9, len: 4 }
        );
        // x past the row end is rejected even though x + y * width < len.
        assert_eq!(
            map.pixel(2, 0).unwrap_err(),
            Error::IndexOutOfRange { index: 2, len: 4 }
        );
        assert!(map.set_pixel(0, 2, Pixel::BLACK).is_err());
        assert!(matches!(
            map.pixel(0, u32::MAX),
            Err(Error::IndexOutOfRange { len: 4, .. })
        ));
        assert!(matches!(
            map.set_pixel(u32::MAX, u32::MAX, Pixel::BLACK),
            Err(Error::IndexOutOfRange { len: 4, .. })
        ));
        // Nothing was corrupted.
        assert_eq!(map.len(), 4);
        map.discard().unwrap();
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn index_2d_panics_out_of_bounds() {
        let mut bitmap = gradient(2, 2);
        let map = Pixelmap::new(&mut bitmap).unwrap();
        let _pixel = map[(2, 0)];
    }

    #[test]
    fn commit_is_idempotent() {
        let mut bitmap = gradient(3, 2);
        let untouched = bitmap.as_bytes().to_vec();
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        let before: Vec<Pixel> = map.iter().copied().collect();
        map.commit().unwrap();
        map.commit().unwrap();
        assert_eq!(map.pixels(), before.as_slice());
        map.close().unwrap();
        assert_eq!(bitmap.as_bytes(), untouched.as_slice());
    }

    #[test]
    fn commit_writes_through_refreshed_lock() {
        let mut bitmap = gradient(2, 1);
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        map[0] = Pixel::new(1, 2, 3, 4);
        map.commit().unwrap();
        map[1] = Pixel::new(5, 6, 7, 8);
        map.commit().unwrap();
        map.discard().unwrap();
        assert_eq!(bitmap.as_bytes(), &[3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn bitmap_accessor_commits() {
        let mut bitmap = gradient(1, 1);
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        map[0] = Pixel::from_rgb(9, 8, 7);
        assert_eq!(map.bitmap().unwrap().as_bytes(), &[7, 8, 9, 255]);
        map.discard().unwrap();
    }

    #[test]
    fn close_persists_edits() {
        let mut bitmap = gradient(2, 2);
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        map.set_pixel(1, 1, Pixel::from_rgb(1, 2, 3)).unwrap();
        map.dispose(Disposal::Commit).unwrap();
        assert!(!bitmap.is_locked());
        assert_eq!(&bitmap.as_bytes()[12..16], &[3, 2, 1, 255]);
    }

    #[test]
    fn discard_drops_edits() {
        let mut bitmap = gradient(2, 2);
        let untouched = bitmap.as_bytes().to_vec();
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        map.set_pixel(1, 1, Pixel::from_rgb(1, 2, 3)).unwrap();
        map.dispose(Disposal::Discard).unwrap();
        assert!(!bitmap.is_locked());
        assert_eq!(bitmap.as_bytes(), untouched.as_slice());
    }

    #[test_log::test]
    fn drop_discards_and_unlocks() {
        let mut bitmap = gradient(2, 2);
        let untouched = bitmap.as_bytes().to_vec();
        {
            let mut map = Pixelmap::new(&mut bitmap).unwrap();
            map[0] = Pixel::TRANSPARENT;
        }
        assert!(!bitmap.is_locked());
        assert_eq!(bitmap.pixel_format(), PixelFormat::CANONICAL);
        assert_eq!(bitmap.as_bytes(), untouched.as_slice());
    }

    #[test]
    fn round_trip_through_new_pixelmap() {
        let mut bitmap = gradient(4, 3);
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        for (i, p) in map.iter_mut().enumerate() {
            p.set_argb(i as u8, 255 - i as u8, i as u8 * 2, 7);
        }
        let edited = map.pixels().to_vec();
        map.close().unwrap();

        let map = Pixelmap::new(&mut bitmap).unwrap();
        assert_eq!(map.pixels(), edited.as_slice());
        map.discard().unwrap();
    }

    #[test]
    fn iteration_restarts_and_sees_edits() {
        let mut bitmap = gradient(3, 1);
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        let first: Vec<Pixel> = (&map).into_iter().copied().collect();
        let second: Vec<Pixel> = map.iter().copied().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);

        for p in &mut map {
            p.a = 0;
        }
        assert!(map.iter().all(|p| p.a == 0));
        map.discard().unwrap();
    }

    #[test]
    fn img_view_matches_dimensions() {
        let mut bitmap = gradient(4, 2);
        let mut map = Pixelmap::new(&mut bitmap).unwrap();
        let expected = map[(3, 1)];
        {
            let img = map.as_img();
            assert_eq!((img.width(), img.height()), (4, 2));
            assert_eq!(img.buf()[7], expected);
        }
        map.as_img_mut().buf_mut()[0] = Pixel::TRANSPARENT;
        assert_eq!(map[0], Pixel::TRANSPARENT);
        map.discard().unwrap();
    }

    #[test]
    fn works_through_trait_object() {
        let mut bitmap = gradient(2, 1);
        let dynamic: &mut dyn Bitmap = &mut bitmap;
        let map = Pixelmap::new(dynamic).unwrap();
        assert_eq!(alloc::format!("{map:?}"), "Pixelmap(2x1, 32bpp ARGB)");
        map.close().unwrap();
    }

    #[test]
    fn empty_bitmap() {
        let mut bitmap = MemoryBitmap::new(0, 0, PixelFormat::Argb32);
        let map = Pixelmap::new(&mut bitmap).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.get(0).unwrap_err(), Error::IndexOutOfRange { index: 0, len: 0 });
        map.close().unwrap();
    }

    #[test]
    fn channels_in_range_after_every_decode_path() {
        let palette: Vec<Rgba<u8>> = (0..=255u8)
            .map(|i| Rgba {
                r: i,
                g: 255 - i,
                b: i / 2,
                a: i | 1,
            })
            .collect();
        let indices: Vec<u8> = (0..=255u8).collect();
        let mut indexed = MemoryBitmap::from_bytes(16, 16, PixelFormat::Indexed8, &indices)
            .with_palette(palette.clone());
        let map = Pixelmap::new(&mut indexed).unwrap();
        for (p, entry) in map.iter().zip(&palette) {
            assert_eq!(p.to_rgba(), *entry);
        }
        map.discard().unwrap();

        let direct: Vec<u8> = vec![0xFF; 64];
        let mut direct = argb(4, 4, &direct);
        let map = Pixelmap::new(&mut direct).unwrap();
        assert!(map.iter().all(|p| p.to_bytes() == [255; 4]));
        map.discard().unwrap();
    }
}
