//! Typed, random-access pixel buffers over externally owned bitmaps.
//!
//! This crate turns a bitmap's raw pixel memory, in whatever native encoding
//! it uses, into a `Vec` of [`Pixel`] values that can be read and written by
//! index, and writes the edits back on demand:
//!
//! - [`Pixel`]: canonical four-channel 8-bit color, (B, G, R, A) in memory
//! - [`Pixelmap`]: the pixel buffer (decode, index, [`commit`](Pixelmap::commit),
//!   [`dispose`](Pixelmap::dispose))
//! - [`Bitmap`] / [`BitmapData`]: the lockable image the buffer edits
//! - [`MemoryBitmap`]: a `Vec`-backed [`Bitmap`]
//! - [`PixelFormat`]: native encoding tags
//! - [`Limits`]: size caps checked before any memory is locked
//!
//! Every buffer is normalized to [`PixelFormat::CANONICAL`] (32-bit ARGB,
//! stored as B, G, R, A bytes). 8-bit palette-indexed bitmaps are converted on
//! construction; other encodings fail with [`Error::UnsupportedFormat`].
//!
//! # Example
//!
//! ```
//! use pixelmap::{Disposal, MemoryBitmap, Pixel, PixelFormat, Pixelmap};
//!
//! let mut bitmap = MemoryBitmap::new(4, 4, PixelFormat::Argb32);
//! let mut map = Pixelmap::new(&mut bitmap)?;
//! map.set_pixel(1, 2, Pixel::from_rgb(255, 0, 0))?;
//! map.dispose(Disposal::Commit)?;
//!
//! let offset = 2 * bitmap.stride() + 4;
//! assert_eq!(&bitmap.as_bytes()[offset..offset + 4], &[0, 0, 255, 255]);
//! # Ok::<(), pixelmap::Error>(())
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod bitmap;
mod codec;
mod error;
mod format;
mod limits;
mod memory;
mod pixel;
mod pixelmap;

pub use bitmap::{Bitmap, BitmapData, LockError, LockToken};
pub use error::{Error, Result};
pub use format::PixelFormat;
pub use limits::{LimitExceeded, Limits};
pub use memory::MemoryBitmap;
pub use pixel::Pixel;
pub use pixelmap::{Disposal, Pixelmap};

// Re-exports for bitmap implementors and users.
pub use imgref::{ImgRef, ImgRefMut};
pub use rgb;
pub use rgb::Rgba;
