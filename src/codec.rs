//! Native encoding dispatch.
//!
//! Each supported [`PixelFormat`] maps to one [`Codec`] variant with its own
//! decode function. Encoding only ever targets the canonical layout, so there
//! is a single encoder, [`encode_bgra32`].

use alloc::vec::Vec;

use rgb::Rgba;

use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::pixel::Pixel;

/// Decoder selected for a native encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Codec {
    /// One palette index byte per pixel.
    Indexed8,
    /// Four bytes per pixel in (B, G, R, A) order.
    Bgra32,
    /// Known encoding without a decoder.
    Unsupported(PixelFormat),
}

impl Codec {
    pub(crate) fn for_format(format: PixelFormat) -> Self {
        match format {
            PixelFormat::Indexed8 => Self::Indexed8,
            PixelFormat::Argb32 => Self::Bgra32,
            other => Self::Unsupported(other),
        }
    }

    /// Decode `height` rows of `width` pixels from a locked region.
    pub(crate) fn decode(
        self,
        bits: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        palette: &[Rgba<u8>],
    ) -> Result<Vec<Pixel>> {
        match self {
            Self::Indexed8 => decode_indexed8(bits, width, height, stride, palette),
            Self::Bgra32 => Ok(decode_bgra32(bits, width, height, stride)),
            Self::Unsupported(format) => Err(Error::UnsupportedFormat(format)),
        }
    }
}

/// Pixel bytes of each row, without row padding.
///
/// Rows that run past the end of `bits` are cut short; rows that start past
/// it are not produced.
fn rows(
    bits: &[u8],
    row_bytes: usize,
    height: u32,
    stride: usize,
) -> impl Iterator<Item = &[u8]> {
    (0..height as usize).map_while(move |y| {
        let row = bits.get(y.checked_mul(stride)?..)?;
        Some(&row[..row_bytes.min(row.len())])
    })
}

/// Decode canonical (B, G, R, A) groups in scan order.
///
/// A trailing group with fewer than four bytes yields no pixel.
pub(crate) fn decode_bgra32(bits: &[u8], width: u32, height: u32, stride: usize) -> Vec<Pixel> {
    let row_bytes = width as usize * Pixel::BYTES;
    rows(bits, row_bytes, height, stride)
        .flat_map(|row| row.chunks_exact(Pixel::BYTES))
        .map(|group| Pixel::from_bytes(group.iter().copied()))
        .collect()
}

/// Decode palette indices in scan order. Alpha comes from the palette entry.
pub(crate) fn decode_indexed8(
    bits: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    palette: &[Rgba<u8>],
) -> Result<Vec<Pixel>> {
    rows(bits, width as usize, height, stride)
        .flatten()
        .map(|&index| {
            palette
                .get(index as usize)
                .map(|&entry| Pixel::from(entry))
                .ok_or(Error::PaletteIndex {
                    index,
                    len: palette.len(),
                })
        })
        .collect()
}

/// Write `pixels` into `dst` in canonical layout, `width` pixels per row and
/// `stride` bytes between row starts. Returns the number of bytes written.
///
/// Row padding is left untouched. Writing stops at the end of `dst`, so a
/// count below `4 × pixels.len()` means pixels were not written.
pub(crate) fn encode_bgra32(pixels: &[Pixel], width: u32, stride: usize, dst: &mut [u8]) -> usize {
    let width = width as usize;
    if width == 0 {
        return 0;
    }
    let mut written = 0;
    for (y, row) in pixels.chunks(width).enumerate() {
        let Some(out) = y.checked_mul(stride).and_then(|start| dst.get_mut(start..)) else {
            break;
        };
        for (pixel, group) in row.iter().zip(out.chunks_exact_mut(Pixel::BYTES)) {
            group.copy_from_slice(&pixel.to_bytes());
            written += Pixel::BYTES;
        }
    }
    written
}
