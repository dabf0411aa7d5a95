//! Native pixel encoding tags.

use crate::error::Error;

/// Native pixel encoding of a bitmap.
///
/// Discriminants are the raw tag values bitmap hosts use, with the bit depth
/// in bits 8..16 and a format index in the low byte. Bits 16..22 are flags;
/// the `*Flag` variants and [`Max`](Self::Max) are those bare tags, which
/// hosts define but no bitmap stores. Only [`Indexed8`](Self::Indexed8) and
/// [`Argb32`](Self::Argb32) can be decoded; the rest are known tags that fail
/// fast with [`Error::UnsupportedFormat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u32)]
pub enum PixelFormat {
    /// No format recorded.
    Undefined = 0x0000_0000,
    /// 1 bit per pixel, palette indexed.
    Indexed1 = 0x0003_0101,
    /// 4 bits per pixel, palette indexed.
    Indexed4 = 0x0003_0402,
    /// 8 bits per pixel, palette indexed.
    Indexed8 = 0x0003_0803,
    /// 16-bit grayscale.
    Gray16 = 0x0010_1004,
    /// 16-bit, 5 bits per color channel.
    Rgb555 = 0x0002_1005,
    /// 16-bit, 5/6/5 bits for red/green/blue.
    Rgb565 = 0x0002_1006,
    /// 16-bit, 1 bit alpha and 5 bits per color channel.
    Argb1555 = 0x0006_1007,
    /// 24-bit, 8 bits per color channel, no alpha.
    Rgb24 = 0x0002_1808,
    /// 32-bit with an unused padding byte.
    Rgb32 = 0x0002_2009,
    /// 32-bit (B, G, R, A) with straight alpha. The canonical encoding.
    Argb32 = 0x0026_200A,
    /// 32-bit (B, G, R, A) with premultiplied alpha.
    PArgb32 = 0x000E_200B,
    /// 48-bit, 16 bits per color channel.
    Rgb48 = 0x0010_300C,
    /// 64-bit, 16 bits per channel, straight alpha.
    Argb64 = 0x0034_400D,
    /// 64-bit, 16 bits per channel, premultiplied alpha.
    PArgb64 = 0x001A_400E,
    /// Bare flag: palette indexed.
    IndexedFlag = 0x0001_0000,
    /// Bare flag: native to the host graphics API.
    GdiFlag = 0x0002_0000,
    /// Bare flag: has an alpha channel.
    AlphaFlag = 0x0004_0000,
    /// Bare flag: premultiplied alpha.
    PAlphaFlag = 0x0008_0000,
    /// Bare flag: 16 bits per channel.
    ExtendedFlag = 0x0010_0000,
    /// Bare flag: the host's canonical layout.
    CanonicalFlag = 0x0020_0000,
    /// Sentinel one past the last format index.
    Max = 0x0000_000F,
}

impl PixelFormat {
    /// The encoding every [`Pixelmap`](crate::Pixelmap) normalizes to.
    pub const CANONICAL: Self = Self::Argb32;

    const ALL: [Self; 22] = [
        Self::Undefined,
        Self::Indexed1,
        Self::Indexed4,
        Self::Indexed8,
        Self::Gray16,
        Self::Rgb555,
        Self::Rgb565,
        Self::Argb1555,
        Self::Rgb24,
        Self::Rgb32,
        Self::Argb32,
        Self::PArgb32,
        Self::Rgb48,
        Self::Argb64,
        Self::PArgb64,
        Self::IndexedFlag,
        Self::GdiFlag,
        Self::AlphaFlag,
        Self::PAlphaFlag,
        Self::ExtendedFlag,
        Self::CanonicalFlag,
        Self::Max,
    ];

    /// Raw tag value.
    #[inline]
    pub const fn to_raw(self) -> u32 {
        self as u32
    }

    /// Bits per pixel, `0` for [`Undefined`](Self::Undefined).
    #[inline]
    pub const fn bits_per_pixel(self) -> u32 {
        (self as u32 >> 8) & 0xFF
    }

    /// Whether pixels are palette indices.
    #[inline]
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Indexed1 | Self::Indexed4 | Self::Indexed8)
    }

    /// Whether the encoding carries an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Argb1555 | Self::Argb32 | Self::PArgb32 | Self::Argb64 | Self::PArgb64
        )
    }

    /// Whether this is the canonical encoding.
    #[inline]
    pub const fn is_canonical(self) -> bool {
        matches!(self, Self::Argb32)
    }

    /// Whether a [`Pixelmap`](crate::Pixelmap) can decode this encoding.
    #[inline]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Indexed8 | Self::Argb32)
    }

    /// Row pitch in bytes for `width` pixels, padded to a 4-byte boundary.
    pub const fn stride(self, width: u32) -> usize {
        let bits = width as usize * self.bits_per_pixel() as usize;
        bits.div_ceil(32) * 4
    }
}

impl TryFrom<u32> for PixelFormat {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|f| f.to_raw() == raw)
            .ok_or(Error::InvalidEncodingTag(raw))
    }
}

impl From<PixelFormat> for u32 {
    #[inline]
    fn from(format: PixelFormat) -> Self {
        format.to_raw()
    }
}

impl core::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Undefined => "undefined",
            Self::Indexed1 => "1bpp indexed",
            Self::Indexed4 => "4bpp indexed",
            Self::Indexed8 => "8bpp indexed",
            Self::Gray16 => "16bpp grayscale",
            Self::Rgb555 => "16bpp RGB555",
            Self::Rgb565 => "16bpp RGB565",
            Self::Argb1555 => "16bpp ARGB1555",
            Self::Rgb24 => "24bpp RGB",
            Self::Rgb32 => "32bpp RGB",
            Self::Argb32 => "32bpp ARGB",
            Self::PArgb32 => "32bpp premultiplied ARGB",
            Self::Rgb48 => "48bpp RGB",
            Self::Argb64 => "64bpp ARGB",
            Self::PArgb64 => "64bpp premultiplied ARGB",
            Self::IndexedFlag => "indexed flag",
            Self::GdiFlag => "GDI flag",
            Self::AlphaFlag => "alpha flag",
            Self::PAlphaFlag => "premultiplied alpha flag",
            Self::ExtendedFlag => "extended flag",
            Self::CanonicalFlag => "canonical flag",
            Self::Max => "max",
        })
    }
}
