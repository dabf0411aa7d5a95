//! Canonical per-pixel color value.
//!
//! [`Pixel`] is the unit every decoder produces and every encoder consumes.
//! Its field order matches the canonical packed layout in memory:
//! blue, green, red, alpha.

use rgb::Rgba;
use rgb::alt::BGRA;

/// Four-channel 8-bit color.
///
/// The default value is fully opaque black. Channels are plain `u8`, so every
/// value is in range by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Pixel {
    /// Blue channel.
    pub b: u8,
    /// Green channel.
    pub g: u8,
    /// Red channel.
    pub r: u8,
    /// Alpha (opacity). 255 is fully opaque.
    pub a: u8,
}

impl Pixel {
    /// Opaque black.
    pub const BLACK: Self = Self::from_rgb(0, 0, 0);

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Bytes per pixel in the canonical encoding.
    pub const BYTES: usize = 4;

    /// Create a pixel from red, green, blue and alpha.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Create a pixel with alpha first, in ARGB argument order.
    #[inline]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, a)
    }

    /// Create an opaque pixel.
    #[inline]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Interpret a byte sequence positionally as (B, G, R, A).
    ///
    /// Missing color bytes default to `0`, a missing alpha byte defaults to
    /// `255`. Anything past the fourth byte is ignored.
    pub fn from_bytes<I>(bytes: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut bytes = bytes.into_iter();
        let b = bytes.next().unwrap_or(0);
        let g = bytes.next().unwrap_or(0);
        let r = bytes.next().unwrap_or(0);
        let a = bytes.next().unwrap_or(0xFF);
        Self { b, g, r, a }
    }

    /// Canonical (B, G, R, A) bytes.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }

    /// Convert to an RGBA color.
    #[inline]
    pub const fn to_rgba(self) -> Rgba<u8> {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
        }
    }

    /// Overwrite all four channels.
    pub fn set_argb(&mut self, a: u8, r: u8, g: u8, b: u8) {
        *self = Self::from_argb(a, r, g, b);
    }

    /// Overwrite the color channels and make the pixel opaque.
    pub fn set_rgb(&mut self, r: u8, g: u8, b: u8) {
        *self = Self::from_rgb(r, g, b);
    }
}

impl Default for Pixel {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<Rgba<u8>> for Pixel {
    #[inline]
    fn from(c: Rgba<u8>) -> Self {
        Self::new(c.r, c.g, c.b, c.a)
    }
}

impl From<Pixel> for Rgba<u8> {
    #[inline]
    fn from(p: Pixel) -> Self {
        p.to_rgba()
    }
}

impl From<BGRA<u8>> for Pixel {
    #[inline]
    fn from(c: BGRA<u8>) -> Self {
        Self::new(c.r, c.g, c.b, c.a)
    }
}

impl From<Pixel> for BGRA<u8> {
    #[inline]
    fn from(p: Pixel) -> Self {
        BGRA {
            b: p.b,
            g: p.g,
            r: p.r,
            a: p.a,
        }
    }
}

impl From<[u8; 4]> for Pixel {
    /// Canonical (B, G, R, A) bytes.
    #[inline]
    fn from(bytes: [u8; 4]) -> Self {
        let [b, g, r, a] = bytes;
        Self { b, g, r, a }
    }
}

impl From<Pixel> for [u8; 4] {
    #[inline]
    fn from(p: Pixel) -> Self {
        p.to_bytes()
    }
}
