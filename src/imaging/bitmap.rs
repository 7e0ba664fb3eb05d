use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::foundation::core::Size;
use crate::foundation::error::{StudioError, StudioResult};

const FINGERPRINT_SEED: u64 = 0x51a7_c0de_2f4b_9e11;

/// A straight-alpha RGBA8 pixel buffer.
///
/// Pixels are tightly packed, row-major, 4 bytes per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Wrap raw RGBA8 bytes, checking that the length matches the dimensions.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> StudioResult<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(StudioError::invalid(format!(
                "rgba8 buffer for {width}x{height} must be {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A bitmap filled with one straight RGBA8 pixel value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> StudioResult<Self> {
        let n = byte_len(width, height)? / 4;
        Ok(Self {
            width,
            height,
            data: rgba.repeat(n),
        })
    }

    /// A fully transparent bitmap.
    pub fn transparent(width: u32, height: u32) -> StudioResult<Self> {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a [`Size`].
    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Raw RGBA8 bytes.
    pub fn as_rgba8(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA8 bytes.
    pub fn as_rgba8_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume into raw RGBA8 bytes.
    pub fn into_rgba8(self) -> Vec<u8> {
        self.data
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Overwrite the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Stable content hash (dimensions + pixels).
    pub fn fingerprint(&self) -> u64 {
        let mut buf = Vec::with_capacity(self.data.len() + 8);
        buf.extend_from_slice(&self.width.to_le_bytes());
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.data);
        xxh3_64_with_seed(&buf, FINGERPRINT_SEED)
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint()))
            .finish()
    }
}

fn byte_len(width: u32, height: u32) -> StudioResult<usize> {
    if width == 0 || height == 0 {
        return Err(StudioError::invalid(format!(
            "bitmap dimensions must be positive, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| StudioError::invalid("bitmap size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/bitmap.rs"]
mod tests;
