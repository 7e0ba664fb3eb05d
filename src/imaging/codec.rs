use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{StudioError, StudioResult};
use crate::imaging::bitmap::Bitmap;

/// Decode any supported image format into a straight RGBA8 [`Bitmap`].
pub fn decode_image(bytes: &[u8]) -> StudioResult<Bitmap> {
    let dyn_img =
        image::load_from_memory(bytes).map_err(|e| StudioError::codec(format!("decode: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Bitmap::from_rgba8(width, height, rgba.into_raw())
}

/// Encode a bitmap as PNG bytes.
pub fn encode_png(bitmap: &Bitmap) -> StudioResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(
        bitmap.width(),
        bitmap.height(),
        bitmap.as_rgba8().to_vec(),
    )
    .ok_or_else(|| StudioError::codec("rgba8 buffer does not match dimensions"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| StudioError::codec(format!("encode png: {e}")))?;
    Ok(buf)
}

/// Read and decode an image file.
pub fn read_image(path: impl AsRef<Path>) -> StudioResult<Bitmap> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Write a bitmap as a PNG file, creating parent directories as needed.
pub fn write_png(path: impl AsRef<Path>, bitmap: &Bitmap) -> StudioResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let bytes = encode_png(bitmap)?;
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/codec.rs"]
mod tests;
