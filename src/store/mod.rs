//! Bitmap persistence boundary.
//!
//! The core never touches files directly; it reads and writes bitmaps through these traits,
//! keyed by opaque [`BitmapRef`] handles.

use std::sync::Arc;

use crate::foundation::error::StudioResult;
use crate::foundation::ids::BitmapRef;
use crate::imaging::bitmap::Bitmap;

pub(crate) mod dir;
pub(crate) mod memory;

/// Read access to stored bitmaps.
pub trait BitmapSource {
    /// Fetch a bitmap; `Ok(None)` when the handle is unknown.
    fn bitmap(&self, r: &BitmapRef) -> StudioResult<Option<Arc<Bitmap>>>;

    /// Whether the handle currently resolves to data.
    fn contains(&self, r: &BitmapRef) -> bool;
}

/// Read/write bitmap storage.
pub trait BitmapStore: BitmapSource {
    /// Store (or overwrite) a bitmap under `r`.
    fn put(&mut self, r: &BitmapRef, bitmap: Arc<Bitmap>) -> StudioResult<()>;

    /// Drop the bitmap under `r`. Removing an unknown handle is not an error.
    fn remove(&mut self, r: &BitmapRef) -> StudioResult<()>;
}

impl<T: BitmapSource + ?Sized> BitmapSource for &T {
    fn bitmap(&self, r: &BitmapRef) -> StudioResult<Option<Arc<Bitmap>>> {
        (**self).bitmap(r)
    }

    fn contains(&self, r: &BitmapRef) -> bool {
        (**self).contains(r)
    }
}
