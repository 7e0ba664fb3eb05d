use std::sync::Arc;

use crate::foundation::error::StudioResult;
use crate::foundation::ids::BitmapRef;
use crate::imaging::bitmap::Bitmap;
use crate::store::{BitmapSource, BitmapStore};

/// Bitmap writes of an in-flight command, layered over the committed store.
///
/// Reads see staged bitmaps first. Nothing reaches the store before [`Staged::flush`].
pub(crate) struct Staged<'a, S: ?Sized> {
    base: &'a S,
    puts: Vec<(BitmapRef, Arc<Bitmap>)>,
}

impl<'a, S: BitmapSource + ?Sized> Staged<'a, S> {
    pub(crate) fn new(base: &'a S) -> Self {
        Self {
            base,
            puts: Vec::new(),
        }
    }

    pub(crate) fn put(&mut self, r: BitmapRef, bitmap: Arc<Bitmap>) {
        self.puts.push((r, bitmap));
    }

    pub(crate) fn into_puts(self) -> Vec<(BitmapRef, Arc<Bitmap>)> {
        self.puts
    }
}

impl<S: BitmapSource + ?Sized> BitmapSource for Staged<'_, S> {
    fn bitmap(&self, r: &BitmapRef) -> StudioResult<Option<Arc<Bitmap>>> {
        if let Some((_, b)) = self.puts.iter().rev().find(|(k, _)| k == r) {
            return Ok(Some(Arc::clone(b)));
        }
        self.base.bitmap(r)
    }

    fn contains(&self, r: &BitmapRef) -> bool {
        self.puts.iter().any(|(k, _)| k == r) || self.base.contains(r)
    }
}

/// Write staged bitmaps. On failure, handles that did not exist before are removed again.
pub(crate) fn flush<S: BitmapStore + ?Sized>(
    store: &mut S,
    puts: Vec<(BitmapRef, Arc<Bitmap>)>,
) -> StudioResult<()> {
    let mut fresh: Vec<BitmapRef> = Vec::new();
    for (r, bitmap) in puts {
        let existed = store.contains(&r);
        if let Err(e) = store.put(&r, bitmap) {
            for f in fresh.iter().rev() {
                if let Err(undo) = store.remove(f) {
                    tracing::warn!(bitmap = %f, error = %undo, "rollback failed");
                }
            }
            return Err(e);
        }
        if !existed {
            fresh.push(r);
        }
    }
    Ok(())
}
