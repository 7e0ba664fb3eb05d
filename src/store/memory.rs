use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::StudioResult;
use crate::foundation::ids::BitmapRef;
use crate::imaging::bitmap::Bitmap;
use crate::store::{BitmapSource, BitmapStore};

/// In-memory bitmap store.
#[derive(Clone, Debug, Default)]
pub struct MemoryBitmapStore {
    bitmaps: HashMap<BitmapRef, Arc<Bitmap>>,
}

impl MemoryBitmapStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bitmaps.
    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }

    /// Stored handles, sorted.
    pub fn refs(&self) -> Vec<&BitmapRef> {
        let mut out: Vec<&BitmapRef> = self.bitmaps.keys().collect();
        out.sort();
        out
    }
}

impl BitmapSource for MemoryBitmapStore {
    fn bitmap(&self, r: &BitmapRef) -> StudioResult<Option<Arc<Bitmap>>> {
        Ok(self.bitmaps.get(r).cloned())
    }

    fn contains(&self, r: &BitmapRef) -> bool {
        self.bitmaps.contains_key(r)
    }
}

impl BitmapStore for MemoryBitmapStore {
    fn put(&mut self, r: &BitmapRef, bitmap: Arc<Bitmap>) -> StudioResult<()> {
        self.bitmaps.insert(r.clone(), bitmap);
        Ok(())
    }

    fn remove(&mut self, r: &BitmapRef) -> StudioResult<()> {
        self.bitmaps.remove(r);
        Ok(())
    }
}
