use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::ids::BitmapRef;
use crate::imaging::bitmap::Bitmap;
use crate::imaging::codec;
use crate::store::{BitmapSource, BitmapStore};

/// Bitmap store backed by PNG files under a root directory.
///
/// A handle is used as the file path relative to the root; handles that would escape the root
/// are rejected.
#[derive(Clone, Debug)]
pub struct DirBitmapStore {
    root: PathBuf,
}

impl DirBitmapStore {
    /// Store rooted at `root` (created lazily on first write).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a handle.
    pub fn path_for(&self, r: &BitmapRef) -> StudioResult<PathBuf> {
        let rel = Path::new(r.as_str());
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe || r.as_str().is_empty() {
            return Err(StudioError::invalid(format!(
                "bitmap handle '{r}' must be a relative path inside the project"
            )));
        }
        Ok(self.root.join(rel))
    }
}

impl BitmapSource for DirBitmapStore {
    fn bitmap(&self, r: &BitmapRef) -> StudioResult<Option<Arc<Bitmap>>> {
        let path = self.path_for(r)?;
        if !path.is_file() {
            return Ok(None);
        }
        codec::read_image(&path).map(|b| Some(Arc::new(b)))
    }

    fn contains(&self, r: &BitmapRef) -> bool {
        self.path_for(r).map(|p| p.is_file()).unwrap_or(false)
    }
}

impl BitmapStore for DirBitmapStore {
    fn put(&mut self, r: &BitmapRef, bitmap: Arc<Bitmap>) -> StudioResult<()> {
        let path = self.path_for(r)?;
        codec::write_png(&path, &bitmap)
    }

    fn remove(&mut self, r: &BitmapRef) -> StudioResult<()> {
        let path = self.path_for(r)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("remove bitmap '{}'", path.display()))
                .map_err(StudioError::from),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/dir.rs"]
mod tests;
