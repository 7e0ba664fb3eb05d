use std::sync::Arc;

use crate::foundation::error::{StudioError, StudioResult};
use crate::imaging::bitmap::Bitmap;
use crate::layers::model::{Layer, LayerKind};
use crate::project::model::Project;
use crate::render::composite::blit_over;
use crate::store::BitmapSource;

/// Effective bitmap of `layer`: the last applied edit's output, or the imported source.
///
/// A handle that does not resolve is reported as `CorruptState`.
pub fn layer_bitmap<S: BitmapSource + ?Sized>(
    project: &Project,
    layer: &Layer,
    bitmaps: &S,
) -> StudioResult<Arc<Bitmap>> {
    let r = project.effective_source(layer);
    bitmaps.bitmap(r)?.ok_or_else(|| {
        StudioError::corrupt(format!(
            "bitmap {r} for layer {} is missing",
            layer.id().short()
        ))
    })
}

/// Flatten the project at its current cursor.
///
/// The output is a pure function of project state and stored bitmaps: rendering twice gives
/// byte-identical pixels.
#[tracing::instrument(skip(project, bitmaps), fields(project = project.name()))]
pub fn render<S: BitmapSource + ?Sized>(project: &Project, bitmaps: &S) -> StudioResult<Bitmap> {
    let size = project
        .canvas()
        .size
        .ok_or_else(|| StudioError::corrupt("canvas size is unknown"))?;
    let mut canvas = Bitmap::filled(size.width, size.height, project.canvas().background.rgba())?;

    let mut drawn = 0usize;
    for layer in project.layers().iter() {
        if !layer.visible() || layer.kind() != LayerKind::Raster {
            continue;
        }
        let src = layer_bitmap(project, layer, bitmaps)?;
        blit_over(&mut canvas, &src, layer.opacity(), layer.position());
        drawn += 1;
    }
    tracing::debug!(layers = drawn, cursor = project.history().cursor(), "rendered");
    Ok(canvas)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
