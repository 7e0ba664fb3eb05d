use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::config::settings::PROJECT_FILE;
use crate::foundation::core::{CanvasSettings, Position};
use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::ids::{BitmapRef, LayerId, OpId};
use crate::history::record::OperationRecord;
use crate::imaging::bitmap::Bitmap;
use crate::imaging::codec;
use crate::layers::model::Layer;
use crate::layers::registry::{LayerPatch, MoveDirection};
use crate::ops::color_replace::ColorReplaceParams;
use crate::ops::operation::Operation;
use crate::project::doc::ProjectDoc;
use crate::project::model::Project;
use crate::project::repair::{RepairReport, load_project};
use crate::render::compositor::{self, layer_bitmap};
use crate::session::opts::SessionOpts;
use crate::session::staged::{Staged, flush};
use crate::store::BitmapStore;
use crate::store::dir::DirBitmapStore;

/// What a committed command changed.
enum Change {
    /// Nothing the compositor reads.
    Metadata,
    /// Visible output may differ.
    Visible,
    /// A new record was applied; its composite snapshot goes under this handle.
    Applied(BitmapRef),
}

/// Edit session owning exactly one loaded project and its bitmap store.
///
/// Every command works on a copy of the project and stages its bitmap writes. The copy replaces
/// the live project only after rendering and storing succeeded, so a failed command leaves no
/// visible change.
pub struct Session<S: BitmapStore> {
    project: Project,
    store: S,
    opts: SessionOpts,
    composite: Option<Arc<Bitmap>>,
    repairs: RepairReport,
    garbage: Vec<BitmapRef>,
}

impl<S: BitmapStore> Session<S> {
    /// Start a new, empty project.
    pub fn create(
        name: impl Into<String>,
        canvas: CanvasSettings,
        store: S,
        opts: SessionOpts,
    ) -> Self {
        Self {
            project: Project::new(name, canvas),
            store,
            opts,
            composite: None,
            repairs: RepairReport::default(),
            garbage: Vec::new(),
        }
    }

    /// Load a project document, repairing it against `store`. See [`Session::repairs`].
    pub fn open(doc: ProjectDoc, store: S, opts: SessionOpts) -> StudioResult<Self> {
        let (project, repairs) = load_project(doc, &store)?;
        Ok(Self {
            project,
            store,
            opts,
            composite: None,
            repairs,
            garbage: Vec::new(),
        })
    }

    /// The live project.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// The bitmap store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the bitmap store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Session options.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Composite produced by the last visible change, if rendering on mutation is enabled.
    pub fn composite(&self) -> Option<&Arc<Bitmap>> {
        self.composite.as_ref()
    }

    /// Repairs made when the project was opened.
    pub fn repairs(&self) -> &RepairReport {
        &self.repairs
    }

    /// Derived bitmaps waiting for [`Session::collect_garbage`].
    pub fn pending_garbage(&self) -> &[BitmapRef] {
        &self.garbage
    }

    /// Persistable document of the live project.
    pub fn to_doc(&self) -> StudioResult<ProjectDoc> {
        self.project.to_doc()
    }

    /// Import a bitmap as a new top layer. The first import defines the canvas size.
    #[tracing::instrument(skip(self, bitmap), fields(w = bitmap.width(), h = bitmap.height()))]
    pub fn import_layer(&mut self, bitmap: Bitmap, name: Option<&str>) -> StudioResult<LayerId> {
        let mut work = self.project.clone();
        let id = LayerId::generate();
        let source = BitmapRef::layer_source(&id);
        let name = name
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Layer {}", work.layers().len() + 1));
        work.import_layer(id.clone(), name, bitmap.size(), source.clone())?;
        self.commit(work, vec![(source, Arc::new(bitmap))], Vec::new(), Change::Visible)?;
        tracing::info!(layer = %id, "layer imported");
        Ok(id)
    }

    /// Apply `operation` to a layer (explicit id or prefix, else the active layer).
    ///
    /// Any redo future is discarded along with its derived bitmaps.
    #[tracing::instrument(skip(self, operation), fields(kind = operation.kind()))]
    pub fn apply_operation(
        &mut self,
        layer: Option<&str>,
        operation: Operation,
    ) -> StudioResult<OperationRecord> {
        operation.validate()?;
        let mut work = self.project.clone();
        let target = work.layers().resolve_active(layer)?.clone();
        if target.locked() {
            tracing::warn!(layer = %target.id(), "applying operation to a locked layer");
        }

        let input = layer_bitmap(&work, &target, &self.store)?;
        let output = operation.apply(&input)?;
        let record = OperationRecord::new(OpId::generate(), operation, target.id().clone());
        let layer_out = record
            .output_layer()
            .cloned()
            .unwrap_or_else(|| record.output().clone());
        let snapshot = record.output().clone();

        let discarded = work.push_operation(record.clone())?;
        let dropped = discarded
            .iter()
            .flat_map(|r| r.outputs().cloned())
            .collect();
        self.commit(
            work,
            vec![(layer_out, Arc::new(output))],
            dropped,
            Change::Applied(snapshot),
        )?;
        tracing::info!(op = %record.id(), truncated = discarded.len(), "operation applied");
        Ok(record)
    }

    /// Apply a color replacement. See [`Session::apply_operation`].
    pub fn apply_color_replace(
        &mut self,
        layer: Option<&str>,
        params: ColorReplaceParams,
    ) -> StudioResult<OperationRecord> {
        self.apply_operation(layer, params.into())
    }

    /// Count the pixels a color replacement would change, without recording anything.
    pub fn preview_color_replace(
        &self,
        layer: Option<&str>,
        params: &ColorReplaceParams,
    ) -> StudioResult<usize> {
        let target = self.project.layers().resolve_active(layer)?;
        let input = layer_bitmap(&self.project, target, &self.store)?;
        params.count_matches(&input)
    }

    /// Step the cursor back. Returns the new cursor.
    #[tracing::instrument(skip(self))]
    pub fn undo(&mut self) -> StudioResult<isize> {
        let mut work = self.project.clone();
        let cursor = work.undo()?;
        self.commit(work, Vec::new(), Vec::new(), Change::Visible)?;
        Ok(cursor)
    }

    /// Step the cursor forward. Returns the new cursor.
    #[tracing::instrument(skip(self))]
    pub fn redo(&mut self) -> StudioResult<isize> {
        let mut work = self.project.clone();
        let cursor = work.redo()?;
        self.commit(work, Vec::new(), Vec::new(), Change::Visible)?;
        Ok(cursor)
    }

    /// Delete one record by id or prefix, with its derived bitmaps.
    #[tracing::instrument(skip(self))]
    pub fn delete_operation(&mut self, query: &str) -> StudioResult<OperationRecord> {
        let mut work = self.project.clone();
        let (index, record) = work.delete_operation(query)?;
        let dropped = record.outputs().cloned().collect();
        self.commit(work, Vec::new(), dropped, Change::Visible)?;
        tracing::info!(op = %record.id(), index, "operation deleted");
        Ok(record)
    }

    /// Delete a layer and every record targeting it.
    #[tracing::instrument(skip(self))]
    pub fn delete_layer(&mut self, query: &str) -> StudioResult<Layer> {
        let mut work = self.project.clone();
        let (layer, cascaded) = work.delete_layer(query)?;
        let dropped = std::iter::once(layer.source().clone())
            .chain(cascaded.iter().flat_map(|r| r.outputs().cloned()))
            .collect();
        self.commit(work, Vec::new(), dropped, Change::Visible)?;
        tracing::info!(layer = %layer.id(), cascaded = cascaded.len(), "layer deleted");
        Ok(layer)
    }

    /// Move a layer one step. Returns `false` (and changes nothing) at the boundary.
    #[tracing::instrument(skip(self))]
    pub fn move_layer(&mut self, query: &str, dir: MoveDirection) -> StudioResult<bool> {
        let mut work = self.project.clone();
        if !work.layers_mut().move_layer(query, dir)? {
            return Ok(false);
        }
        self.commit(work, Vec::new(), Vec::new(), Change::Visible)?;
        Ok(true)
    }

    /// Show or hide a layer.
    #[tracing::instrument(skip(self))]
    pub fn set_visibility(&mut self, query: &str, visible: bool) -> StudioResult<()> {
        let mut work = self.project.clone();
        work.layers_mut().set_visibility(query, visible)?;
        self.commit(work, Vec::new(), Vec::new(), Change::Visible)
    }

    /// Set layer opacity; must lie in `[0, 1]`.
    #[tracing::instrument(skip(self))]
    pub fn set_opacity(&mut self, query: &str, opacity: f64) -> StudioResult<()> {
        let mut work = self.project.clone();
        work.layers_mut().set_opacity(query, opacity)?;
        self.commit(work, Vec::new(), Vec::new(), Change::Visible)
    }

    /// Move a layer on the canvas.
    #[tracing::instrument(skip(self))]
    pub fn set_position(&mut self, query: &str, position: Position) -> StudioResult<()> {
        let mut work = self.project.clone();
        work.layers_mut().set_position(query, position)?;
        self.commit(work, Vec::new(), Vec::new(), Change::Visible)
    }

    /// Rename a layer. Does not re-render.
    #[tracing::instrument(skip(self, name))]
    pub fn rename_layer(&mut self, query: &str, name: impl Into<String>) -> StudioResult<()> {
        let mut work = self.project.clone();
        work.layers_mut().rename(query, name)?;
        self.commit(work, Vec::new(), Vec::new(), Change::Metadata)
    }

    /// Set the advisory lock flag. Does not re-render.
    #[tracing::instrument(skip(self))]
    pub fn set_locked(&mut self, query: &str, locked: bool) -> StudioResult<()> {
        let mut work = self.project.clone();
        work.layers_mut().set_locked(query, locked)?;
        self.commit(work, Vec::new(), Vec::new(), Change::Metadata)
    }

    /// Apply several layer field changes as one command.
    ///
    /// Either every field of `patch` is applied or, on error, none is. An empty patch only
    /// checks that the layer exists.
    #[tracing::instrument(skip(self))]
    pub fn update_layer(&mut self, query: &str, patch: &LayerPatch) -> StudioResult<Layer> {
        let mut work = self.project.clone();
        let layer = work.layers_mut().apply_patch(query, patch)?.clone();
        if patch.is_empty() {
            return Ok(layer);
        }
        let change = if patch.is_visual() {
            Change::Visible
        } else {
            Change::Metadata
        };
        self.commit(work, Vec::new(), Vec::new(), change)?;
        Ok(layer)
    }

    /// Drop the whole history and its derived bitmaps, keeping layers. Returns the record count.
    #[tracing::instrument(skip(self))]
    pub fn reset_history(&mut self) -> StudioResult<usize> {
        let mut work = self.project.clone();
        let dropped_records = work.clear_history();
        let dropped = dropped_records
            .iter()
            .flat_map(|r| r.outputs().cloned())
            .collect();
        self.commit(work, Vec::new(), dropped, Change::Visible)?;
        Ok(dropped_records.len())
    }

    /// Render the live project from the store.
    pub fn render(&self) -> StudioResult<Bitmap> {
        compositor::render(&self.project, &self.store)
    }

    /// Render and write the composite as a PNG file.
    #[tracing::instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn export_png(&self, path: impl AsRef<Path>) -> StudioResult<()> {
        let composite = self.render()?;
        codec::write_png(path, &composite)
    }

    /// Render the live project and store it under the composite handle.
    ///
    /// Returns `false` without writing anything while the canvas size is still unknown. Callers
    /// that persist the project document themselves run this after saving, with
    /// `render_on_mutation` disabled, so the stored composite never runs ahead of the document.
    pub fn store_composite(&mut self) -> StudioResult<bool> {
        if self.project.canvas().size.is_none() {
            return Ok(false);
        }
        let composite = Arc::new(self.render()?);
        self.store
            .put(&self.opts.composite_ref, Arc::clone(&composite))?;
        self.composite = Some(composite);
        Ok(true)
    }

    /// Check that every layer source exists and no record is excluded from compositing.
    pub fn health(&self) -> StudioResult<()> {
        let mut problems = Vec::new();
        for layer in self.project.layers().iter() {
            if !self.store.contains(layer.source()) {
                problems.push(format!(
                    "layer {} source {} is missing",
                    layer.id().short(),
                    layer.source()
                ));
            }
        }
        if !self.project.excluded().is_empty() {
            let ids: Vec<&str> = self.project.excluded().iter().map(|id| id.short()).collect();
            problems.push(format!("excluded operations: {}", ids.join(", ")));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(StudioError::corrupt(problems.join("; ")))
        }
    }

    /// Remove queued derived bitmaps that the live project no longer references.
    ///
    /// Failures are logged and skipped. Returns the number of bitmaps removed.
    pub fn collect_garbage(&mut self) -> usize {
        let queued = std::mem::take(&mut self.garbage);
        let mut removed = 0;
        for r in queued {
            if self.is_referenced(&r) {
                continue;
            }
            match self.store.remove(&r) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(bitmap = %r, error = %e, "garbage collection failed"),
            }
        }
        tracing::debug!(removed, "derived bitmaps collected");
        removed
    }

    fn is_referenced(&self, r: &BitmapRef) -> bool {
        r == &self.opts.composite_ref
            || self.project.layers().iter().any(|l| l.source() == r)
            || self
                .project
                .history()
                .records()
                .iter()
                .any(|rec| rec.outputs().any(|o| o == r))
    }

    fn commit(
        &mut self,
        work: Project,
        puts: Vec<(BitmapRef, Arc<Bitmap>)>,
        dropped: Vec<BitmapRef>,
        change: Change,
    ) -> StudioResult<()> {
        let mut staged = Staged::new(&self.store);
        for (r, b) in puts {
            staged.put(r, b);
        }

        let render_now = match &change {
            Change::Metadata => false,
            Change::Visible => self.opts.render_on_mutation,
            Change::Applied(_) => true,
        };
        let composite = if render_now {
            let c = Arc::new(compositor::render(&work, &staged)?);
            if let Change::Applied(snapshot) = &change {
                staged.put(snapshot.clone(), Arc::clone(&c));
            }
            if self.opts.render_on_mutation {
                staged.put(self.opts.composite_ref.clone(), Arc::clone(&c));
            }
            Some(c)
        } else {
            None
        };

        let puts = staged.into_puts();
        flush(&mut self.store, puts)?;

        self.project = work;
        match change {
            Change::Metadata => {}
            _ if self.opts.render_on_mutation => self.composite = composite,
            _ => self.composite = None,
        }
        self.garbage.extend(dropped);
        if self.opts.collect_garbage {
            self.collect_garbage();
        }
        Ok(())
    }
}

impl Session<DirBitmapStore> {
    /// Create a project directory with an empty project and write its document.
    ///
    /// Fails with `GuardrailViolation` when the directory already holds a project.
    pub fn create_dir(
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        canvas: CanvasSettings,
        opts: SessionOpts,
    ) -> StudioResult<Self> {
        let dir = dir.into();
        if dir.join(PROJECT_FILE).exists() {
            return Err(StudioError::guardrail(format!(
                "project already exists at '{}'",
                dir.display()
            )));
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create project directory '{}'", dir.display()))?;
        let session = Self::create(name, canvas, DirBitmapStore::new(dir), opts);
        session.save()?;
        Ok(session)
    }

    /// Open the project stored in `dir`.
    pub fn open_dir(dir: impl Into<PathBuf>, opts: SessionOpts) -> StudioResult<Self> {
        let dir = dir.into();
        let doc = ProjectDoc::from_path(dir.join(PROJECT_FILE))?;
        Self::open(doc, DirBitmapStore::new(dir), opts)
    }

    /// Write the project document next to its bitmaps.
    pub fn save(&self) -> StudioResult<()> {
        self.to_doc()?
            .write_to_path(self.store.root().join(PROJECT_FILE))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/service.rs"]
mod tests;
