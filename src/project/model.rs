use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::foundation::core::{CanvasSettings, Size};
use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::ids::{BitmapRef, LayerId, OpId};
use crate::history::record::OperationRecord;
use crate::history::stack::OperationStack;
use crate::layers::model::Layer;
use crate::layers::registry::LayerRegistry;

/// Root aggregate of an edit session: canvas settings, layer stack and operation history.
///
/// A `Project` is plain state. Bitmaps live in a [`crate::BitmapStore`]; the project only holds
/// handles to them. Use [`crate::Session`] to drive edits that also produce pixels.
#[derive(Clone, Debug)]
pub struct Project {
    pub(crate) name: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) canvas: CanvasSettings,
    pub(crate) layers: LayerRegistry,
    pub(crate) history: OperationStack,
    pub(crate) legacy_base_layer: Option<LayerId>,
    pub(crate) excluded: BTreeSet<OpId>,
}

impl Project {
    /// Empty project.
    pub fn new(name: impl Into<String>, canvas: CanvasSettings) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            created_at: now,
            updated_at: now,
            canvas,
            layers: LayerRegistry::new(),
            history: OperationStack::new(),
            legacy_base_layer: None,
            excluded: BTreeSet::new(),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Canvas settings.
    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    /// Layer stack.
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Operation history.
    pub fn history(&self) -> &OperationStack {
        &self.history
    }

    /// Layer that whole-project (null-target) records apply to.
    pub fn legacy_base_layer(&self) -> Option<&LayerId> {
        self.legacy_base_layer.as_ref()
    }

    /// Records excluded from compositing because their output or target is gone.
    pub fn excluded(&self) -> &BTreeSet<OpId> {
        &self.excluded
    }

    /// Whether a record is excluded from compositing.
    pub fn is_excluded(&self, id: &OpId) -> bool {
        self.excluded.contains(id)
    }

    /// Whether `record` edits `layer`: an explicit target, or a null target on the legacy base.
    pub fn record_targets(&self, record: &OperationRecord, layer: &LayerId) -> bool {
        match record.target() {
            Some(t) => t == layer,
            None => self.legacy_base_layer.as_ref() == Some(layer),
        }
    }

    /// Handle of the bitmap the compositor draws for `layer` at the current cursor.
    ///
    /// That is the output of the last applied, non-excluded record targeting the layer, or the
    /// imported bitmap when there is none.
    pub fn effective_source<'a>(&'a self, layer: &'a Layer) -> &'a BitmapRef {
        self.history
            .applied()
            .iter()
            .rev()
            .filter(|r| !self.is_excluded(r.id()))
            .find(|r| self.record_targets(r, layer.id()))
            .map_or(layer.source(), |r| r.effective_output())
    }

    /// Add a layer on top. The first layer defines the canvas size when none was set.
    pub fn import_layer(
        &mut self,
        id: LayerId,
        name: impl Into<String>,
        size: Size,
        source: BitmapRef,
    ) -> StudioResult<&Layer> {
        if self.canvas.size.is_none() {
            self.canvas.size = Some(size);
        }
        self.touch();
        self.layers.add(id, name, size, source)
    }

    /// Remove a layer together with every record that targets it.
    ///
    /// Fails with `GuardrailViolation` when it is the last layer.
    pub fn delete_layer(&mut self, query: &str) -> StudioResult<(Layer, Vec<OperationRecord>)> {
        let layer = self.layers.delete(query)?;
        let id = layer.id().clone();
        let legacy_base = self.legacy_base_layer.clone();
        let cascaded = self.history.remove_where(|r| match r.target() {
            Some(t) => t == &id,
            None => legacy_base.as_ref() == Some(&id),
        });
        if legacy_base.as_ref() == Some(&id) {
            self.legacy_base_layer = None;
        }
        self.forget(&cascaded);
        self.touch();
        Ok((layer, cascaded))
    }

    /// Append a record (truncating any redo future). Returns the discarded records.
    pub fn push_operation(&mut self, record: OperationRecord) -> StudioResult<Vec<OperationRecord>> {
        if let Some(target) = record.target()
            && self.layers.get(target).is_none()
        {
            return Err(StudioError::not_found(format!(
                "operation targets unknown layer {target}"
            )));
        }
        let discarded = self.history.push(record);
        self.forget(&discarded);
        self.touch();
        Ok(discarded)
    }

    /// Move the cursor back.
    pub fn undo(&mut self) -> StudioResult<isize> {
        let c = self.history.undo()?;
        self.touch();
        Ok(c)
    }

    /// Move the cursor forward.
    pub fn redo(&mut self) -> StudioResult<isize> {
        let c = self.history.redo()?;
        self.touch();
        Ok(c)
    }

    /// Delete one record by id or prefix.
    pub fn delete_operation(&mut self, query: &str) -> StudioResult<(usize, OperationRecord)> {
        let (i, rec) = self.history.delete(query)?;
        self.forget(std::slice::from_ref(&rec));
        self.touch();
        Ok((i, rec))
    }

    /// Drop the whole history, keeping layers.
    pub fn clear_history(&mut self) -> Vec<OperationRecord> {
        let all = self.history.clear();
        self.excluded.clear();
        self.touch();
        all
    }

    /// Mutable layer access for property edits.
    pub(crate) fn layers_mut(&mut self) -> &mut LayerRegistry {
        self.touch();
        &mut self.layers
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn forget(&mut self, gone: &[OperationRecord]) {
        for r in gone {
            self.excluded.remove(r.id());
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/model.rs"]
mod tests;
