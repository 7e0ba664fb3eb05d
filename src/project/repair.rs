//! Load a [`ProjectDoc`] into a [`Project`], repairing what can be repaired.
//!
//! Every repair is reported; nothing is silently dropped. Violations that cannot be repaired
//! (duplicate ids, unknown operation kinds, unreadable layer sources) fail with `CorruptState`.

use std::collections::{BTreeSet, HashSet};

use crate::foundation::core::{CanvasSettings, Position, Size};
use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::ids::{BitmapRef, LayerId, OpId};
use crate::history::record::OperationRecord;
use crate::history::stack::OperationStack;
use crate::layers::model::Layer;
use crate::layers::registry::LayerRegistry;
use crate::ops::operation::Operation;
use crate::project::doc::{LayerDoc, ProjectDoc, RecordDoc};
use crate::project::model::Project;
use crate::store::BitmapSource;

/// One change made while loading.
#[derive(Clone, Debug, PartialEq)]
pub enum Repair {
    /// The document had no cursor; it now points at the last record.
    MigratedCursor {
        /// New cursor.
        cursor: isize,
    },
    /// The stored cursor was outside `[-1, len - 1]`.
    ClampedCursor {
        /// Stored value.
        from: i64,
        /// Clamped value.
        to: isize,
    },
    /// Some layers had no explicit order; all orders follow document sequence.
    AssignedLayerOrder,
    /// Layer orders were not a dense `0..N-1` sequence.
    RenormalizedLayerOrder,
    /// A layer opacity was outside `[0, 1]`.
    ClampedOpacity {
        /// Layer id.
        layer: LayerId,
        /// Stored value.
        from: f64,
        /// Clamped value.
        to: f64,
    },
    /// The canvas size was missing and taken from the bottommost layer.
    InferredCanvasSize(Size),
    /// Whole-project records now apply to this layer.
    AdoptedLegacyBase(LayerId),
    /// A record is kept in history but skipped by the compositor.
    ExcludedOperation {
        /// Record id.
        op: OpId,
        /// Why it cannot be composited.
        reason: String,
    },
}

impl std::fmt::Display for Repair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MigratedCursor { cursor } => write!(f, "missing cursor set to {cursor}"),
            Self::ClampedCursor { from, to } => write!(f, "cursor {from} clamped to {to}"),
            Self::AssignedLayerOrder => f.write_str("layer orders assigned from document order"),
            Self::RenormalizedLayerOrder => f.write_str("layer orders renormalized"),
            Self::ClampedOpacity { layer, from, to } => {
                write!(f, "layer {} opacity {from} clamped to {to}", layer.short())
            }
            Self::InferredCanvasSize(s) => {
                write!(f, "canvas size inferred as {}x{}", s.width, s.height)
            }
            Self::AdoptedLegacyBase(id) => {
                write!(f, "whole-project operations bound to layer {}", id.short())
            }
            Self::ExcludedOperation { op, reason } => {
                write!(f, "operation {} excluded: {reason}", op.short())
            }
        }
    }
}

/// Everything [`load_project`] changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RepairReport {
    repairs: Vec<Repair>,
}

impl RepairReport {
    /// `true` when the document loaded unchanged.
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }

    /// Repairs in the order they were made.
    pub fn repairs(&self) -> &[Repair] {
        &self.repairs
    }

    fn push(&mut self, r: Repair) {
        tracing::warn!(repair = %r, "project repaired on load");
        self.repairs.push(r);
    }
}

/// Build a project from a document, consulting `bitmaps` for layer sizes and output existence.
#[tracing::instrument(skip(doc, bitmaps), fields(project = %doc.name))]
pub fn load_project<S: BitmapSource + ?Sized>(
    doc: ProjectDoc,
    bitmaps: &S,
) -> StudioResult<(Project, RepairReport)> {
    let mut report = RepairReport::default();

    let layers = load_layers(&doc.layers, bitmaps, &mut report)?;
    let registry = LayerRegistry::from_layers(layers);

    let canvas_doc = doc.canvas.clone().unwrap_or_default();
    let width = canvas_doc.width.or(doc.canvas_width).filter(|w| *w > 0);
    let height = canvas_doc.height.or(doc.canvas_height).filter(|h| *h > 0);
    let mut canvas = CanvasSettings {
        size: match (width, height) {
            (Some(w), Some(h)) => Some(Size::new(w, h)?),
            _ => None,
        },
        background: canvas_doc.background,
        dpi: canvas_doc.dpi,
    };
    if canvas.size.is_none()
        && let Some(bottom) = registry.bottom()
    {
        canvas.size = Some(bottom.size());
        report.push(Repair::InferredCanvasSize(bottom.size()));
    }

    let records = load_records(&doc.operations)?;
    let len = records.len() as isize;
    let cursor = match doc.active_op_index {
        None => {
            report.push(Repair::MigratedCursor { cursor: len - 1 });
            len - 1
        }
        Some(c) if c < -1 || c >= len as i64 => {
            let to = (c.clamp(-1, len as i64 - 1)) as isize;
            report.push(Repair::ClampedCursor { from: c, to });
            to
        }
        Some(c) => c as isize,
    };

    let mut legacy_base = doc
        .legacy_base_layer
        .map(LayerId::new)
        .filter(|id| registry.get(id).is_some());
    if legacy_base.is_none()
        && records.iter().any(|r| r.target().is_none())
        && let Some(bottom) = registry.bottom()
    {
        legacy_base = Some(bottom.id().clone());
        report.push(Repair::AdoptedLegacyBase(bottom.id().clone()));
    }

    let mut excluded = BTreeSet::new();
    for r in &records {
        let reason = match r.target() {
            Some(t) if registry.get(t).is_none() => Some(format!("target layer {t} is missing")),
            None if legacy_base.is_none() => Some("no layer to apply to".to_owned()),
            _ if !bitmaps.contains(r.effective_output()) => {
                Some(format!("output {} is missing", r.effective_output()))
            }
            _ => None,
        };
        if let Some(reason) = reason {
            excluded.insert(r.id().clone());
            report.push(Repair::ExcludedOperation {
                op: r.id().clone(),
                reason,
            });
        }
    }

    let project = Project {
        name: doc.name,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
        canvas,
        layers: registry,
        history: OperationStack::from_parts(records, cursor)?,
        legacy_base_layer: legacy_base,
        excluded,
    };
    Ok((project, report))
}

fn load_layers<S: BitmapSource + ?Sized>(
    docs: &[LayerDoc],
    bitmaps: &S,
    report: &mut RepairReport,
) -> StudioResult<Vec<Layer>> {
    let mut seen = HashSet::new();
    for d in docs {
        if !seen.insert(d.id.as_str()) {
            return Err(StudioError::corrupt(format!("duplicate layer id {}", d.id)));
        }
    }

    let missing = docs.iter().any(|d| d.order.is_none());
    let all_equal = docs.len() > 1 && docs.windows(2).all(|w| w[0].order == w[1].order);
    let by_sequence = missing || all_equal;
    let mut idx: Vec<usize> = (0..docs.len()).collect();
    if by_sequence {
        if !docs.is_empty() {
            report.push(Repair::AssignedLayerOrder);
        }
    } else {
        idx.sort_by_key(|&i| (docs[i].order, i));
        let dense = idx
            .iter()
            .enumerate()
            .all(|(n, &i)| docs[i].order == Some(n as u32));
        if !dense {
            report.push(Repair::RenormalizedLayerOrder);
        }
    }

    let mut layers = Vec::with_capacity(docs.len());
    for (order, i) in idx.into_iter().enumerate() {
        let d = &docs[i];
        let id = LayerId::new(d.id.clone());
        let source = BitmapRef::new(d.source_reference.clone());
        let size = match d.size {
            Some(s) => s,
            None => bitmaps
                .bitmap(&source)?
                .map(|b| b.size())
                .ok_or_else(|| {
                    StudioError::corrupt(format!("layer {} source {source} is missing", d.id))
                })?,
        };
        let opacity = if d.opacity.is_nan() {
            1.0
        } else {
            d.opacity.clamp(0.0, 1.0)
        };
        if opacity != d.opacity {
            report.push(Repair::ClampedOpacity {
                layer: id.clone(),
                from: d.opacity,
                to: opacity,
            });
        }
        let position = d
            .position
            .unwrap_or_else(|| Position::new(d.x.unwrap_or(0), d.y.unwrap_or(0)));
        layers.push(Layer {
            id,
            name: d.name.clone(),
            kind: d.kind,
            visible: d.visible,
            opacity,
            locked: d.locked,
            order: order as u32,
            position,
            size,
            source,
        });
    }
    Ok(layers)
}

fn load_records(docs: &[RecordDoc]) -> StudioResult<Vec<OperationRecord>> {
    let mut seen = HashSet::new();
    docs.iter()
        .map(|d| -> StudioResult<OperationRecord> {
            if !seen.insert(d.id.as_str()) {
                return Err(StudioError::corrupt(format!("duplicate operation id {}", d.id)));
            }
            let operation = Operation::from_parts(&d.kind, d.parameters.clone())
                .map_err(|e| StudioError::corrupt(format!("operation {}: {e}", d.id)))?;
            Ok(OperationRecord::from_stored(
                OpId::new(d.id.clone()),
                operation,
                d.target_layer_id.clone().map(LayerId::new),
                BitmapRef::new(d.output_reference.clone()),
                d.output_layer_reference.clone().map(BitmapRef::new),
                d.created_at,
                d.note.clone(),
            ))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/project/repair.rs"]
mod tests;
